//! Propagation of trace context to downstream services.
//!
//! Registry and identity calls made while handling an order carry the W3C
//! `traceparent`/`tracestate` of the current span and the inbound
//! `x-request-id`, so one order request can be followed across services.

use opentelemetry::trace::{SpanContext, TraceContextExt};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::RequestBuilder;
use tracing_opentelemetry::OpenTelemetrySpanExt;

pub const TRACEPARENT_HEADER: &str = "traceparent";
pub const TRACESTATE_HEADER: &str = "tracestate";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// `00-{trace_id}-{span_id}-{flags}`, or `None` outside a sampled span.
fn traceparent(span_context: &SpanContext) -> Option<String> {
    span_context.is_valid().then(|| {
        format!(
            "00-{}-{}-{:02x}",
            span_context.trace_id(),
            span_context.span_id(),
            span_context.trace_flags().to_u8()
        )
    })
}

/// Headers identifying the current span and request.
pub fn propagation_headers(request_id: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let context = tracing::Span::current().context();
    let span = context.span();
    let span_context = span.span_context();

    if let Some(value) = traceparent(span_context).and_then(|v| HeaderValue::from_str(&v).ok()) {
        headers.insert(TRACEPARENT_HEADER, value);
        let state = span_context.trace_state().header();
        if let Ok(value) = HeaderValue::from_str(&state) {
            if !state.is_empty() {
                headers.insert(TRACESTATE_HEADER, value);
            }
        }
    }

    if let Some(value) = request_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    headers
}

/// Adds trace propagation to outbound requests.
pub trait TracedClientExt {
    fn propagate(self, request_id: Option<&str>) -> Self;
}

impl TracedClientExt for RequestBuilder {
    fn propagate(self, request_id: Option<&str>) -> Self {
        self.headers(propagation_headers(request_id))
    }
}
