use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Route template of the request, so `/orders/:id` stays one series.
fn route_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned())
}

/// HTTP request count, latency and in-flight gauge, labelled by method,
/// route and status class.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().as_str().to_owned();
    let route = route_label(&req);

    let in_flight = gauge!("http_requests_in_flight", "route" => route.clone());
    in_flight.increment(1.0);
    let response = next.run(req).await;
    in_flight.decrement(1.0);

    let status = response.status();
    let class = format!("{}xx", status.as_u16() / 100);
    let labels = [
        ("method", method),
        ("route", route),
        ("status", class),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels)
        .record(started.elapsed().as_secs_f64());
    if status.is_server_error() {
        counter!("http_server_errors_total", &labels[..2]).increment(1);
    }

    response
}
