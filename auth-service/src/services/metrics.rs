//! Prometheus metrics for auth-service.

use once_cell::sync::Lazy;
use prometheus::{IntCounterVec, register_int_counter_vec};

/// Service token requests by outcome (issued, rejected).
pub static SERVICE_TOKEN_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "auth_service_token_requests_total",
        "Service token requests by outcome",
        &["outcome"]
    )
    .expect("Failed to register service_token_requests")
});

pub fn init_metrics() {
    for outcome in ["issued", "rejected"] {
        SERVICE_TOKEN_REQUESTS.with_label_values(&[outcome]);
    }
}

pub fn get_metrics() -> String {
    service_core::observability::render_metrics()
}
