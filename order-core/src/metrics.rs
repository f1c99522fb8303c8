//! Prometheus metrics for the order workflow.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};
use service_core::error::AppError;

/// Order operations by kind, operation and outcome.
pub static ORDER_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "orders_operations_total",
        "Order operations by kind, operation and outcome",
        &["kind", "operation", "outcome"]
    )
    .expect("Failed to register orders_operations")
});

pub static REMOTE_CALL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "orders_remote_call_duration_seconds",
        "Duration of registry lookups made while validating an order",
        &["target"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register remote_call_duration")
});

pub static EVENTS_PUBLISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "orders_events_published_total",
        "Lifecycle events published by topic and outcome",
        &["topic", "outcome"]
    )
    .expect("Failed to register events_published")
});

pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "orders_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Register every collector and seed the label sets scraped on a fresh
/// process, so dashboards see zeros instead of gaps.
pub fn init_metrics(kind: &str) {
    for operation in ["create", "update", "advance", "pay"] {
        for outcome in ["ok", "rejected", "error"] {
            ORDER_OPERATIONS.with_label_values(&[kind, operation, outcome]);
        }
    }
    Lazy::force(&REMOTE_CALL_DURATION);
    Lazy::force(&EVENTS_PUBLISHED);
    Lazy::force(&DB_QUERY_DURATION);
}

pub fn get_metrics() -> String {
    service_core::observability::render_metrics()
}

pub fn outcome_label<T>(result: &Result<T, AppError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(AppError::BadRequest(_))
        | Err(AppError::ValidationError(_))
        | Err(AppError::NotFound(_))
        | Err(AppError::Unauthorized(_)) => "rejected",
        Err(_) => "error",
    }
}
