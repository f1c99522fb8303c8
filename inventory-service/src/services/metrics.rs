//! Prometheus metrics for inventory-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

pub static ITEMS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "inventory_items_created_total",
        "Total number of items created",
        &["status"]
    )
    .expect("Failed to register items_created")
});

/// Stock adjustments by source (api, event) and outcome.
pub static STOCK_ADJUSTMENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "inventory_stock_adjustments_total",
        "Stock adjustments by source and outcome",
        &["source", "outcome"]
    )
    .expect("Failed to register stock_adjustments")
});

pub static EVENTS_CONSUMED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "inventory_events_consumed_total",
        "Order events consumed by topic",
        &["topic"]
    )
    .expect("Failed to register events_consumed")
});

pub static EVENT_RESUBSCRIBES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "inventory_event_resubscribes_total",
        "Times the order event subscription was re-established"
    )
    .expect("Failed to register event_resubscribes")
});

pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "inventory_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

pub fn init_metrics() {
    for status in ["ok", "error"] {
        ITEMS_CREATED.with_label_values(&[status]);
    }
    Lazy::force(&STOCK_ADJUSTMENTS);
    Lazy::force(&EVENTS_CONSUMED);
    Lazy::force(&EVENT_RESUBSCRIBES);
    Lazy::force(&DB_QUERY_DURATION);
}

pub fn get_metrics() -> String {
    service_core::observability::render_metrics()
}

/// Outcome label for a stock adjustment result.
pub fn outcome_label<T>(result: &Result<T, service_core::error::AppError>) -> &'static str {
    use service_core::error::AppError;
    match result {
        Ok(_) => "applied",
        Err(AppError::BadRequest(_)) => "rejected",
        Err(AppError::NotFound(_)) => "not_found",
        Err(_) => "error",
    }
}
