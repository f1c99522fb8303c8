//! Prometheus metrics for contact-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

/// Contacts created by kind.
pub static CONTACTS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "contact_contacts_created_total",
        "Total number of contacts created",
        &["kind"]
    )
    .expect("Failed to register contacts_created")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "contact_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

pub fn init_metrics() {
    for kind in ["customer", "vendor"] {
        CONTACTS_CREATED.with_label_values(&[kind]);
    }
    Lazy::force(&DB_QUERY_DURATION);
}

pub fn get_metrics() -> String {
    service_core::observability::render_metrics()
}
