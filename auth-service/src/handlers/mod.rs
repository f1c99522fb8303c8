pub mod service_token;

pub use service_token::issue_service_token;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// auth-service has no backing store, so ready means listening.
pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}

pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        crate::services::get_metrics(),
    )
}
