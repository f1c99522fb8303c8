pub mod items;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "service": "inventory-service",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed - database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "service": "inventory-service",
                    "error": e.to_string()
                })),
            )
        }
    }
}

/// Ready only with a reachable database and a live order event subscription.
pub async fn readiness_check(State(state): State<AppState>) -> StatusCode {
    if let Err(e) = state.store.health_check().await {
        tracing::warn!(error = %e, "Readiness check failed");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    if !state.subscription.is_subscribed() {
        tracing::warn!("Readiness check failed - order event subscription is down");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        crate::services::get_metrics(),
    )
}
