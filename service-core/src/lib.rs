//! service-core: shared infrastructure for the order-management services.
pub mod auth;
pub mod clients;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod events;
pub mod extract;
pub mod middleware;
pub mod observability;
pub mod pagination;

pub use async_trait;
pub use axum;
pub use rust_decimal;
pub use secrecy;
pub use serde;
pub use serde_json;
pub use sqlx;
pub use tokio;
pub use tower;
pub use tower_http;
pub use tracing;
pub use validator;
