//! HTTP clients for service-to-service calls.
//!
//! Every client unwraps the `{status, message, data}` envelope and classifies
//! failures into [`ClientError`] so callers can tell a missing entity from a
//! rejected credential or a broken dependency.

pub mod auth_client;
pub mod contact_client;
pub mod error;
pub mod inventory_client;

pub use auth_client::{ServiceTokenClient, ServiceTokenResponse, StaticTokenSource, TokenSource};
pub use contact_client::{ContactClient, ContactRecord};
pub use error::ClientError;
pub use inventory_client::{InventoryClient, ItemRecord};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::envelope::ApiResponse;

/// Map the HTTP status and decode the envelope payload.
pub(crate) async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
    resource: &'static str,
    id: &str,
) -> Result<T, ClientError> {
    let status = response.status();
    let url = response.url().to_string();

    match status {
        StatusCode::NOT_FOUND => {
            return Err(ClientError::NotFound {
                resource,
                id: id.to_string(),
            });
        }
        StatusCode::UNAUTHORIZED => {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Unauthorized(format!(
                "{} rejected credentials: {}",
                url, body
            )));
        }
        s if !s.is_success() => {
            return Err(ClientError::UnexpectedStatus {
                status: s.as_u16(),
                url,
            });
        }
        _ => {}
    }

    let envelope: ApiResponse<T> = response
        .json()
        .await
        .map_err(|e| ClientError::InvalidResponse(format!("{}: {}", url, e)))?;

    envelope
        .into_data()
        .ok_or_else(|| ClientError::InvalidResponse(format!("{} returned no data", url)))
}
