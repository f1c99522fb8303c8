//! Client for inventory-service item lookups.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use super::{ClientError, read_envelope};
use crate::observability::TracedClientExt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
}

#[derive(Clone)]
pub struct InventoryClient {
    http: reqwest::Client,
    base_url: String,
}

impl InventoryClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self, token, request_id))]
    pub async fn get_item(
        &self,
        id: Uuid,
        token: &str,
        request_id: Option<&str>,
    ) -> Result<ItemRecord, ClientError> {
        let url = format!("{}/items/{}", self.base_url, id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .propagate(request_id)
            .send()
            .await?;

        read_envelope(response, "item", &id.to_string()).await
    }
}
