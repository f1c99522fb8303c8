//! Client for contact-service: customer and vendor lookups.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use super::{ClientError, read_envelope};
use crate::observability::TracedClientExt;

/// The fields of a customer or vendor the order workflow relies on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Clone)]
pub struct ContactClient {
    http: reqwest::Client,
    base_url: String,
}

impl ContactClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    #[instrument(skip(self, token, request_id))]
    pub async fn get_customer(
        &self,
        id: Uuid,
        token: &str,
        request_id: Option<&str>,
    ) -> Result<ContactRecord, ClientError> {
        self.get("customers", "customer", id, token, request_id).await
    }

    #[instrument(skip(self, token, request_id))]
    pub async fn get_vendor(
        &self,
        id: Uuid,
        token: &str,
        request_id: Option<&str>,
    ) -> Result<ContactRecord, ClientError> {
        self.get("vendors", "vendor", id, token, request_id).await
    }

    async fn get(
        &self,
        collection: &str,
        resource: &'static str,
        id: Uuid,
        token: &str,
        request_id: Option<&str>,
    ) -> Result<ContactRecord, ClientError> {
        let url = format!("{}/{}/{}", self.base_url, collection, id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .propagate(request_id)
            .send()
            .await?;

        read_envelope(response, resource, &id.to_string()).await
    }
}
