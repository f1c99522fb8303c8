//! Remote references an order depends on.
//!
//! The orchestrator only needs to know that a counterparty exists and what an
//! item costs; these traits keep it independent of the HTTP clients so tests
//! can substitute fixed answers.

use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::clients::{ClientError, ContactClient, InventoryClient};
use uuid::Uuid;

#[async_trait]
pub trait CounterpartyLookup: Send + Sync {
    async fn ensure_exists(
        &self,
        id: Uuid,
        token: &str,
        request_id: Option<&str>,
    ) -> Result<(), ClientError>;
}

#[async_trait]
pub trait ItemCatalog: Send + Sync {
    async fn unit_price(
        &self,
        item_id: Uuid,
        token: &str,
        request_id: Option<&str>,
    ) -> Result<Decimal, ClientError>;
}

#[async_trait]
impl ItemCatalog for InventoryClient {
    async fn unit_price(
        &self,
        item_id: Uuid,
        token: &str,
        request_id: Option<&str>,
    ) -> Result<Decimal, ClientError> {
        Ok(self.get_item(item_id, token, request_id).await?.unit_price)
    }
}

/// Customers registered in contact-service.
#[derive(Clone)]
pub struct CustomerLookup(pub ContactClient);

#[async_trait]
impl CounterpartyLookup for CustomerLookup {
    async fn ensure_exists(
        &self,
        id: Uuid,
        token: &str,
        request_id: Option<&str>,
    ) -> Result<(), ClientError> {
        self.0.get_customer(id, token, request_id).await.map(|_| ())
    }
}

/// Vendors registered in contact-service.
#[derive(Clone)]
pub struct VendorLookup(pub ContactClient);

#[async_trait]
impl CounterpartyLookup for VendorLookup {
    async fn ensure_exists(
        &self,
        id: Uuid,
        token: &str,
        request_id: Option<&str>,
    ) -> Result<(), ClientError> {
        self.0.get_vendor(id, token, request_id).await.map(|_| ())
    }
}
