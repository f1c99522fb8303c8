//! Order lifecycle events.
//!
//! Order services publish when an order leaves `draft`; inventory subscribes
//! and adjusts stock. Delivery is at-most-once: a publish failure is logged by
//! the caller and the order state change stands.

pub mod memory;
pub mod redis_bus;

pub use memory::InMemoryEventBus;
pub use redis_bus::RedisEventBus;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub const SALES_ORDER_CONFIRMED: &str = "sales.order.confirmed";
pub const PURCHASE_ORDER_RECEIVED: &str = "purchase.order.received";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventItem {
    pub item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    pub event_type: String,
    pub order_id: Uuid,
    pub counterparty_id: Uuid,
    pub items: Vec<EventItem>,
    pub total_amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Broker error: {0}")]
    Broker(#[from] redis::RedisError),
}

/// Topic name paired with the decoded event.
pub type EventStream = BoxStream<'static, (String, OrderEvent)>;

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, event: &OrderEvent) -> Result<(), EventError>;
}

#[async_trait]
pub trait EventSubscriber: Send + Sync {
    async fn subscribe(&self, topics: &[&str]) -> Result<EventStream, EventError>;
}
