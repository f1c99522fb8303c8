//! Order persistence.

pub mod memory;
pub mod pg;

pub use memory::InMemoryOrderRepository;
pub use pg::PgOrderRepository;

use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderStatus, OrderWithItems};

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert the order row and all of its items atomically.
    async fn create(&self, order: Order, items: Vec<OrderItem>) -> Result<OrderWithItems, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<OrderWithItems>, AppError>;

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<OrderWithItems>, AppError>;

    /// Swap the item set of a draft order and store the new total. The
    /// draft status is re-checked under a row lock; a non-draft order fails
    /// with `BadRequest` and keeps its items.
    async fn replace_items(
        &self,
        id: Uuid,
        items: Vec<OrderItem>,
        total_amount: Decimal,
    ) -> Result<OrderWithItems, AppError>;

    /// Move `id` from `from` to `to` if and only if it is currently in `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderWithItems, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

pub(crate) fn order_not_found(id: Uuid) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Order {} not found", id))
}

pub(crate) fn wrong_status(id: Uuid, actual: OrderStatus, expected: OrderStatus) -> AppError {
    AppError::BadRequest(anyhow::anyhow!(
        "Order {} is {}, expected {}",
        id,
        actual,
        expected
    ))
}
