use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{order_not_found, wrong_status, OrderRepository};
use crate::models::{Order, OrderItem, OrderStatus, OrderWithItems};

/// In-process repository for tests and local runs. The mutex plays the part
/// of the row lock and the conditional update.
#[derive(Clone, Default)]
pub struct InMemoryOrderRepository {
    orders: Arc<Mutex<HashMap<Uuid, OrderWithItems>>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn count(&self) -> usize {
        self.orders.lock().await.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: Order, items: Vec<OrderItem>) -> Result<OrderWithItems, AppError> {
        let mut orders = self.orders.lock().await;
        if orders.contains_key(&order.id) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Failed to create order: duplicate key"
            )));
        }
        let created = OrderWithItems { order, items };
        orders.insert(created.id(), created.clone());
        Ok(created)
    }

    async fn get(&self, id: Uuid) -> Result<Option<OrderWithItems>, AppError> {
        Ok(self.orders.lock().await.get(&id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<OrderWithItems>, AppError> {
        let mut orders: Vec<OrderWithItems> =
            self.orders.lock().await.values().cloned().collect();
        orders.sort_by(|a, b| {
            b.order
                .created_at
                .cmp(&a.order.created_at)
                .then(a.id().cmp(&b.id()))
        });
        Ok(orders
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn replace_items(
        &self,
        id: Uuid,
        items: Vec<OrderItem>,
        total_amount: Decimal,
    ) -> Result<OrderWithItems, AppError> {
        let mut orders = self.orders.lock().await;
        let existing = orders.get_mut(&id).ok_or_else(|| order_not_found(id))?;
        if existing.status() != OrderStatus::Draft {
            return Err(wrong_status(id, existing.status(), OrderStatus::Draft));
        }

        existing.items = items;
        existing.order.total_amount = total_amount;
        existing.order.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderWithItems, AppError> {
        let mut orders = self.orders.lock().await;
        let existing = orders.get_mut(&id).ok_or_else(|| order_not_found(id))?;
        if existing.status() != from {
            return Err(wrong_status(id, existing.status(), from));
        }

        existing.order.status = to;
        existing.order.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
