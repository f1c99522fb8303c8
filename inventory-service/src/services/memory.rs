use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::store::{apply_delta, stock_not_found};
use super::InventoryStore;
use crate::models::{Item, Stock};

#[derive(Default)]
struct Tables {
    items: HashMap<Uuid, Item>,
    stocks: HashMap<Uuid, Stock>,
}

/// In-process store for tests and local runs. A single mutex stands in for
/// the row lock, so adjustments are serialized.
#[derive(Clone, Default)]
pub struct InMemoryInventoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn create_item(&self, item: Item) -> Result<Item, AppError> {
        let mut tables = self.tables.lock().await;
        if tables.items.values().any(|existing| existing.sku == item.sku) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Failed to create item: duplicate key"
            )));
        }

        tables.stocks.insert(
            item.id,
            Stock {
                item_id: item.id,
                quantity: 0,
                updated_at: item.created_at,
            },
        );
        tables.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: Uuid) -> Result<Option<Item>, AppError> {
        Ok(self.tables.lock().await.items.get(&id).cloned())
    }

    async fn list_items(&self, limit: i64, offset: i64) -> Result<Vec<Item>, AppError> {
        let mut items: Vec<Item> = self.tables.lock().await.items.values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(items
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn get_stock(&self, item_id: Uuid) -> Result<Option<Stock>, AppError> {
        Ok(self.tables.lock().await.stocks.get(&item_id).cloned())
    }

    async fn adjust_stock(&self, item_id: Uuid, delta: i64) -> Result<Stock, AppError> {
        let mut tables = self.tables.lock().await;
        let stock = tables
            .stocks
            .get_mut(&item_id)
            .ok_or_else(|| stock_not_found(item_id))?;

        stock.quantity = apply_delta(item_id, stock.quantity, delta)?;
        stock.updated_at = Utc::now();
        Ok(stock.clone())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
