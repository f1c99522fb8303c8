//! Item and stock persistence.

use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::metrics::DB_QUERY_DURATION;
use crate::models::{Item, Stock};

#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Insert the item and its zero stock row atomically.
    async fn create_item(&self, item: Item) -> Result<Item, AppError>;

    async fn get_item(&self, id: Uuid) -> Result<Option<Item>, AppError>;

    async fn list_items(&self, limit: i64, offset: i64) -> Result<Vec<Item>, AppError>;

    async fn get_stock(&self, item_id: Uuid) -> Result<Option<Stock>, AppError>;

    /// Apply `delta` under a row lock. Fails with `NotFound` for an unknown
    /// item and `BadRequest` when the result would be negative; stock is
    /// unchanged in both cases.
    async fn adjust_stock(&self, item_id: Uuid, delta: i64) -> Result<Stock, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

pub(crate) fn apply_delta(item_id: Uuid, current: i64, delta: i64) -> Result<i64, AppError> {
    match current.checked_add(delta) {
        Some(next) if next >= 0 => Ok(next),
        _ => Err(AppError::BadRequest(anyhow::anyhow!(
            "Insufficient stock for item {}: on hand {}, requested change {}",
            item_id,
            current,
            delta
        ))),
    }
}

pub(crate) fn stock_not_found(item_id: Uuid) -> AppError {
    AppError::NotFound(anyhow::anyhow!("Stock for item {} not found", item_id))
}

#[derive(Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        tracing::info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    #[instrument(skip(self, item), fields(item_id = %item.id, sku = %item.sku))]
    async fn create_item(&self, item: Item) -> Result<Item, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_item"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let created = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (id, name, sku, unit_price, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, sku, unit_price, created_at, updated_at
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(item.unit_price)
        .bind(item.created_at)
        .bind(item.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to create item", e))?;

        sqlx::query("INSERT INTO stocks (item_id, quantity) VALUES ($1, 0)")
            .bind(created.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to create stock row", e))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit item: {}", e))
        })?;

        timer.observe_duration();
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_item(&self, id: Uuid) -> Result<Option<Item>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_item"])
            .start_timer();

        let item = sqlx::query_as::<_, Item>(
            "SELECT id, name, sku, unit_price, created_at, updated_at FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to get item", e))?;

        timer.observe_duration();
        Ok(item)
    }

    #[instrument(skip(self))]
    async fn list_items(&self, limit: i64, offset: i64) -> Result<Vec<Item>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_items"])
            .start_timer();

        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, sku, unit_price, created_at, updated_at
            FROM items
            ORDER BY created_at DESC, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to list items", e))?;

        timer.observe_duration();
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn get_stock(&self, item_id: Uuid) -> Result<Option<Stock>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_stock"])
            .start_timer();

        let stock = sqlx::query_as::<_, Stock>(
            "SELECT item_id, quantity, updated_at FROM stocks WHERE item_id = $1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to get stock", e))?;

        timer.observe_duration();
        Ok(stock)
    }

    #[instrument(skip(self))]
    async fn adjust_stock(&self, item_id: Uuid, delta: i64) -> Result<Stock, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["adjust_stock"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let current: i64 =
            sqlx::query_scalar("SELECT quantity FROM stocks WHERE item_id = $1 FOR UPDATE")
                .bind(item_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| AppError::from_sqlx("Failed to lock stock row", e))?
                .ok_or_else(|| stock_not_found(item_id))?;

        // Dropping the transaction rolls it back and releases the lock.
        let next = apply_delta(item_id, current, delta)?;

        let stock = sqlx::query_as::<_, Stock>(
            r#"
            UPDATE stocks SET quantity = $2, updated_at = NOW()
            WHERE item_id = $1
            RETURNING item_id, quantity, updated_at
            "#,
        )
        .bind(item_id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::from_sqlx("Failed to update stock", e))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit stock change: {}", e))
        })?;

        timer.observe_duration();
        tracing::debug!(previous = current, quantity = next, "Stock adjusted");
        Ok(stock)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        service_core::db::health_check(&self.pool).await
    }
}
