use async_trait::async_trait;
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::instrument;
use uuid::Uuid;

use super::{order_not_found, wrong_status, OrderRepository};
use crate::kind::OrderKind;
use crate::metrics::DB_QUERY_DURATION;
use crate::models::{Order, OrderItem, OrderRow, OrderStatus, OrderWithItems};

/// PostgreSQL repository. Table and counterparty column names come from `K`.
pub struct PgOrderRepository<K> {
    pool: PgPool,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for PgOrderRepository<K> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _kind: PhantomData,
        }
    }
}

fn begin_failed(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
}

fn commit_failed(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
}

impl<K: OrderKind> PgOrderRepository<K> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _kind: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn order_columns() -> String {
        format!(
            "id, {} AS counterparty_id, status, total_amount, created_at, updated_at",
            K::COUNTERPARTY_FIELD
        )
    }

    async fn insert_items(
        tx: &mut Transaction<'_, Postgres>,
        items: &[OrderItem],
    ) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO {} (id, order_id, item_id, quantity, unit_price, subtotal) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            K::ITEMS_TABLE
        );
        for item in items {
            sqlx::query(&sql)
                .bind(item.id)
                .bind(item.order_id)
                .bind(item.item_id)
                .bind(item.quantity)
                .bind(item.unit_price)
                .bind(item.subtotal)
                .execute(&mut **tx)
                .await
                .map_err(|e| AppError::from_sqlx("Failed to insert order item", e))?;
        }
        Ok(())
    }

    async fn items_for(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItem>>, AppError> {
        let sql = format!(
            "SELECT id, order_id, item_id, quantity, unit_price, subtotal FROM {} \
             WHERE order_id = ANY($1) ORDER BY order_id, id",
            K::ITEMS_TABLE
        );
        let rows = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to load order items", e))?;

        let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for item in rows {
            grouped.entry(item.order_id).or_default().push(item);
        }
        Ok(grouped)
    }

    async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
    ) -> Result<OrderStatus, AppError> {
        let sql = format!("SELECT status FROM {} WHERE id = $1 FOR UPDATE", K::ORDERS_TABLE);
        let status: String = sqlx::query_scalar(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to lock order", e))?
            .ok_or_else(|| order_not_found(id))?;
        status.parse()
    }

    async fn fetch_existing(&self, id: Uuid) -> Result<OrderWithItems, AppError> {
        self.get(id).await?.ok_or_else(|| order_not_found(id))
    }
}

#[async_trait]
impl<K: OrderKind> OrderRepository for PgOrderRepository<K> {
    #[instrument(skip(self, order, items), fields(kind = K::NAME, order_id = %order.id, lines = items.len()))]
    async fn create(&self, order: Order, items: Vec<OrderItem>) -> Result<OrderWithItems, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_order"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(begin_failed)?;

        let sql = format!(
            "INSERT INTO {} (id, {}, status, total_amount, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            K::ORDERS_TABLE,
            K::COUNTERPARTY_FIELD,
            Self::order_columns()
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order.id)
            .bind(order.counterparty_id)
            .bind(order.status.as_str())
            .bind(order.total_amount)
            .bind(order.created_at)
            .bind(order.updated_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to create order", e))?;

        Self::insert_items(&mut tx, &items).await?;
        tx.commit().await.map_err(commit_failed)?;

        timer.observe_duration();
        Ok(OrderWithItems {
            order: row.try_into()?,
            items,
        })
    }

    #[instrument(skip(self), fields(kind = K::NAME))]
    async fn get(&self, id: Uuid) -> Result<Option<OrderWithItems>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_order"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            Self::order_columns(),
            K::ORDERS_TABLE
        );
        let Some(row) = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to get order", e))?
        else {
            return Ok(None);
        };

        let items = self.items_for(&[id]).await?.remove(&id).unwrap_or_default();

        timer.observe_duration();
        Ok(Some(OrderWithItems {
            order: row.try_into()?,
            items,
        }))
    }

    #[instrument(skip(self), fields(kind = K::NAME))]
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<OrderWithItems>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_orders"])
            .start_timer();

        let sql = format!(
            "SELECT {} FROM {} ORDER BY created_at DESC, id LIMIT $1 OFFSET $2",
            Self::order_columns(),
            K::ORDERS_TABLE
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to list orders", e))?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut items = self.items_for(&ids).await?;

        let orders = rows
            .into_iter()
            .map(|row| {
                let items = items.remove(&row.id).unwrap_or_default();
                Ok(OrderWithItems {
                    order: row.try_into()?,
                    items,
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        timer.observe_duration();
        Ok(orders)
    }

    #[instrument(skip(self, items), fields(kind = K::NAME, lines = items.len()))]
    async fn replace_items(
        &self,
        id: Uuid,
        items: Vec<OrderItem>,
        total_amount: Decimal,
    ) -> Result<OrderWithItems, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["replace_items"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(begin_failed)?;

        // The pre-check in the orchestrator ran before remote validation; the
        // order may have left draft since then.
        let status = Self::lock_status(&mut tx, id).await?;
        if status != OrderStatus::Draft {
            return Err(wrong_status(id, status, OrderStatus::Draft));
        }

        let sql = format!("DELETE FROM {} WHERE order_id = $1", K::ITEMS_TABLE);
        sqlx::query(&sql)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to delete order items", e))?;

        Self::insert_items(&mut tx, &items).await?;

        let sql = format!(
            "UPDATE {} SET total_amount = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            K::ORDERS_TABLE,
            Self::order_columns()
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(total_amount)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to update order total", e))?;

        tx.commit().await.map_err(commit_failed)?;

        timer.observe_duration();
        Ok(OrderWithItems {
            order: row.try_into()?,
            items,
        })
    }

    #[instrument(skip(self), fields(kind = K::NAME))]
    async fn transition(
        &self,
        id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<OrderWithItems, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["transition"])
            .start_timer();

        let sql = format!(
            "UPDATE {} SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
            K::ORDERS_TABLE
        );
        let updated = sqlx::query(&sql)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::from_sqlx("Failed to update order status", e))?
            .rows_affected();

        timer.observe_duration();

        let order = self.fetch_existing(id).await?;
        if updated == 0 {
            return Err(wrong_status(id, order.status(), from));
        }
        Ok(order)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        service_core::db::health_check(&self.pool).await
    }
}
