//! The order workflow: remote validation, pricing, persistence and the
//! status lifecycle.

use chrono::Utc;
use futures::future::join_all;
use service_core::auth::RequestContext;
use service_core::clients::{ClientError, TokenSource};
use service_core::error::AppError;
use service_core::events::{EventItem, EventPublisher, OrderEvent};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::kind::OrderKind;
use crate::lookup::{CounterpartyLookup, ItemCatalog};
use crate::metrics::{outcome_label, EVENTS_PUBLISHED, ORDER_OPERATIONS, REMOTE_CALL_DURATION};
use crate::models::{
    total_of, CreateOrderRequest, Order, OrderItem, OrderLineRequest, OrderStatus,
    OrderWithItems,
};
use crate::repository::OrderRepository;

/// Translate a registry failure into the error the order API reports. A
/// missing reference is the caller's mistake, not ours.
pub fn remote_error(err: ClientError) -> AppError {
    match err {
        ClientError::NotFound { resource, id } => {
            AppError::BadRequest(anyhow::anyhow!("{} {} not found", resource, id))
        }
        ClientError::Unauthorized(msg) => AppError::Unauthorized(anyhow::anyhow!(msg)),
        other => AppError::InternalError(anyhow::anyhow!("Remote call failed: {}", other)),
    }
}

pub struct OrderOrchestrator<K> {
    repo: Arc<dyn OrderRepository>,
    counterparties: Arc<dyn CounterpartyLookup>,
    catalog: Arc<dyn ItemCatalog>,
    tokens: Arc<dyn TokenSource>,
    publisher: Arc<dyn EventPublisher>,
    _kind: PhantomData<fn() -> K>,
}

impl<K> Clone for OrderOrchestrator<K> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            counterparties: Arc::clone(&self.counterparties),
            catalog: Arc::clone(&self.catalog),
            tokens: Arc::clone(&self.tokens),
            publisher: Arc::clone(&self.publisher),
            _kind: PhantomData,
        }
    }
}

impl<K: OrderKind> OrderOrchestrator<K> {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        counterparties: Arc<dyn CounterpartyLookup>,
        catalog: Arc<dyn ItemCatalog>,
        tokens: Arc<dyn TokenSource>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repo,
            counterparties,
            catalog,
            tokens,
            publisher,
            _kind: PhantomData,
        }
    }

    pub fn repository(&self) -> &Arc<dyn OrderRepository> {
        &self.repo
    }

    /// The caller's own token when it sent a valid one, else ours.
    async fn resolve_token(&self, ctx: &RequestContext) -> Result<String, AppError> {
        if let Some(token) = ctx.bearer_token() {
            return Ok(token.to_string());
        }
        tracing::debug!("No caller token, using service identity");
        self.tokens.get_or_refresh().await.map_err(remote_error)
    }

    async fn validate_counterparty(
        &self,
        id: Uuid,
        token: &str,
        request_id: Option<&str>,
    ) -> Result<(), AppError> {
        let timer = REMOTE_CALL_DURATION
            .with_label_values(&["counterparty"])
            .start_timer();
        let result = self
            .counterparties
            .ensure_exists(id, token, request_id)
            .await;
        timer.observe_duration();

        result.map_err(|e| {
            tracing::warn!(counterparty_id = %id, error = %e, "{} validation failed", K::COUNTERPARTY_LABEL);
            match e {
                ClientError::NotFound { .. } => AppError::BadRequest(anyhow::anyhow!(
                    "{} {} not found",
                    K::COUNTERPARTY_LABEL,
                    id
                )),
                other => remote_error(other),
            }
        })
    }

    /// Look up every line's price concurrently. All lookups run to completion;
    /// the first failure in line order is reported.
    async fn price_lines(
        &self,
        order_id: Uuid,
        lines: &[OrderLineRequest],
        token: &str,
        request_id: Option<&str>,
    ) -> Result<Vec<OrderItem>, AppError> {
        let timer = REMOTE_CALL_DURATION
            .with_label_values(&["catalog"])
            .start_timer();
        let prices = join_all(
            lines
                .iter()
                .map(|line| self.catalog.unit_price(line.item_id, token, request_id)),
        )
        .await;
        timer.observe_duration();

        lines
            .iter()
            .zip(prices)
            .map(|(line, price)| {
                let unit_price = price.map_err(|e| {
                    tracing::warn!(item_id = %line.item_id, error = %e, "Item validation failed");
                    remote_error(e)
                })?;
                OrderItem::priced(order_id, line.item_id, line.quantity, unit_price)
            })
            .collect()
    }

    fn record<T>(operation: &str, result: &Result<T, AppError>) {
        ORDER_OPERATIONS
            .with_label_values(&[K::NAME, operation, outcome_label(result)])
            .inc();
    }

    #[instrument(skip(self, ctx, req), fields(kind = K::NAME, counterparty_id = %req.counterparty_id, lines = req.items.len()))]
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateOrderRequest,
    ) -> Result<OrderWithItems, AppError> {
        let result = self.create_inner(ctx, req).await;
        Self::record("create", &result);
        result
    }

    async fn create_inner(
        &self,
        ctx: &RequestContext,
        req: CreateOrderRequest,
    ) -> Result<OrderWithItems, AppError> {
        let token = self.resolve_token(ctx).await?;
        let request_id = ctx.request_id.as_deref();

        self.validate_counterparty(req.counterparty_id, &token, request_id)
            .await?;

        let order_id = Uuid::new_v4();
        let items = self
            .price_lines(order_id, &req.items, &token, request_id)
            .await?;

        let now = Utc::now();
        let order = Order {
            id: order_id,
            counterparty_id: req.counterparty_id,
            status: OrderStatus::Draft,
            total_amount: total_of(&items)?,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(order, items).await?;
        tracing::info!(
            order_id = %created.id(),
            total_amount = %created.order.total_amount,
            "{} order created",
            K::NAME
        );
        Ok(created)
    }

    /// Replace the items of a draft order, re-pricing every line.
    #[instrument(skip(self, ctx, lines), fields(kind = K::NAME, lines = lines.len()))]
    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        lines: Vec<OrderLineRequest>,
    ) -> Result<OrderWithItems, AppError> {
        let result = self.update_inner(ctx, id, lines).await;
        Self::record("update", &result);
        result
    }

    async fn update_inner(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        lines: Vec<OrderLineRequest>,
    ) -> Result<OrderWithItems, AppError> {
        let existing = self.get(id).await?;
        if existing.status() != OrderStatus::Draft {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Order {} is {} and can no longer be modified",
                id,
                existing.status()
            )));
        }

        let token = self.resolve_token(ctx).await?;
        let items = self
            .price_lines(id, &lines, &token, ctx.request_id.as_deref())
            .await?;
        let total = total_of(&items)?;

        let updated = self.repo.replace_items(id, items, total).await?;
        tracing::info!(order_id = %id, total_amount = %total, "{} order updated", K::NAME);
        Ok(updated)
    }

    /// Move a draft order forward (confirm or receive) and announce it.
    #[instrument(skip(self), fields(kind = K::NAME))]
    pub async fn advance(&self, id: Uuid) -> Result<OrderWithItems, AppError> {
        let result = self
            .repo
            .transition(id, OrderStatus::Draft, K::ADVANCED)
            .await;
        Self::record("advance", &result);

        let order = result?;
        tracing::info!(order_id = %id, status = %order.status(), "{} order advanced", K::NAME);
        self.publish(&order).await;
        Ok(order)
    }

    #[instrument(skip(self), fields(kind = K::NAME))]
    pub async fn pay(&self, id: Uuid) -> Result<OrderWithItems, AppError> {
        let result = self
            .repo
            .transition(id, K::ADVANCED, OrderStatus::Paid)
            .await;
        Self::record("pay", &result);

        let order = result?;
        tracing::info!(order_id = %id, "{} order paid", K::NAME);
        Ok(order)
    }

    pub async fn get(&self, id: Uuid) -> Result<OrderWithItems, AppError> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Order {} not found", id)))
    }

    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<OrderWithItems>, AppError> {
        self.repo.list(limit, offset).await
    }

    /// Publish failures are logged; the status change has already committed.
    async fn publish(&self, order: &OrderWithItems) {
        let event = OrderEvent {
            event_type: K::ADVANCE_TOPIC.to_string(),
            order_id: order.id(),
            counterparty_id: order.order.counterparty_id,
            items: order
                .items
                .iter()
                .map(|item| EventItem {
                    item_id: item.item_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    subtotal: item.subtotal,
                })
                .collect(),
            total_amount: order.order.total_amount,
            timestamp: Utc::now(),
        };

        match self.publisher.publish(K::ADVANCE_TOPIC, &event).await {
            Ok(()) => {
                EVENTS_PUBLISHED
                    .with_label_values(&[K::ADVANCE_TOPIC, "ok"])
                    .inc();
                tracing::info!(order_id = %event.order_id, topic = K::ADVANCE_TOPIC, "Order event published");
            }
            Err(e) => {
                EVENTS_PUBLISHED
                    .with_label_values(&[K::ADVANCE_TOPIC, "error"])
                    .inc();
                tracing::error!(
                    order_id = %event.order_id,
                    topic = K::ADVANCE_TOPIC,
                    error = %e,
                    "Failed to publish order event"
                );
            }
        }
    }
}
