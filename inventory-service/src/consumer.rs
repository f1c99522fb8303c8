//! Applies stock changes from order lifecycle events.
//!
//! A confirmed sales order removes its quantities from stock; a received
//! purchase order adds them. Each line is adjusted independently: one failing
//! item is logged and the rest of the event is still applied.

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use futures::StreamExt;
use service_core::events::{
    EventError, EventStream, EventSubscriber, OrderEvent, PURCHASE_ORDER_RECEIVED,
    SALES_ORDER_CONFIRMED,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::services::metrics::{
    outcome_label, EVENTS_CONSUMED, EVENT_RESUBSCRIBES, STOCK_ADJUSTMENTS,
};
use crate::services::InventoryStore;

pub const SUBSCRIBED_TOPICS: [&str; 2] = [SALES_ORDER_CONFIRMED, PURCHASE_ORDER_RECEIVED];

/// Sign applied to event quantities, or `None` for topics inventory does not
/// act on.
pub fn stock_direction(topic: &str) -> Option<i64> {
    match topic {
        SALES_ORDER_CONFIRMED => Some(-1),
        PURCHASE_ORDER_RECEIVED => Some(1),
        _ => None,
    }
}

/// Per-event tally, returned for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplySummary {
    pub applied: usize,
    pub failed: usize,
}

/// Whether the consumer currently holds an open subscription. Shared with
/// the readiness probe.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionStatus(Arc<AtomicBool>);

impl SubscriptionStatus {
    pub fn is_subscribed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, subscribed: bool) {
        self.0.store(subscribed, Ordering::Release);
    }
}

/// Delay schedule between resubscription attempts; never gives up.
pub fn resubscribe_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(500),
        max_interval: Duration::from_secs(30),
        max_elapsed_time: None,
        ..Default::default()
    }
}

#[derive(Clone)]
pub struct StockEventConsumer {
    store: Arc<dyn InventoryStore>,
    status: SubscriptionStatus,
    backoff: ExponentialBackoff,
}

impl StockEventConsumer {
    pub fn new(store: Arc<dyn InventoryStore>) -> Self {
        Self {
            store,
            status: SubscriptionStatus::default(),
            backoff: resubscribe_backoff(),
        }
    }

    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.status.clone()
    }

    #[instrument(skip(self, event), fields(order_id = %event.order_id, lines = event.items.len()))]
    pub async fn handle(&self, topic: &str, event: &OrderEvent) -> ApplySummary {
        let mut summary = ApplySummary::default();
        let Some(direction) = stock_direction(topic) else {
            tracing::warn!(topic = %topic, "Ignoring event on unexpected topic");
            return summary;
        };

        for line in &event.items {
            let delta = direction * i64::from(line.quantity);
            let result = self.store.adjust_stock(line.item_id, delta).await;
            STOCK_ADJUSTMENTS
                .with_label_values(&["event", outcome_label(&result)])
                .inc();

            match result {
                Ok(stock) => {
                    summary.applied += 1;
                    tracing::info!(
                        item_id = %line.item_id,
                        delta,
                        quantity = stock.quantity,
                        "Stock adjusted from event"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(
                        item_id = %line.item_id,
                        delta,
                        error = %e,
                        "Failed to adjust stock from event"
                    );
                }
            }
        }

        EVENTS_CONSUMED.with_label_values(&[topic]).inc();
        summary
    }

    /// Drain the stream until it ends.
    pub async fn run(&self, mut events: EventStream) {
        while let Some((topic, event)) = events.next().await {
            let summary = self.handle(&topic, &event).await;
            tracing::debug!(
                topic = %topic,
                applied = summary.applied,
                failed = summary.failed,
                "Order event processed"
            );
        }
        tracing::warn!("Order event stream ended");
    }

    /// Drain `events`, then resubscribe with backoff every time the stream
    /// ends or a subscribe attempt fails.
    async fn supervise(mut self, subscriber: Arc<dyn EventSubscriber>, events: EventStream) {
        let mut current = Some(events);
        loop {
            if let Some(events) = current.take() {
                self.status.set(true);
                self.backoff.reset();
                self.run(events).await;
                self.status.set(false);
            }

            let delay = self
                .backoff
                .next_backoff()
                .unwrap_or(self.backoff.max_interval);
            tracing::warn!(delay_ms = delay.as_millis() as u64, "Resubscribing to order events");
            tokio::time::sleep(delay).await;

            match subscriber.subscribe(&SUBSCRIBED_TOPICS).await {
                Ok(events) => {
                    EVENT_RESUBSCRIBES.inc();
                    tracing::info!("Order event subscription restored");
                    current = Some(events);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to resubscribe to order events");
                }
            }
        }
    }

    /// Subscribe to both order topics and process events in the background.
    /// The first subscription must succeed; later losses are retried.
    pub async fn spawn(
        self,
        subscriber: Arc<dyn EventSubscriber>,
    ) -> Result<JoinHandle<()>, EventError> {
        let events = subscriber.subscribe(&SUBSCRIBED_TOPICS).await?;
        self.status.set(true);
        Ok(tokio::spawn(self.supervise(subscriber, events)))
    }
}
