//! Stock adjustments driven by order events.

mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use backoff::ExponentialBackoff;
use chrono::Utc;
use common::{seed_item, TestApp};
use futures::StreamExt;
use inventory_service::consumer::{ApplySummary, StockEventConsumer};
use inventory_service::services::{InMemoryInventoryStore, InventoryStore};
use rust_decimal::Decimal;
use service_core::events::{
    EventError, EventItem, EventPublisher, EventStream, EventSubscriber, InMemoryEventBus,
    OrderEvent, PURCHASE_ORDER_RECEIVED, SALES_ORDER_CONFIRMED,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

/// What one `subscribe` call yields.
enum Step {
    /// A stream that delivers these events and then ends.
    Deliver(Vec<(String, OrderEvent)>),
    Fail,
}

/// Replays scripted subscriptions; once the script runs out every
/// subscription stays open and silent.
struct ScriptedSubscriber {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

impl ScriptedSubscriber {
    fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSubscriber for ScriptedSubscriber {
    async fn subscribe(&self, _topics: &[&str]) -> Result<EventStream, EventError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Deliver(events)) => Ok(futures::stream::iter(events).boxed()),
            Some(Step::Fail) => {
                let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
                Err(EventError::from(err))
            }
            None => Ok(futures::stream::pending().boxed()),
        }
    }
}

fn backoff_of(interval: Duration) -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: interval,
        max_interval: interval,
        randomization_factor: 0.0,
        max_elapsed_time: None,
        ..Default::default()
    }
}

fn line(item_id: Uuid, quantity: i32) -> EventItem {
    let unit_price = Decimal::new(1000, 2);
    EventItem {
        item_id,
        quantity,
        unit_price,
        subtotal: unit_price * Decimal::from(quantity),
    }
}

fn event(event_type: &str, items: Vec<EventItem>) -> OrderEvent {
    let total_amount = items.iter().map(|i| i.subtotal).sum();
    OrderEvent {
        event_type: event_type.to_string(),
        order_id: Uuid::new_v4(),
        counterparty_id: Uuid::new_v4(),
        items,
        total_amount,
        timestamp: Utc::now(),
    }
}

async fn quantity(store: &InMemoryInventoryStore, id: Uuid) -> i64 {
    store.get_stock(id).await.unwrap().unwrap().quantity
}

#[tokio::test]
async fn sales_confirmation_reduces_stock() {
    let store = InMemoryInventoryStore::new();
    let id = seed_item(&store, "S-1", Decimal::new(1000, 2), 10).await;
    let consumer = StockEventConsumer::new(Arc::new(store.clone()));

    let summary = consumer
        .handle(SALES_ORDER_CONFIRMED, &event(SALES_ORDER_CONFIRMED, vec![line(id, 3)]))
        .await;

    assert_eq!(summary, ApplySummary { applied: 1, failed: 0 });
    assert_eq!(quantity(&store, id).await, 7);
}

#[tokio::test]
async fn purchase_receipt_increases_stock() {
    let store = InMemoryInventoryStore::new();
    let id = seed_item(&store, "P-1", Decimal::new(500, 2), 0).await;
    let consumer = StockEventConsumer::new(Arc::new(store.clone()));

    consumer
        .handle(
            PURCHASE_ORDER_RECEIVED,
            &event(PURCHASE_ORDER_RECEIVED, vec![line(id, 4)]),
        )
        .await;

    assert_eq!(quantity(&store, id).await, 4);
}

#[tokio::test]
async fn failing_line_does_not_stop_the_rest() {
    let store = InMemoryInventoryStore::new();
    let scarce = seed_item(&store, "A-1", Decimal::new(100, 2), 1).await;
    let plenty = seed_item(&store, "B-1", Decimal::new(100, 2), 10).await;
    let consumer = StockEventConsumer::new(Arc::new(store.clone()));

    let summary = consumer
        .handle(
            SALES_ORDER_CONFIRMED,
            &event(
                SALES_ORDER_CONFIRMED,
                vec![line(Uuid::new_v4(), 1), line(scarce, 5), line(plenty, 2)],
            ),
        )
        .await;

    assert_eq!(summary, ApplySummary { applied: 1, failed: 2 });
    assert_eq!(quantity(&store, scarce).await, 1);
    assert_eq!(quantity(&store, plenty).await, 8);
}

#[tokio::test]
async fn unrelated_topic_is_ignored() {
    let store = InMemoryInventoryStore::new();
    let id = seed_item(&store, "U-1", Decimal::new(100, 2), 5).await;
    let consumer = StockEventConsumer::new(Arc::new(store.clone()));

    let summary = consumer
        .handle("sales.order.paid", &event("sales.order.paid", vec![line(id, 5)]))
        .await;

    assert_eq!(summary, ApplySummary::default());
    assert_eq!(quantity(&store, id).await, 5);
}

#[tokio::test]
async fn subscribed_consumer_applies_published_events() {
    let store = InMemoryInventoryStore::new();
    let id = seed_item(&store, "E-1", Decimal::new(1000, 2), 10).await;
    let bus = InMemoryEventBus::new();

    let handle = StockEventConsumer::new(Arc::new(store.clone()))
        .spawn(Arc::new(bus.clone()))
        .await
        .unwrap();

    bus.publish(
        SALES_ORDER_CONFIRMED,
        &event(SALES_ORDER_CONFIRMED, vec![line(id, 3)]),
    )
    .await
    .unwrap();

    let mut observed = 10;
    for _ in 0..50 {
        observed = quantity(&store, id).await;
        if observed == 7 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();

    assert_eq!(observed, 7);
}

#[tokio::test]
async fn consumer_resubscribes_after_stream_ends() {
    let store = InMemoryInventoryStore::new();
    let id = seed_item(&store, "R-1", Decimal::new(1000, 2), 10).await;
    let subscriber = ScriptedSubscriber::new(vec![
        Step::Deliver(vec![(
            SALES_ORDER_CONFIRMED.to_string(),
            event(SALES_ORDER_CONFIRMED, vec![line(id, 3)]),
        )]),
        Step::Fail,
        Step::Deliver(vec![(
            PURCHASE_ORDER_RECEIVED.to_string(),
            event(PURCHASE_ORDER_RECEIVED, vec![line(id, 5)]),
        )]),
    ]);

    let consumer = StockEventConsumer::new(Arc::new(store.clone()))
        .with_backoff(backoff_of(Duration::from_millis(5)));
    let status = consumer.status();
    let handle = consumer.spawn(subscriber.clone()).await.unwrap();

    let mut observed = 10;
    for _ in 0..100 {
        observed = quantity(&store, id).await;
        if observed == 12 && subscriber.calls() >= 4 && status.is_subscribed() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handle.abort();

    assert_eq!(observed, 12);
    assert_eq!(subscriber.calls(), 4);
    assert!(status.is_subscribed());
}

#[tokio::test]
async fn readiness_follows_event_subscription() {
    let store = InMemoryInventoryStore::new();
    let subscriber = ScriptedSubscriber::new(vec![Step::Deliver(vec![])]);

    let consumer = StockEventConsumer::new(Arc::new(store.clone()))
        .with_backoff(backoff_of(Duration::from_secs(60)));
    let app = TestApp::with_store(store, consumer.status());

    let (status, _) = app.request("GET", "/ready", None, None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let status_handle = consumer.status();
    let handle = consumer.spawn(subscriber).await.unwrap();

    // The first stream is empty, so the consumer drops to waiting out the backoff.
    for _ in 0..50 {
        if !status_handle.is_subscribed() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let (status, _) = app.request("GET", "/ready", None, None).await;
    handle.abort();
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn ready_while_subscribed() {
    let store = InMemoryInventoryStore::new();
    let bus = InMemoryEventBus::new();
    let consumer = StockEventConsumer::new(Arc::new(store.clone()));
    let app = TestApp::with_store(store, consumer.status());

    let handle = consumer.spawn(Arc::new(bus.clone())).await.unwrap();
    let (status, _) = app.request("GET", "/ready", None, None).await;
    handle.abort();

    assert_eq!(status, StatusCode::OK);
}
