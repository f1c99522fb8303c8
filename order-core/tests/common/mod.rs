//! Shared fixtures for order-core tests: fixed registries, a recording bus and
//! a router over in-memory storage.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    Router,
};
use order_core::{
    order_routes, CounterpartyLookup, InMemoryOrderRepository, ItemCatalog, OrderKind,
    OrderOrchestrator,
};
use rust_decimal::Decimal;
use secrecy::Secret;
use service_core::auth::{PrincipalKind, TokenIssuer, TokenVerifier};
use service_core::clients::{ClientError, StaticTokenSource};
use service_core::events::{EventError, EventPublisher, InMemoryEventBus, OrderEvent};
use service_core::middleware::auth::optional_auth_middleware;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower::ServiceExt;
use uuid::Uuid;

pub const SERVICE_TOKEN: &str = "service-identity-token";
pub const TEST_JWT_SECRET: &str = "order-core-test-secret";

/// Known counterparties; anything else is reported missing.
#[derive(Default)]
pub struct FixedCounterparties {
    known: HashSet<Uuid>,
}

impl FixedCounterparties {
    pub fn with(ids: &[Uuid]) -> Self {
        Self {
            known: ids.iter().copied().collect(),
        }
    }
}

#[async_trait]
impl CounterpartyLookup for FixedCounterparties {
    async fn ensure_exists(
        &self,
        id: Uuid,
        _token: &str,
        _request_id: Option<&str>,
    ) -> Result<(), ClientError> {
        if self.known.contains(&id) {
            Ok(())
        } else {
            Err(ClientError::NotFound {
                resource: "customer",
                id: id.to_string(),
            })
        }
    }
}

/// Canned catalog answer for one item.
#[derive(Clone)]
pub enum Listing {
    Price(Decimal),
    Unauthorized,
    Unavailable,
}

/// Item prices keyed by id. Records every call so tests can check fan-out and
/// which token was forwarded.
#[derive(Default)]
pub struct FixedCatalog {
    listings: RwLock<HashMap<Uuid, Listing>>,
    calls: Mutex<Vec<(Uuid, String)>>,
}

impl FixedCatalog {
    pub async fn set(&self, item_id: Uuid, listing: Listing) {
        self.listings.write().await.insert(item_id, listing);
    }

    pub async fn calls(&self) -> Vec<(Uuid, String)> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ItemCatalog for FixedCatalog {
    async fn unit_price(
        &self,
        item_id: Uuid,
        token: &str,
        _request_id: Option<&str>,
    ) -> Result<Decimal, ClientError> {
        self.calls.lock().await.push((item_id, token.to_string()));
        match self.listings.read().await.get(&item_id).cloned() {
            Some(Listing::Price(price)) => Ok(price),
            Some(Listing::Unauthorized) => {
                Err(ClientError::Unauthorized("inventory rejected token".to_string()))
            }
            Some(Listing::Unavailable) => Err(ClientError::UnexpectedStatus {
                status: 503,
                url: format!("http://inventory/items/{}", item_id),
            }),
            None => Err(ClientError::NotFound {
                resource: "item",
                id: item_id.to_string(),
            }),
        }
    }
}

/// Publisher whose broker is always down.
pub struct BrokenPublisher;

#[async_trait]
impl EventPublisher for BrokenPublisher {
    async fn publish(&self, _topic: &str, _event: &OrderEvent) -> Result<(), EventError> {
        Err(EventError::Serialization(
            serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        ))
    }
}

pub struct Harness<K> {
    pub orders: OrderOrchestrator<K>,
    pub repo: InMemoryOrderRepository,
    pub catalog: Arc<FixedCatalog>,
    pub bus: InMemoryEventBus,
    pub customer: Uuid,
    pub widget: Uuid,
    pub gadget: Uuid,
}

/// Customer plus two items: widget at 10.00, gadget at 5.00.
pub async fn harness<K: OrderKind>() -> Harness<K> {
    harness_with_publisher(None).await
}

pub async fn harness_with_publisher<K: OrderKind>(
    publisher: Option<Arc<dyn EventPublisher>>,
) -> Harness<K> {
    let customer = Uuid::new_v4();
    let widget = Uuid::new_v4();
    let gadget = Uuid::new_v4();

    let catalog = Arc::new(FixedCatalog::default());
    catalog.set(widget, Listing::Price(Decimal::new(1000, 2))).await;
    catalog.set(gadget, Listing::Price(Decimal::new(500, 2))).await;

    let repo = InMemoryOrderRepository::new();
    let bus = InMemoryEventBus::new();
    let publisher = publisher.unwrap_or_else(|| Arc::new(bus.clone()));

    let orders = OrderOrchestrator::new(
        Arc::new(repo.clone()),
        Arc::new(FixedCounterparties::with(&[customer])),
        catalog.clone(),
        Arc::new(StaticTokenSource(SERVICE_TOKEN.to_string())),
        publisher,
    );

    Harness {
        orders,
        repo,
        catalog,
        bus,
        customer,
        widget,
        gadget,
    }
}

impl<K: OrderKind> Harness<K> {
    pub fn router(&self) -> Router {
        let verifier = TokenVerifier::new(&Secret::new(TEST_JWT_SECRET.to_string()));
        order_routes(self.orders.clone()).layer(from_fn_with_state(verifier, optional_auth_middleware))
    }
}

pub fn user_token() -> String {
    TokenIssuer::new(&Secret::new(TEST_JWT_SECRET.to_string()), 5)
        .issue("alice", PrincipalKind::User)
        .expect("Failed to issue test token")
        .token
}

pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}
