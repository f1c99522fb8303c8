//! Application startup and lifecycle management.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::auth::TokenVerifier;
use service_core::db::create_pool;
use service_core::error::AppError;
use service_core::events::RedisEventBus;
use service_core::middleware::{
    auth::require_auth_middleware, metrics::metrics_middleware, tracing::request_id_middleware,
};
use service_core::observability::install_metrics_recorder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::config::InventoryConfig;
use crate::consumer::{StockEventConsumer, SubscriptionStatus};
use crate::handlers::{self, items};
use crate::services::{init_metrics, InventoryStore, PgInventoryStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn InventoryStore>,
    pub verifier: TokenVerifier,
    pub subscription: SubscriptionStatus,
}

pub fn build_router(state: AppState) -> Router {
    let registry = Router::new()
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/:id", get(items::get_item))
        .route("/items/:id/stock", get(items::get_stock))
        .route("/items/:id/stock/adjust", post(items::adjust_stock))
        .layer(from_fn_with_state(
            state.verifier.clone(),
            require_auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .merge(registry)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    consumer: JoinHandle<()>,
}

impl Application {
    pub async fn build(config: InventoryConfig) -> Result<Self, AppError> {
        install_metrics_recorder()?;
        init_metrics();

        let pool = create_pool(&config.database).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;
        let store = PgInventoryStore::new(pool);
        store.run_migrations().await?;
        let store: Arc<dyn InventoryStore> = Arc::new(store);

        let bus = RedisEventBus::connect(&config.redis).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to Redis");
            AppError::ServiceUnavailable
        })?;
        let consumer = StockEventConsumer::new(store.clone());
        let subscription = consumer.status();
        let consumer = consumer
            .spawn(Arc::new(bus))
            .await
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Failed to subscribe to order events: {}", e))
            })?;

        let state = AppState {
            store,
            verifier: TokenVerifier::new(&config.jwt_secret),
            subscription,
        };

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            router: build_router(state),
            consumer,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = "inventory-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );
        let result = axum::serve(self.listener, self.router).await;
        self.consumer.abort();
        result
    }
}
