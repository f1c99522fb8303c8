//! Application startup and lifecycle management.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use order_core::lookup::CustomerLookup;
use order_core::metrics::init_metrics;
use order_core::{
    order_routes, OrderKind, OrderOrchestrator, OrderRepository, PgOrderRepository, Sales,
};
use service_core::auth::TokenVerifier;
use service_core::clients::{ContactClient, InventoryClient, ServiceTokenClient, TokenSource};
use service_core::config::DownstreamConfig;
use service_core::db::create_pool;
use service_core::error::AppError;
use service_core::events::{EventPublisher, RedisEventBus};
use service_core::middleware::{
    auth::optional_auth_middleware, metrics::metrics_middleware, tracing::request_id_middleware,
};
use service_core::observability::install_metrics_recorder;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::SalesConfig;
use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderOrchestrator<Sales>,
    pub verifier: TokenVerifier,
}

/// Wire the order workflow to contact-service and inventory-service.
pub fn build_orchestrator(
    http: reqwest::Client,
    downstream: &DownstreamConfig,
    tokens: Arc<dyn TokenSource>,
    repo: Arc<dyn OrderRepository>,
    publisher: Arc<dyn EventPublisher>,
) -> OrderOrchestrator<Sales> {
    let customers = CustomerLookup(ContactClient::new(
        http.clone(),
        &downstream.contact_service_url,
    ));
    let catalog = InventoryClient::new(http, &downstream.inventory_service_url);

    OrderOrchestrator::new(repo, Arc::new(customers), Arc::new(catalog), tokens, publisher)
}

pub fn build_router(state: AppState) -> Router {
    // Callers without a token are served under the service identity.
    let orders = order_routes(state.orders.clone()).layer(from_fn_with_state(
        state.verifier.clone(),
        optional_auth_middleware,
    ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .merge(orders)
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

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
    tracing::info!("Database migrations completed");
    Ok(())
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: SalesConfig) -> Result<Self, AppError> {
        install_metrics_recorder()?;
        init_metrics(Sales::NAME);

        let pool = create_pool(&config.database).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;
        run_migrations(&pool).await?;
        let repo = PgOrderRepository::<Sales>::new(pool);

        let bus = RedisEventBus::connect(&config.redis).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to Redis");
            AppError::ServiceUnavailable
        })?;

        let http = config.http.build_client()?;
        let tokens = ServiceTokenClient::new(
            http.clone(),
            &config.downstream.auth_service_url,
            &config.service_name,
            config.service_secret.clone(),
        );

        let state = AppState {
            orders: build_orchestrator(
                http,
                &config.downstream,
                Arc::new(tokens),
                Arc::new(repo),
                Arc::new(bus),
            ),
            verifier: TokenVerifier::new(&config.jwt_secret),
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
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        tracing::info!(
            service = "sales-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );
        axum::serve(self.listener, self.router).await
    }
}
