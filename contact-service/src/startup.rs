//! Application startup and lifecycle management.

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use service_core::auth::TokenVerifier;
use service_core::db::create_pool;
use service_core::error::AppError;
use service_core::middleware::{
    auth::require_auth_middleware, metrics::metrics_middleware, tracing::request_id_middleware,
};
use service_core::observability::install_metrics_recorder;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ContactConfig;
use crate::handlers::{self, contacts};
use crate::services::{init_metrics, ContactStore, PgContactStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    pub verifier: TokenVerifier,
}

pub fn build_router(state: AppState) -> Router {
    let registry = Router::new()
        .route(
            "/customers",
            get(contacts::list_customers).post(contacts::create_customer),
        )
        .route("/customers/:id", get(contacts::get_customer))
        .route(
            "/vendors",
            get(contacts::list_vendors).post(contacts::create_vendor),
        )
        .route("/vendors/:id", get(contacts::get_vendor))
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
}

impl Application {
    pub async fn build(config: ContactConfig) -> Result<Self, AppError> {
        install_metrics_recorder()?;
        init_metrics();

        let pool = create_pool(&config.database).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            e
        })?;
        let store = PgContactStore::new(pool);
        store.run_migrations().await?;

        let state = AppState {
            store: Arc::new(store),
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
            service = "contact-service",
            version = env!("CARGO_PKG_VERSION"),
            port = self.port,
            "Service ready to accept connections"
        );
        axum::serve(self.listener, self.router).await
    }
}
