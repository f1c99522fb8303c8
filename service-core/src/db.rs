//! PostgreSQL pool setup and liveness probe.

use crate::config::DatabaseConfig;
use crate::error::AppError;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::instrument;

/// Readiness probes answer within this bound even when the pool is exhausted.
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[instrument(skip(config), fields(max = config.max_connections, min = config.min_connections))]
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(Duration::from_secs(600))
        .test_before_acquire(true)
        .connect(config.url.expose_secret())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to connect to PostgreSQL: {}", e))
        })?;

    tracing::info!("PostgreSQL pool ready");
    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> Result<(), AppError> {
    let probe = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool);
    match tokio::time::timeout(HEALTH_CHECK_TIMEOUT, probe).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(e)) => Err(AppError::DatabaseError(anyhow::anyhow!(
            "Database probe failed: {}",
            e
        ))),
        Err(_) => Err(AppError::DatabaseError(anyhow::anyhow!(
            "Database probe timed out after {:?}",
            HEALTH_CHECK_TIMEOUT
        ))),
    }
}
