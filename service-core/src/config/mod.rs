use crate::error::AppError;
use config::{Config as Cfg, File};
use secrecy::Secret;
use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

/// PostgreSQL pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            url: Secret::new(require_env("DATABASE_URL")?),
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10)?,
            min_connections: env_parse("DATABASE_MIN_CONNECTIONS", 2)?,
            acquire_timeout: Duration::from_secs(env_parse("DATABASE_ACQUIRE_TIMEOUT_SECS", 30)?),
        })
    }
}

/// Redis connection used for event pub/sub.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub url: Secret<String>,
}

impl RedisConfig {
    pub fn from_env() -> Self {
        Self {
            url: Secret::new(env_or("REDIS_URL", "redis://localhost:6379")),
        }
    }
}

/// Outbound HTTP client deadlines.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl HttpClientConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            connect_timeout: Duration::from_millis(env_parse("HTTP_CONNECT_TIMEOUT_MS", 5_000)?),
            request_timeout: Duration::from_millis(env_parse("HTTP_REQUEST_TIMEOUT_MS", 10_000)?),
        })
    }

    /// Build a reqwest client bounded by these deadlines.
    pub fn build_client(&self) -> Result<reqwest::Client, AppError> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .build()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Failed to build HTTP client: {}", e)))
    }
}

/// Base URLs of the services an order service calls.
#[derive(Debug, Clone)]
pub struct DownstreamConfig {
    pub auth_service_url: String,
    pub contact_service_url: String,
    pub inventory_service_url: String,
}

impl DownstreamConfig {
    pub fn from_env() -> Self {
        Self {
            auth_service_url: env_or("AUTH_SERVICE_URL", "http://localhost:8081"),
            contact_service_url: env_or("CONTACT_SERVICE_URL", "http://localhost:8082"),
            inventory_service_url: env_or("INVENTORY_SERVICE_URL", "http://localhost:8083"),
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn require_env(key: &str) -> Result<String, AppError> {
    env::var(key).map_err(|_| AppError::ConfigError(anyhow::anyhow!("{} is required", key)))
}

pub fn env_parse<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("{}: {}", key, e))),
        Err(_) => Ok(default),
    }
}
