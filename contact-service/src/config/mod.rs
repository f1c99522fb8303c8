use secrecy::Secret;
use service_core::config::{self as core_config, DatabaseConfig, env_or, require_env};
use service_core::error::AppError;

#[derive(Debug, Clone)]
pub struct ContactConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub jwt_secret: Secret<String>,
}

impl ContactConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            common: core_config::Config::load()?,
            service_name: env_or("SERVICE_NAME", "contact-service"),
            log_level: env_or("LOG_LEVEL", "info"),
            otlp_endpoint: std::env::var("OTLP_ENDPOINT").ok(),
            database: DatabaseConfig::from_env()?,
            jwt_secret: Secret::new(require_env("JWT_SECRET")?),
        })
    }
}
