use secrecy::Secret;
use service_core::config::{
    self as core_config, DatabaseConfig, DownstreamConfig, HttpClientConfig, RedisConfig, env_or,
    require_env,
};
use service_core::error::AppError;

#[derive(Debug, Clone)]
pub struct SalesConfig {
    pub common: core_config::Config,
    /// Also the identity presented to auth-service.
    pub service_name: String,
    pub service_secret: Secret<String>,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub http: HttpClientConfig,
    pub downstream: DownstreamConfig,
    pub jwt_secret: Secret<String>,
}

impl SalesConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            common: core_config::Config::load()?,
            service_name: env_or("SERVICE_NAME", "sales-service"),
            service_secret: Secret::new(require_env("SERVICE_SECRET")?),
            log_level: env_or("LOG_LEVEL", "info"),
            otlp_endpoint: std::env::var("OTLP_ENDPOINT").ok(),
            database: DatabaseConfig::from_env()?,
            redis: RedisConfig::from_env(),
            http: HttpClientConfig::from_env()?,
            downstream: DownstreamConfig::from_env(),
            jwt_secret: Secret::new(require_env("JWT_SECRET")?),
        })
    }
}
