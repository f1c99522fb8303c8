use secrecy::Secret;
use service_core::config::{self as core_config, env_or, env_parse, require_env};
use service_core::error::AppError;

use crate::services::ServiceCredentials;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub jwt: JwtConfig,
    pub credentials: ServiceCredentials,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    pub service_token_ttl_minutes: i64,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let credentials = ServiceCredentials::parse(&require_env("SERVICE_CREDENTIALS")?)?;

        Ok(Self {
            common,
            service_name: env_or("SERVICE_NAME", "auth-service"),
            log_level: env_or("LOG_LEVEL", "info"),
            otlp_endpoint: std::env::var("OTLP_ENDPOINT").ok(),
            jwt: JwtConfig {
                secret: Secret::new(require_env("JWT_SECRET")?),
                service_token_ttl_minutes: env_parse("SERVICE_TOKEN_TTL_MINUTES", 60)?,
            },
            credentials,
        })
    }
}
