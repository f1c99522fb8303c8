//! Test helper module for auth-service integration tests.

#![allow(dead_code)]

use auth_service::config::{AuthConfig, JwtConfig};
use auth_service::services::ServiceCredentials;
use auth_service::startup::Application;
use secrecy::Secret;
use service_core::config::Config as CoreConfig;

pub const TEST_JWT_SECRET: &str = "auth-service-test-secret";
pub const SALES_SECRET: &str = "sales-secret";

pub fn test_config() -> AuthConfig {
    AuthConfig {
        common: CoreConfig { port: 0 },
        service_name: "auth-service-test".to_string(),
        log_level: "warn".to_string(),
        otlp_endpoint: None,
        jwt: JwtConfig {
            secret: Secret::new(TEST_JWT_SECRET.to_string()),
            service_token_ttl_minutes: 60,
        },
        credentials: ServiceCredentials::parse(&format!(
            "sales-service={},purchase-service=purchase-secret",
            SALES_SECRET
        ))
        .expect("Failed to parse test credentials"),
    }
}

pub struct TestApp {
    pub address: String,
    client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let app = Application::build(test_config())
            .await
            .expect("Failed to build test application");
        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        Self {
            address,
            client: reqwest::Client::new(),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}
