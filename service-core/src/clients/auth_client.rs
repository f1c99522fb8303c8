//! Service-identity token client.
//!
//! Order services call the registries on their own behalf when the inbound
//! request carried no usable caller token. The token is cached in-process and
//! refreshed shortly before it expires.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

use super::{ClientError, read_envelope};
use crate::observability::TracedClientExt;

/// Refresh this long before the issuer-reported expiry.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Upper bound on how long a fetched token is cached, whatever the issuer says.
pub const MAX_CACHED_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);

/// Anything that can hand out a bearer token for outbound calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn get_or_refresh(&self) -> Result<String, ClientError>;
}

#[derive(Debug, Serialize)]
struct ServiceTokenRequest<'a> {
    service_name: &'a str,
    service_secret: &'a str,
}

/// Payload of `POST /service-token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceTokenResponse {
    pub token: String,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + REFRESH_MARGIN < self.expires_at
    }
}

#[derive(Clone)]
pub struct ServiceTokenClient {
    http: reqwest::Client,
    token_url: String,
    service_name: String,
    service_secret: Secret<String>,
    cache: Arc<RwLock<Option<CachedToken>>>,
}

impl ServiceTokenClient {
    pub fn new(
        http: reqwest::Client,
        auth_base_url: &str,
        service_name: &str,
        service_secret: Secret<String>,
    ) -> Self {
        tracing::info!(
            auth_url = %auth_base_url,
            service_name = %service_name,
            "Service identity client configured (token fetched on first use)"
        );

        Self {
            http,
            token_url: format!("{}/service-token", auth_base_url.trim_end_matches('/')),
            service_name: service_name.to_string(),
            service_secret,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    #[instrument(skip(self), fields(service_name = %self.service_name))]
    async fn fetch(&self) -> Result<CachedToken, ClientError> {
        let body = ServiceTokenRequest {
            service_name: &self.service_name,
            service_secret: self.service_secret.expose_secret(),
        };

        let response = self
            .http
            .post(&self.token_url)
            .propagate(None)
            .json(&body)
            .send()
            .await?;
        let issued: ServiceTokenResponse =
            read_envelope(response, "service identity", &self.service_name).await?;

        let lifetime =
            Duration::from_secs(issued.expires_in.max(0) as u64).min(MAX_CACHED_LIFETIME);
        tracing::info!(expires_in = issued.expires_in, "Obtained service token");

        Ok(CachedToken {
            token: issued.token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

#[async_trait]
impl TokenSource for ServiceTokenClient {
    async fn get_or_refresh(&self) -> Result<String, ClientError> {
        {
            let guard = self.cache.read().await;
            if let Some(cached) = guard.as_ref().filter(|c| c.is_fresh()) {
                return Ok(cached.token.clone());
            }
        }

        let mut guard = self.cache.write().await;

        // Another task may have refreshed while we waited for the write lock.
        if let Some(cached) = guard.as_ref().filter(|c| c.is_fresh()) {
            return Ok(cached.token.clone());
        }

        let fresh = self.fetch().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to obtain service token");
            e
        })?;
        let token = fresh.token.clone();
        *guard = Some(fresh);
        Ok(token)
    }
}

/// Fixed token source for tests and local runs without auth-service.
#[derive(Debug, Clone)]
pub struct StaticTokenSource(pub String);

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn get_or_refresh(&self) -> Result<String, ClientError> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn issued(token: &str, expires_in: i64) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "message": "Service token issued",
            "data": {"token": token, "expires_in": expires_in}
        }))
    }

    fn client(server: &MockServer) -> ServiceTokenClient {
        ServiceTokenClient::new(
            reqwest::Client::new(),
            &server.uri(),
            "sales-service",
            Secret::new("s3cret".to_string()),
        )
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/service-token"))
            .and(body_json(json!({
                "service_name": "sales-service",
                "service_secret": "s3cret"
            })))
            .respond_with(issued("tok-1", 3600))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let client = client.clone();
                tokio::spawn(async move { client.get_or_refresh().await })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "tok-1");
        }
    }

    #[tokio::test]
    async fn test_token_inside_refresh_margin_is_refetched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/service-token"))
            .respond_with(issued("short-lived", 60))
            .expect(2)
            .mount(&server)
            .await;

        let client = client(&server);
        client.get_or_refresh().await.unwrap();
        client.get_or_refresh().await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_lifetime_is_capped_and_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/service-token"))
            .respond_with(issued("long-lived", i64::MAX))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        assert_eq!(client.get_or_refresh().await.unwrap(), "long-lived");
        assert_eq!(client.get_or_refresh().await.unwrap(), "long-lived");

        let cached = client.cache.read().await.clone().unwrap();
        assert!(cached.expires_at <= Instant::now() + MAX_CACHED_LIFETIME);
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/service-token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "status": "error", "message": "Invalid service credentials", "data": null
            })))
            .mount(&server)
            .await;

        let err = client(&server).get_or_refresh().await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(issued("recovered", 3600))
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(client.get_or_refresh().await.is_err());
        assert_eq!(client.get_or_refresh().await.unwrap(), "recovered");
    }
}
