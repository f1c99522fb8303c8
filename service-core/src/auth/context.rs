//! Per-request caller identity, passed explicitly down the call chain.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

use super::token::Claims;
use crate::middleware::tracing::RequestId;

/// Caller credential and correlation ID for one inbound request.
///
/// `token` is only set when the bearer token verified; an absent or invalid
/// token leaves the context anonymous.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub token: Option<String>,
    pub claims: Option<Claims>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(token: String, claims: Claims) -> Self {
        Self {
            token: Some(token),
            claims: Some(claims),
            request_id: None,
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut context = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();

        if context.request_id.is_none() {
            context.request_id = parts.extensions.get::<RequestId>().map(|id| id.0.clone());
        }

        Ok(context)
    }
}
