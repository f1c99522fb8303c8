use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

use crate::auth::{RequestContext, TokenVerifier};
use crate::error::AppError;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// Reject requests without a valid bearer token. Used by the registries.
pub async fn require_auth_middleware(
    State(verifier): State<TokenVerifier>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized(anyhow::anyhow!("Missing or invalid Authorization header")))?;

    let claims = verifier.verify(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized(anyhow::anyhow!("Invalid or expired token"))
    })?;

    req.extensions_mut()
        .insert(RequestContext::authenticated(token, claims));

    Ok(next.run(req).await)
}

/// Attach the caller's identity when a valid token is present; otherwise the
/// request continues anonymously and downstream calls fall back to the
/// service identity.
pub async fn optional_auth_middleware(
    State(verifier): State<TokenVerifier>,
    mut req: Request,
    next: Next,
) -> Response {
    let context = match bearer_token(req.headers()) {
        Some(token) => match verifier.verify(token) {
            Ok(claims) => RequestContext::authenticated(token.to_string(), claims),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring invalid caller token");
                RequestContext::anonymous()
            }
        },
        None => RequestContext::anonymous(),
    };

    req.extensions_mut().insert(context);
    next.run(req).await
}
