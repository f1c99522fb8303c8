use axum::{extract::State, Json};
use service_core::auth::PrincipalKind;
use service_core::clients::ServiceTokenResponse;
use service_core::envelope::ApiResponse;
use service_core::error::AppError;
use service_core::extract::ValidatedJson;

use crate::dtos::ServiceTokenRequest;
use crate::services::metrics::SERVICE_TOKEN_REQUESTS;
use crate::AppState;

/// Exchange a registered service name and secret for a bearer token.
pub async fn issue_service_token(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ServiceTokenRequest>,
) -> Result<Json<ApiResponse<ServiceTokenResponse>>, AppError> {
    if !state.credentials.verify(&req.service_name, &req.service_secret) {
        SERVICE_TOKEN_REQUESTS.with_label_values(&["rejected"]).inc();
        tracing::warn!(service_name = %req.service_name, "Rejected service credentials");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "Invalid service credentials"
        )));
    }

    let issued = state.issuer.issue(&req.service_name, PrincipalKind::Service)?;

    SERVICE_TOKEN_REQUESTS.with_label_values(&["issued"]).inc();
    tracing::info!(
        service_name = %req.service_name,
        expires_in = issued.expires_in,
        "Issued service token"
    );

    Ok(Json(ApiResponse::success(
        "Service token issued",
        ServiceTokenResponse {
            token: issued.token,
            expires_in: issued.expires_in,
        },
    )))
}
