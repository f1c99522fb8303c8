//! Customer and vendor endpoints. Each route is a thin wrapper that fixes the
//! [`ContactKind`].

use axum::{extract::State, http::StatusCode, Json};
use service_core::envelope::ApiResponse;
use service_core::error::AppError;
use service_core::extract::{IdPath, QueryParams, ValidatedJson};
use service_core::pagination::Pagination;
use uuid::Uuid;

use crate::models::{Contact, ContactKind, CreateContactRequest};
use crate::services::metrics::CONTACTS_CREATED;
use crate::AppState;

async fn create(
    state: &AppState,
    kind: ContactKind,
    req: CreateContactRequest,
) -> Result<(StatusCode, Json<ApiResponse<Contact>>), AppError> {
    let contact = state.store.create(kind, Contact::new(req)).await?;
    CONTACTS_CREATED.with_label_values(&[kind.label()]).inc();
    tracing::info!(kind = kind.label(), contact_id = %contact.id, "Contact created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            format!("{} created", kind.title()),
            contact,
        )),
    ))
}

async fn get(
    state: &AppState,
    kind: ContactKind,
    id: Uuid,
) -> Result<Json<ApiResponse<Contact>>, AppError> {
    let contact = state.store.get(kind, id).await?.ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("{} {} not found", kind.title(), id))
    })?;

    Ok(Json(ApiResponse::success(
        format!("{} retrieved", kind.title()),
        contact,
    )))
}

async fn list(
    state: &AppState,
    kind: ContactKind,
    page: Pagination,
) -> Result<Json<ApiResponse<Vec<Contact>>>, AppError> {
    let contacts = state
        .store
        .list(kind, page.limit(), page.offset())
        .await?;

    Ok(Json(ApiResponse::success(
        format!("{}s retrieved", kind.title()),
        contacts,
    )))
}

pub async fn create_customer(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Contact>>), AppError> {
    create(&state, ContactKind::Customer, req).await
}

pub async fn get_customer(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<ApiResponse<Contact>>, AppError> {
    get(&state, ContactKind::Customer, id).await
}

pub async fn list_customers(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<Pagination>,
) -> Result<Json<ApiResponse<Vec<Contact>>>, AppError> {
    list(&state, ContactKind::Customer, page).await
}

pub async fn create_vendor(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Contact>>), AppError> {
    create(&state, ContactKind::Vendor, req).await
}

pub async fn get_vendor(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<ApiResponse<Contact>>, AppError> {
    get(&state, ContactKind::Vendor, id).await
}

pub async fn list_vendors(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<Pagination>,
) -> Result<Json<ApiResponse<Vec<Contact>>>, AppError> {
    list(&state, ContactKind::Vendor, page).await
}
