use axum::{extract::State, http::StatusCode, Json};
use service_core::envelope::ApiResponse;
use service_core::error::AppError;
use service_core::extract::{IdPath, QueryParams, ValidatedJson};
use service_core::pagination::Pagination;

use crate::models::{AdjustStockRequest, CreateItemRequest, Item, Stock};
use crate::services::metrics::{outcome_label, ITEMS_CREATED, STOCK_ADJUSTMENTS};
use crate::AppState;

pub async fn create_item(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Item>>), AppError> {
    let result = state.store.create_item(Item::new(req)).await;
    let status = if result.is_ok() { "ok" } else { "error" };
    ITEMS_CREATED.with_label_values(&[status]).inc();

    let item = result?;
    tracing::info!(item_id = %item.id, sku = %item.sku, "Item created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Item created", item)),
    ))
}

pub async fn get_item(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<ApiResponse<Item>>, AppError> {
    let item = state
        .store
        .get_item(id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item {} not found", id)))?;

    Ok(Json(ApiResponse::success("Item retrieved", item)))
}

pub async fn list_items(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<Pagination>,
) -> Result<Json<ApiResponse<Vec<Item>>>, AppError> {
    let items = state
        .store
        .list_items(page.limit(), page.offset())
        .await?;

    Ok(Json(ApiResponse::success("Items retrieved", items)))
}

pub async fn get_stock(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<ApiResponse<Stock>>, AppError> {
    let stock = state.store.get_stock(id).await?.ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("Stock for item {} not found", id))
    })?;

    Ok(Json(ApiResponse::success("Stock retrieved", stock)))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    ValidatedJson(req): ValidatedJson<AdjustStockRequest>,
) -> Result<Json<ApiResponse<Stock>>, AppError> {
    let result = state.store.adjust_stock(id, req.delta).await;
    STOCK_ADJUSTMENTS
        .with_label_values(&["api", outcome_label(&result)])
        .inc();

    let stock = result?;
    tracing::info!(item_id = %id, delta = req.delta, quantity = stock.quantity, "Stock adjusted");

    Ok(Json(ApiResponse::success("Stock adjusted", stock)))
}
