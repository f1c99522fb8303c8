//! HTTP surface of an order service, generic over the order kind.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use service_core::auth::RequestContext;
use service_core::envelope::ApiResponse;
use service_core::error::AppError;
use service_core::extract::{IdPath, QueryParams, ValidatedJson};
use service_core::pagination::Pagination;

use crate::kind::OrderKind;
use crate::models::{CreateOrderBody, OrderResponse, UpdateOrderRequest};
use crate::orchestrator::OrderOrchestrator;

type OrderJson<K> = Json<ApiResponse<OrderResponse<K>>>;

pub async fn create_order<K: OrderKind>(
    State(orders): State<OrderOrchestrator<K>>,
    ctx: RequestContext,
    ValidatedJson(body): ValidatedJson<CreateOrderBody>,
) -> Result<(StatusCode, OrderJson<K>), AppError> {
    let order = orders.create(&ctx, body.into_request::<K>()?).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Order created", order.into())),
    ))
}

pub async fn list_orders<K: OrderKind>(
    State(orders): State<OrderOrchestrator<K>>,
    QueryParams(page): QueryParams<Pagination>,
) -> Result<Json<ApiResponse<Vec<OrderResponse<K>>>>, AppError> {
    let list = orders.list(page.limit(), page.offset()).await?;

    Ok(Json(ApiResponse::success(
        "Orders retrieved",
        list.into_iter().map(OrderResponse::from).collect(),
    )))
}

pub async fn get_order<K: OrderKind>(
    State(orders): State<OrderOrchestrator<K>>,
    IdPath(id): IdPath,
) -> Result<OrderJson<K>, AppError> {
    let order = orders.get(id).await?;
    Ok(Json(ApiResponse::success("Order retrieved", order.into())))
}

pub async fn update_order<K: OrderKind>(
    State(orders): State<OrderOrchestrator<K>>,
    ctx: RequestContext,
    IdPath(id): IdPath,
    ValidatedJson(req): ValidatedJson<UpdateOrderRequest>,
) -> Result<OrderJson<K>, AppError> {
    let order = orders.update(&ctx, id, req.items).await?;
    Ok(Json(ApiResponse::success("Order updated", order.into())))
}

pub async fn advance_order<K: OrderKind>(
    State(orders): State<OrderOrchestrator<K>>,
    IdPath(id): IdPath,
) -> Result<OrderJson<K>, AppError> {
    let order = orders.advance(id).await?;
    let message = format!("Order {}", order.status());
    Ok(Json(ApiResponse::success(message, order.into())))
}

pub async fn pay_order<K: OrderKind>(
    State(orders): State<OrderOrchestrator<K>>,
    IdPath(id): IdPath,
) -> Result<OrderJson<K>, AppError> {
    let order = orders.pay(id).await?;
    Ok(Json(ApiResponse::success("Order paid", order.into())))
}

/// `/orders` routes with the orchestrator already bound as state.
pub fn order_routes<K: OrderKind>(orders: OrderOrchestrator<K>) -> Router {
    Router::new()
        .route("/orders", get(list_orders::<K>).post(create_order::<K>))
        .route("/orders/:id", get(get_order::<K>).put(update_order::<K>))
        .route(
            &format!("/orders/:id/{}", K::ADVANCE_ACTION),
            post(advance_order::<K>),
        )
        .route("/orders/:id/pay", post(pay_order::<K>))
        .with_state(orders)
}
