use crate::{
    entities::order::OrderStatus,
    errors::ServiceError,
    handlers::common::{created_response, success_response, validate_input},
    services::orders::{CheckoutInput, OrderView},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Creates the router for order endpoints
pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(checkout))
        .route("/:id", get(get_order))
        .route("/:id/status", put(update_order_status))
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListParams {
    /// Only orders in this status
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListParams),
    responses((status = 200, description = "Orders, newest first", body = [OrderView])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> Result<Response, ServiceError> {
    let orders = state.services.orders.list_orders(params.status).await?;
    Ok(success_response(orders))
}

/// Place an order from cart lines
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CheckoutInput,
    responses(
        (status = 201, description = "Order placed", body = OrderView),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutInput>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let order = state.services.orders.checkout(payload).await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items", body = OrderView),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.get_order(id).await?;
    Ok(success_response(order))
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}/status",
    params(("id" = i32, Path, description = "Order id")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order moved to the new status", body = OrderView),
        (status = 400, description = "Transition not allowed", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Orders"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> Result<Response, ServiceError> {
    let order = state
        .services
        .orders
        .update_status(id, payload.status)
        .await?;
    Ok(success_response(order))
}
