use crate::{
    cart::{CartAction, CartState},
    catalog::{ColorOption, SizeOption},
    errors::ServiceError,
    handlers::common::{success_response, validate_input},
    services::orders::CheckoutLine,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::{get, post, put},
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/totals", post(price_cart))
        .route("/items", post(add_cart_item))
        .route(
            "/items/:product_id",
            put(update_cart_item).delete(remove_cart_item),
        )
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceCartRequest {
    #[validate]
    pub lines: Vec<CheckoutLine>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateQuantityRequest {
    /// Any value is accepted, including zero and negatives
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: i32,
    pub name: String,
    pub sku: String,
    pub image: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    pub selected_color: ColorOption,
    pub selected_size: SizeOption,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub line_total: Decimal,
}

/// Cart as the storefront renders it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub item_count: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total: Decimal,
}

impl From<&CartState> for CartView {
    fn from(state: &CartState) -> Self {
        Self {
            items: state
                .items
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product_id,
                    name: item.product.name.clone(),
                    sku: item.product.sku.clone(),
                    image: item.product.image.clone(),
                    price: item.product.price,
                    selected_color: item.selected_color.clone(),
                    selected_size: item.selected_size.clone(),
                    quantity: item.quantity,
                    line_total: item.product.price.saturating_mul(Decimal::from(item.quantity)),
                })
                .collect(),
            item_count: state.item_count(),
            subtotal: state.subtotal,
            tax: state.tax,
            shipping: state.shipping,
            total: state.total,
        }
    }
}

/// Price cart lines against current catalog prices
#[utoipa::path(
    post,
    path = "/api/cart/totals",
    request_body = PriceCartRequest,
    responses(
        (status = 200, description = "Priced cart", body = CartView),
        (status = 400, description = "Unknown color or size", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn price_cart(
    State(state): State<AppState>,
    Json(payload): Json<PriceCartRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let cart = state.services.orders.price_lines(&payload.lines).await?;
    Ok(success_response(CartView::from(&cart)))
}

/// Current server-side cart session
#[utoipa::path(
    get,
    path = "/api/cart",
    responses((status = 200, description = "Cart", body = CartView)),
    tag = "Cart"
)]
pub async fn get_cart(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let session = state.cart.lock().await;
    Ok(success_response(CartView::from(session.state())))
}

/// Add one line, merging with an identical variant already in the cart
#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = CheckoutLine,
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 400, description = "Unknown color or size", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown product", body = crate::errors::ErrorResponse)
    ),
    tag = "Cart"
)]
pub async fn add_cart_item(
    State(state): State<AppState>,
    Json(line): Json<CheckoutLine>,
) -> Result<Response, ServiceError> {
    validate_input(&line)?;
    let priced = state
        .services
        .orders
        .price_lines(std::slice::from_ref(&line))
        .await?;
    let item = priced.items.into_iter().next().ok_or_else(|| {
        ServiceError::InternalError("priced cart line went missing".to_string())
    })?;

    let mut session = state.cart.lock().await;
    let cart = session.dispatch(CartAction::AddItem {
        product: item.product,
        quantity: item.quantity,
        color: item.selected_color,
        size: item.selected_size,
    });
    debug!(product_id = line.product_id, "cart line added");
    Ok(success_response(CartView::from(cart)))
}

#[utoipa::path(
    put,
    path = "/api/cart/items/{product_id}",
    params(("product_id" = i32, Path, description = "Product id")),
    request_body = UpdateQuantityRequest,
    responses((status = 200, description = "Updated cart", body = CartView)),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<Response, ServiceError> {
    let mut session = state.cart.lock().await;
    let cart = session.update_quantity(product_id, payload.quantity);
    Ok(success_response(CartView::from(cart)))
}

/// Remove every line of the product
#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    params(("product_id" = i32, Path, description = "Product id")),
    responses((status = 200, description = "Updated cart", body = CartView)),
    tag = "Cart"
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Response, ServiceError> {
    let mut session = state.cart.lock().await;
    let cart = session.remove_item(product_id);
    Ok(success_response(CartView::from(cart)))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses((status = 200, description = "Empty cart", body = CartView)),
    tag = "Cart"
)]
pub async fn clear_cart(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let mut session = state.cart.lock().await;
    let cart = session.clear();
    Ok(success_response(CartView::from(cart)))
}
