use crate::{
    cart::{reduce, CartAction, CartProduct, CartState},
    catalog::{ColorOption, ProductView, SizeOption, CUSTOM_SIZE_ID, CUSTOM_SIZE_NAME},
    db::TrackedTransaction,
    entities::{
        order::{self, OrderStatus, ShippingMethod},
        order_item, product,
    },
    errors::ServiceError,
    services::products::load_views,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

const DEFAULT_SOURCE: &str = "Online Store";

/// One cart line as the checkout form submits it
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub product_id: i32,
    #[serde(default)]
    pub color_id: Option<i32>,
    /// A size the product offers, or the custom-size sentinel id
    #[serde(default)]
    pub size_id: Option<i32>,
    #[validate(range(min = 1, max = 10000, message = "Quantity must be between 1 and 10000"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 1, max = 1000))]
    pub shipping_address: String,
    #[serde(default = "default_shipping_method")]
    pub shipping_method: ShippingMethod,
    #[validate(length(min = 1, max = 50))]
    pub payment_method: String,
    #[serde(default)]
    pub source: Option<String>,
    #[validate(length(min = 1, message = "An order needs at least one line"))]
    #[validate]
    pub lines: Vec<CheckoutLine>,
}

fn default_shipping_method() -> ShippingMethod {
    ShippingMethod::Standard
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub product_name: String,
    pub color_name: Option<String>,
    pub size_name: Option<String>,
    pub quantity: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub unit_price: Decimal,
}

impl From<order_item::Model> for OrderItemView {
    fn from(model: order_item::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            product_name: model.product_name,
            color_name: model.color_name,
            size_name: model.size_name,
            quantity: model.quantity,
            unit_price: model.unit_price.round_dp(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: i32,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: String,
    pub shipping_method: ShippingMethod,
    pub payment_method: String,
    pub status: OrderStatus,
    pub source: String,
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
    /// Total rounded to cents, as the admin order list shows it
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub item_count: i32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<OrderItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderView {
    fn new(model: order::Model, items: Vec<order_item::Model>) -> Self {
        Self {
            id: model.id,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            shipping_address: model.shipping_address,
            shipping_method: model.shipping_method,
            payment_method: model.payment_method,
            status: model.status,
            source: model.source,
            subtotal: model.subtotal,
            tax: model.tax,
            shipping: model.shipping,
            total: model.total,
            amount: model.total.round_dp(2),
            item_count: model.item_count,
            items: items.into_iter().map(Into::into).collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Prices the lines against current catalog prices without persisting anything.
    #[instrument(skip(self, lines))]
    pub async fn price_lines(&self, lines: &[CheckoutLine]) -> Result<CartState, ServiceError> {
        build_cart(&*self.db, lines).await
    }

    /// Turns submitted cart lines into an order. Prices come from the
    /// catalog, totals from the cart engine; stock is left untouched.
    #[instrument(skip(self, input), fields(lines = input.lines.len()))]
    pub async fn checkout(&self, input: CheckoutInput) -> Result<OrderView, ServiceError> {
        let txn = TrackedTransaction::begin(&self.db, "checkout").await?;
        let result = insert_order(txn.conn(), input).await;
        let order = txn.finish(result).await?;

        info!(order_id = order.id, total = %order.total, "Order placed");
        Ok(order)
    }

    /// Newest first, optionally restricted to one status
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderView>, ServiceError> {
        let mut query = order::Entity::find()
            .order_by_desc(order::Column::CreatedAt)
            .order_by_desc(order::Column::Id);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }

        let orders = query.all(&*self.db).await?;
        Ok(orders
            .into_iter()
            .map(|o| OrderView::new(o, Vec::new()))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderView, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;
        let items = order_item::Entity::find()
            .filter(order_item::Column::OrderId.eq(order_id))
            .order_by_asc(order_item::Column::Id)
            .all(&*self.db)
            .await?;
        Ok(OrderView::new(order, items))
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: i32,
        next: OrderStatus,
    ) -> Result<OrderView, ServiceError> {
        let order = order::Entity::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order", order_id))?;

        let current = order.status;
        if current.is_terminal() {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} is {:?} and can no longer change",
                order_id, current
            )));
        }
        if !current.can_transition_to(next) {
            return Err(ServiceError::InvalidOperation(format!(
                "Order {} cannot move from {:?} to {:?}",
                order_id, current, next
            )));
        }

        let mut active: order::ActiveModel = order.into();
        active.status = Set(next);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        info!(order_id, from = ?current, to = ?next, "Order status changed");
        self.get_order(order_id).await
    }
}

fn no_color() -> ColorOption {
    ColorOption {
        id: 0,
        name: String::new(),
        value: String::new(),
    }
}

fn no_size() -> SizeOption {
    SizeOption {
        id: 0,
        name: String::new(),
        dimensions: String::new(),
    }
}

fn custom_size() -> SizeOption {
    SizeOption {
        id: CUSTOM_SIZE_ID,
        name: CUSTOM_SIZE_NAME.to_string(),
        dimensions: "Custom dimensions".to_string(),
    }
}

fn resolve_color(product: &ProductView, color_id: Option<i32>) -> Result<ColorOption, ServiceError> {
    match color_id {
        None => Ok(no_color()),
        Some(id) => product
            .available_colors
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Color {} is not offered for product {}",
                    id, product.id
                ))
            }),
    }
}

fn resolve_size(product: &ProductView, size_id: Option<i32>) -> Result<SizeOption, ServiceError> {
    match size_id {
        None => Ok(no_size()),
        Some(CUSTOM_SIZE_ID) => Ok(custom_size()),
        Some(id) => product
            .available_sizes
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Size {} is not offered for product {}",
                    id, product.id
                ))
            }),
    }
}

/// Runs each line through the cart reducer with catalog prices.
pub(crate) async fn build_cart<C>(conn: &C, lines: &[CheckoutLine]) -> Result<CartState, ServiceError>
where
    C: ConnectionTrait,
{
    let mut ids: Vec<i32> = lines.iter().map(|l| l.product_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let models = product::Entity::find()
        .filter(product::Column::Id.is_in(ids))
        .all(conn)
        .await?;
    let products: HashMap<i32, ProductView> = load_views(conn, models)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut state = CartState::default();
    for line in lines {
        if line.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| ServiceError::not_found("Product", line.product_id))?;

        state = reduce(
            &state,
            CartAction::AddItem {
                product: CartProduct::from(product),
                quantity: line.quantity,
                color: resolve_color(product, line.color_id)?,
                size: resolve_size(product, line.size_id)?,
            },
        );
    }
    Ok(state)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

async fn insert_order<C>(conn: &C, input: CheckoutInput) -> Result<OrderView, ServiceError>
where
    C: ConnectionTrait,
{
    let cart = build_cart(conn, &input.lines).await?;
    let item_count = i32::try_from(cart.item_count())
        .map_err(|_| ServiceError::ValidationError("Order quantity is too large".to_string()))?;

    let now = Utc::now();
    let order = order::ActiveModel {
        customer_name: Set(input.customer_name.trim().to_string()),
        customer_email: Set(input.customer_email.trim().to_string()),
        shipping_address: Set(input.shipping_address.trim().to_string()),
        shipping_method: Set(input.shipping_method),
        payment_method: Set(input.payment_method),
        status: Set(OrderStatus::Pending),
        source: Set(input
            .source
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string())),
        subtotal: Set(cart.subtotal),
        tax: Set(cart.tax),
        shipping: Set(cart.shipping),
        total: Set(cart.total),
        item_count: Set(item_count),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?;

    let mut items = Vec::with_capacity(cart.items.len());
    for line in &cart.items {
        let item = order_item::ActiveModel {
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            product_name: Set(line.product.name.clone()),
            color_name: Set(non_empty(&line.selected_color.name)),
            size_name: Set(non_empty(&line.selected_size.name)),
            quantity: Set(line.quantity),
            unit_price: Set(line.product.price),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        items.push(item);
    }

    Ok(OrderView::new(order, items))
}
