//! Cart engine.
//!
//! A cart is a list of line items plus totals that are always derived from
//! those items. Every transition goes through [`reduce`]; [`CartSession`]
//! owns one cart, applies transitions and persists the result.

pub mod pricing;
pub mod storage;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::catalog::{ColorOption, ProductView, SizeOption};

pub use pricing::{CartPricing, CartTotals};
pub use storage::{
    CartStorage, CartStorageError, JsonFileCartStorage, MemoryCartStorage, CART_STORAGE_KEY,
};

/// Product fields a cart line needs to price and display itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub sku: String,
    #[schema(value_type = String, example = "1299.99")]
    pub price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<&ProductView> for CartProduct {
    fn from(product: &ProductView) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            sku: product.sku.clone(),
            price: product.price,
            image: product.images.first().cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: i32,
    pub product: CartProduct,
    pub selected_color: ColorOption,
    pub selected_size: SizeOption,
    pub quantity: i32,
}

impl CartItem {
    fn same_variant(&self, product_id: i32, color: &ColorOption, size: &SizeOption) -> bool {
        self.product_id == product_id
            && self.selected_color.id == color.id
            && self.selected_size.id == size.id
    }
}

/// Line items plus their derived totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    pub items: Vec<CartItem>,
    #[serde(default)]
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[serde(default)]
    #[schema(value_type = String)]
    pub tax: Decimal,
    #[serde(default)]
    #[schema(value_type = String)]
    pub shipping: Decimal,
    #[serde(default)]
    #[schema(value_type = String)]
    pub total: Decimal,
}

impl CartState {
    /// The only constructor that sets totals.
    pub fn from_items(items: Vec<CartItem>, pricing: &CartPricing) -> Self {
        let totals = pricing.totals(items.iter().map(|i| (i.product.price, i.quantity)));
        Self {
            items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping: totals.shipping,
            total: totals.total,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities across all lines
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i64::from(i.quantity)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CartAction {
    /// Merge into the line with the same product, color and size, or append.
    /// A merged quantity saturates at `i32::MAX`.
    #[serde(rename_all = "camelCase")]
    AddItem {
        product: CartProduct,
        quantity: i32,
        color: ColorOption,
        size: SizeOption,
    },
    /// Drop every line of the product, whatever its variant.
    #[serde(rename_all = "camelCase")]
    RemoveItem { product_id: i32 },
    /// Set the quantity of the first line of the product. Any value is accepted.
    #[serde(rename_all = "camelCase")]
    UpdateQuantity { product_id: i32, quantity: i32 },
    Clear,
}

/// Applies `action` with the default pricing.
pub fn reduce(state: &CartState, action: CartAction) -> CartState {
    reduce_with(&CartPricing::default(), state, action)
}

pub fn reduce_with(pricing: &CartPricing, state: &CartState, action: CartAction) -> CartState {
    let mut items = state.items.clone();

    match action {
        CartAction::AddItem {
            product,
            quantity,
            color,
            size,
        } => match items
            .iter_mut()
            .find(|item| item.same_variant(product.id, &color, &size))
        {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => items.push(CartItem {
                product_id: product.id,
                product,
                selected_color: color,
                selected_size: size,
                quantity,
            }),
        },
        CartAction::RemoveItem { product_id } => {
            items.retain(|item| item.product_id != product_id);
        }
        CartAction::UpdateQuantity {
            product_id,
            quantity,
        } => {
            if let Some(item) = items.iter_mut().find(|item| item.product_id == product_id) {
                item.quantity = quantity;
            }
        }
        CartAction::Clear => items.clear(),
    }

    CartState::from_items(items, pricing)
}

/// One shopping session: current state, its pricing and where it is saved.
pub struct CartSession {
    state: CartState,
    pricing: CartPricing,
    storage: Box<dyn CartStorage>,
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSession")
            .field("state", &self.state)
            .field("pricing", &self.pricing)
            .finish_non_exhaustive()
    }
}

impl CartSession {
    /// Rehydrates from `storage`. Missing or unreadable data yields an empty
    /// cart; persisted totals are ignored and recomputed from the items.
    pub fn restore(storage: Box<dyn CartStorage>) -> Self {
        Self::restore_with(storage, CartPricing::default())
    }

    pub fn restore_with(storage: Box<dyn CartStorage>, pricing: CartPricing) -> Self {
        let items = match storage.load() {
            Ok(Some(saved)) => saved.items,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable persisted cart");
                Vec::new()
            }
        };

        Self {
            state: CartState::from_items(items, &pricing),
            pricing,
            storage,
        }
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    /// Applies one transition and persists the new state. A failed save is
    /// logged; the in-memory transition stands.
    pub fn dispatch(&mut self, action: CartAction) -> &CartState {
        self.state = reduce_with(&self.pricing, &self.state, action);
        debug!(
            lines = self.state.items.len(),
            total = %self.state.total,
            "cart updated"
        );
        if let Err(e) = self.storage.save(&self.state) {
            warn!(error = %e, "failed to persist cart");
        }
        &self.state
    }

    pub fn add_item(
        &mut self,
        product: CartProduct,
        quantity: i32,
        color: ColorOption,
        size: SizeOption,
    ) -> &CartState {
        self.dispatch(CartAction::AddItem {
            product,
            quantity,
            color,
            size,
        })
    }

    pub fn remove_item(&mut self, product_id: i32) -> &CartState {
        self.dispatch(CartAction::RemoveItem { product_id })
    }

    pub fn update_quantity(&mut self, product_id: i32, quantity: i32) -> &CartState {
        self.dispatch(CartAction::UpdateQuantity {
            product_id,
            quantity,
        })
    }

    pub fn clear(&mut self) -> &CartState {
        self.dispatch(CartAction::Clear)
    }
}
