//! Read-side catalog shapes shared by the product endpoints, the cart engine
//! and the in-memory catalog query.

pub mod query;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{color, size};

pub use query::{apply_query, CatalogQuery, SortOption};

/// Sentinel size name picked by customers who want bespoke dimensions.
pub const CUSTOM_SIZE_NAME: &str = "Custom";
/// Size id a storefront sends for the custom size; never stored.
pub const CUSTOM_SIZE_ID: i32 = 999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColorOption {
    pub id: i32,
    pub name: String,
    /// Hex color value
    #[schema(example = "#D4BF9A")]
    pub value: String,
}

impl From<color::Model> for ColorOption {
    fn from(model: color::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            value: model.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SizeOption {
    pub id: i32,
    pub name: String,
    #[schema(example = "180 x 90 x 85 cm")]
    pub dimensions: String,
}

impl From<size::Model> for SizeOption {
    fn from(model: size::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            dimensions: model.dimensions,
        }
    }
}

/// Product as the storefront renders it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 1299.99)]
    pub price: Decimal,
    pub sku: String,
    pub stock: i32,
    pub category_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category_slug: Option<String>,
    pub featured: bool,
    pub bestseller: bool,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 4.5)]
    pub rating: Decimal,
    pub review_count: i32,
    pub images: Vec<String>,
    pub available_colors: Vec<ColorOption>,
    pub available_sizes: Vec<SizeOption>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductView {
    pub fn has_color(&self, color_id: i32) -> bool {
        self.available_colors.iter().any(|c| c.id == color_id)
    }
}
