use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::ProductView;

/// Display ordering for catalog listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    /// Featured products first
    #[default]
    Featured,
    /// Bestsellers first
    Bestseller,
    /// Cheapest first
    PriceLow,
    /// Most expensive first
    PriceHigh,
    /// Highest id first
    Newest,
}

/// Conjunctive filters plus a sort order. Absent fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CatalogQuery {
    pub category_id: Option<i32>,
    /// Keep products offering this color id
    pub color_id: Option<i32>,
    /// Inclusive lower price bound
    #[param(value_type = Option<f64>)]
    #[schema(value_type = Option<f64>)]
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound
    #[param(value_type = Option<f64>)]
    #[schema(value_type = Option<f64>)]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: SortOption,
}

impl CatalogQuery {
    fn matches(&self, product: &ProductView) -> bool {
        if let Some(category_id) = self.category_id {
            if product.category_id != Some(category_id) {
                return false;
            }
        }
        if let Some(color_id) = self.color_id {
            if !product.has_color(color_id) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }
}

/// Produces the display list for `query`. The source is never reordered;
/// every call filters from the full list again.
pub fn apply_query(products: &[ProductView], query: &CatalogQuery) -> Vec<ProductView> {
    let mut filtered: Vec<ProductView> = products
        .iter()
        .filter(|p| query.matches(p))
        .cloned()
        .collect();

    // sort_by is stable, ties keep source order
    match query.sort {
        SortOption::Featured => filtered.sort_by(|a, b| b.featured.cmp(&a.featured)),
        SortOption::Bestseller => filtered.sort_by(|a, b| b.bestseller.cmp(&a.bestseller)),
        SortOption::PriceLow => filtered.sort_by(|a, b| a.price.cmp(&b.price)),
        SortOption::PriceHigh => filtered.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOption::Newest => filtered.sort_by(|a, b| b.id.cmp(&a.id)),
    }

    filtered
}
