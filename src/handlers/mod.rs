pub mod cart;
pub mod categories;
pub mod common;
pub mod health;
pub mod orders;
pub mod products;
pub mod reviews;

use crate::services::{
    categories::CategoryService, orders::OrderService, products::ProductService,
    reviews::ReviewService,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub products: Arc<ProductService>,
    pub categories: Arc<CategoryService>,
    pub orders: Arc<OrderService>,
    pub reviews: Arc<ReviewService>,
}

impl AppServices {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            products: Arc::new(ProductService::new(db.clone())),
            categories: Arc::new(CategoryService::new(db.clone())),
            orders: Arc::new(OrderService::new(db.clone())),
            reviews: Arc::new(ReviewService::new(db)),
        }
    }
}
