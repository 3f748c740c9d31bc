//! FurnishFlow API Library
//!
//! Catalog, cart pricing engine, checkout and moderation backend for the
//! FurnishFlow furniture storefront.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{http::HeaderValue, routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::cart::{CartSession, JsonFileCartStorage};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    /// Back-office cart session shared by the `/api/cart` endpoints
    pub cart: Arc<Mutex<CartSession>>,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig, cart: CartSession) -> Self {
        Self {
            services: handlers::AppServices::new(db.clone()),
            db,
            config,
            cart: Arc::new(Mutex::new(cart)),
        }
    }

    /// State whose cart session is restored from `config.cart_storage_path`.
    pub fn with_file_cart(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let storage = JsonFileCartStorage::new(&config.cart_storage_path);
        let cart = CartSession::restore(Box::new(storage));
        Self::new(db, config, cart)
    }
}

/// Every `/api` route, still waiting for its state
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/products", handlers::products::products_routes())
        .nest("/categories", handlers::categories::categories_routes())
        .nest("/cart", handlers::cart::cart_routes())
        .nest("/orders", handlers::orders::orders_routes())
        .nest("/reviews", handlers::reviews::reviews_routes())
}

fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if origins.is_empty() {
        ::tracing::info!("No CORS origins configured; allowing any origin");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Full application router: API, health, Swagger UI and the HTTP layers.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::<AppState>::new()
        .route("/", get(|| async { "furnishflow-api up" }))
        .nest("/api", api_routes())
        .nest("/health", handlers::health::health_routes())
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
