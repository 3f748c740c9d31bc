#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use furnishflow_api::{
    build_router,
    cart::{CartSession, JsonFileCartStorage},
    config::AppConfig,
    db, AppState,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper harness for spinning up an application backed by a throwaway SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());

        let mut cfg = AppConfig::new(db_url, "127.0.0.1".to_string(), 18_080, "test".to_string());
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.cart_storage_path = dir.path().join("cart.json").display().to_string();

        let pool = db::establish_connection_with_config(&db::DbConfig::from(&cfg))
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let storage = JsonFileCartStorage::new(&cfg.cart_storage_path);
        let state = AppState::new(
            Arc::new(pool),
            cfg,
            CartSession::restore(Box::new(storage)),
        );
        let router = build_router(state.clone());

        Self { router, state, dir }
    }

    pub fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// Send a request and return the status with the decoded JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request");

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    pub async fn create_category(&self, name: &str, slug: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/categories",
                json!({ "name": name, "slug": slug, "description": format!("{} furniture", name) }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "category create failed: {body}");
        body["id"].as_i64().expect("category id")
    }

    /// Creates a product and returns its id.
    pub async fn create_product(&self, payload: Value) -> i64 {
        let (status, body) = self.post("/api/products", payload).await;
        assert_eq!(status, StatusCode::CREATED, "product create failed: {body}");
        body["id"].as_i64().expect("product id")
    }
}

/// Product payload in the shape the admin form submits.
pub fn product_payload(name: &str, sku: &str, price: f64) -> Value {
    json!({
        "name": name,
        "sku": sku,
        "price": price,
        "stock": 10,
        "description": format!("{} for testing", name),
        "featured": false,
        "bestseller": false,
        "images": [],
        "availableColors": [],
        "availableSizes": []
    })
}
