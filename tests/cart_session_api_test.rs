mod common;

use axum::http::StatusCode;
use common::{product_payload, TestApp};
use furnishflow_api::cart::{CartStorage, JsonFileCartStorage};
use serde_json::json;

#[tokio::test]
async fn session_endpoints_drive_the_reducer_and_persist() {
    let app = TestApp::new().await;
    let stool = app.create_product(product_payload("Bar Stool", "STL-9", 89.5)).await;
    let lamp = app.create_product(product_payload("Lamp", "LMP-9", 20.0)).await;

    let (status, cart) = app.get("/api/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["total"], 0.0);

    app.post("/api/cart/items", json!({ "productId": stool, "quantity": 1 }))
        .await;
    let (status, cart) = app
        .post("/api/cart/items", json!({ "productId": stool, "quantity": 2 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["items"][0]["lineTotal"], 268.5);

    app.post("/api/cart/items", json!({ "productId": lamp, "quantity": 1 }))
        .await;
    let (_, cart) = app
        .put(&format!("/api/cart/items/{lamp}"), json!({ "quantity": 4 }))
        .await;
    assert_eq!(cart["items"][1]["quantity"], 4);
    assert_eq!(cart["subtotal"], 348.5);

    let saved = JsonFileCartStorage::new(app.dir().join("cart.json"))
        .load()
        .unwrap()
        .unwrap();
    assert_eq!(saved.items.len(), 2);

    let (_, cart) = app.delete(&format!("/api/cart/items/{stool}")).await;
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);

    let (status, cart) = app.delete("/api/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["shipping"], 0.0);
}

#[tokio::test]
async fn adding_unknown_product_is_not_found() {
    let app = TestApp::new().await;
    let (status, _) = app
        .post("/api/cart/items", json!({ "productId": 31337, "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, cart) = app.get("/api/cart").await;
    assert_eq!(cart["items"], json!([]));
}

#[tokio::test]
async fn health_endpoints_report_the_database() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"]["status"], "up");

    let (status, body) = app.get("/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");

    let (status, _) = app.get("/health/live").await;
    assert_eq!(status, StatusCode::OK);
}
