mod common;

use axum::http::StatusCode;
use common::TestApp;
use furnishflow_api::cart::{reduce, CartAction, CartProduct, CartState};
use furnishflow_api::catalog::{ColorOption, SizeOption};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;

async fn seed_sofa(app: &TestApp) -> Value {
    let id = app
        .create_product(json!({
            "name": "Modern Sofa",
            "sku": "SOF-001",
            "price": 999.99,
            "stock": 10,
            "images": ["/img/sofa.jpg"],
            "availableColors": [
                { "name": "Natural Oak", "value": "#D4BF9A" },
                { "name": "Walnut", "value": "#5C4033" }
            ],
            "availableSizes": [{ "name": "Medium", "dimensions": "120 x 80 x 45 cm" }]
        }))
        .await;
    let (_, body) = app.get(&format!("/api/products/{id}")).await;
    body
}

async fn seed_stool(app: &TestApp) -> Value {
    let id = app
        .create_product(json!({
            "name": "Bar Stool",
            "sku": "STL-002",
            "price": 89.5,
            "stock": 40
        }))
        .await;
    let (_, body) = app.get(&format!("/api/products/{id}")).await;
    body
}

fn checkout_body(lines: Value) -> Value {
    json!({
        "customerName": "Dana Reyes",
        "customerEmail": "dana@example.com",
        "shippingAddress": "12 Elm Street, Springfield",
        "shippingMethod": "express",
        "paymentMethod": "card",
        "lines": lines
    })
}

fn decimal(value: &Value) -> Decimal {
    Decimal::from_str(&value.to_string()).unwrap()
}

#[tokio::test]
async fn checkout_totals_match_the_cart_engine() {
    let app = TestApp::new().await;
    let sofa = seed_sofa(&app).await;
    let stool = seed_stool(&app).await;

    let sofa_id = sofa["id"].as_i64().unwrap() as i32;
    let stool_id = stool["id"].as_i64().unwrap() as i32;
    let oak = &sofa["availableColors"][0];
    let medium = &sofa["availableSizes"][0];

    let lines = json!([
        { "productId": stool_id, "quantity": 2 },
        { "productId": sofa_id, "colorId": oak["id"], "sizeId": medium["id"], "quantity": 1 },
        { "productId": stool_id, "quantity": 1 }
    ]);
    let (status, order) = app.post("/api/orders", checkout_body(lines)).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");

    // Same lines through the reducer directly
    let stool_product = CartProduct {
        id: stool_id,
        name: "Bar Stool".into(),
        sku: "STL-002".into(),
        price: dec!(89.50),
        image: None,
    };
    let sofa_product = CartProduct {
        id: sofa_id,
        name: "Modern Sofa".into(),
        sku: "SOF-001".into(),
        price: dec!(999.99),
        image: Some("/img/sofa.jpg".into()),
    };
    let none_color = ColorOption { id: 0, name: String::new(), value: String::new() };
    let none_size = SizeOption { id: 0, name: String::new(), dimensions: String::new() };
    let oak_color: ColorOption = serde_json::from_value(oak.clone()).unwrap();
    let medium_size: SizeOption = serde_json::from_value(medium.clone()).unwrap();

    let mut expected = CartState::default();
    for action in [
        CartAction::AddItem {
            product: stool_product.clone(),
            quantity: 2,
            color: none_color.clone(),
            size: none_size.clone(),
        },
        CartAction::AddItem {
            product: sofa_product,
            quantity: 1,
            color: oak_color,
            size: medium_size,
        },
        CartAction::AddItem {
            product: stool_product,
            quantity: 1,
            color: none_color,
            size: none_size,
        },
    ] {
        expected = reduce(&expected, action);
    }

    assert_eq!(decimal(&order["subtotal"]).round_dp(2), expected.subtotal);
    assert_eq!(decimal(&order["shipping"]).round_dp(2), expected.shipping);
    assert_eq!(decimal(&order["total"]).round_dp(2), expected.total.round_dp(2));
    assert_eq!(order["itemCount"], 4);
    assert_eq!(order["status"], "Pending");
    assert_eq!(order["shippingMethod"], "express");
    assert_eq!(order["source"], "Online Store");

    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(items[1]["colorName"], "Natural Oak");
    assert_eq!(items[1]["sizeName"], "Medium");

    // Stock is left alone
    let (_, stool_after) = app.get(&format!("/api/products/{stool_id}")).await;
    assert_eq!(stool_after["stock"], 40);
}

#[tokio::test]
async fn cart_totals_endpoint_prices_lines() {
    let app = TestApp::new().await;
    let stool = seed_stool(&app).await;

    let (status, cart) = app
        .post(
            "/api/cart/totals",
            json!({ "lines": [{ "productId": stool["id"], "quantity": 2 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["subtotal"], 179.0);
    assert_eq!(cart["shipping"], 49.99);
    assert_eq!(cart["itemCount"], 2);
}

#[tokio::test]
async fn checkout_rejects_bad_lines() {
    let app = TestApp::new().await;
    let sofa = seed_sofa(&app).await;

    let (status, _) = app
        .post(
            "/api/orders",
            checkout_body(json!([{ "productId": 9999, "quantity": 1 }])),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .post(
            "/api/orders",
            checkout_body(json!([{ "productId": sofa["id"], "quantity": 0 }])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/orders",
            checkout_body(json!([{ "productId": sofa["id"], "colorId": 4242, "quantity": 1 }])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post("/api/orders", checkout_body(json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, orders) = app.get("/api/orders").await;
    assert_eq!(orders, json!([]));
}

#[tokio::test]
async fn duplicate_lines_merge_into_one_order_item() {
    let app = TestApp::new().await;
    let sofa = seed_sofa(&app).await;
    let oak = &sofa["availableColors"][0]["id"];
    let medium = &sofa["availableSizes"][0]["id"];

    let line = |quantity: i32| {
        json!({ "productId": sofa["id"], "colorId": oak, "sizeId": medium, "quantity": quantity })
    };
    let (status, order) = app
        .post("/api/orders", checkout_body(json!([line(2), line(3)])))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{order}");

    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    assert_eq!(order["itemCount"], 5);
    assert_eq!(decimal(&order["subtotal"]).round_dp(2), dec!(4999.95));
}

#[tokio::test]
async fn oversized_quantities_are_rejected_before_pricing() {
    let app = TestApp::new().await;
    let stool = seed_stool(&app).await;

    let line = json!({ "productId": stool["id"], "quantity": 1_500_000_000 });
    let (status, _) = app
        .post("/api/orders", checkout_body(json!([line.clone(), line.clone()])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/cart/totals", json!({ "lines": [line] }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, orders) = app.get("/api/orders").await;
    assert_eq!(orders, json!([]));
}

#[tokio::test]
async fn custom_size_is_accepted_at_checkout() {
    let app = TestApp::new().await;
    let sofa = seed_sofa(&app).await;

    let (status, order) = app
        .post(
            "/api/orders",
            checkout_body(json!([{ "productId": sofa["id"], "sizeId": 999, "quantity": 1 }])),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["items"][0]["sizeName"], "Custom");
}

#[tokio::test]
async fn order_status_follows_the_lifecycle() {
    let app = TestApp::new().await;
    let stool = seed_stool(&app).await;
    let (_, order) = app
        .post(
            "/api/orders",
            checkout_body(json!([{ "productId": stool["id"], "quantity": 1 }])),
        )
        .await;
    let id = order["id"].as_i64().unwrap();
    let status_uri = format!("/api/orders/{id}/status");

    let (status, _) = app.put(&status_uri, json!({ "status": "Shipped" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for next in ["Processing", "Shipped", "Completed"] {
        let (status, body) = app.put(&status_uri, json!({ "status": next })).await;
        assert_eq!(status, StatusCode::OK, "{next}: {body}");
        assert_eq!(body["status"], next);
    }

    let (status, _) = app.put(&status_uri, json!({ "status": "Cancelled" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, completed) = app.get("/api/orders?status=Completed").await;
    assert_eq!(completed.as_array().unwrap().len(), 1);
    let (_, pending) = app.get("/api/orders?status=Pending").await;
    assert_eq!(pending, json!([]));

    let (status, _) = app.get("/api/orders/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn moderation_recomputes_product_rating() {
    let app = TestApp::new().await;
    let sofa = seed_sofa(&app).await;
    let product_id = sofa["id"].as_i64().unwrap();

    let mut review_ids = Vec::new();
    for (name, rating, comment) in [
        ("Ana", 5, "Lovely fabric"),
        ("Ben", 4, "Sturdy frame"),
        ("Cy", 1, "Arrived scratched"),
    ] {
        let (status, body) = app
            .post(
                "/api/reviews",
                json!({
                    "productId": product_id,
                    "customerName": name,
                    "rating": rating,
                    "comment": comment
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "Pending");
        review_ids.push(body["id"].as_i64().unwrap());
    }

    let (_, published) = app.get(&format!("/api/reviews/product/{product_id}")).await;
    assert_eq!(published, json!([]));

    for id in &review_ids[..2] {
        let (status, _) = app
            .put(&format!("/api/reviews/{id}/status"), json!({ "status": "Published" }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, product) = app.get(&format!("/api/products/{product_id}")).await;
    assert_eq!(product["rating"], 4.5);
    assert_eq!(product["reviewCount"], 2);

    let (status, _) = app.delete(&format!("/api/reviews/{}", review_ids[0])).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, product) = app.get(&format!("/api/products/{product_id}")).await;
    assert_eq!(product["rating"], 4.0);
    assert_eq!(product["reviewCount"], 1);

    let (_, found) = app.get("/api/reviews?search=SCRATCHED").await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["productName"], "Modern Sofa");

    let (_, pending) = app.get("/api/reviews?status=Pending").await;
    assert_eq!(pending.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn review_validation() {
    let app = TestApp::new().await;
    let sofa = seed_sofa(&app).await;

    let (status, _) = app
        .post(
            "/api/reviews",
            json!({ "productId": sofa["id"], "customerName": "Eve", "rating": 6, "comment": "Too good" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/reviews",
            json!({ "productId": 9999, "customerName": "Eve", "rating": 3, "comment": "Where?" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/reviews/product/9999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
