mod common;

use axum::http::StatusCode;
use common::{product_payload, TestApp};
use furnishflow_api::entities::{color, product_color, product_image, product_size, size};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

fn sofa_payload(sku: &str) -> serde_json::Value {
    json!({
        "name": "Test Sofa",
        "sku": sku,
        "price": 1299.99,
        "stock": 3,
        "description": "Three seater",
        "featured": true,
        "bestseller": false,
        "images": ["/img/sofa-front.jpg", "/img/sofa-side.jpg"],
        "availableColors": [{ "name": "Red", "value": "#F00" }],
        "availableSizes": [
            { "name": "Large", "dimensions": "180 x 100 x 50 cm" },
            { "id": 999, "name": "Custom", "dimensions": "Custom dimensions" }
        ]
    })
}

#[tokio::test]
async fn create_fetch_update_round_trip() {
    let app = TestApp::new().await;
    let id = app.create_product(sofa_payload("SOF-T1")).await;

    let (status, body) = app.get(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Test Sofa");
    assert_eq!(body["price"], 1299.99);
    let colors = body["availableColors"].as_array().unwrap();
    assert_eq!(colors.len(), 1);
    assert_eq!(colors[0]["name"], "Red");
    assert_eq!(colors[0]["value"], "#F00");
    assert_eq!(body["availableSizes"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["images"],
        json!(["/img/sofa-front.jpg", "/img/sofa-side.jpg"])
    );

    let mut update = sofa_payload("SOF-T1");
    update["availableColors"] = json!([]);
    let (status, _) = app.put(&format!("/api/products/{id}"), update).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.get(&format!("/api/products/{id}")).await;
    assert_eq!(body["availableColors"], json!([]));
    assert_eq!(body["availableSizes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn same_color_across_products_shares_one_row() {
    let app = TestApp::new().await;
    app.create_product(sofa_payload("SOF-A")).await;
    app.create_product(sofa_payload("SOF-B")).await;

    let db = app.state.db.as_ref();
    let reds = color::Entity::find()
        .filter(color::Column::Name.eq("Red"))
        .filter(color::Column::Value.eq("#F00"))
        .count(db)
        .await
        .unwrap();
    assert_eq!(reds, 1);
    assert_eq!(product_color::Entity::find().count(db).await.unwrap(), 2);
    assert_eq!(size::Entity::find().count(db).await.unwrap(), 1);
}

#[tokio::test]
async fn delete_leaves_no_association_rows() {
    let app = TestApp::new().await;
    let id = app.create_product(sofa_payload("SOF-D")).await;

    let (status, _) = app.delete(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);

    let db = app.state.db.as_ref();
    let id = id as i32;
    assert_eq!(
        product_image::Entity::find()
            .filter(product_image::Column::ProductId.eq(id))
            .count(db)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        product_color::Entity::find()
            .filter(product_color::Column::ProductId.eq(id))
            .count(db)
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        product_size::Entity::find()
            .filter(product_size::Column::ProductId.eq(id))
            .count(db)
            .await
            .unwrap(),
        0
    );

    let (status, _) = app.get(&format!("/api/products/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn writes_to_missing_product_are_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .put("/api/products/4242", product_payload("Ghost", "GHO-1", 10.0))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");

    let (status, _) = app.delete("/api/products/4242").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/api/products/4242").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_sku_conflicts() {
    let app = TestApp::new().await;
    app.create_product(product_payload("Stool", "STL-1", 89.5)).await;

    let (status, body) = app
        .post("/api/products", product_payload("Other Stool", "STL-1", 79.0))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("STL-1"));
}

#[tokio::test]
async fn invalid_payload_is_rejected() {
    let app = TestApp::new().await;
    let (status, _) = app
        .post("/api/products", product_payload("", "EMPTY-1", 10.0))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/products", product_payload("Negative", "NEG-1", -1.0))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_is_newest_first_without_variants() {
    let app = TestApp::new().await;
    let first = app.create_product(sofa_payload("SOF-L1")).await;
    let second = app.create_product(product_payload("Lamp", "LMP-1", 49.0)).await;

    let (status, body) = app.get("/api/products").await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["id"].as_i64(), Some(second));
    assert_eq!(list[1]["id"].as_i64(), Some(first));
    assert_eq!(list[1]["images"], json!([]));
}

#[tokio::test]
async fn search_filters_and_sorts() {
    let app = TestApp::new().await;
    let living = app.create_category("Living Room", "living-room").await;

    let mut sofa = sofa_payload("SOF-S1");
    sofa["categoryId"] = json!(living);
    let sofa_id = app.create_product(sofa).await;

    let mut chair = product_payload("Chair", "CHR-1", 199.0);
    chair["categoryId"] = json!(living);
    let chair_id = app.create_product(chair).await;

    app.create_product(product_payload("Desk", "DSK-1", 450.0)).await;

    let (status, body) = app
        .get(&format!("/api/products/search?categoryId={living}&sort=price-low"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![chair_id, sofa_id]);

    let (_, body) = app
        .get("/api/products/search?minPrice=200&maxPrice=500")
        .await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Desk"]);
}

#[tokio::test]
async fn category_listing_resolves_category_fields() {
    let app = TestApp::new().await;
    let office = app.create_category("Office", "office").await;

    let mut desk = product_payload("Desk", "DSK-2", 450.0);
    desk["categoryId"] = json!(office);
    app.create_product(desk).await;
    app.create_product(product_payload("Loose Lamp", "LMP-2", 35.0)).await;

    let (status, body) = app.get(&format!("/api/products/category/{office}")).await;
    assert_eq!(status, StatusCode::OK);
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["categoryName"], "Office");
    assert_eq!(list[0]["categorySlug"], "office");

    let (status, body) = app.get("/api/products/category/999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
