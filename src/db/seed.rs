//! Sample catalog for fresh development databases.

use crate::{
    db::TrackedTransaction,
    entities::{category, product},
    errors::ServiceError,
    services::products::{insert_product_graph, ColorInput, ProductInput, SizeInput},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set,
};
use tracing::{info, instrument};

const CATEGORIES: [(&str, &str, &str, &str); 5] = [
    (
        "Living Room",
        "living-room",
        "Comfortable and stylish furniture for your living space.",
        "/assets/category-living-room.jpg",
    ),
    (
        "Bedroom",
        "bedroom",
        "Create your perfect sleep sanctuary with our bedroom collection.",
        "/assets/category-bedroom.jpg",
    ),
    (
        "Dining Room",
        "dining-room",
        "Elegant tables and chairs for memorable dining experiences.",
        "/assets/category-dining.jpg",
    ),
    (
        "Office",
        "office",
        "Functional and ergonomic furniture for productive workspaces.",
        "/assets/category-office.jpg",
    ),
    (
        "Outdoor",
        "outdoor",
        "Weather-resistant furniture for your garden, patio or balcony.",
        "/assets/category-outdoor.jpg",
    ),
];

fn color(name: &str, value: &str) -> ColorInput {
    ColorInput {
        id: None,
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn size(name: &str, dimensions: &str) -> SizeInput {
    SizeInput {
        id: None,
        name: name.to_string(),
        dimensions: dimensions.to_string(),
    }
}

struct SampleProduct {
    input: ProductInput,
    category_slug: &'static str,
    rating: Decimal,
    review_count: i32,
}

fn sample_products() -> Vec<SampleProduct> {
    vec![
        SampleProduct {
            input: ProductInput {
                name: "Modern Sofa".into(),
                sku: "SOF-001".into(),
                price: Decimal::new(99999, 2),
                stock: 10,
                description: Some("Comfortable modern sofa".into()),
                category_id: None,
                featured: true,
                bestseller: true,
                images: vec!["/assets/sofa-1.jpg".into(), "/assets/sofa-1-alt.jpg".into()],
                available_colors: vec![
                    color("Natural Oak", "#D4BF9A"),
                    color("Walnut", "#5C4033"),
                    color("Navy Blue", "#1A2B50"),
                ],
                available_sizes: vec![
                    size("Medium", "120 x 80 x 45 cm"),
                    size("Large", "180 x 100 x 50 cm"),
                    size("XL", "200 x 120 x 60 cm"),
                ],
            },
            category_slug: "living-room",
            rating: Decimal::new(45, 1),
            review_count: 12,
        },
        SampleProduct {
            input: ProductInput {
                name: "Dining Table".into(),
                sku: "TBL-001".into(),
                price: Decimal::new(59999, 2),
                stock: 5,
                description: Some("Elegant dining table".into()),
                category_id: None,
                featured: true,
                bestseller: false,
                images: vec!["/assets/table-1.jpg".into()],
                available_colors: vec![color("Natural Oak", "#D4BF9A"), color("Walnut", "#5C4033")],
                available_sizes: vec![
                    size("Medium", "120 x 80 x 45 cm"),
                    size("Large", "180 x 100 x 50 cm"),
                ],
            },
            category_slug: "dining-room",
            rating: Decimal::new(40, 1),
            review_count: 8,
        },
    ]
}

/// Inserts the sample categories and products when no product exists yet.
/// Returns whether anything was written.
#[instrument(skip(db))]
pub async fn seed_sample_catalog(db: &DatabaseConnection) -> Result<bool, ServiceError> {
    if product::Entity::find().count(db).await? > 0 {
        info!("Products already present, skipping sample catalog");
        return Ok(false);
    }

    let txn = TrackedTransaction::begin(db, "seed_sample_catalog").await?;
    let result = insert_samples(txn.conn()).await;
    let inserted = txn.finish(result).await?;

    info!(products = inserted, "Sample catalog added");
    Ok(true)
}

async fn category_id_for<C>(conn: &C, slug: &str) -> Result<i32, ServiceError>
where
    C: ConnectionTrait,
{
    if let Some(existing) = category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(conn)
        .await?
    {
        return Ok(existing.id);
    }
    Err(ServiceError::not_found("Category", slug))
}

async fn insert_samples<C>(conn: &C) -> Result<usize, ServiceError>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    for (name, slug, description, image) in CATEGORIES {
        let exists = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(conn)
            .await?
            .is_some();
        if exists {
            continue;
        }
        category::ActiveModel {
            name: Set(name.to_string()),
            slug: Set(slug.to_string()),
            description: Set(Some(description.to_string())),
            image: Set(Some(image.to_string())),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    let samples = sample_products();
    let count = samples.len();
    for sample in samples {
        let mut input = sample.input;
        input.category_id = Some(category_id_for(conn, sample.category_slug).await?);
        let product_id = insert_product_graph(conn, &input).await?;

        product::ActiveModel {
            id: Set(product_id),
            rating: Set(sample.rating),
            review_count: Set(sample.review_count),
            ..Default::default()
        }
        .update(conn)
        .await?;
    }
    Ok(count)
}
