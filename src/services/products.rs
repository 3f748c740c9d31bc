use crate::{
    catalog::{apply_query, CatalogQuery, ColorOption, ProductView, SizeOption, CUSTOM_SIZE_NAME},
    db::TrackedTransaction,
    entities::{category, color, product, product_color, product_image, product_size, review, size},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Highest unit price the catalog accepts
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 2);

fn validate_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("decimal_min_zero"));
    }
    if *value > MAX_PRICE {
        return Err(ValidationError::new("price_too_high"));
    }
    Ok(())
}

/// Color as submitted from the product form; any id is ignored and the
/// row is resolved by `(name, value)`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColorInput {
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 32))]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SizeInput {
    #[serde(default)]
    pub id: Option<i32>,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub dimensions: String,
}

impl SizeInput {
    /// The storefront's custom-dimensions entry, which is never stored.
    pub fn is_custom(&self) -> bool {
        self.name.eq_ignore_ascii_case(CUSTOM_SIZE_NAME)
    }
}

/// Full product payload, used for both create and update
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[validate(length(min = 1, max = 255, message = "Product name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "SKU must be between 1 and 100 characters"))]
    pub sku: String,
    #[validate(custom = "validate_price")]
    #[schema(value_type = f64, example = 1299.99)]
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub bestseller: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    #[validate]
    pub available_colors: Vec<ColorInput>,
    #[serde(default)]
    #[validate]
    pub available_sizes: Vec<SizeInput>,
}

impl ProductInput {
    /// Trims text fields and drops blank image URLs.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.sku = self.sku.trim().to_string();
        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self.images = self
            .images
            .into_iter()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect();
        for color in &mut self.available_colors {
            color.name = color.name.trim().to_string();
            color.value = color.value.trim().to_string();
        }
        for size in &mut self.available_sizes {
            size.name = size.name.trim().to_string();
            size.dimensions = size.dimensions.trim().to_string();
        }
        self
    }
}

/// Product catalog service: reads and the transactional upsert paths
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Product rows newest first, without images or variants
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductView>, ServiceError> {
        let products = product::Entity::find()
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(products.into_iter().map(summary_view).collect())
    }

    /// Fully assembled views of every product, in id order
    #[instrument(skip(self))]
    pub async fn catalog(&self) -> Result<Vec<ProductView>, ServiceError> {
        let products = product::Entity::find()
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?;
        load_views(&*self.db, products).await
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &CatalogQuery) -> Result<Vec<ProductView>, ServiceError> {
        let catalog = self.catalog().await?;
        Ok(apply_query(&catalog, query))
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, product_id: i32) -> Result<ProductView, ServiceError> {
        let product = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        load_views(&*self.db, vec![product])
            .await?
            .pop()
            .ok_or_else(|| ServiceError::not_found("Product", product_id))
    }

    /// Products of one category, with category name and slug resolved
    #[instrument(skip(self))]
    pub async fn list_by_category(&self, category_id: i32) -> Result<Vec<ProductView>, ServiceError> {
        let products = product::Entity::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .order_by_asc(product::Column::Id)
            .all(&*self.db)
            .await?;
        load_views(&*self.db, products).await
    }

    /// Inserts the product with its images, colors and sizes in one transaction.
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(&self, input: ProductInput) -> Result<i32, ServiceError> {
        let input = input.normalized();
        let txn = TrackedTransaction::begin(&self.db, "create_product").await?;
        let result = insert_product_graph(txn.conn(), &input).await;
        let product_id = txn.finish(result).await?;

        info!(product_id, "Created product");
        Ok(product_id)
    }

    /// Replaces the product row and all of its images, colors and sizes.
    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn update_product(
        &self,
        product_id: i32,
        input: ProductInput,
    ) -> Result<(), ServiceError> {
        let input = input.normalized();
        let txn = TrackedTransaction::begin(&self.db, "update_product").await?;
        let result = replace_product_graph(txn.conn(), product_id, &input).await;
        txn.finish(result).await?;

        info!(product_id, "Updated product");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: i32) -> Result<(), ServiceError> {
        let txn = TrackedTransaction::begin(&self.db, "delete_product").await?;
        let result = delete_product_graph(txn.conn(), product_id).await;
        txn.finish(result).await?;

        info!(product_id, "Deleted product");
        Ok(())
    }
}

fn summary_view(model: product::Model) -> ProductView {
    ProductView {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price.round_dp(2),
        sku: model.sku,
        stock: model.stock,
        category_id: model.category_id,
        category_name: None,
        category_slug: None,
        featured: model.featured,
        bestseller: model.bestseller,
        rating: model.rating.round_dp(1),
        review_count: model.review_count,
        images: Vec::new(),
        available_colors: Vec::new(),
        available_sizes: Vec::new(),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

/// Attaches category, images, colors and sizes to each product with one
/// query per association. Output keeps the input order.
pub(crate) async fn load_views<C>(
    conn: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductView>, ServiceError>
where
    C: ConnectionTrait,
{
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    let category_ids: Vec<i32> = products.iter().filter_map(|p| p.category_id).collect();

    let categories: HashMap<i32, category::Model> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    let mut images: HashMap<i32, Vec<String>> = HashMap::new();
    for image in product_image::Entity::find()
        .filter(product_image::Column::ProductId.is_in(ids.clone()))
        .order_by_asc(product_image::Column::Position)
        .order_by_asc(product_image::Column::Id)
        .all(conn)
        .await?
    {
        images.entry(image.product_id).or_default().push(image.image_url);
    }

    let mut colors: HashMap<i32, Vec<ColorOption>> = HashMap::new();
    for (link, color) in product_color::Entity::find()
        .filter(product_color::Column::ProductId.is_in(ids.clone()))
        .order_by_asc(product_color::Column::ColorId)
        .find_also_related(color::Entity)
        .all(conn)
        .await?
    {
        if let Some(color) = color {
            colors.entry(link.product_id).or_default().push(color.into());
        }
    }

    let mut sizes: HashMap<i32, Vec<SizeOption>> = HashMap::new();
    for (link, size) in product_size::Entity::find()
        .filter(product_size::Column::ProductId.is_in(ids))
        .order_by_asc(product_size::Column::SizeId)
        .find_also_related(size::Entity)
        .all(conn)
        .await?
    {
        if let Some(size) = size {
            sizes.entry(link.product_id).or_default().push(size.into());
        }
    }

    Ok(products
        .into_iter()
        .map(|model| {
            let id = model.id;
            let category = model.category_id.and_then(|cid| categories.get(&cid));
            let category_name = category.map(|c| c.name.clone());
            let category_slug = category.map(|c| c.slug.clone());

            let mut view = summary_view(model);
            view.category_name = category_name;
            view.category_slug = category_slug;
            view.images = images.remove(&id).unwrap_or_default();
            view.available_colors = colors.remove(&id).unwrap_or_default();
            view.available_sizes = sizes.remove(&id).unwrap_or_default();
            view
        })
        .collect())
}

/// Maps a unique index violation on `products.sku` to a conflict.
fn sku_conflict(err: DbErr, sku: &str) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::Conflict(format!("SKU {} already exists", sku))
        }
        _ => ServiceError::DatabaseError(err),
    }
}

async fn ensure_unique_sku<C>(conn: &C, sku: &str, exclude_id: Option<i32>) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let mut query = product::Entity::find().filter(product::Column::Sku.eq(sku));
    if let Some(id) = exclude_id {
        query = query.filter(product::Column::Id.ne(id));
    }

    if query.one(conn).await?.is_some() {
        return Err(ServiceError::Conflict(format!("SKU {} already exists", sku)));
    }
    Ok(())
}

async fn ensure_category_exists<C>(conn: &C, category_id: Option<i32>) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    if let Some(category_id) = category_id {
        if category::Entity::find_by_id(category_id).one(conn).await?.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "Category {} does not exist",
                category_id
            )));
        }
    }
    Ok(())
}

pub(crate) async fn insert_product_graph<C>(conn: &C, input: &ProductInput) -> Result<i32, ServiceError>
where
    C: ConnectionTrait,
{
    ensure_unique_sku(conn, &input.sku, None).await?;
    ensure_category_exists(conn, input.category_id).await?;

    let now = Utc::now();
    let inserted = product::ActiveModel {
        name: Set(input.name.clone()),
        sku: Set(input.sku.clone()),
        price: Set(input.price.round_dp(2)),
        stock: Set(input.stock),
        description: Set(input.description.clone()),
        category_id: Set(input.category_id),
        featured: Set(input.featured),
        bestseller: Set(input.bestseller),
        rating: Set(Decimal::ZERO),
        review_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| sku_conflict(e, &input.sku))?;

    attach_associations(conn, inserted.id, input).await?;
    Ok(inserted.id)
}

async fn replace_product_graph<C>(
    conn: &C,
    product_id: i32,
    input: &ProductInput,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let existing = product::Entity::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

    ensure_unique_sku(conn, &input.sku, Some(product_id)).await?;
    ensure_category_exists(conn, input.category_id).await?;

    let mut active: product::ActiveModel = existing.into();
    active.name = Set(input.name.clone());
    active.sku = Set(input.sku.clone());
    active.price = Set(input.price.round_dp(2));
    active.stock = Set(input.stock);
    active.description = Set(input.description.clone());
    active.category_id = Set(input.category_id);
    active.featured = Set(input.featured);
    active.bestseller = Set(input.bestseller);
    active.updated_at = Set(Utc::now());
    active
        .update(conn)
        .await
        .map_err(|e| sku_conflict(e, &input.sku))?;

    detach_associations(conn, product_id).await?;
    attach_associations(conn, product_id, input).await
}

async fn delete_product_graph<C>(conn: &C, product_id: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    if product::Entity::find_by_id(product_id).one(conn).await?.is_none() {
        return Err(ServiceError::not_found("Product", product_id));
    }

    detach_associations(conn, product_id).await?;
    review::Entity::delete_many()
        .filter(review::Column::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    product::Entity::delete_by_id(product_id).exec(conn).await?;
    Ok(())
}

async fn detach_associations<C>(conn: &C, product_id: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    product_color::Entity::delete_many()
        .filter(product_color::Column::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    product_size::Entity::delete_many()
        .filter(product_size::Column::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    product_image::Entity::delete_many()
        .filter(product_image::Column::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn attach_associations<C>(
    conn: &C,
    product_id: i32,
    input: &ProductInput,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    for (position, url) in input.images.iter().enumerate() {
        product_image::ActiveModel {
            product_id: Set(product_id),
            image_url: Set(url.clone()),
            position: Set(position as i32),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }

    for color in &input.available_colors {
        let color_id = upsert_color(conn, &color.name, &color.value).await?;
        product_color::Entity::insert(product_color::ActiveModel {
            product_id: Set(product_id),
            color_id: Set(color_id),
        })
        .on_conflict(
            OnConflict::columns([product_color::Column::ProductId, product_color::Column::ColorId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    }

    for size in &input.available_sizes {
        if size.is_custom() {
            continue;
        }
        let size_id = upsert_size(conn, &size.name, &size.dimensions).await?;
        product_size::Entity::insert(product_size::ActiveModel {
            product_id: Set(product_id),
            size_id: Set(size_id),
        })
        .on_conflict(
            OnConflict::columns([product_size::Column::ProductId, product_size::Column::SizeId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    }

    Ok(())
}

/// Insert-if-absent on the `(name, value)` unique index, then read the row back.
pub(crate) async fn upsert_color<C>(conn: &C, name: &str, value: &str) -> Result<i32, ServiceError>
where
    C: ConnectionTrait,
{
    color::Entity::insert(color::ActiveModel {
        name: Set(name.to_string()),
        value: Set(value.to_string()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([color::Column::Name, color::Column::Value])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    color::Entity::find()
        .filter(color::Column::Name.eq(name))
        .filter(color::Column::Value.eq(value))
        .one(conn)
        .await?
        .map(|c| c.id)
        .ok_or_else(|| ServiceError::InternalError(format!("color {} {} vanished after upsert", name, value)))
}

/// Insert-if-absent on the `(name, dimensions)` unique index.
pub(crate) async fn upsert_size<C>(conn: &C, name: &str, dimensions: &str) -> Result<i32, ServiceError>
where
    C: ConnectionTrait,
{
    size::Entity::insert(size::ActiveModel {
        name: Set(name.to_string()),
        dimensions: Set(dimensions.to_string()),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([size::Column::Name, size::Column::Dimensions])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(conn)
    .await?;

    size::Entity::find()
        .filter(size::Column::Name.eq(name))
        .filter(size::Column::Dimensions.eq(dimensions))
        .one(conn)
        .await?
        .map(|s| s.id)
        .ok_or_else(|| {
            ServiceError::InternalError(format!("size {} {} vanished after upsert", name, dimensions))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::PaginatorTrait;

    async fn setup() -> (tempfile::TempDir, ProductService, Arc<DatabaseConnection>) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("products.db").display());
        let db = crate::db::establish_connection(&url).await.unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        let db = Arc::new(db);
        (dir, ProductService::new(db.clone()), db)
    }

    fn input(sku: &str) -> ProductInput {
        ProductInput {
            name: "  Oak Shelf ".into(),
            sku: sku.into(),
            price: dec!(149.5),
            stock: 4,
            description: Some("   ".into()),
            category_id: None,
            featured: false,
            bestseller: false,
            images: vec!["b.jpg".into(), " ".into(), "a.jpg".into()],
            available_colors: vec![ColorInput {
                id: Some(77),
                name: "Natural Oak".into(),
                value: "#D4BF9A".into(),
            }],
            available_sizes: vec![
                SizeInput {
                    id: None,
                    name: "Small".into(),
                    dimensions: "80 x 60 x 40 cm".into(),
                },
                SizeInput {
                    id: Some(999),
                    name: "Custom".into(),
                    dimensions: String::new(),
                },
            ],
        }
    }

    #[test]
    fn price_must_stay_within_bounds() {
        let mut product = input("SHF-0");
        assert!(product.validate().is_ok());

        product.price = MAX_PRICE + dec!(0.01);
        assert!(product.validate().is_err());

        product.price = dec!(-0.01);
        assert!(product.validate().is_err());
    }

    #[tokio::test]
    async fn create_normalizes_and_keeps_image_order() {
        let (_dir, service, _db) = setup().await;
        let id = service.create_product(input("SHF-1")).await.unwrap();

        let view = service.get_product(id).await.unwrap();
        assert_eq!(view.name, "Oak Shelf");
        assert_eq!(view.description, None);
        assert_eq!(view.images, vec!["b.jpg", "a.jpg"]);
        assert_eq!(view.price, dec!(149.50));
        assert_eq!(view.available_colors.len(), 1);
        assert_ne!(view.available_colors[0].id, 77);
    }

    #[tokio::test]
    async fn custom_size_is_never_persisted() {
        let (_dir, service, db) = setup().await;
        let id = service.create_product(input("SHF-2")).await.unwrap();

        let view = service.get_product(id).await.unwrap();
        assert_eq!(view.available_sizes.len(), 1);
        assert_eq!(view.available_sizes[0].name, "Small");
        assert_eq!(size::Entity::find().count(&*db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_conflict_and_leaves_no_rows() {
        let (_dir, service, db) = setup().await;
        service.create_product(input("SHF-3")).await.unwrap();

        let err = service.create_product(input("SHF-3")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(product::Entity::find().count(&*db).await.unwrap(), 1);
        assert_eq!(product_image::Entity::find().count(&*db).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn unknown_category_rolls_back() {
        let (_dir, service, db) = setup().await;
        let mut bad = input("SHF-4");
        bad.category_id = Some(404);

        let err = service.create_product(bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
        assert_eq!(product::Entity::find().count(&*db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_replaces_every_association() {
        let (_dir, service, db) = setup().await;
        let id = service.create_product(input("SHF-5")).await.unwrap();

        let mut next = input("SHF-5");
        next.images = vec!["c.jpg".into()];
        next.available_colors = vec![];
        next.available_sizes = vec![];
        service.update_product(id, next).await.unwrap();

        let view = service.get_product(id).await.unwrap();
        assert_eq!(view.images, vec!["c.jpg"]);
        assert!(view.available_colors.is_empty());
        assert!(view.available_sizes.is_empty());
        // dimension rows stay for reuse by other products
        assert_eq!(color::Entity::find().count(&*db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_product_is_not_found_for_every_write() {
        let (_dir, service, _db) = setup().await;
        assert!(matches!(
            service.update_product(41, input("SHF-6")).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.delete_product(41).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.get_product(41).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
