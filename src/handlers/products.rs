use crate::{
    catalog::{CatalogQuery, ProductView},
    errors::ServiceError,
    handlers::common::{created_response, success_response, validate_input, MutationResponse},
    services::products::ProductInput,
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::get,
    Router,
};

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/category/:category_id", get(list_category_products))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// List products, newest first, without images or variants
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "Product summaries", body = [ProductView]),
        (status = 500, description = "Database error", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn list_products(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let products = state.services.products.list_products().await?;
    Ok(success_response(products))
}

/// Filter and sort the full catalog
#[utoipa::path(
    get,
    path = "/api/products/search",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Matching products", body = [ProductView])
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Response, ServiceError> {
    let products = state.services.products.search(&query).await?;
    Ok(success_response(products))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail", body = ProductView),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    let product = state.services.products.get_product(id).await?;
    Ok(success_response(product))
}

#[utoipa::path(
    get,
    path = "/api/products/category/{category_id}",
    params(("category_id" = i32, Path, description = "Category id")),
    responses(
        (status = 200, description = "Products in the category", body = [ProductView])
    ),
    tag = "Products"
)]
pub async fn list_category_products(
    State(state): State<AppState>,
    Path(category_id): Path<i32>,
) -> Result<Response, ServiceError> {
    let products = state.services.products.list_by_category(category_id).await?;
    Ok(success_response(products))
}

/// Create a product with its images, colors and sizes
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = MutationResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductInput>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let id = state.services.products.create_product(payload).await?;
    Ok(created_response(MutationResponse::with_id(
        id,
        "Product created successfully",
    )))
}

/// Replace a product and all of its associations
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = MutationResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductInput>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    state.services.products.update_product(id, payload).await?;
    Ok(success_response(MutationResponse::with_id(
        id,
        "Product updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = MutationResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.products.delete_product(id).await?;
    Ok(success_response(MutationResponse::with_id(
        id,
        "Product deleted successfully",
    )))
}
