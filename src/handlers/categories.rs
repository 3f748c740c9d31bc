use crate::{
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, validate_input},
    services::categories::{CategoryInput, CategoryView},
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::Response,
    routing::get,
    Router,
};

/// Creates the router for category endpoints
pub fn categories_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        // GET addresses a category by slug, writes by numeric id
        .route(
            "/:key",
            get(get_category).put(update_category).delete(delete_category),
        )
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories with product counts", body = [CategoryView])
    ),
    tag = "Categories"
)]
pub async fn list_categories(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let categories = state.services.categories.list_categories().await?;
    Ok(success_response(categories))
}

#[utoipa::path(
    get,
    path = "/api/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category", body = CategoryView),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, ServiceError> {
    let category = state.services.categories.get_by_slug(&slug).await?;
    Ok(success_response(category))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = CategoryView),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryInput>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let category = state.services.categories.create_category(payload).await?;
    Ok(created_response(category))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category updated", body = CategoryView),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Slug already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<CategoryInput>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let category = state.services.categories.update_category(id, payload).await?;
    Ok(success_response(category))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Category still has products", body = crate::errors::ErrorResponse)
    ),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.categories.delete_category(id).await?;
    Ok(no_content_response())
}
