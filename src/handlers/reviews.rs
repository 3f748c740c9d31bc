use crate::{
    entities::review::ReviewStatus,
    errors::ServiceError,
    handlers::common::{created_response, no_content_response, success_response, validate_input},
    services::reviews::{ReviewFilter, ReviewInput, ReviewView},
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
    routing::{delete, get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Creates the router for review endpoints
pub fn reviews_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(submit_review))
        .route("/product/:product_id", get(list_product_reviews))
        .route("/:id", delete(delete_review))
        .route("/:id/status", put(update_review_status))
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct UpdateReviewStatusRequest {
    pub status: ReviewStatus,
}

/// Moderation list with search and status filters
#[utoipa::path(
    get,
    path = "/api/reviews",
    params(ReviewFilter),
    responses((status = 200, description = "Reviews, newest first", body = [ReviewView])),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(filter): Query<ReviewFilter>,
) -> Result<Response, ServiceError> {
    let reviews = state.services.reviews.list(&filter).await?;
    Ok(success_response(reviews))
}

#[utoipa::path(
    get,
    path = "/api/reviews/product/{product_id}",
    params(("product_id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Published reviews", body = [ReviewView]),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Reviews"
)]
pub async fn list_product_reviews(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Response, ServiceError> {
    let reviews = state.services.reviews.list_published(product_id).await?;
    Ok(success_response(reviews))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = ReviewInput,
    responses(
        (status = 201, description = "Review awaiting moderation", body = ReviewView),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Reviews"
)]
pub async fn submit_review(
    State(state): State<AppState>,
    Json(payload): Json<ReviewInput>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let review = state.services.reviews.submit(payload).await?;
    Ok(created_response(review))
}

#[utoipa::path(
    put,
    path = "/api/reviews/{id}/status",
    params(("id" = i32, Path, description = "Review id")),
    request_body = UpdateReviewStatusRequest,
    responses(
        (status = 200, description = "Review moderated", body = ReviewView),
        (status = 404, description = "Review not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Reviews"
)]
pub async fn update_review_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateReviewStatusRequest>,
) -> Result<Response, ServiceError> {
    let review = state.services.reviews.set_status(id, payload.status).await?;
    Ok(success_response(review))
}

#[utoipa::path(
    delete,
    path = "/api/reviews/{id}",
    params(("id" = i32, Path, description = "Review id")),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 404, description = "Review not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Reviews"
)]
pub async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, ServiceError> {
    state.services.reviews.delete(id).await?;
    Ok(no_content_response())
}
