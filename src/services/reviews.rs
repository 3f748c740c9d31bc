use crate::{
    db::TrackedTransaction,
    entities::{
        product,
        review::{self, ReviewStatus},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub product_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub customer_name: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(min = 1, max = 4000))]
    pub comment: String,
}

/// Admin list filters
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReviewFilter {
    /// Case-insensitive match on product name, customer name or comment
    pub search: Option<String>,
    pub status: Option<ReviewStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewView {
    pub id: i32,
    pub product_id: i32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub product_name: Option<String>,
    pub customer_name: String,
    pub rating: i32,
    pub comment: String,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
}

impl ReviewView {
    fn new(model: review::Model, product_name: Option<String>) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            product_name,
            customer_name: model.customer_name,
            rating: model.rating,
            comment: model.comment,
            status: model.status,
            created_at: model.created_at,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);
        self.product_name.as_deref().map_or(false, hit)
            || hit(&self.customer_name)
            || hit(&self.comment)
    }
}

#[derive(Clone)]
pub struct ReviewService {
    db: Arc<DatabaseConnection>,
}

impl ReviewService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Published reviews of one product, newest first
    #[instrument(skip(self))]
    pub async fn list_published(&self, product_id: i32) -> Result<Vec<ReviewView>, ServiceError> {
        let product = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

        let reviews = review::Entity::find()
            .filter(review::Column::ProductId.eq(product_id))
            .filter(review::Column::Status.eq(ReviewStatus::Published))
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(reviews
            .into_iter()
            .map(|r| ReviewView::new(r, Some(product.name.clone())))
            .collect())
    }

    /// New reviews wait for moderation and do not affect the rating yet.
    #[instrument(skip(self, input), fields(product_id = input.product_id))]
    pub async fn submit(&self, input: ReviewInput) -> Result<ReviewView, ServiceError> {
        if !(1..=5).contains(&input.rating) {
            return Err(ServiceError::ValidationError(
                "Rating must be between 1 and 5".to_string(),
            ));
        }
        let product = product::Entity::find_by_id(input.product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", input.product_id))?;

        let model = review::ActiveModel {
            product_id: Set(product.id),
            customer_name: Set(input.customer_name.trim().to_string()),
            rating: Set(input.rating),
            comment: Set(input.comment.trim().to_string()),
            status: Set(ReviewStatus::Pending),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(review_id = model.id, "Review submitted");
        Ok(ReviewView::new(model, Some(product.name)))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ReviewFilter) -> Result<Vec<ReviewView>, ServiceError> {
        let mut query = review::Entity::find()
            .find_also_related(product::Entity)
            .order_by_desc(review::Column::CreatedAt)
            .order_by_desc(review::Column::Id);
        if let Some(status) = filter.status {
            query = query.filter(review::Column::Status.eq(status));
        }

        let views = query
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|(r, p)| ReviewView::new(r, p.map(|p| p.name)));

        let needle = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        Ok(match needle {
            Some(needle) => views.filter(|v| v.matches(&needle)).collect(),
            None => views.collect(),
        })
    }

    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        review_id: i32,
        status: ReviewStatus,
    ) -> Result<ReviewView, ServiceError> {
        let txn = TrackedTransaction::begin(&self.db, "review_set_status").await?;
        let result = set_status_in(txn.conn(), review_id, status).await;
        let view = txn.finish(result).await?;

        info!(review_id, status = ?status, "Review moderated");
        Ok(view)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, review_id: i32) -> Result<(), ServiceError> {
        let txn = TrackedTransaction::begin(&self.db, "review_delete").await?;
        let result = delete_in(txn.conn(), review_id).await;
        txn.finish(result).await?;

        info!(review_id, "Review deleted");
        Ok(())
    }
}

async fn find_review<C>(conn: &C, review_id: i32) -> Result<review::Model, ServiceError>
where
    C: ConnectionTrait,
{
    review::Entity::find_by_id(review_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Review", review_id))
}

async fn set_status_in<C>(
    conn: &C,
    review_id: i32,
    status: ReviewStatus,
) -> Result<ReviewView, ServiceError>
where
    C: ConnectionTrait,
{
    let existing = find_review(conn, review_id).await?;
    let product_id = existing.product_id;

    let mut active: review::ActiveModel = existing.into();
    active.status = Set(status);
    let model = active.update(conn).await?;

    let product = refresh_product_rating(conn, product_id).await?;
    Ok(ReviewView::new(model, Some(product.name)))
}

async fn delete_in<C>(conn: &C, review_id: i32) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    let existing = find_review(conn, review_id).await?;
    review::Entity::delete_by_id(review_id).exec(conn).await?;
    refresh_product_rating(conn, existing.product_id).await?;
    Ok(())
}

/// Mean of the ratings, one decimal place, halves away from zero
pub(crate) fn average_rating(ratings: &[i32]) -> Decimal {
    if ratings.is_empty() {
        return Decimal::ZERO;
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    (Decimal::from(sum) / Decimal::from(ratings.len() as i64))
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// Recomputes `rating` and `review_count` from the published reviews.
async fn refresh_product_rating<C>(conn: &C, product_id: i32) -> Result<product::Model, ServiceError>
where
    C: ConnectionTrait,
{
    let product = product::Entity::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product", product_id))?;

    let ratings: Vec<i32> = review::Entity::find()
        .filter(review::Column::ProductId.eq(product_id))
        .filter(review::Column::Status.eq(ReviewStatus::Published))
        .all(conn)
        .await?
        .into_iter()
        .map(|r| r.rating)
        .collect();

    let mut active: product::ActiveModel = product.into();
    active.rating = Set(average_rating(&ratings));
    active.review_count = Set(ratings.len() as i32);
    active.updated_at = Set(Utc::now());
    Ok(active.update(conn).await?)
}
