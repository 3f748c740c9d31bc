use crate::{
    entities::{category, product},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        let mut err = ValidationError::new("slug");
        err.message = Some("Slug may only contain lowercase letters, digits and '-'".into());
        Err(err)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 100), custom = "validate_slug")]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Category with the number of products currently assigned to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub count: i64,
    pub created_at: DateTime<Utc>,
}

impl CategoryView {
    fn new(model: category::Model, count: i64) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            image: model.image,
            count,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct CategoryCount {
    category_id: Option<i32>,
    count: i64,
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<CategoryView>, ServiceError> {
        let categories = category::Entity::find()
            .order_by_asc(category::Column::Id)
            .all(&*self.db)
            .await?;

        let counts: HashMap<i32, i64> = product::Entity::find()
            .select_only()
            .column(product::Column::CategoryId)
            .column_as(product::Column::Id.count(), "count")
            .filter(product::Column::CategoryId.is_not_null())
            .group_by(product::Column::CategoryId)
            .into_model::<CategoryCount>()
            .all(&*self.db)
            .await?
            .into_iter()
            .filter_map(|row| row.category_id.map(|id| (id, row.count)))
            .collect();

        Ok(categories
            .into_iter()
            .map(|c| {
                let count = counts.get(&c.id).copied().unwrap_or(0);
                CategoryView::new(c, count)
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryView, ServiceError> {
        let model = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", slug))?;
        self.with_count(model).await
    }

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create_category(&self, input: CategoryInput) -> Result<CategoryView, ServiceError> {
        self.ensure_unique_slug(&input.slug, None).await?;

        let now = Utc::now();
        let model = category::ActiveModel {
            name: Set(input.name.trim().to_string()),
            slug: Set(input.slug),
            description: Set(input.description),
            image: Set(input.image),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(category_id = model.id, "Created category");
        Ok(CategoryView::new(model, 0))
    }

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn update_category(
        &self,
        category_id: i32,
        input: CategoryInput,
    ) -> Result<CategoryView, ServiceError> {
        let existing = category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", category_id))?;
        self.ensure_unique_slug(&input.slug, Some(category_id)).await?;

        let mut active: category::ActiveModel = existing.into();
        active.name = Set(input.name.trim().to_string());
        active.slug = Set(input.slug);
        active.description = Set(input.description);
        active.image = Set(input.image);
        active.updated_at = Set(Utc::now());
        let model = active.update(&*self.db).await?;

        info!(category_id, "Updated category");
        self.with_count(model).await
    }

    /// Refuses while products still reference the category.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: i32) -> Result<(), ServiceError> {
        if category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Category", category_id));
        }

        let in_use = self.product_count(category_id).await?;
        if in_use > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category {} still has {} products",
                category_id, in_use
            )));
        }

        category::Entity::delete_by_id(category_id)
            .exec(&*self.db)
            .await?;
        info!(category_id, "Deleted category");
        Ok(())
    }

    async fn with_count(&self, model: category::Model) -> Result<CategoryView, ServiceError> {
        let count = self.product_count(model.id).await?;
        Ok(CategoryView::new(model, count))
    }

    async fn product_count(&self, category_id: i32) -> Result<i64, ServiceError> {
        let count = product::Entity::find()
            .filter(product::Column::CategoryId.eq(category_id))
            .count(&*self.db)
            .await?;
        Ok(count as i64)
    }

    async fn ensure_unique_slug(&self, slug: &str, exclude_id: Option<i32>) -> Result<(), ServiceError> {
        let mut query = category::Entity::find().filter(category::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(category::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category slug {} already exists",
                slug
            )));
        }
        Ok(())
    }
}
