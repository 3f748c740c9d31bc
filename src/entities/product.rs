use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog product
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub sku: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub stock: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub category_id: Option<i32>,
    pub featured: bool,
    pub bestseller: bool,
    /// Mean of published review ratings, one decimal place
    #[sea_orm(column_type = "Decimal(Some((3, 1)))")]
    pub rating: Decimal,
    pub review_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    #[sea_orm(has_many = "super::product_image::Entity")]
    Images,
    #[sea_orm(has_many = "super::product_color::Entity")]
    ProductColors,
    #[sea_orm(has_many = "super::product_size::Entity")]
    ProductSizes,
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::color::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_color::Relation::Color.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_color::Relation::Product.def().rev())
    }
}

impl Related<super::size::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_size::Relation::Size.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_size::Relation::Product.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
