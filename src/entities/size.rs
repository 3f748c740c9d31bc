use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shared size dimension row, unique on `(name, dimensions)`
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sizes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Free-form dimension string, e.g. `180 x 90 x 85 cm`
    pub dimensions: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_size::Entity")]
    ProductSizes,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_size::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_size::Relation::Size.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
