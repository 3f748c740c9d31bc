use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shared color dimension row, unique on `(name, value)`
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "colors")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// Hex value such as `#D4BF9A`
    pub value: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_color::Entity")]
    ProductColors,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_color::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_color::Relation::Color.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
