use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

/// A titled section of an intake form within a subcategory.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "custom_field_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub subcategory_id: i32,
    pub title: String,
    #[sea_orm(default_value = "0")]
    pub sort_order: i32,
    #[sea_orm(default_value = "false")]
    pub is_delete: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

soft_delete_entity!();
