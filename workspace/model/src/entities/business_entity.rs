use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;

/// A legal form (LLC, partnership, ...) belonging to a business type.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "business_entities")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub business_type_id: i32,
    pub name: String,
    pub description: Option<String>,
    #[sea_orm(default_value = "false")]
    pub is_delete: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

soft_delete_entity!();
