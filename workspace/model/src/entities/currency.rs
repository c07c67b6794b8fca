use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A currency the firm bills in.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// ISO 4217 code. Unique among live rows, checked before insert.
    pub currency_code: String,
    pub name: String,
    pub symbol: Option<String>,
    /// Rate against the firm's base currency.
    #[sea_orm(column_type = "Decimal(Some((16, 6)))")]
    pub exchange_rate: Decimal,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    #[sea_orm(default_value = "false")]
    pub is_delete: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

soft_delete_entity!();
