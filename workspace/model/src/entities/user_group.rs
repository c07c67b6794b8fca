use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// Access level granted on a module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    #[default]
    None,
    View,
    Edit,
    Full,
}

/// One level per fixed module of the application. Modules left out of the
/// JSON default to `none`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct DefaultPermissions {
    pub customers: PermissionLevel,
    pub matters: PermissionLevel,
    pub invoices: PermissionLevel,
    pub billing: PermissionLevel,
    pub time_bills: PermissionLevel,
    pub notes: PermissionLevel,
    pub settings: PermissionLevel,
}

impl DefaultPermissions {
    /// Level for one of the fixed module names, `None` for any other name.
    pub fn level_for(&self, module: &str) -> Option<PermissionLevel> {
        match module {
            "customers" => Some(self.customers),
            "matters" => Some(self.matters),
            "invoices" => Some(self.invoices),
            "billing" => Some(self.billing),
            "time_bills" => Some(self.time_bills),
            "notes" => Some(self.notes),
            "settings" => Some(self.settings),
            _ => None,
        }
    }
}

/// A per-module override attached to a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPermission {
    pub module: String,
    pub level: PermissionLevel,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct CustomPermissions(pub Vec<CustomPermission>);

/// A named set of permissions users can be assigned to.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_groups")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub default_permissions: DefaultPermissions,
    #[sea_orm(column_type = "Json")]
    pub custom_permissions: CustomPermissions,
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
