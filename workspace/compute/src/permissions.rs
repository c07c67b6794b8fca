//! Effective permission resolution for a user and edits to a group's
//! custom permission list.
//!
//! Resolution order is fixed: a super admin is granted everything before
//! any group is consulted; a user without a group is denied; otherwise the
//! group's default and custom permissions are handed back unmerged.

use model::entities::user::{self, UserRole};
use model::entities::user_group::{
    self, CustomPermission, CustomPermissions, DefaultPermissions, PermissionLevel,
};
use sea_orm::{ConnectionTrait, EntityTrait};
use tracing::{debug, instrument, warn};

use crate::error::{ComputeError, Result};

/// Why a user ended up without any access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenial {
    NoGroupAssigned,
    GroupNotFound,
}

impl AccessDenial {
    pub fn message(&self) -> &'static str {
        match self {
            AccessDenial::NoGroupAssigned => "User is not assigned to any group",
            AccessDenial::GroupNotFound => "Assigned group not found or inactive",
        }
    }
}

/// Outcome of [`resolve_user_permissions`].
#[derive(Debug, Clone, PartialEq)]
pub enum EffectivePermissions {
    FullAccess,
    NoAccess(AccessDenial),
    Group {
        group: user_group::Model,
        default_permissions: DefaultPermissions,
        custom_permissions: CustomPermissions,
    },
}

impl EffectivePermissions {
    /// Level granted on `module`. A custom entry for the module wins over the
    /// group default; modules named by neither resolve to `None`.
    pub fn level_for(&self, module: &str) -> PermissionLevel {
        match self {
            EffectivePermissions::FullAccess => PermissionLevel::Full,
            EffectivePermissions::NoAccess(_) => PermissionLevel::None,
            EffectivePermissions::Group {
                default_permissions,
                custom_permissions,
                ..
            } => custom_permissions
                .0
                .iter()
                .find(|p| p.module == module)
                .map(|p| p.level)
                .or_else(|| default_permissions.level_for(module))
                .unwrap_or_default(),
        }
    }
}

/// Resolves the permissions of a live user.
///
/// The group lookup only excludes soft-deleted groups; an inactive group
/// still grants its permissions.
#[instrument(skip(db))]
pub async fn resolve_user_permissions<C>(db: &C, user_id: i32) -> Result<EffectivePermissions>
where
    C: ConnectionTrait,
{
    let user = user::Entity::find_active_by_id(user_id)
        .one(db)
        .await?
        .ok_or(ComputeError::UserNotFound(user_id))?;

    if user.role == UserRole::SuperAdmin {
        debug!(user_id, "Super admin resolved to full access");
        return Ok(EffectivePermissions::FullAccess);
    }

    let Some(group_id) = user.group_id else {
        debug!(user_id, "User has no group");
        return Ok(EffectivePermissions::NoAccess(AccessDenial::NoGroupAssigned));
    };

    match user_group::Entity::find_active_by_id(group_id).one(db).await? {
        Some(group) => {
            debug!(user_id, group_id, "Resolved permissions from group");
            Ok(EffectivePermissions::Group {
                default_permissions: group.default_permissions.clone(),
                custom_permissions: group.custom_permissions.clone(),
                group,
            })
        }
        None => {
            warn!(user_id, group_id, "User references a missing group");
            Ok(EffectivePermissions::NoAccess(AccessDenial::GroupNotFound))
        }
    }
}

/// Sets `module` to `level`, replacing an existing entry in place or
/// appending a new one.
pub fn upsert_custom_permission(
    permissions: &mut CustomPermissions,
    module: &str,
    level: PermissionLevel,
) {
    match permissions.0.iter_mut().find(|p| p.module == module) {
        Some(existing) => existing.level = level,
        None => permissions.0.push(CustomPermission {
            module: module.to_string(),
            level,
        }),
    }
}

/// Drops the entry for `module`. Returns `false` when the list did not
/// contain it.
pub fn remove_custom_permission(permissions: &mut CustomPermissions, module: &str) -> bool {
    let before = permissions.0.len();
    permissions.0.retain(|p| p.module != module);
    permissions.0.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbBackend, MockDatabase, Set};

    async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn insert_user(
        db: &DatabaseConnection,
        role: UserRole,
        group_id: Option<i32>,
    ) -> user::Model {
        user::ActiveModel {
            name: Set("Test User".to_string()),
            email: Set("member@example.com".to_string()),
            password_hash: Set("x".to_string()),
            role: Set(role),
            group_id: Set(group_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    async fn insert_group(db: &DatabaseConnection, custom: Vec<CustomPermission>) -> user_group::Model {
        user_group::ActiveModel {
            title: Set("Associates".to_string()),
            default_permissions: Set(DefaultPermissions {
                customers: PermissionLevel::Edit,
                ..Default::default()
            }),
            custom_permissions: Set(CustomPermissions(custom)),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap()
    }

    fn denying_permissions() -> Vec<CustomPermission> {
        vec![CustomPermission {
            module: "customers".to_string(),
            level: PermissionLevel::None,
        }]
    }

    #[tokio::test]
    async fn test_super_admin_gets_full_access_despite_denying_group() {
        let db = setup_db().await;
        let group = insert_group(&db, denying_permissions()).await;
        let admin = insert_user(&db, UserRole::SuperAdmin, Some(group.id)).await;

        let resolved = resolve_user_permissions(&db, admin.id).await.unwrap();
        assert_eq!(resolved, EffectivePermissions::FullAccess);
        assert_eq!(resolved.level_for("customers"), PermissionLevel::Full);
    }

    #[tokio::test]
    async fn test_super_admin_resolution_skips_group_query() {
        let now = Utc::now().naive_utc();
        let admin = user::Model {
            id: 1,
            name: "Root".to_string(),
            email: "root@example.com".to_string(),
            password_hash: "x".to_string(),
            role: UserRole::SuperAdmin,
            otp: None,
            otp_expires_at: None,
            group_id: Some(99),
            is_delete: false,
            created_at: now,
            updated_at: now,
        };
        let db = MockDatabase::new(DbBackend::Sqlite)
            .append_query_results([vec![admin]])
            .into_connection();

        let resolved = resolve_user_permissions(&db, 1).await.unwrap();
        assert_eq!(resolved, EffectivePermissions::FullAccess);
        assert_eq!(db.into_transaction_log().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_group_and_no_group_are_distinguishable() {
        let db = setup_db().await;
        let loner = insert_user(&db, UserRole::User, None).await;
        let orphan = insert_user(&db, UserRole::User, Some(4242)).await;

        let no_group = resolve_user_permissions(&db, loner.id).await.unwrap();
        let missing = resolve_user_permissions(&db, orphan.id).await.unwrap();

        assert_eq!(no_group, EffectivePermissions::NoAccess(AccessDenial::NoGroupAssigned));
        assert_eq!(missing, EffectivePermissions::NoAccess(AccessDenial::GroupNotFound));
        assert_ne!(
            AccessDenial::NoGroupAssigned.message(),
            AccessDenial::GroupNotFound.message()
        );
    }

    #[tokio::test]
    async fn test_soft_deleted_group_is_not_found() {
        let db = setup_db().await;
        let group = insert_group(&db, vec![]).await;
        let member = insert_user(&db, UserRole::User, Some(group.id)).await;
        user_group::Entity::soft_delete(&db, group.id).await.unwrap();

        let resolved = resolve_user_permissions(&db, member.id).await.unwrap();
        assert_eq!(resolved, EffectivePermissions::NoAccess(AccessDenial::GroupNotFound));
    }

    #[tokio::test]
    async fn test_inactive_group_still_resolves() {
        let db = setup_db().await;
        let group = insert_group(&db, vec![]).await;
        let mut active: user_group::ActiveModel = group.clone().into();
        active.is_active = Set(false);
        active.update(&db).await.unwrap();
        let member = insert_user(&db, UserRole::User, Some(group.id)).await;

        let resolved = resolve_user_permissions(&db, member.id).await.unwrap();
        assert!(matches!(resolved, EffectivePermissions::Group { .. }));
    }

    #[tokio::test]
    async fn test_group_permissions_returned_verbatim() {
        let db = setup_db().await;
        let group = insert_group(&db, denying_permissions()).await;
        let member = insert_user(&db, UserRole::User, Some(group.id)).await;

        let resolved = resolve_user_permissions(&db, member.id).await.unwrap();
        let EffectivePermissions::Group {
            default_permissions,
            custom_permissions,
            ..
        } = &resolved
        else {
            panic!("expected group permissions, got {resolved:?}");
        };
        assert_eq!(default_permissions.customers, PermissionLevel::Edit);
        assert_eq!(custom_permissions.0, denying_permissions());
        // Custom entry wins over the default.
        assert_eq!(resolved.level_for("customers"), PermissionLevel::None);
        assert_eq!(resolved.level_for("reports"), PermissionLevel::None);
    }

    #[tokio::test]
    async fn test_unknown_or_deleted_user_is_not_found() {
        let db = setup_db().await;
        let member = insert_user(&db, UserRole::User, None).await;
        user::Entity::soft_delete(&db, member.id).await.unwrap();

        let err = resolve_user_permissions(&db, member.id).await.unwrap_err();
        assert!(matches!(err, ComputeError::UserNotFound(id) if id == member.id));
        let err = resolve_user_permissions(&db, 777).await.unwrap_err();
        assert!(matches!(err, ComputeError::UserNotFound(777)));
    }

    #[test]
    fn test_upsert_replaces_in_place_or_appends() {
        let mut list = CustomPermissions(vec![
            CustomPermission {
                module: "reports".to_string(),
                level: PermissionLevel::View,
            },
            CustomPermission {
                module: "documents".to_string(),
                level: PermissionLevel::None,
            },
        ]);

        upsert_custom_permission(&mut list, "reports", PermissionLevel::Full);
        assert_eq!(list.0.len(), 2);
        assert_eq!(list.0[0].module, "reports");
        assert_eq!(list.0[0].level, PermissionLevel::Full);

        upsert_custom_permission(&mut list, "calendar", PermissionLevel::Edit);
        assert_eq!(list.0.len(), 3);
        assert_eq!(list.0[2].module, "calendar");
    }

    #[test]
    fn test_remove_reports_absent_module() {
        let mut list = CustomPermissions(vec![CustomPermission {
            module: "reports".to_string(),
            level: PermissionLevel::View,
        }]);

        assert!(!remove_custom_permission(&mut list, "documents"));
        assert_eq!(list.0.len(), 1);

        assert!(remove_custom_permission(&mut list, "reports"));
        assert!(list.0.is_empty());
    }
}
