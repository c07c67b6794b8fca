//! Root of all SeaORM entity modules.
//!
//! Every table carries the same bookkeeping columns: an auto-increment `id`,
//! an `is_delete` soft-delete flag and `created_at`/`updated_at` timestamps.
//! References between tables are plain integer columns; nothing is enforced
//! by the database, rows are matched on those integers at query time.

/// Implements the shared row lifecycle for the entity declared in the
/// invoking module: timestamp maintenance on save plus soft-delete aware
/// finders.
macro_rules! soft_delete_entity {
    () => {
        #[async_trait::async_trait]
        impl sea_orm::ActiveModelBehavior for ActiveModel {
            async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, sea_orm::DbErr>
            where
                C: sea_orm::ConnectionTrait,
            {
                let now = chrono::Utc::now().naive_utc();
                if insert {
                    if self.created_at.is_not_set() {
                        self.created_at = sea_orm::ActiveValue::Set(now);
                    }
                    if self.is_delete.is_not_set() {
                        self.is_delete = sea_orm::ActiveValue::Set(false);
                    }
                }
                self.updated_at = sea_orm::ActiveValue::Set(now);
                Ok(self)
            }
        }

        impl Entity {
            /// Rows that have not been soft-deleted.
            pub fn find_active() -> sea_orm::Select<Entity> {
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
                Entity::find().filter(Column::IsDelete.eq(false))
            }

            /// A single row by id, unless it has been soft-deleted.
            pub fn find_active_by_id(id: i32) -> sea_orm::Select<Entity> {
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
                Entity::find_by_id(id).filter(Column::IsDelete.eq(false))
            }

            /// Flips `is_delete` on a live row. Returns `false` when no live row
            /// with that id exists.
            pub async fn soft_delete<C>(db: &C, id: i32) -> Result<bool, sea_orm::DbErr>
            where
                C: sea_orm::ConnectionTrait,
            {
                use sea_orm::sea_query::Expr;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                let result = Entity::update_many()
                    .col_expr(Column::IsDelete, Expr::value(true))
                    .col_expr(Column::UpdatedAt, Expr::value(chrono::Utc::now().naive_utc()))
                    .filter(Column::Id.eq(id))
                    .filter(Column::IsDelete.eq(false))
                    .exec(db)
                    .await?;
                Ok(result.rows_affected > 0)
            }
        }
    };
}

pub mod business_entity;
pub mod business_type;
pub mod currency;
pub mod custom_field;
pub mod custom_field_group;
pub mod customer;
pub mod heads_up;
pub mod installment;
pub mod invoice;
pub mod matter;
pub mod note;
pub mod practice_area;
pub mod subcategory;
pub mod time_bill;
pub mod user;
pub mod user_group;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::business_entity::Entity as BusinessEntity;
    pub use super::business_type::Entity as BusinessType;
    pub use super::currency::Entity as Currency;
    pub use super::custom_field::Entity as CustomField;
    pub use super::custom_field_group::Entity as CustomFieldGroup;
    pub use super::customer::Entity as Customer;
    pub use super::heads_up::Entity as HeadsUp;
    pub use super::installment::Entity as Installment;
    pub use super::invoice::Entity as Invoice;
    pub use super::matter::Entity as Matter;
    pub use super::note::Entity as Note;
    pub use super::practice_area::Entity as PracticeArea;
    pub use super::subcategory::Entity as Subcategory;
    pub use super::time_bill::Entity as TimeBill;
    pub use super::user::Entity as User;
    pub use super::user_group::Entity as UserGroup;
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, DbErr, EntityTrait, Set};

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    #[tokio::test]
    async fn test_timestamps_and_flag_are_filled_on_insert() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let customer = customer::ActiveModel {
            name: Set("Acme Ltd".to_string()),
            status: Set(customer::CustomerStatus::Active),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        assert!(!customer.is_delete);
        assert_eq!(customer.created_at, customer.updated_at);
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_delete_hides_row_from_active_finders() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let matter = matter::ActiveModel {
            customer_id: Set(1),
            title: Set("Lease dispute".to_string()),
            status: Set(matter::MatterStatus::Open),
            open_date: Set(Some(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        assert!(Matter::find_active_by_id(matter.id).one(&db).await?.is_some());
        assert!(Matter::soft_delete(&db, matter.id).await?);

        assert!(Matter::find_active_by_id(matter.id).one(&db).await?.is_none());
        assert!(Matter::find_active().all(&db).await?.is_empty());

        // The row is still there, only flagged.
        let raw = Matter::find_by_id(matter.id).one(&db).await?.unwrap();
        assert!(raw.is_delete);

        // A second delete finds nothing live to flip.
        assert!(!Matter::soft_delete(&db, matter.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_group_permissions_round_trip_through_json_columns() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let group = user_group::ActiveModel {
            title: Set("Paralegals".to_string()),
            default_permissions: Set(user_group::DefaultPermissions {
                customers: user_group::PermissionLevel::View,
                ..Default::default()
            }),
            custom_permissions: Set(user_group::CustomPermissions(vec![
                user_group::CustomPermission {
                    module: "reports".to_string(),
                    level: user_group::PermissionLevel::Edit,
                },
            ])),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let loaded = UserGroup::find_by_id(group.id).one(&db).await?.unwrap();
        assert_eq!(loaded.default_permissions.customers, user_group::PermissionLevel::View);
        assert_eq!(loaded.default_permissions.settings, user_group::PermissionLevel::None);
        assert_eq!(loaded.custom_permissions.0.len(), 1);
        assert_eq!(loaded.custom_permissions.0[0].module, "reports");
        Ok(())
    }

    #[tokio::test]
    async fn test_decimal_amounts_persist() -> Result<(), DbErr> {
        let db = setup_db().await?;

        let invoice = invoice::ActiveModel {
            customer_id: Set(7),
            invoice_number: Set("INV-0001".to_string()),
            amount: Set(Decimal::new(125050, 2)),
            currency_code: Set("USD".to_string()),
            issue_date: Set(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()),
            status: Set(invoice::InvoiceStatus::Draft),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let loaded = Invoice::find_by_id(invoice.id).one(&db).await?.unwrap();
        assert_eq!(loaded.amount, Decimal::new(125050, 2));
        Ok(())
    }
}
