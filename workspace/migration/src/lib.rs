pub use sea_orm_migration::prelude::*;

mod bookkeeping;
mod m20250301_000001_create_accounts_and_taxonomy;
mod m20250301_000002_create_practice_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_accounts_and_taxonomy::Migration),
            Box::new(m20250301_000002_create_practice_tables::Migration),
        ]
    }
}
