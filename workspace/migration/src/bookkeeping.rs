use sea_orm_migration::{prelude::*, schema::*};

/// Columns every table carries: the soft-delete flag and row timestamps.
#[derive(DeriveIden)]
enum Bookkeeping {
    IsDelete,
    CreatedAt,
    UpdatedAt,
}

/// Appends the bookkeeping columns to a table definition.
pub(crate) fn with_bookkeeping(table: &mut TableCreateStatement) -> &mut TableCreateStatement {
    table
        .col(boolean(Bookkeeping::IsDelete).default(false))
        .col(date_time(Bookkeeping::CreatedAt).default(Expr::current_timestamp()))
        .col(date_time(Bookkeeping::UpdatedAt).default(Expr::current_timestamp()))
}
