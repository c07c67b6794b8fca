use sea_orm_migration::{prelude::*, schema::*};

use crate::bookkeeping::with_bookkeeping;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create customers table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(pk_auto(Customers::Id))
                        .col(string(Customers::Name))
                        .col(string_null(Customers::Email))
                        .col(string_null(Customers::Phone))
                        .col(string_null(Customers::Company))
                        .col(text_null(Customers::Address))
                        .col(integer_null(Customers::BusinessTypeId))
                        .col(string_len(Customers::Status, 20).default("active")),
                )
                .to_owned(),
            )
            .await?;

        // Create matters table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(Matters::Table)
                        .if_not_exists()
                        .col(pk_auto(Matters::Id))
                        .col(integer(Matters::CustomerId))
                        .col(string(Matters::Title))
                        .col(text_null(Matters::Description))
                        .col(integer_null(Matters::PracticeAreaId))
                        .col(string_len(Matters::Status, 20).default("open"))
                        .col(date_null(Matters::OpenDate))
                        .col(date_null(Matters::CloseDate)),
                )
                .to_owned(),
            )
            .await?;

        // Create invoices table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(pk_auto(Invoices::Id))
                        .col(integer(Invoices::CustomerId))
                        .col(integer_null(Invoices::MatterId))
                        .col(string(Invoices::InvoiceNumber))
                        .col(decimal_len(Invoices::Amount, 16, 4))
                        .col(string_len(Invoices::CurrencyCode, 3))
                        .col(date(Invoices::IssueDate))
                        .col(date_null(Invoices::DueDate))
                        .col(string_len(Invoices::Status, 20).default("draft"))
                        .col(text_null(Invoices::Notes)),
                )
                .to_owned(),
            )
            .await?;

        // Create installments table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(Installments::Table)
                        .if_not_exists()
                        .col(pk_auto(Installments::Id))
                        .col(integer(Installments::InvoiceId))
                        .col(integer(Installments::CustomerId))
                        .col(decimal_len(Installments::Amount, 16, 4))
                        .col(date(Installments::DueDate))
                        .col(string_len(Installments::Status, 20).default("pending"))
                        .col(date_time_null(Installments::PaidAt)),
                )
                .to_owned(),
            )
            .await?;

        // Create time_bills table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(TimeBills::Table)
                        .if_not_exists()
                        .col(pk_auto(TimeBills::Id))
                        .col(integer(TimeBills::CustomerId))
                        .col(integer_null(TimeBills::MatterId))
                        .col(integer_null(TimeBills::UserId))
                        .col(text_null(TimeBills::Description))
                        .col(date_null(TimeBills::DateOfWork))
                        .col(string(TimeBills::Duration))
                        .col(string(TimeBills::HourlyRate))
                        .col(string_len(TimeBills::Status, 20).default("pending")),
                )
                .to_owned(),
            )
            .await?;

        // Create notes table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(Notes::Table)
                        .if_not_exists()
                        .col(pk_auto(Notes::Id))
                        .col(integer(Notes::CustomerId))
                        .col(integer_null(Notes::MatterId))
                        .col(string(Notes::Title))
                        .col(text(Notes::Content)),
                )
                .to_owned(),
            )
            .await?;

        // Create heads_ups table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(HeadsUps::Table)
                        .if_not_exists()
                        .col(pk_auto(HeadsUps::Id))
                        .col(string(HeadsUps::Title))
                        .col(text_null(HeadsUps::Message))
                        .col(integer_null(HeadsUps::CustomerId))
                        .col(string_len(HeadsUps::Frequency, 20))
                        .col(string_len(HeadsUps::TimeOfDay, 5))
                        .col(string(HeadsUps::Timezone))
                        .col(date_time_null(HeadsUps::NextRunAt))
                        .col(date_time_null(HeadsUps::LastRunAt))
                        .col(boolean(HeadsUps::IsEnabled).default(true)),
                )
                .to_owned(),
            )
            .await?;

        // Lookup indexes for the integer references queried by list filters
        manager
            .create_index(
                Index::create()
                    .name("idx_matters_customer_id")
                    .table(Matters::Table)
                    .col(Matters::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_customer_id")
                    .table(Invoices::Table)
                    .col(Invoices::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_installments_invoice_id")
                    .table(Installments::Table)
                    .col(Installments::InvoiceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_time_bills_date_of_work")
                    .table(TimeBills::Table)
                    .col(TimeBills::DateOfWork)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notes_customer_id")
                    .table(Notes::Table)
                    .col(Notes::CustomerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(HeadsUps::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TimeBills::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Installments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Matters::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    Name,
    Email,
    Phone,
    Company,
    Address,
    BusinessTypeId,
    Status,
}

#[derive(DeriveIden)]
enum Matters {
    Table,
    Id,
    CustomerId,
    Title,
    Description,
    PracticeAreaId,
    Status,
    OpenDate,
    CloseDate,
}

#[derive(DeriveIden)]
enum Invoices {
    Table,
    Id,
    CustomerId,
    MatterId,
    InvoiceNumber,
    Amount,
    CurrencyCode,
    IssueDate,
    DueDate,
    Status,
    Notes,
}

#[derive(DeriveIden)]
enum Installments {
    Table,
    Id,
    InvoiceId,
    CustomerId,
    Amount,
    DueDate,
    Status,
    PaidAt,
}

#[derive(DeriveIden)]
enum TimeBills {
    Table,
    Id,
    CustomerId,
    MatterId,
    UserId,
    Description,
    DateOfWork,
    Duration,
    HourlyRate,
    Status,
}

#[derive(DeriveIden)]
enum Notes {
    Table,
    Id,
    CustomerId,
    MatterId,
    Title,
    Content,
}

#[derive(DeriveIden)]
enum HeadsUps {
    Table,
    Id,
    Title,
    Message,
    CustomerId,
    Frequency,
    TimeOfDay,
    Timezone,
    NextRunAt,
    LastRunAt,
    IsEnabled,
}
