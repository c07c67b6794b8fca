use sea_orm_migration::{prelude::*, schema::*};

use crate::bookkeeping::with_bookkeeping;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(pk_auto(Users::Id))
                        .col(string(Users::Name))
                        .col(string(Users::Email))
                        .col(string(Users::PasswordHash))
                        .col(string_len(Users::Role, 20).default("user"))
                        .col(string_null(Users::Otp))
                        .col(date_time_null(Users::OtpExpiresAt))
                        .col(integer_null(Users::GroupId)),
                )
                .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_group_id")
                    .table(Users::Table)
                    .col(Users::GroupId)
                    .to_owned(),
            )
            .await?;

        // Create user_groups table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(UserGroups::Table)
                        .if_not_exists()
                        .col(pk_auto(UserGroups::Id))
                        .col(string(UserGroups::Title))
                        .col(text_null(UserGroups::Description))
                        .col(json(UserGroups::DefaultPermissions))
                        .col(json(UserGroups::CustomPermissions))
                        .col(boolean(UserGroups::IsActive).default(true)),
                )
                .to_owned(),
            )
            .await?;

        // Create currencies table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(Currencies::Table)
                        .if_not_exists()
                        .col(pk_auto(Currencies::Id))
                        .col(string_len(Currencies::CurrencyCode, 3))
                        .col(string(Currencies::Name))
                        .col(string_null(Currencies::Symbol))
                        .col(decimal_len(Currencies::ExchangeRate, 16, 6).default(1))
                        .col(boolean(Currencies::IsActive).default(true)),
                )
                .to_owned(),
            )
            .await?;

        // Create business_types table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(BusinessTypes::Table)
                        .if_not_exists()
                        .col(pk_auto(BusinessTypes::Id))
                        .col(string(BusinessTypes::Name))
                        .col(text_null(BusinessTypes::Description))
                        .col(boolean(BusinessTypes::IsActive).default(true)),
                )
                .to_owned(),
            )
            .await?;

        // Create business_entities table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(BusinessEntities::Table)
                        .if_not_exists()
                        .col(pk_auto(BusinessEntities::Id))
                        .col(integer(BusinessEntities::BusinessTypeId))
                        .col(string(BusinessEntities::Name))
                        .col(text_null(BusinessEntities::Description)),
                )
                .to_owned(),
            )
            .await?;

        // Create practice_areas table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(PracticeAreas::Table)
                        .if_not_exists()
                        .col(pk_auto(PracticeAreas::Id))
                        .col(string(PracticeAreas::Name))
                        .col(text_null(PracticeAreas::Description)),
                )
                .to_owned(),
            )
            .await?;

        // Create subcategories table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(Subcategories::Table)
                        .if_not_exists()
                        .col(pk_auto(Subcategories::Id))
                        .col(integer(Subcategories::PracticeAreaId))
                        .col(string(Subcategories::Name))
                        .col(text_null(Subcategories::Description)),
                )
                .to_owned(),
            )
            .await?;

        // Create custom_field_groups table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(CustomFieldGroups::Table)
                        .if_not_exists()
                        .col(pk_auto(CustomFieldGroups::Id))
                        .col(integer(CustomFieldGroups::SubcategoryId))
                        .col(string(CustomFieldGroups::Title))
                        .col(integer(CustomFieldGroups::SortOrder).default(0)),
                )
                .to_owned(),
            )
            .await?;

        // Create custom_fields table
        manager
            .create_table(
                with_bookkeeping(
                    Table::create()
                        .table(CustomFields::Table)
                        .if_not_exists()
                        .col(pk_auto(CustomFields::Id))
                        .col(integer(CustomFields::GroupId))
                        .col(string(CustomFields::Label))
                        .col(string_len(CustomFields::FieldType, 20))
                        .col(json(CustomFields::Options))
                        .col(boolean(CustomFields::IsRequired).default(false))
                        .col(integer(CustomFields::SortOrder).default(0)),
                )
                .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomFields::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomFieldGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Subcategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PracticeAreas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BusinessEntities::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(BusinessTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Currencies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Role,
    Otp,
    OtpExpiresAt,
    GroupId,
}

#[derive(DeriveIden)]
enum UserGroups {
    Table,
    Id,
    Title,
    Description,
    DefaultPermissions,
    CustomPermissions,
    IsActive,
}

#[derive(DeriveIden)]
enum Currencies {
    Table,
    Id,
    CurrencyCode,
    Name,
    Symbol,
    ExchangeRate,
    IsActive,
}

#[derive(DeriveIden)]
enum BusinessTypes {
    Table,
    Id,
    Name,
    Description,
    IsActive,
}

#[derive(DeriveIden)]
enum BusinessEntities {
    Table,
    Id,
    BusinessTypeId,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum PracticeAreas {
    Table,
    Id,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum Subcategories {
    Table,
    Id,
    PracticeAreaId,
    Name,
    Description,
}

#[derive(DeriveIden)]
enum CustomFieldGroups {
    Table,
    Id,
    SubcategoryId,
    Title,
    SortOrder,
}

#[derive(DeriveIden)]
enum CustomFields {
    Table,
    Id,
    GroupId,
    Label,
    FieldType,
    Options,
    IsRequired,
    SortOrder,
}
