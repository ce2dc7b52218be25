//! Create resident and public agency tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Resident::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Resident::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Resident::Kind)
                            .string_len(16)
                            .not_null()
                            .default("common"),
                    )
                    .col(ColumnDef::new(Resident::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(Resident::Email)
                            .string_len(256)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Resident::Photo).string_len(512))
                    .col(ColumnDef::new(Resident::City).string_len(128).not_null())
                    .col(ColumnDef::new(Resident::Uf).string_len(2).not_null())
                    .col(ColumnDef::new(Resident::Token).string_len(64).unique_key())
                    .col(
                        ColumnDef::new(Resident::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: kind (auditor lookups for notifications)
        manager
            .create_index(
                Index::create()
                    .name("idx_resident_kind_city")
                    .table(Resident::Table)
                    .col(Resident::Kind)
                    .col(Resident::City)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PublicAgency::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PublicAgency::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PublicAgency::Name).string_len(128).not_null())
                    .col(
                        ColumnDef::new(PublicAgency::Email)
                            .string_len(256)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(PublicAgency::Photo).string_len(512))
                    .col(ColumnDef::new(PublicAgency::City).string_len(128).not_null())
                    .col(ColumnDef::new(PublicAgency::Uf).string_len(2).not_null())
                    .col(
                        ColumnDef::new(PublicAgency::Verification)
                            .string_len(16)
                            .not_null()
                            .default("unverified"),
                    )
                    .col(ColumnDef::new(PublicAgency::Token).string_len(64).unique_key())
                    .col(
                        ColumnDef::new(PublicAgency::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PublicAgency::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Resident::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Resident {
    Table,
    Id,
    Kind,
    Name,
    Email,
    Photo,
    City,
    Uf,
    Token,
    CreatedAt,
}

#[derive(Iden)]
enum PublicAgency {
    Table,
    Id,
    Name,
    Email,
    Photo,
    City,
    Uf,
    Verification,
    Token,
    CreatedAt,
}
