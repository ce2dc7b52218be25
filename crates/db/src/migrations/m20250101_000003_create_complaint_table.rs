//! Create complaint table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Complaint::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Complaint::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Complaint::SearchId)
                            .string_len(8)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Complaint::CategoryId).string_len(32).not_null())
                    .col(ColumnDef::new(Complaint::Title).string_len(128).not_null())
                    .col(ColumnDef::new(Complaint::Description).text().not_null())
                    .col(
                        ColumnDef::new(Complaint::Anonymous)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Complaint::PublisherId).string_len(32))
                    .col(ColumnDef::new(Complaint::Media).json_binary().not_null().default("[]"))
                    .col(
                        ColumnDef::new(Complaint::Status)
                            .string_len(16)
                            .not_null()
                            .default("unverified"),
                    )
                    .col(ColumnDef::new(Complaint::RejectionReason).text())
                    .col(ColumnDef::new(Complaint::Location).json_binary().not_null())
                    .col(ColumnDef::new(Complaint::City).string_len(128).not_null())
                    .col(ColumnDef::new(Complaint::Uf).string_len(2).not_null())
                    .col(ColumnDef::new(Complaint::IpAddress).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Complaint::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Complaint::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_category")
                            .from(Complaint::Table, Complaint::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_publisher")
                            .from(Complaint::Table, Complaint::PublisherId)
                            .to(Resident::Table, Resident::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, city, uf, created_at) for the listing feeds
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_status_city_created")
                    .table(Complaint::Table)
                    .col(Complaint::Status)
                    .col(Complaint::City)
                    .col(Complaint::Uf)
                    .col(Complaint::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: publisher_id (for a resident's own complaints)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_publisher_id")
                    .table(Complaint::Table)
                    .col(Complaint::PublisherId)
                    .to_owned(),
            )
            .await?;

        // Index: (created_at, id) for keyset pagination
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_created_at_id")
                    .table(Complaint::Table)
                    .col(Complaint::CreatedAt)
                    .col(Complaint::Id)
                    .to_owned(),
            )
            .await?;

        // Index: category_id (category usage checks)
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_category_id")
                    .table(Complaint::Table)
                    .col(Complaint::CategoryId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Complaint::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
    SearchId,
    CategoryId,
    Title,
    Description,
    Anonymous,
    PublisherId,
    Media,
    Status,
    RejectionReason,
    Location,
    City,
    Uf,
    IpAddress,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Category {
    Table,
    Id,
}

#[derive(Iden)]
enum Resident {
    Table,
    Id,
}
