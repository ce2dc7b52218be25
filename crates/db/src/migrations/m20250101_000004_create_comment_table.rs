//! Create comment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comment::ComplaintId).string_len(32).not_null())
                    .col(ColumnDef::new(Comment::AuthorKind).string_len(16).not_null())
                    .col(ColumnDef::new(Comment::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Comment::Description).text().not_null())
                    .col(
                        ColumnDef::new(Comment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Comment::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_complaint")
                            .from(Comment::Table, Comment::ComplaintId)
                            .to(Complaint::Table, Complaint::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (complaint_id, id) for insertion-ordered comment threads
        manager
            .create_index(
                Index::create()
                    .name("idx_comment_complaint_id")
                    .table(Comment::Table)
                    .col(Comment::ComplaintId)
                    .col(Comment::Id)
                    .to_owned(),
            )
            .await?;

        // Index: (author_kind, author_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_comment_author")
                    .table(Comment::Table)
                    .col(Comment::AuthorKind)
                    .col(Comment::AuthorId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
    ComplaintId,
    AuthorKind,
    AuthorId,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
}
