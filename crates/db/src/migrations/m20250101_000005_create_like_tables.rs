//! Create complaint and comment like tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ComplaintLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ComplaintLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ComplaintLike::ComplaintId).string_len(32).not_null())
                    .col(ColumnDef::new(ComplaintLike::ResidentId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(ComplaintLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_like_complaint")
                            .from(ComplaintLike::Table, ComplaintLike::ComplaintId)
                            .to(Complaint::Table, Complaint::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_complaint_like_resident")
                            .from(ComplaintLike::Table, ComplaintLike::ResidentId)
                            .to(Resident::Table, Resident::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (complaint_id, resident_id) - one like per resident per complaint
        manager
            .create_index(
                Index::create()
                    .name("idx_complaint_like_complaint_resident")
                    .table(ComplaintLike::Table)
                    .col(ComplaintLike::ComplaintId)
                    .col(ComplaintLike::ResidentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CommentLike::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CommentLike::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CommentLike::CommentId).string_len(32).not_null())
                    .col(ColumnDef::new(CommentLike::ResidentId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(CommentLike::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_like_comment")
                            .from(CommentLike::Table, CommentLike::CommentId)
                            .to(Comment::Table, Comment::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_like_resident")
                            .from(CommentLike::Table, CommentLike::ResidentId)
                            .to(Resident::Table, Resident::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (comment_id, resident_id) - one like per resident per comment
        manager
            .create_index(
                Index::create()
                    .name("idx_comment_like_comment_resident")
                    .table(CommentLike::Table)
                    .col(CommentLike::CommentId)
                    .col(CommentLike::ResidentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CommentLike::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ComplaintLike::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ComplaintLike {
    Table,
    Id,
    ComplaintId,
    ResidentId,
    CreatedAt,
}

#[derive(Iden)]
enum CommentLike {
    Table,
    Id,
    CommentId,
    ResidentId,
    CreatedAt,
}

#[derive(Iden)]
enum Complaint {
    Table,
    Id,
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
}

#[derive(Iden)]
enum Resident {
    Table,
    Id,
}
