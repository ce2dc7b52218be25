//! Like ledger repository for complaints and comments.

use std::sync::Arc;

use crate::entities::{CommentLike, ComplaintLike, comment_like, complaint_like};
use chrono::Utc;
use denuncia_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, SqlErr, sea_query::OnConflict,
};

/// A like whose target vanished mid-request reads as a missing target.
fn insert_error(e: &DbErr, missing: impl FnOnce() -> AppError) -> AppError {
    match e.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => missing(),
        _ => AppError::Database(e.to_string()),
    }
}

/// Like repository for database operations.
///
/// Every mutation is a single statement; the unique `(target, resident)`
/// index makes concurrent duplicate likes collapse to one row.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record a complaint like. Returns `false` if the resident already liked it.
    pub async fn like_complaint(
        &self,
        id: &str,
        complaint_id: &str,
        resident_id: &str,
    ) -> AppResult<bool> {
        let model = complaint_like::ActiveModel {
            id: Set(id.to_string()),
            complaint_id: Set(complaint_id.to_string()),
            resident_id: Set(resident_id.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let rows = ComplaintLike::insert(model)
            .on_conflict(
                OnConflict::columns([
                    complaint_like::Column::ComplaintId,
                    complaint_like::Column::ResidentId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| {
                insert_error(&e, || AppError::ComplaintNotFound(complaint_id.to_string()))
            })?;
        Ok(rows > 0)
    }

    /// Remove a complaint like. Returns `false` if there was none.
    pub async fn unlike_complaint(&self, complaint_id: &str, resident_id: &str) -> AppResult<bool> {
        let res = ComplaintLike::delete_many()
            .filter(complaint_like::Column::ComplaintId.eq(complaint_id))
            .filter(complaint_like::Column::ResidentId.eq(resident_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }

    /// Residents who liked a complaint, oldest like first.
    pub async fn complaint_likers(&self, complaint_id: &str) -> AppResult<Vec<String>> {
        ComplaintLike::find()
            .select_only()
            .column(complaint_like::Column::ResidentId)
            .filter(complaint_like::Column::ComplaintId.eq(complaint_id))
            .order_by_asc(complaint_like::Column::CreatedAt)
            .order_by_asc(complaint_like::Column::Id)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a comment like. Returns `false` if the resident already liked it.
    pub async fn like_comment(
        &self,
        id: &str,
        comment_id: &str,
        resident_id: &str,
    ) -> AppResult<bool> {
        let model = comment_like::ActiveModel {
            id: Set(id.to_string()),
            comment_id: Set(comment_id.to_string()),
            resident_id: Set(resident_id.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let rows = CommentLike::insert(model)
            .on_conflict(
                OnConflict::columns([
                    comment_like::Column::CommentId,
                    comment_like::Column::ResidentId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| insert_error(&e, || AppError::CommentNotFound(comment_id.to_string())))?;
        Ok(rows > 0)
    }

    /// Remove a comment like. Returns `false` if there was none.
    pub async fn unlike_comment(&self, comment_id: &str, resident_id: &str) -> AppResult<bool> {
        let res = CommentLike::delete_many()
            .filter(comment_like::Column::CommentId.eq(comment_id))
            .filter(comment_like::Column::ResidentId.eq(resident_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected > 0)
    }

    /// Residents who liked a comment, oldest like first.
    pub async fn comment_likers(&self, comment_id: &str) -> AppResult<Vec<String>> {
        CommentLike::find()
            .select_only()
            .column(comment_like::Column::ResidentId)
            .filter(comment_like::Column::CommentId.eq(comment_id))
            .order_by_asc(comment_like::Column::CreatedAt)
            .order_by_asc(comment_like::Column::Id)
            .into_tuple::<String>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_like_reports_insert() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(repo.like_complaint("l1", "x1", "r1").await.unwrap());
        assert!(!repo.like_complaint("l2", "x1", "r1").await.unwrap());
    }

    #[tokio::test]
    async fn test_unlike_without_like() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(!repo.unlike_comment("c1", "r1").await.unwrap());
    }
}
