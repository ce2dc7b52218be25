//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment, comment::CommentAuthor};
use chrono::Utc;
use denuncia_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a comment by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<comment::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CommentNotFound(id.to_string()))
    }

    /// Insert a comment already bound to its complaint.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace the text of a comment written by `author`. Returns rows updated.
    pub async fn update_description(
        &self,
        id: &str,
        author: &CommentAuthor,
        description: &str,
    ) -> AppResult<u64> {
        let res = Comment::update_many()
            .col_expr(comment::Column::Description, Expr::value(description))
            .col_expr(comment::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(comment::Column::Id.eq(id))
            .filter(comment::Column::AuthorKind.eq(author.kind()))
            .filter(comment::Column::AuthorId.eq(author.id()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected)
    }

    /// Remove a comment only if it belongs to `complaint_id`. Returns rows removed.
    pub async fn delete_from_complaint(&self, id: &str, complaint_id: &str) -> AppResult<u64> {
        let res = Comment::delete_many()
            .filter(comment::Column::Id.eq(id))
            .filter(comment::Column::ComplaintId.eq(complaint_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected)
    }

    /// Remove a comment written by `author`. Returns rows removed.
    pub async fn delete_owned(&self, id: &str, author: &CommentAuthor) -> AppResult<u64> {
        let res = Comment::delete_many()
            .filter(comment::Column::Id.eq(id))
            .filter(comment::Column::AuthorKind.eq(author.kind()))
            .filter(comment::Column::AuthorId.eq(author.id()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<comment::Model>::new()])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let result = repo.get_by_id("missing").await;
        assert!(matches!(result, Err(AppError::CommentNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_from_other_complaint_removes_nothing() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let rows = repo.delete_from_complaint("c1", "other").await.unwrap();
        assert_eq!(rows, 0);
    }
}
