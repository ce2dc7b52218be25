//! Complaint repository.

use std::sync::Arc;

use crate::entities::{Complaint, complaint, complaint::ComplaintStatus};
use chrono::Utc;
use denuncia_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    prelude::Json, sea_query::Expr,
};

/// Content fields a publisher may change. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintChanges {
    /// New category.
    pub category_id: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New anonymity flag.
    pub anonymous: Option<bool>,
    /// Replacement media list.
    pub media: Option<Json>,
    /// Replacement location.
    pub location: Option<Json>,
}

impl ComplaintChanges {
    /// Whether no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.category_id.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.anonymous.is_none()
            && self.media.is_none()
            && self.location.is_none()
    }
}

/// Complaint repository for database operations.
#[derive(Clone)]
pub struct ComplaintRepository {
    db: Arc<DatabaseConnection>,
}

impl ComplaintRepository {
    /// Create a new complaint repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a complaint by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<complaint::Model>> {
        Complaint::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a complaint by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<complaint::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ComplaintNotFound(id.to_string()))
    }

    /// Whether a search id is already taken.
    pub async fn search_id_exists(&self, search_id: &str) -> AppResult<bool> {
        let count = Complaint::find()
            .filter(complaint::Column::SearchId.eq(search_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    /// Number of complaints filed under a category.
    pub async fn count_by_category(&self, category_id: &str) -> AppResult<u64> {
        Complaint::find()
            .filter(complaint::Column::CategoryId.eq(category_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new complaint.
    pub async fn create(&self, model: complaint::ActiveModel) -> AppResult<complaint::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply publisher changes in one statement.
    ///
    /// Matches only when `publisher_id` owns the complaint and, if
    /// `unreviewed_only` is set, the complaint is still unverified.
    /// Returns the number of rows updated.
    pub async fn update_content(
        &self,
        id: &str,
        publisher_id: &str,
        changes: ComplaintChanges,
        unreviewed_only: bool,
    ) -> AppResult<u64> {
        let mut update = Complaint::update_many()
            .col_expr(complaint::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::PublisherId.eq(publisher_id));

        if let Some(category_id) = changes.category_id {
            update = update.col_expr(complaint::Column::CategoryId, Expr::value(category_id));
        }
        if let Some(title) = changes.title {
            update = update.col_expr(complaint::Column::Title, Expr::value(title));
        }
        if let Some(description) = changes.description {
            update = update.col_expr(complaint::Column::Description, Expr::value(description));
        }
        if let Some(anonymous) = changes.anonymous {
            update = update.col_expr(complaint::Column::Anonymous, Expr::value(anonymous));
        }
        if let Some(media) = changes.media {
            update = update.col_expr(complaint::Column::Media, Expr::value(media));
        }
        if let Some(location) = changes.location {
            update = update.col_expr(complaint::Column::Location, Expr::value(location));
        }
        if unreviewed_only {
            update = update.filter(complaint::Column::Status.eq(ComplaintStatus::Unverified));
        }

        let res = update
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected)
    }

    /// Set the moderation status in one statement.
    ///
    /// With `from` set, only a complaint currently in that status is changed.
    /// Returns the number of rows updated.
    pub async fn transition_status(
        &self,
        id: &str,
        to: ComplaintStatus,
        rejection_reason: Option<String>,
        from: Option<ComplaintStatus>,
    ) -> AppResult<u64> {
        let mut update = Complaint::update_many()
            .col_expr(complaint::Column::Status, Expr::value(to))
            .col_expr(complaint::Column::RejectionReason, Expr::value(rejection_reason))
            .col_expr(complaint::Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(complaint::Column::Id.eq(id));

        if let Some(from) = from {
            update = update.filter(complaint::Column::Status.eq(from));
        }

        let res = update
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected)
    }

    /// Delete a complaint owned by `publisher_id`. Returns the number of rows removed.
    pub async fn delete_owned(&self, id: &str, publisher_id: &str) -> AppResult<u64> {
        let res = Complaint::delete_many()
            .filter(complaint::Column::Id.eq(id))
            .filter(complaint::Column::PublisherId.eq(publisher_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(res.rows_affected)
    }
}
