//! Resident repository.

use std::sync::Arc;

use crate::entities::{Resident, resident, resident::ResidentKind};
use denuncia_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Resident repository for database operations.
#[derive(Clone)]
pub struct ResidentRepository {
    db: Arc<DatabaseConnection>,
}

impl ResidentRepository {
    /// Create a new resident repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a resident by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<resident::Model>> {
        Resident::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a resident by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<resident::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Resident: {id}")))
    }

    /// Find a resident by API token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<resident::Model>> {
        Resident::find()
            .filter(resident::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a resident by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<resident::Model>> {
        Resident::find()
            .filter(resident::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find residents by IDs, in ID order.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<resident::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Resident::find()
            .filter(resident::Column::Id.is_in(ids.iter().cloned()))
            .order_by_asc(resident::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Auditors responsible for a locality.
    pub async fn find_auditors_by_locality(
        &self,
        city: &str,
        uf: &str,
    ) -> AppResult<Vec<resident::Model>> {
        Resident::find()
            .filter(resident::Column::Kind.eq(ResidentKind::Auditor))
            .filter(resident::Column::City.eq(city))
            .filter(resident::Column::Uf.eq(uf))
            .order_by_asc(resident::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new resident.
    pub async fn create(&self, model: resident::ActiveModel) -> AppResult<resident::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
