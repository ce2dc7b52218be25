//! Public agency repository.

use std::sync::Arc;

use crate::entities::{PublicAgency, public_agency};
use denuncia_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// Public agency repository for database operations.
#[derive(Clone)]
pub struct PublicAgencyRepository {
    db: Arc<DatabaseConnection>,
}

impl PublicAgencyRepository {
    /// Create a new public agency repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an agency by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<public_agency::Model>> {
        PublicAgency::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an agency by API token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<public_agency::Model>> {
        PublicAgency::find()
            .filter(public_agency::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new agency.
    pub async fn create(
        &self,
        model: public_agency::ActiveModel,
    ) -> AppResult<public_agency::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
