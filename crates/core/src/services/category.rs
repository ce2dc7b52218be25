//! Category service.

use crate::services::account::Account;
use chrono::Utc;
use denuncia_common::{AppError, AppResult, IdGenerator};
use denuncia_db::{
    entities::category,
    repositories::{CategoryRepository, ComplaintRepository},
};
use sea_orm::{IntoActiveModel, Set};
use serde::Deserialize;
use validator::Validate;

/// Input for creating a category.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryInput {
    #[validate(length(min = 2, max = 50))]
    pub name: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Input for updating a category.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryInput {
    pub category_id: String,

    #[validate(length(min = 2, max = 50))]
    pub name: Option<String>,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

/// Category service for business logic.
#[derive(Clone)]
pub struct CategoryService {
    category_repo: CategoryRepository,
    complaint_repo: ComplaintRepository,
    id_gen: IdGenerator,
}

impl CategoryService {
    /// Create a new category service.
    #[must_use]
    pub const fn new(category_repo: CategoryRepository, complaint_repo: ComplaintRepository) -> Self {
        Self {
            category_repo,
            complaint_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List all categories.
    pub async fn list(&self) -> AppResult<Vec<category::Model>> {
        self.category_repo.list().await
    }

    /// Get a category.
    pub async fn get(&self, id: &str) -> AppResult<category::Model> {
        self.category_repo.get_by_id(id).await
    }

    /// Create a category. Names are unique.
    pub async fn create(
        &self,
        caller: &Account,
        input: CreateCategoryInput,
    ) -> AppResult<category::Model> {
        caller.require_admin()?;
        input.validate()?;

        let name = input.name.trim().to_string();
        if self.category_repo.find_by_name(&name).await?.is_some() {
            return Err(AppError::Conflict(format!("Category {name} already exists")));
        }

        let model = category::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name),
            description: Set(input.description),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let created = self.category_repo.create(model).await?;
        tracing::info!(category_id = %created.id, name = %created.name, "Category created");
        Ok(created)
    }

    /// Rename or re-describe a category.
    pub async fn update(
        &self,
        caller: &Account,
        input: UpdateCategoryInput,
    ) -> AppResult<category::Model> {
        caller.require_admin()?;
        input.validate()?;

        let existing = self.category_repo.get_by_id(&input.category_id).await?;
        let mut active = existing.clone().into_active_model();
        let mut changed = false;

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name != existing.name {
                if self.category_repo.find_by_name(&name).await?.is_some() {
                    return Err(AppError::Conflict(format!("Category {name} already exists")));
                }
                active.name = Set(name);
                changed = true;
            }
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
            changed = true;
        }

        if !changed {
            return Ok(existing);
        }
        self.category_repo.update(active).await
    }

    /// Delete a category that no complaint uses.
    pub async fn delete(&self, caller: &Account, id: &str) -> AppResult<()> {
        caller.require_admin()?;

        let in_use = self.complaint_repo.count_by_category(id).await?;
        if in_use > 0 {
            return Err(AppError::Conflict(format!(
                "Category is used by {in_use} complaints"
            )));
        }

        if !self.category_repo.delete(id).await? {
            return Err(AppError::CategoryNotFound(id.to_string()));
        }
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
