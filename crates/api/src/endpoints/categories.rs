//! Category endpoints.

use axum::{Json, Router, extract::State, routing::post};
use denuncia_common::AppResult;
use denuncia_core::{CreateCategoryInput, UpdateCategoryInput};
use denuncia_db::entities::category;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Category response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created: String,
}

impl From<category::Model> for CategoryResponse {
    fn from(c: category::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            created: c.created_at.to_rfc3339(),
        }
    }
}

/// Any request naming a single category.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryIdRequest {
    pub category_id: String,
}

/// List categories.
async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<CategoryResponse>>> {
    let categories = state.category_service.list().await?;
    Ok(ApiResponse::ok(
        categories.into_iter().map(Into::into).collect(),
    ))
}

/// Show a category.
async fn show(
    State(state): State<AppState>,
    Json(req): Json<CategoryIdRequest>,
) -> AppResult<ApiResponse<CategoryResponse>> {
    let category = state.category_service.get(&req.category_id).await?;
    Ok(ApiResponse::ok(category.into()))
}

/// Create a category (admins).
async fn create(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCategoryInput>,
) -> AppResult<ApiResponse<CategoryResponse>> {
    let category = state.category_service.create(&account, req).await?;
    Ok(ApiResponse::ok(category.into()))
}

/// Update a category (admins).
async fn update(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateCategoryInput>,
) -> AppResult<ApiResponse<CategoryResponse>> {
    let category = state.category_service.update(&account, req).await?;
    Ok(ApiResponse::ok(category.into()))
}

/// Delete an unused category (admins).
async fn delete(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CategoryIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .category_service
        .delete(&account, &req.category_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
}
