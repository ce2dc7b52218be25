//! Comment endpoints.

use axum::{Json, Router, extract::State, routing::post};
use denuncia_common::AppResult;
use denuncia_core::{EnrichedComment, EnrichedComplaint, Liker, UpdateCommentInput};
use serde::Deserialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Any request naming a single comment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentIdRequest {
    pub comment_id: String,
}

/// Show a comment.
async fn show(
    State(state): State<AppState>,
    Json(req): Json<CommentIdRequest>,
) -> AppResult<ApiResponse<EnrichedComment>> {
    let comment = state.comment_service.get(&req.comment_id).await?;
    Ok(ApiResponse::ok(comment))
}

/// Residents who liked a comment.
async fn likes(
    State(state): State<AppState>,
    Json(req): Json<CommentIdRequest>,
) -> AppResult<ApiResponse<Vec<Liker>>> {
    let likers = state
        .interaction_service
        .comment_likers(&req.comment_id)
        .await?;
    Ok(ApiResponse::ok(likers))
}

/// Edit the caller's comment.
async fn update(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateCommentInput>,
) -> AppResult<ApiResponse<EnrichedComment>> {
    let comment = state.comment_service.update(&account, req).await?;
    Ok(ApiResponse::ok(comment))
}

/// Delete the caller's comment.
async fn delete(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommentIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .comment_service
        .delete(&account, &req.comment_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Like a comment.
async fn like(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommentIdRequest>,
) -> AppResult<ApiResponse<EnrichedComplaint>> {
    let complaint = state
        .interaction_service
        .like_comment(&account, &req.comment_id)
        .await?;
    Ok(ApiResponse::ok(complaint))
}

/// Unlike a comment.
async fn unlike(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CommentIdRequest>,
) -> AppResult<ApiResponse<EnrichedComplaint>> {
    let complaint = state
        .interaction_service
        .unlike_comment(&account, &req.comment_id)
        .await?;
    Ok(ApiResponse::ok(complaint))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/show", post(show))
        .route("/likes", post(likes))
        .route("/update", post(update))
        .route("/delete", post(delete))
        .route("/like", post(like))
        .route("/unlike", post(unlike))
}
