//! Complaint endpoints.

use axum::{Json, Router, extract::State, routing::post};
use denuncia_common::AppResult;
use denuncia_core::{
    AttachCommentInput, ComplaintReceipt, CreateComplaintInput, DetachCommentInput,
    EnrichedComplaint, Liker, ModerateInput, PageRequest, UpdateComplaintInput,
};
use denuncia_db::entities::complaint::ComplaintStatus;
use serde::Deserialize;

use crate::{
    extractors::{AuthUser, ClientIp, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

// ==================== Request Types ====================

/// Auditor feed of every complaint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(flatten)]
    pub page: PageRequest,
}

/// Feed of one city.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FromCityRequest {
    pub city: String,
    pub uf: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(flatten)]
    pub page: PageRequest,
}

/// The caller's own complaints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FromEmailRequest {
    pub email: String,
    #[serde(default)]
    pub status: Option<ComplaintStatus>,
    #[serde(flatten)]
    pub page: PageRequest,
}

/// Auditor feed of one city in one status.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FromStatusAndCityRequest {
    pub status: ComplaintStatus,
    pub city: String,
    pub uf: String,
    #[serde(flatten)]
    pub page: PageRequest,
}

/// Lookup by public search id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowComplaintRequest {
    pub search_id: String,
}

/// Any request naming a single complaint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintIdRequest {
    pub complaint_id: String,
}

// ==================== Handlers ====================

/// Every complaint (auditors).
async fn list(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> AppResult<ApiResponse<Vec<EnrichedComplaint>>> {
    let page = state
        .feed_service
        .list(&account, req.category.as_deref(), &req.page)
        .await?;
    Ok(ApiResponse::ok(page))
}

/// Accepted complaints of a city.
async fn from_city(
    State(state): State<AppState>,
    Json(req): Json<FromCityRequest>,
) -> AppResult<ApiResponse<Vec<EnrichedComplaint>>> {
    let page = state
        .feed_service
        .by_city(&req.city, &req.uf, req.category.as_deref(), &req.page)
        .await?;
    Ok(ApiResponse::ok(page))
}

/// The caller's complaints.
async fn from_email(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FromEmailRequest>,
) -> AppResult<ApiResponse<Vec<EnrichedComplaint>>> {
    let page = state
        .feed_service
        .by_publisher(&account, &req.email, req.status, &req.page)
        .await?;
    Ok(ApiResponse::ok(page))
}

/// Complaints of a city in a status (auditors).
async fn from_status_and_city(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FromStatusAndCityRequest>,
) -> AppResult<ApiResponse<Vec<EnrichedComplaint>>> {
    let page = state
        .feed_service
        .by_status_and_city(&account, req.status, &req.city, &req.uf, &req.page)
        .await?;
    Ok(ApiResponse::ok(page))
}

/// Show a complaint.
async fn show(
    State(state): State<AppState>,
    Json(req): Json<ShowComplaintRequest>,
) -> AppResult<ApiResponse<EnrichedComplaint>> {
    let complaint = state.feed_service.by_search_id(&req.search_id).await?;
    Ok(ApiResponse::ok(complaint))
}

/// Residents who liked a complaint.
async fn likes(
    State(state): State<AppState>,
    Json(req): Json<ComplaintIdRequest>,
) -> AppResult<ApiResponse<Vec<Liker>>> {
    let likers = state
        .interaction_service
        .complaint_likers(&req.complaint_id)
        .await?;
    Ok(ApiResponse::ok(likers))
}

/// File a complaint.
async fn create(
    MaybeAuthUser(account): MaybeAuthUser,
    ClientIp(ip): ClientIp,
    State(state): State<AppState>,
    Json(req): Json<CreateComplaintInput>,
) -> AppResult<ApiResponse<ComplaintReceipt>> {
    let receipt = state
        .complaint_service
        .create(account.as_ref(), &ip, req)
        .await?;
    Ok(ApiResponse::ok(receipt))
}

/// Edit a complaint.
async fn update(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateComplaintInput>,
) -> AppResult<ApiResponse<EnrichedComplaint>> {
    let complaint = state.complaint_service.update(&account, req).await?;
    Ok(ApiResponse::ok(complaint))
}

/// Delete a complaint.
async fn delete(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ComplaintIdRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .complaint_service
        .delete(&account, &req.complaint_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Accept or reject a complaint.
async fn moderate(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ModerateInput>,
) -> AppResult<ApiResponse<EnrichedComplaint>> {
    let complaint = state.moderation_service.moderate(&account, req).await?;
    Ok(ApiResponse::ok(complaint))
}

/// Like a complaint.
async fn like(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ComplaintIdRequest>,
) -> AppResult<ApiResponse<EnrichedComplaint>> {
    let complaint = state
        .interaction_service
        .like_complaint(&account, &req.complaint_id)
        .await?;
    Ok(ApiResponse::ok(complaint))
}

/// Unlike a complaint.
async fn unlike(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ComplaintIdRequest>,
) -> AppResult<ApiResponse<EnrichedComplaint>> {
    let complaint = state
        .interaction_service
        .unlike_complaint(&account, &req.complaint_id)
        .await?;
    Ok(ApiResponse::ok(complaint))
}

/// Comment on a complaint.
async fn comment(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AttachCommentInput>,
) -> AppResult<ApiResponse<EnrichedComplaint>> {
    let complaint = state
        .interaction_service
        .attach_comment(&account, req)
        .await?;
    Ok(ApiResponse::ok(complaint))
}

/// Remove a comment from a complaint.
async fn remove_comment(
    AuthUser(account): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DetachCommentInput>,
) -> AppResult<ApiResponse<EnrichedComplaint>> {
    let complaint = state
        .interaction_service
        .detach_comment(&account, req)
        .await?;
    Ok(ApiResponse::ok(complaint))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/from-city", post(from_city))
        .route("/from-email", post(from_email))
        .route("/from-status-and-city", post(from_status_and_city))
        .route("/show", post(show))
        .route("/likes", post(likes))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
        .route("/moderate", post(moderate))
        .route("/like", post(like))
        .route("/unlike", post(unlike))
        .route("/comment", post(comment))
        .route("/remove-comment", post(remove_comment))
}
