//! API endpoints.

mod categories;
mod comments;
mod complaints;

use axum::{Json, Router};
use serde_json::{Value, json};

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/complaints", complaints::router())
        .nest("/comments", comments::router())
        .nest("/categories", categories::router())
}

/// Liveness probe.
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
