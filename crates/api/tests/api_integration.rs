//! API integration tests.
//!
//! Each test builds the full router over a migrated in-memory database and
//! drives it with `oneshot` requests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    middleware,
    routing::get,
};
use denuncia_api::{AppState, healthz, middleware::auth_middleware, router as api_router};
use denuncia_common::Config;
use denuncia_core::NoOpNotifier;
use denuncia_db::{
    entities::{complaint::ComplaintStatus, resident::ResidentKind},
    test_utils::{ComplaintFixture, TestDatabase},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Create the test router.
fn create_test_router(db: &TestDatabase) -> Router {
    let config = Config::for_database("sqlite::memory:");
    let state = AppState::new(db.connection(), &config, Some(Arc::new(NoOpNotifier)));

    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

async fn post(app: &Router, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_healthz() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_store_failure_during_auth_is_a_server_error() {
    // No queued results: every query against this connection fails.
    let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
    let config = Config::for_database("sqlite::memory:");
    let state = AppState::new(db, &config, Some(Arc::new(NoOpNotifier)));
    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state);

    let (status, body) = post(&app, "/api/complaints/list", Some("tok"), json!({})).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);
    let (status, _) = post(&app, "/api/complaints/nope", None, json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_half_cursor_is_a_validation_error() {
    let db = TestDatabase::in_memory().await.unwrap();
    let app = create_test_router(&db);

    let (status, body) = post(
        &app,
        "/api/complaints/from-city",
        None,
        json!({"city": "Brumadinho", "uf": "MG", "lastId": "01hx"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_auditor_feed_requires_account_and_role() {
    let db = TestDatabase::in_memory().await.unwrap();
    let common = db.insert_resident(ResidentKind::Common, "Caio").await.unwrap();
    let auditor = db.insert_resident(ResidentKind::Auditor, "Dora").await.unwrap();
    let app = create_test_router(&db);

    let (status, _) = post(&app, "/api/complaints/list", None, json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(&app, "/api/complaints/list", Some("bogus"), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post(
        &app,
        "/api/complaints/list",
        common.token.as_deref(),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = post(
        &app,
        "/api/complaints/list",
        auditor.token.as_deref(),
        json!({"sortBased": "relevance", "order": -1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_anonymous_filing_and_lookup() {
    let db = TestDatabase::in_memory().await.unwrap();
    let category = db.insert_category("Iluminação").await.unwrap();
    let resident = db.insert_resident(ResidentKind::Common, "Beto").await.unwrap();
    let app = create_test_router(&db);

    let (status, body) = post(
        &app,
        "/api/complaints/create",
        resident.token.as_deref(),
        json!({
            "category": category.id,
            "title": "Poste caído",
            "description": "Poste caído na praça",
            "anonymous": true,
            "location": {"type": "Point", "coordinates": [-44.2, -20.14]}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let search_id = body["data"]["searchId"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "unverified");

    let (status, body) = post(
        &app,
        "/api/complaints/show",
        None,
        json!({"searchId": search_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let shown = &body["data"];
    assert_eq!(shown["title"], "Poste caído");
    assert_eq!(shown["publisher"], Value::Null);
    assert_eq!(shown["category"]["name"], "Iluminação");
    assert!(shown.get("ip_address").is_none());
    assert!(shown.get("ipAddress").is_none());
    assert!(shown.get("searchId").is_none());
    assert!(shown.get("relevance").is_none());
}

#[tokio::test]
async fn test_named_filing_requires_account() {
    let db = TestDatabase::in_memory().await.unwrap();
    let category = db.insert_category("Ruído").await.unwrap();
    let app = create_test_router(&db);

    let (status, _) = post(
        &app,
        "/api/complaints/create",
        None,
        json!({
            "category": category.id,
            "title": "Som alto",
            "description": "Festa toda noite",
            "location": {"type": "Point", "coordinates": [-44.2, -20.14]}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_like_twice_conflicts() {
    let db = TestDatabase::in_memory().await.unwrap();
    let category = db.insert_category("Água").await.unwrap();
    let resident = db.insert_resident(ResidentKind::Common, "Gabi").await.unwrap();
    let complaint = db
        .insert_complaint(ComplaintFixture::new(&category.id))
        .await
        .unwrap();
    let app = create_test_router(&db);
    let token = resident.token.as_deref();

    let (status, body) = post(
        &app,
        "/api/complaints/like",
        token,
        json!({"complaintId": complaint.id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likes"], json!([resident.id]));

    let (status, body) = post(
        &app,
        "/api/complaints/like",
        token,
        json!({"complaintId": complaint.id}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = post(
        &app,
        "/api/complaints/likes",
        None,
        json!({"complaintId": complaint.id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([{"id": resident.id, "name": "Gabi"}]));
}

#[tokio::test]
async fn test_moderation_flow() {
    let db = TestDatabase::in_memory().await.unwrap();
    let category = db.insert_category("Lixo").await.unwrap();
    let auditor = db.insert_resident(ResidentKind::Auditor, "Hugo").await.unwrap();
    let complaint = db
        .insert_complaint(ComplaintFixture::new(&category.id))
        .await
        .unwrap();
    let app = create_test_router(&db);
    let token = auditor.token.as_deref();

    let (status, _) = post(
        &app,
        "/api/complaints/moderate",
        token,
        json!({"complaintId": complaint.id, "status": "rejected"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(
        &app,
        "/api/complaints/moderate",
        token,
        json!({"complaintId": complaint.id, "status": "accepted"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "accepted");

    let (status, body) = post(
        &app,
        "/api/complaints/from-city",
        None,
        json!({"city": "Brumadinho", "uf": "MG"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"], complaint.id.as_str());

    let (status, body) = post(
        &app,
        "/api/complaints/from-city",
        None,
        json!({"city": "Brumadinho", "uf": "MG", "category": "no-such-category"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let (status, body) = post(
        &app,
        "/api/complaints/from-status-and-city",
        token,
        json!({"status": "unverified", "city": "Brumadinho", "uf": "MG"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));

    let stored = denuncia_db::repositories::ComplaintRepository::new(db.connection())
        .get_by_id(&complaint.id)
        .await
        .unwrap();
    assert_eq!(stored.status, ComplaintStatus::Accepted);
}

#[tokio::test]
async fn test_comment_round_trip_over_http() {
    let db = TestDatabase::in_memory().await.unwrap();
    let category = db.insert_category("Esgoto").await.unwrap();
    let publisher = db.insert_resident(ResidentKind::Common, "Íris").await.unwrap();
    let agency = db.insert_agency("Copasa").await.unwrap();
    let complaint = db
        .insert_complaint(ComplaintFixture::new(&category.id).published_by(&publisher.id))
        .await
        .unwrap();
    let app = create_test_router(&db);

    let (status, body) = post(
        &app,
        "/api/complaints/comment",
        agency.token.as_deref(),
        json!({"complaintId": complaint.id, "description": "Equipe a caminho"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let comments = body["data"]["publicAgenciesComments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["userType"], "PublicAgency");
    let comment_id = comments[0]["id"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/api/comments/show",
        None,
        json!({"commentId": comment_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["publisher"]["name"], "Copasa");

    let (status, body) = post(
        &app,
        "/api/complaints/remove-comment",
        publisher.token.as_deref(),
        json!({"complaintId": complaint.id, "commentId": comment_id}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["publicAgenciesComments"], json!([]));
}

#[tokio::test]
async fn test_category_admin_routes() {
    let db = TestDatabase::in_memory().await.unwrap();
    let admin = db.insert_resident(ResidentKind::Admin, "Jade").await.unwrap();
    let app = create_test_router(&db);

    let (status, body) = post(
        &app,
        "/api/categories/create",
        admin.token.as_deref(),
        json!({"name": "Trânsito", "description": "Semáforos e sinalização"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Trânsito");

    let (status, _) = post(
        &app,
        "/api/categories/create",
        admin.token.as_deref(),
        json!({"name": "Trânsito"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = post(&app, "/api/categories/list", None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}
