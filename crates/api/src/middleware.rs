//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use denuncia_common::{AppError, Config};
use denuncia_core::{
    AccountService, CategoryService, CommentService, ComplaintService, FeedService,
    InteractionService, ModerationService, NotifierService,
};
use denuncia_db::repositories::{
    CategoryRepository, CommentRepository, ComplaintRepository, FeedRepository, LikeRepository,
    PublicAgencyRepository, ResidentRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub feed_service: FeedService,
    pub complaint_service: ComplaintService,
    pub moderation_service: ModerationService,
    pub interaction_service: InteractionService,
    pub comment_service: CommentService,
    pub category_service: CategoryService,
}

impl AppState {
    /// Wire every service over one connection pool.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: &Config,
        notifier: Option<NotifierService>,
    ) -> Self {
        let resident_repo = ResidentRepository::new(Arc::clone(&db));
        let agency_repo = PublicAgencyRepository::new(Arc::clone(&db));
        let category_repo = CategoryRepository::new(Arc::clone(&db));
        let complaint_repo = ComplaintRepository::new(Arc::clone(&db));
        let comment_repo = CommentRepository::new(Arc::clone(&db));
        let like_repo = LikeRepository::new(Arc::clone(&db));
        let feed_repo = FeedRepository::new(db);

        let feed_service = FeedService::new(feed_repo, config);
        let mut complaint_service = ComplaintService::new(
            complaint_repo.clone(),
            category_repo.clone(),
            resident_repo.clone(),
            feed_service.clone(),
            config,
        );
        let mut moderation_service =
            ModerationService::new(complaint_repo.clone(), feed_service.clone(), config);
        let mut interaction_service = InteractionService::new(
            like_repo,
            comment_repo.clone(),
            complaint_repo.clone(),
            resident_repo.clone(),
            feed_service.clone(),
            config,
        );

        if let Some(notifier) = notifier {
            complaint_service.set_notifier(notifier.clone());
            moderation_service.set_notifier(notifier.clone());
            interaction_service.set_notifier(notifier);
        }

        Self {
            account_service: AccountService::new(resident_repo, agency_repo),
            comment_service: CommentService::new(comment_repo, feed_service.clone()),
            category_service: CategoryService::new(category_repo, complaint_repo),
            feed_service,
            complaint_service,
            moderation_service,
            interaction_service,
        }
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` into an [`denuncia_core::Account`]
/// request extension. Requests with an unknown token continue anonymously;
/// endpoints that need an account reject them. A store failure while
/// resolving the token ends the request with that error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.account_service.authenticate_by_token(token.trim()).await {
            Ok(account) => {
                req.extensions_mut().insert(account);
            }
            Err(AppError::Unauthorized) => {
                tracing::debug!("Unknown bearer token");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve bearer token");
                return e.into_response();
            }
        }
    }

    next.run(req).await
}
