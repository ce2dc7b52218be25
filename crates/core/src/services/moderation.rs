//! Moderation of filed complaints.
//!
//! Complaints start `unverified` and an auditor moves them to `accepted` or
//! `rejected`. Whether a reviewed complaint may be reviewed again is the
//! `moderation.allow_remoderation` policy. Each transition is a single
//! conditional update, so two auditors racing on the same complaint cannot
//! both win when re-moderation is off.

use std::time::Duration;

use crate::services::{
    account::Account,
    feed::FeedService,
    notification::{NotificationEvent, NotifierService, dispatch},
    projection::EnrichedComplaint,
};
use denuncia_common::{AppError, AppResult, Config, with_deadline};
use denuncia_db::{entities::complaint::ComplaintStatus, repositories::ComplaintRepository};
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// A blank reason counts as absent; anything else is measured after trimming.
#[allow(clippy::ptr_arg)]
fn validate_reason(reason: &String) -> Result<(), ValidationError> {
    let len = reason.trim().chars().count();
    if len == 0 || (2..=500).contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::new("rejection_reason_length"))
    }
}

/// Input for moderating a complaint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ModerateInput {
    pub complaint_id: String,

    pub status: ComplaintStatus,

    #[serde(rename = "rejection_reason", alias = "rejectionReason", default)]
    #[validate(custom(function = "validate_reason"))]
    pub rejection_reason: Option<String>,
}

/// Moderation service.
#[derive(Clone)]
pub struct ModerationService {
    complaint_repo: ComplaintRepository,
    feed: FeedService,
    allow_remoderation: bool,
    timeout: Duration,
    notifier: Option<NotifierService>,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub fn new(complaint_repo: ComplaintRepository, feed: FeedService, config: &Config) -> Self {
        Self {
            complaint_repo,
            feed,
            allow_remoderation: config.moderation.allow_remoderation,
            timeout: config.database.operation_timeout(),
            notifier: None,
        }
    }

    /// Set the notifier (optional).
    pub fn set_notifier(&mut self, notifier: NotifierService) {
        self.notifier = Some(notifier);
    }

    /// Move a complaint to `accepted` or `rejected`. Auditors only.
    pub async fn moderate(
        &self,
        caller: &Account,
        input: ModerateInput,
    ) -> AppResult<EnrichedComplaint> {
        let auditor = caller.require_auditor()?;
        input.validate()?;

        let reason = match input.status {
            ComplaintStatus::Unverified => {
                return Err(AppError::Validation(
                    "status must be accepted or rejected".to_string(),
                ));
            }
            ComplaintStatus::Accepted => None,
            ComplaintStatus::Rejected => {
                let reason = input
                    .rejection_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| {
                        AppError::Validation(
                            "rejection_reason is required when rejecting".to_string(),
                        )
                    })?;
                Some(reason.to_string())
            }
        };

        let from = (!self.allow_remoderation).then_some(ComplaintStatus::Unverified);
        let updated = with_deadline(
            self.timeout,
            "complaint moderation",
            self.complaint_repo.transition_status(
                &input.complaint_id,
                input.status,
                reason.clone(),
                from,
            ),
        )
        .await?;

        let current = with_deadline(
            self.timeout,
            "complaint lookup",
            self.complaint_repo.get_by_id(&input.complaint_id),
        )
        .await?;
        if updated == 0 {
            return Err(AppError::Conflict(format!(
                "Complaint was already moderated ({:?})",
                current.status
            )));
        }

        tracing::info!(
            complaint_id = %current.id,
            auditor_id = %auditor.id,
            status = ?input.status,
            "Complaint moderated"
        );

        if let Some(publisher_id) = current.publisher_id {
            dispatch(
                self.notifier.as_ref(),
                NotificationEvent::ComplaintModerated {
                    complaint_id: current.id.clone(),
                    publisher_id,
                    status: input.status,
                    rejection_reason: reason,
                },
            )
            .await;
        }

        self.feed.by_id(&current.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::notification::testing::RecordingNotifier;
    use denuncia_db::{
        entities::{complaint, resident::ResidentKind},
        repositories::FeedRepository,
        test_utils::{ComplaintFixture, TestDatabase},
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    struct Fixture {
        db: TestDatabase,
        auditor: Account,
        complaint: complaint::Model,
        notifier: Arc<RecordingNotifier>,
    }

    async fn setup(notifier: RecordingNotifier) -> Fixture {
        let db = TestDatabase::in_memory().await.unwrap();
        let category = db.insert_category("Queimadas").await.unwrap();
        let publisher = db.insert_resident(ResidentKind::Common, "Nina").await.unwrap();
        let auditor = db.insert_resident(ResidentKind::Auditor, "Otto").await.unwrap();
        let complaint = db
            .insert_complaint(ComplaintFixture::new(&category.id).published_by(&publisher.id))
            .await
            .unwrap();
        Fixture {
            db,
            auditor: Account::Resident(auditor),
            complaint,
            notifier: Arc::new(notifier),
        }
    }

    fn service(fixture: &Fixture, config: &Config) -> ModerationService {
        let mut service = ModerationService::new(
            ComplaintRepository::new(fixture.db.connection()),
            FeedService::new(FeedRepository::new(fixture.db.connection()), config),
            config,
        );
        service.set_notifier(fixture.notifier.clone());
        service
    }

    fn moderate(complaint_id: &str, status: ComplaintStatus, reason: Option<&str>) -> ModerateInput {
        ModerateInput {
            complaint_id: complaint_id.to_string(),
            status,
            rejection_reason: reason.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_reject_without_reason_fails_before_store() {
        // The mock has no queued results, so any store access would fail differently.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let config = Config::for_database("sqlite::memory:");
        let service = ModerationService::new(
            ComplaintRepository::new(db.clone()),
            FeedService::new(FeedRepository::new(db), &config),
            &config,
        );
        let auditor = Account::Resident(denuncia_db::entities::resident::Model {
            id: "a1".to_string(),
            kind: ResidentKind::Auditor,
            name: "Otto".to_string(),
            email: "otto@example.com".to_string(),
            photo: None,
            city: "Brumadinho".to_string(),
            uf: "MG".to_string(),
            token: None,
            created_at: chrono::Utc::now().fixed_offset(),
        });

        for reason in [None, Some("   "), Some(" a ")] {
            let result = service
                .moderate(&auditor, moderate("c1", ComplaintStatus::Rejected, reason))
                .await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }

        let result = service
            .moderate(&auditor, moderate("c1", ComplaintStatus::Unverified, None))
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_only_auditors_moderate() {
        let fixture = setup(RecordingNotifier::default()).await;
        let config = Config::for_database("sqlite::memory:");
        let admin = Account::Resident(
            fixture
                .db
                .insert_resident(ResidentKind::Admin, "Root")
                .await
                .unwrap(),
        );

        let result = service(&fixture, &config)
            .moderate(&admin, moderate(&fixture.complaint.id, ComplaintStatus::Accepted, None))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_reject_then_terminal_without_remoderation() {
        let fixture = setup(RecordingNotifier::default()).await;
        let config = Config::for_database("sqlite::memory:");
        let service = service(&fixture, &config);
        let id = fixture.complaint.id.clone();

        let rejected = service
            .moderate(
                &fixture.auditor,
                moderate(&id, ComplaintStatus::Rejected, Some("Duplicada")),
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, ComplaintStatus::Rejected);
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Duplicada"));

        let again = service
            .moderate(&fixture.auditor, moderate(&id, ComplaintStatus::Accepted, None))
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        let stored = ComplaintRepository::new(fixture.db.connection())
            .get_by_id(&id)
            .await
            .unwrap();
        assert_eq!(stored.status, ComplaintStatus::Rejected);

        let events = fixture.notifier.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            NotificationEvent::ComplaintModerated { status: ComplaintStatus::Rejected, .. }
        ));
    }

    #[tokio::test]
    async fn test_remoderation_clears_reason() {
        let fixture = setup(RecordingNotifier::default()).await;
        let mut config = Config::for_database("sqlite::memory:");
        config.moderation.allow_remoderation = true;
        let service = service(&fixture, &config);
        let id = fixture.complaint.id.clone();

        service
            .moderate(
                &fixture.auditor,
                moderate(&id, ComplaintStatus::Rejected, Some("Sem foto")),
            )
            .await
            .unwrap();
        let accepted = service
            .moderate(&fixture.auditor, moderate(&id, ComplaintStatus::Accepted, None))
            .await
            .unwrap();

        assert_eq!(accepted.status, ComplaintStatus::Accepted);
        assert!(accepted.rejection_reason.is_none());
        assert_eq!(fixture.notifier.events().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_complaint_and_failed_notification() {
        let fixture = setup(RecordingNotifier::failing()).await;
        let config = Config::for_database("sqlite::memory:");
        let service = service(&fixture, &config);

        let missing = service
            .moderate(&fixture.auditor, moderate("nope", ComplaintStatus::Accepted, None))
            .await;
        assert!(matches!(missing, Err(AppError::ComplaintNotFound(_))));

        let accepted = service
            .moderate(
                &fixture.auditor,
                moderate(&fixture.complaint.id, ComplaintStatus::Accepted, None),
            )
            .await
            .unwrap();
        assert_eq!(accepted.status, ComplaintStatus::Accepted);
        assert_eq!(fixture.notifier.events().len(), 1);
    }

    #[tokio::test]
    async fn test_reason_length_measured_after_trim() {
        let fixture = setup(RecordingNotifier::default()).await;
        let config = Config::for_database("sqlite::memory:");
        let service = service(&fixture, &config);

        let long = format!("  {}  ", "x".repeat(500));
        let done = service
            .moderate(
                &fixture.auditor,
                moderate(&fixture.complaint.id, ComplaintStatus::Rejected, Some(&long)),
            )
            .await
            .unwrap();
        assert_eq!(done.rejection_reason.as_deref(), Some("x".repeat(500).as_str()));
    }

    #[tokio::test]
    async fn test_stalled_store_hits_operation_deadline() {
        use sea_orm::TransactionTrait;

        let fixture = setup(RecordingNotifier::default()).await;
        let mut config = Config::for_database("sqlite::memory:");
        config.database.operation_timeout_ms = 50;
        let service = service(&fixture, &config);

        // Single-connection pool: the open transaction blocks every other query.
        let txn = fixture.db.conn.begin().await.unwrap();
        let result = service
            .moderate(
                &fixture.auditor,
                moderate(&fixture.complaint.id, ComplaintStatus::Accepted, None),
            )
            .await;
        assert!(matches!(result, Err(AppError::Database(ref msg)) if msg.contains("timed out")));
        txn.rollback().await.unwrap();
    }
}
