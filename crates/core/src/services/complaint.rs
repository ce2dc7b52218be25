//! Complaint filing and publisher-side maintenance.

use std::time::Duration;

use crate::services::{
    account::Account,
    feed::FeedService,
    notification::{NotificationEvent, NotifierService, dispatch},
    projection::EnrichedComplaint,
};
use chrono::{DateTime, FixedOffset, Utc};
use denuncia_common::{AppError, AppResult, Config, IdGenerator, config::LocalityConfig, with_deadline};
use denuncia_db::{
    entities::complaint::{self, ComplaintStatus},
    repositories::{CategoryRepository, ComplaintChanges, ComplaintRepository, ResidentRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Attempts at drawing an unused search id before giving up.
const SEARCH_ID_ATTEMPTS: usize = 8;

/// Maximum number of media URIs on a complaint.
pub const MAX_MEDIA: usize = 10;

/// A `GeoJSON` point: `{"type": "Point", "coordinates": [lng, lat]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<f64>,
}

impl Location {
    /// A point at the given longitude and latitude.
    #[must_use]
    pub fn point(lng: f64, lat: f64) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: vec![lng, lat],
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "type": self.kind, "coordinates": self.coordinates })
    }
}

fn validate_location(location: &Location) -> Result<(), ValidationError> {
    if location.kind != "Point" {
        return Err(ValidationError::new("location_type"));
    }
    match location.coordinates.as_slice() {
        [lng, lat] if (-180.0..=180.0).contains(lng) && (-90.0..=90.0).contains(lat) => Ok(()),
        _ => Err(ValidationError::new("location_coordinates")),
    }
}

#[allow(clippy::ptr_arg)]
fn validate_media(media: &Vec<String>) -> Result<(), ValidationError> {
    if media.iter().all(|uri| url::Url::parse(uri).is_ok()) {
        Ok(())
    } else {
        Err(ValidationError::new("media_uri"))
    }
}

/// Input for filing a complaint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaintInput {
    pub category: String,

    #[validate(length(min = 2, max = 100))]
    pub title: String,

    #[validate(length(min = 2, max = 500))]
    pub description: String,

    #[serde(default)]
    pub anonymous: bool,

    #[serde(default)]
    #[validate(length(max = 10), custom(function = "validate_media"))]
    pub media: Vec<String>,

    #[validate(custom(function = "validate_location"))]
    pub location: Location,
}

/// Input for a publisher edit. Absent fields stay as they are.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComplaintInput {
    pub complaint_id: String,

    pub category: Option<String>,

    #[validate(length(min = 2, max = 100))]
    pub title: Option<String>,

    #[validate(length(min = 2, max = 500))]
    pub description: Option<String>,

    pub anonymous: Option<bool>,

    #[validate(length(max = 10), custom(function = "validate_media"))]
    pub media: Option<Vec<String>>,

    #[validate(custom(function = "validate_location"))]
    pub location: Option<Location>,
}

/// What the filer gets back. The only place the search id is echoed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintReceipt {
    pub id: String,
    pub search_id: String,
    pub status: ComplaintStatus,
    pub created: DateTime<FixedOffset>,
}

/// Complaint service for business logic.
#[derive(Clone)]
pub struct ComplaintService {
    complaint_repo: ComplaintRepository,
    category_repo: CategoryRepository,
    resident_repo: ResidentRepository,
    feed: FeedService,
    id_gen: IdGenerator,
    locality: LocalityConfig,
    lock_reviewed_edits: bool,
    timeout: Duration,
    notifier: Option<NotifierService>,
}

impl ComplaintService {
    /// Create a new complaint service.
    #[must_use]
    pub fn new(
        complaint_repo: ComplaintRepository,
        category_repo: CategoryRepository,
        resident_repo: ResidentRepository,
        feed: FeedService,
        config: &Config,
    ) -> Self {
        Self {
            complaint_repo,
            category_repo,
            resident_repo,
            feed,
            id_gen: IdGenerator::new(),
            locality: config.locality.clone(),
            lock_reviewed_edits: config.moderation.lock_reviewed_edits,
            timeout: config.database.operation_timeout(),
            notifier: None,
        }
    }

    /// Set the notifier (optional).
    pub fn set_notifier(&mut self, notifier: NotifierService) {
        self.notifier = Some(notifier);
    }

    /// File a complaint.
    ///
    /// Anonymous complaints may be filed without an account; a signed-in
    /// resident is still recorded as publisher. Agencies cannot file.
    pub async fn create(
        &self,
        caller: Option<&Account>,
        ip_address: &str,
        input: CreateComplaintInput,
    ) -> AppResult<ComplaintReceipt> {
        input.validate()?;

        let publisher = match caller {
            Some(Account::Agency(_)) => {
                return Err(AppError::Forbidden(
                    "Public agencies cannot file complaints".to_string(),
                ));
            }
            Some(Account::Resident(r)) => Some(r),
            None if input.anonymous => None,
            None => return Err(AppError::Unauthorized),
        };

        self.category_repo.get_by_id(&input.category).await?;
        let search_id = self.unused_search_id().await?;

        let now = Utc::now().fixed_offset();
        let model = complaint::ActiveModel {
            id: Set(self.id_gen.generate()),
            search_id: Set(search_id),
            category_id: Set(input.category),
            title: Set(input.title),
            description: Set(input.description),
            anonymous: Set(input.anonymous),
            publisher_id: Set(publisher.map(|p| p.id.clone())),
            media: Set(serde_json::json!(input.media)),
            status: Set(ComplaintStatus::Unverified),
            rejection_reason: Set(None),
            location: Set(input.location.to_json()),
            city: Set(self.locality.city.clone()),
            uf: Set(self.locality.uf.clone()),
            ip_address: Set(ip_address.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = with_deadline(
            self.timeout,
            "complaint insert",
            self.complaint_repo.create(model),
        )
        .await?;

        tracing::info!(
            complaint_id = %created.id,
            anonymous = created.anonymous,
            has_publisher = created.publisher_id.is_some(),
            "Complaint filed"
        );

        self.announce(&created).await;

        Ok(ComplaintReceipt {
            id: created.id,
            search_id: created.search_id,
            status: created.status,
            created: created.created_at,
        })
    }

    /// Edit a complaint's content. Publisher only.
    pub async fn update(
        &self,
        caller: &Account,
        input: UpdateComplaintInput,
    ) -> AppResult<EnrichedComplaint> {
        let resident = caller.require_resident()?;
        input.validate()?;

        if let Some(ref category_id) = input.category {
            self.category_repo.get_by_id(category_id).await?;
        }

        let changes = ComplaintChanges {
            category_id: input.category,
            title: input.title,
            description: input.description,
            anonymous: input.anonymous,
            media: input.media.map(|m| serde_json::json!(m)),
            location: input.location.as_ref().map(Location::to_json),
        };
        if changes.is_empty() {
            return Err(AppError::BadRequest("Nothing to update".to_string()));
        }

        let updated = with_deadline(
            self.timeout,
            "complaint update",
            self.complaint_repo.update_content(
                &input.complaint_id,
                &resident.id,
                changes,
                self.lock_reviewed_edits,
            ),
        )
        .await?;

        if updated == 0 {
            return Err(self.explain_miss(&input.complaint_id, &resident.id).await);
        }

        tracing::info!(complaint_id = %input.complaint_id, "Complaint updated");
        self.feed.by_id(&input.complaint_id).await
    }

    /// Delete a complaint with its comments and likes. Publisher only.
    pub async fn delete(&self, caller: &Account, complaint_id: &str) -> AppResult<()> {
        let resident = caller.require_resident()?;

        let deleted = with_deadline(
            self.timeout,
            "complaint delete",
            self.complaint_repo.delete_owned(complaint_id, &resident.id),
        )
        .await?;

        if deleted == 0 {
            return Err(self.explain_miss(complaint_id, &resident.id).await);
        }

        tracing::info!(complaint_id = %complaint_id, "Complaint deleted");
        Ok(())
    }

    async fn unused_search_id(&self) -> AppResult<String> {
        for _ in 0..SEARCH_ID_ATTEMPTS {
            let candidate = self.id_gen.generate_search_id();
            if !self.complaint_repo.search_id_exists(&candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!(search_id = %candidate, "Search id taken, drawing again");
        }
        Err(AppError::Internal(
            "Could not allocate a unique search id".to_string(),
        ))
    }

    /// Why a conditional write by `publisher_id` matched nothing.
    async fn explain_miss(&self, complaint_id: &str, publisher_id: &str) -> AppError {
        match self.complaint_repo.find_by_id(complaint_id).await {
            Err(e) => e,
            Ok(None) => AppError::ComplaintNotFound(complaint_id.to_string()),
            Ok(Some(c)) if c.publisher_id.as_deref() != Some(publisher_id) => {
                AppError::Forbidden("Only the publisher can change this complaint".to_string())
            }
            Ok(Some(c)) => AppError::Conflict(format!(
                "Complaint is already {:?} and can no longer be edited",
                c.status
            )),
        }
    }

    async fn announce(&self, created: &complaint::Model) {
        if self.notifier.is_none() {
            return;
        }

        match self
            .resident_repo
            .find_auditors_by_locality(&created.city, &created.uf)
            .await
        {
            Ok(auditors) if !auditors.is_empty() => {
                dispatch(
                    self.notifier.as_ref(),
                    NotificationEvent::ComplaintCreated {
                        complaint_id: created.id.clone(),
                        title: created.title.clone(),
                        auditor_ids: auditors.into_iter().map(|a| a.id).collect(),
                    },
                )
                .await;
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to look up auditors to notify"),
        }

        if let Some(ref publisher_id) = created.publisher_id {
            dispatch(
                self.notifier.as_ref(),
                NotificationEvent::SearchIdIssued {
                    complaint_id: created.id.clone(),
                    search_id: created.search_id.clone(),
                    publisher_id: publisher_id.clone(),
                },
            )
            .await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::notification::testing::RecordingNotifier;
    use denuncia_db::{
        entities::resident::ResidentKind,
        repositories::FeedRepository,
        test_utils::{ComplaintFixture, TestDatabase},
    };
    use std::sync::Arc;

    fn service(db: &TestDatabase, config: &Config) -> ComplaintService {
        ComplaintService::new(
            ComplaintRepository::new(db.connection()),
            CategoryRepository::new(db.connection()),
            ResidentRepository::new(db.connection()),
            FeedService::new(FeedRepository::new(db.connection()), config),
            config,
        )
    }

    fn input(category_id: &str, anonymous: bool) -> CreateComplaintInput {
        CreateComplaintInput {
            category: category_id.to_string(),
            title: "Poste apagado".to_string(),
            description: "Rua escura há uma semana".to_string(),
            anonymous,
            media: vec!["https://example.com/poste.jpg".to_string()],
            location: Location::point(-44.2, -20.14),
        }
    }

    #[test]
    fn test_location_validation() {
        assert!(validate_location(&Location::point(-44.2, -20.14)).is_ok());
        assert!(validate_location(&Location::point(200.0, 0.0)).is_err());

        let line = Location {
            kind: "LineString".to_string(),
            coordinates: vec![0.0, 0.0],
        };
        assert!(validate_location(&line).is_err());

        let short = Location {
            kind: "Point".to_string(),
            coordinates: vec![0.0],
        };
        assert!(validate_location(&short).is_err());
    }

    #[test]
    fn test_media_validation() {
        let mut input = CreateComplaintInput {
            category: "c".to_string(),
            title: "ok".to_string(),
            description: "ok".to_string(),
            anonymous: true,
            media: vec!["not a uri".to_string()],
            location: Location::point(0.0, 0.0),
        };
        assert!(input.validate().is_err());

        input.media = vec!["https://example.com/a.png".to_string(); MAX_MEDIA + 1];
        assert!(input.validate().is_err());

        input.media.truncate(MAX_MEDIA);
        assert!(input.validate().is_ok());
    }

    #[tokio::test]
    async fn test_create_records_locality_and_notifies() {
        let db = TestDatabase::in_memory().await.unwrap();
        let config = Config::for_database("sqlite::memory:");
        let category = db.insert_category("Iluminação").await.unwrap();
        let publisher = db.insert_resident(ResidentKind::Common, "Rita").await.unwrap();
        let auditor = db.insert_resident(ResidentKind::Auditor, "Tânia").await.unwrap();

        let notifier = Arc::new(RecordingNotifier::default());
        let mut service = service(&db, &config);
        service.set_notifier(notifier.clone());

        let caller = Account::Resident(publisher.clone());
        let receipt = service
            .create(Some(&caller), "10.0.0.1", input(&category.id, false))
            .await
            .unwrap();

        assert_eq!(receipt.status, ComplaintStatus::Unverified);
        assert_eq!(receipt.search_id.len(), 5);

        let stored = ComplaintRepository::new(db.connection())
            .get_by_id(&receipt.id)
            .await
            .unwrap();
        assert_eq!(stored.city, "Brumadinho");
        assert_eq!(stored.uf, "MG");
        assert_eq!(stored.ip_address, "10.0.0.1");
        assert_eq!(stored.publisher_id.as_deref(), Some(publisher.id.as_str()));

        let events = notifier.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            NotificationEvent::ComplaintCreated { auditor_ids, .. } if auditor_ids == &vec![auditor.id.clone()]
        ));
        assert!(matches!(
            &events[1],
            NotificationEvent::SearchIdIssued { search_id, .. } if search_id == &receipt.search_id
        ));
    }

    #[tokio::test]
    async fn test_create_access_rules() {
        let db = TestDatabase::in_memory().await.unwrap();
        let config = Config::for_database("sqlite::memory:");
        let category = db.insert_category("Ruído").await.unwrap();
        let agency = db.insert_agency("Defesa Civil").await.unwrap();
        let service = service(&db, &config);

        let result = service.create(None, "1.1.1.1", input(&category.id, false)).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));

        let result = service
            .create(Some(&Account::Agency(agency)), "1.1.1.1", input(&category.id, false))
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let receipt = service
            .create(None, "1.1.1.1", input(&category.id, true))
            .await
            .unwrap();
        let shown = service.feed.by_id(&receipt.id).await.unwrap();
        assert!(shown.publisher.is_none());
    }

    #[tokio::test]
    async fn test_create_with_unknown_category() {
        let db = TestDatabase::in_memory().await.unwrap();
        let config = Config::for_database("sqlite::memory:");
        let service = service(&db, &config);
        let result = service.create(None, "1.1.1.1", input("missing", true)).await;
        assert!(matches!(result, Err(AppError::CategoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_by_publisher_only() {
        let db = TestDatabase::in_memory().await.unwrap();
        let config = Config::for_database("sqlite::memory:");
        let category = db.insert_category("Calçadas").await.unwrap();
        let owner = db.insert_resident(ResidentKind::Common, "Duda").await.unwrap();
        let stranger = db.insert_resident(ResidentKind::Common, "Edu").await.unwrap();
        let complaint = db
            .insert_complaint(ComplaintFixture::new(&category.id).published_by(&owner.id))
            .await
            .unwrap();
        let service = service(&db, &config);

        let edit = || UpdateComplaintInput {
            complaint_id: complaint.id.clone(),
            title: Some("Calçada quebrada".to_string()),
            ..UpdateComplaintInput::default()
        };

        let result = service.update(&Account::Resident(stranger), edit()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let updated = service
            .update(&Account::Resident(owner.clone()), edit())
            .await
            .unwrap();
        assert_eq!(updated.title, "Calçada quebrada");

        let empty = UpdateComplaintInput {
            complaint_id: complaint.id.clone(),
            ..UpdateComplaintInput::default()
        };
        let result = service.update(&Account::Resident(owner.clone()), empty).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let missing = UpdateComplaintInput {
            complaint_id: "nope".to_string(),
            ..edit()
        };
        let result = service.update(&Account::Resident(owner), missing).await;
        assert!(matches!(result, Err(AppError::ComplaintNotFound(_))));
    }

    #[tokio::test]
    async fn test_reviewed_edit_lock() {
        let db = TestDatabase::in_memory().await.unwrap();
        let category = db.insert_category("Praças").await.unwrap();
        let owner = db.insert_resident(ResidentKind::Common, "Gil").await.unwrap();
        let complaint = db
            .insert_complaint(
                ComplaintFixture::new(&category.id)
                    .published_by(&owner.id)
                    .with_status(ComplaintStatus::Accepted),
            )
            .await
            .unwrap();
        let edit = || UpdateComplaintInput {
            complaint_id: complaint.id.clone(),
            description: Some("Bancos quebrados".to_string()),
            ..UpdateComplaintInput::default()
        };
        let caller = Account::Resident(owner);

        let open = Config::for_database("sqlite::memory:");
        service(&db, &open).update(&caller, edit()).await.unwrap();

        let mut locked = Config::for_database("sqlite::memory:");
        locked.moderation.lock_reviewed_edits = true;
        let result = service(&db, &locked).update(&caller, edit()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let db = TestDatabase::in_memory().await.unwrap();
        let config = Config::for_database("sqlite::memory:");
        let category = db.insert_category("Entulho").await.unwrap();
        let owner = db.insert_resident(ResidentKind::Common, "Ivo").await.unwrap();
        let complaint = db
            .insert_complaint(ComplaintFixture::new(&category.id).published_by(&owner.id))
            .await
            .unwrap();
        db.insert_complaint_like(&complaint.id, &owner.id).await.unwrap();
        let comment = db
            .insert_comment(
                &complaint.id,
                &denuncia_db::entities::comment::CommentAuthor::Resident(owner.id.clone()),
                "Ainda está lá",
            )
            .await
            .unwrap();
        db.insert_comment_like(&comment.id, &owner.id).await.unwrap();
        let service = service(&db, &config);
        let likes = denuncia_db::repositories::LikeRepository::new(db.connection());
        let comments = denuncia_db::repositories::CommentRepository::new(db.connection());

        service
            .delete(&Account::Resident(owner.clone()), &complaint.id)
            .await
            .unwrap();
        assert!(matches!(
            service.feed.by_id(&complaint.id).await,
            Err(AppError::ComplaintNotFound(_))
        ));
        assert!(likes.complaint_likers(&complaint.id).await.unwrap().is_empty());
        assert!(likes.comment_likers(&comment.id).await.unwrap().is_empty());
        assert!(comments.find_by_id(&comment.id).await.unwrap().is_none());

        let again = service.delete(&Account::Resident(owner), &complaint.id).await;
        assert!(matches!(again, Err(AppError::ComplaintNotFound(_))));
    }
}
