//! Likes and comments on complaints.
//!
//! Every ledger mutation is one statement: likes are insert-if-absent and
//! delete-if-present, comments are inserted already bound to their complaint
//! and detached with a delete scoped to that complaint.

use std::time::Duration;

use crate::services::{
    account::Account,
    feed::FeedService,
    notification::{NotificationEvent, NotifierService, dispatch},
    projection::EnrichedComplaint,
};
use chrono::Utc;
use denuncia_common::{AppError, AppResult, Config, IdGenerator, with_deadline};
use denuncia_db::{
    entities::{comment, complaint},
    repositories::{CommentRepository, ComplaintRepository, LikeRepository, ResidentRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Input for commenting on a complaint.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttachCommentInput {
    pub complaint_id: String,

    #[validate(length(min = 2, max = 500))]
    pub description: String,
}

/// Input for removing a comment from a complaint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachCommentInput {
    pub complaint_id: String,
    pub comment_id: String,
}

/// A resident who liked something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Liker {
    pub id: String,
    pub name: String,
}

/// Interaction service for likes and comments.
#[derive(Clone)]
pub struct InteractionService {
    like_repo: LikeRepository,
    comment_repo: CommentRepository,
    complaint_repo: ComplaintRepository,
    resident_repo: ResidentRepository,
    feed: FeedService,
    id_gen: IdGenerator,
    timeout: Duration,
    notifier: Option<NotifierService>,
}

impl InteractionService {
    /// Create a new interaction service.
    #[must_use]
    pub fn new(
        like_repo: LikeRepository,
        comment_repo: CommentRepository,
        complaint_repo: ComplaintRepository,
        resident_repo: ResidentRepository,
        feed: FeedService,
        config: &Config,
    ) -> Self {
        Self {
            like_repo,
            comment_repo,
            complaint_repo,
            resident_repo,
            feed,
            id_gen: IdGenerator::new(),
            timeout: config.database.operation_timeout(),
            notifier: None,
        }
    }

    /// Set the notifier (optional).
    pub fn set_notifier(&mut self, notifier: NotifierService) {
        self.notifier = Some(notifier);
    }

    /// Like a complaint. Liking twice is a conflict.
    pub async fn like_complaint(
        &self,
        caller: &Account,
        complaint_id: &str,
    ) -> AppResult<EnrichedComplaint> {
        let resident = caller.require_resident()?;
        self.complaint(complaint_id).await?;

        let inserted = with_deadline(
            self.timeout,
            "complaint like",
            self.like_repo
                .like_complaint(&self.id_gen.generate(), complaint_id, &resident.id),
        )
        .await?;
        if !inserted {
            return Err(AppError::Conflict("Complaint already liked".to_string()));
        }

        tracing::debug!(complaint_id = %complaint_id, resident_id = %resident.id, "Complaint liked");
        self.feed.by_id(complaint_id).await
    }

    /// Withdraw a complaint like.
    pub async fn unlike_complaint(
        &self,
        caller: &Account,
        complaint_id: &str,
    ) -> AppResult<EnrichedComplaint> {
        let resident = caller.require_resident()?;
        self.complaint(complaint_id).await?;

        let removed = with_deadline(
            self.timeout,
            "complaint unlike",
            self.like_repo.unlike_complaint(complaint_id, &resident.id),
        )
        .await?;
        if !removed {
            return Err(AppError::Conflict("Complaint not liked".to_string()));
        }

        tracing::debug!(complaint_id = %complaint_id, resident_id = %resident.id, "Complaint unliked");
        self.feed.by_id(complaint_id).await
    }

    /// Like a comment. Returns the complaint the comment belongs to.
    pub async fn like_comment(
        &self,
        caller: &Account,
        comment_id: &str,
    ) -> AppResult<EnrichedComplaint> {
        let resident = caller.require_resident()?;
        let comment = self.comment(comment_id).await?;

        let inserted = with_deadline(
            self.timeout,
            "comment like",
            self.like_repo
                .like_comment(&self.id_gen.generate(), comment_id, &resident.id),
        )
        .await?;
        if !inserted {
            return Err(AppError::Conflict("Comment already liked".to_string()));
        }

        self.feed.by_id(&comment.complaint_id).await
    }

    /// Withdraw a comment like.
    pub async fn unlike_comment(
        &self,
        caller: &Account,
        comment_id: &str,
    ) -> AppResult<EnrichedComplaint> {
        let resident = caller.require_resident()?;
        let comment = self.comment(comment_id).await?;

        let removed = with_deadline(
            self.timeout,
            "comment unlike",
            self.like_repo.unlike_comment(comment_id, &resident.id),
        )
        .await?;
        if !removed {
            return Err(AppError::Conflict("Comment not liked".to_string()));
        }

        self.feed.by_id(&comment.complaint_id).await
    }

    /// Residents who liked a complaint, in like order.
    pub async fn complaint_likers(&self, complaint_id: &str) -> AppResult<Vec<Liker>> {
        self.complaint(complaint_id).await?;
        let ids = with_deadline(
            self.timeout,
            "complaint likers",
            self.like_repo.complaint_likers(complaint_id),
        )
        .await?;
        self.likers(ids).await
    }

    /// Residents who liked a comment, in like order.
    pub async fn comment_likers(&self, comment_id: &str) -> AppResult<Vec<Liker>> {
        self.comment(comment_id).await?;
        let ids = with_deadline(
            self.timeout,
            "comment likers",
            self.like_repo.comment_likers(comment_id),
        )
        .await?;
        self.likers(ids).await
    }

    /// Comment on a complaint as the caller.
    pub async fn attach_comment(
        &self,
        caller: &Account,
        input: AttachCommentInput,
    ) -> AppResult<EnrichedComplaint> {
        input.validate()?;
        let complaint = self.complaint(&input.complaint_id).await?;

        let author = caller.comment_author();
        let now = Utc::now().fixed_offset();
        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            complaint_id: Set(complaint.id.clone()),
            author_kind: Set(author.kind()),
            author_id: Set(author.id().to_string()),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = with_deadline(
            self.timeout,
            "comment insert",
            self.comment_repo.create(model),
        )
        .await?;

        tracing::info!(
            comment_id = %created.id,
            complaint_id = %complaint.id,
            author_kind = ?created.author_kind,
            "Comment attached"
        );

        if let (Account::Agency(agency), Some(publisher_id)) = (caller, complaint.publisher_id) {
            dispatch(
                self.notifier.as_ref(),
                NotificationEvent::AgencyCommented {
                    complaint_id: complaint.id.clone(),
                    publisher_id,
                    agency_id: agency.id.clone(),
                    comment_id: created.id.clone(),
                },
            )
            .await;
        }

        self.feed.by_id(&complaint.id).await
    }

    /// Remove a comment from a complaint.
    ///
    /// Allowed for the comment author, the complaint publisher and auditors.
    /// Removing a comment that is already gone succeeds.
    pub async fn detach_comment(
        &self,
        caller: &Account,
        input: DetachCommentInput,
    ) -> AppResult<EnrichedComplaint> {
        let complaint = self.complaint(&input.complaint_id).await?;

        let Some(existing) = self.find_comment(&input.comment_id).await? else {
            tracing::debug!(comment_id = %input.comment_id, "Comment already removed");
            return self.feed.by_id(&complaint.id).await;
        };
        if existing.complaint_id != complaint.id {
            return Err(AppError::Conflict(
                "Comment belongs to another complaint".to_string(),
            ));
        }

        let is_author = existing.author() == caller.comment_author();
        let is_publisher = caller.as_resident().is_some()
            && complaint.publisher_id.as_deref() == Some(caller.id());
        if !(is_author || is_publisher || caller.is_auditor()) {
            return Err(AppError::Forbidden(
                "Only the author, the publisher or an auditor can remove this comment".to_string(),
            ));
        }

        let removed = with_deadline(
            self.timeout,
            "comment delete",
            self.comment_repo
                .delete_from_complaint(&input.comment_id, &complaint.id),
        )
        .await?;

        if removed == 0 && self.find_comment(&input.comment_id).await?.is_some() {
            return Err(AppError::Conflict(
                "Comment belongs to another complaint".to_string(),
            ));
        }

        tracing::info!(comment_id = %input.comment_id, complaint_id = %complaint.id, "Comment detached");
        self.feed.by_id(&complaint.id).await
    }

    async fn complaint(&self, id: &str) -> AppResult<complaint::Model> {
        with_deadline(
            self.timeout,
            "complaint lookup",
            self.complaint_repo.get_by_id(id),
        )
        .await
    }

    async fn comment(&self, id: &str) -> AppResult<comment::Model> {
        with_deadline(self.timeout, "comment lookup", self.comment_repo.get_by_id(id)).await
    }

    async fn find_comment(&self, id: &str) -> AppResult<Option<comment::Model>> {
        with_deadline(self.timeout, "comment lookup", self.comment_repo.find_by_id(id)).await
    }

    async fn likers(&self, ids: Vec<String>) -> AppResult<Vec<Liker>> {
        let residents = with_deadline(
            self.timeout,
            "liker lookup",
            self.resident_repo.find_by_ids(&ids),
        )
        .await?;
        Ok(ids
            .into_iter()
            .filter_map(|id| {
                residents.iter().find(|r| r.id == id).map(|r| Liker {
                    id,
                    name: r.name.clone(),
                })
            })
            .collect())
    }
}
