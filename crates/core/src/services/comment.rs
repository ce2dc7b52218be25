//! Comment maintenance by its author.

use crate::services::{account::Account, feed::FeedService, projection::EnrichedComment};
use denuncia_common::{AppError, AppResult};
use denuncia_db::{entities::comment::CommentAuthor, repositories::CommentRepository};
use serde::Deserialize;
use validator::Validate;

/// Input for editing a comment.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentInput {
    pub comment_id: String,

    #[validate(length(min = 2, max = 500))]
    pub description: String,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    feed: FeedService,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, feed: FeedService) -> Self {
        Self { comment_repo, feed }
    }

    /// A comment with its author and likes.
    pub async fn get(&self, comment_id: &str) -> AppResult<EnrichedComment> {
        let comment = self.comment_repo.get_by_id(comment_id).await?;
        let complaint = self.feed.by_id(&comment.complaint_id).await?;

        complaint
            .residents_comments
            .into_iter()
            .chain(complaint.public_agencies_comments)
            .find(|c| c.id == comment_id)
            .ok_or_else(|| AppError::CommentNotFound(comment_id.to_string()))
    }

    /// Replace the text of the caller's own comment.
    pub async fn update(
        &self,
        caller: &Account,
        input: UpdateCommentInput,
    ) -> AppResult<EnrichedComment> {
        input.validate()?;
        let author = caller.comment_author();

        let updated = self
            .comment_repo
            .update_description(&input.comment_id, &author, &input.description)
            .await?;
        if updated == 0 {
            return Err(self.explain_miss(&input.comment_id).await);
        }

        tracing::debug!(comment_id = %input.comment_id, "Comment updated");
        self.get(&input.comment_id).await
    }

    /// Delete the caller's own comment.
    pub async fn delete(&self, caller: &Account, comment_id: &str) -> AppResult<()> {
        let author: CommentAuthor = caller.comment_author();

        let deleted = self.comment_repo.delete_owned(comment_id, &author).await?;
        if deleted == 0 {
            return Err(self.explain_miss(comment_id).await);
        }

        tracing::info!(comment_id = %comment_id, "Comment deleted");
        Ok(())
    }

    async fn explain_miss(&self, comment_id: &str) -> AppError {
        match self.comment_repo.find_by_id(comment_id).await {
            Err(e) => e,
            Ok(None) => AppError::CommentNotFound(comment_id.to_string()),
            Ok(Some(_)) => AppError::Forbidden("Only the author can change this comment".to_string()),
        }
    }
}
