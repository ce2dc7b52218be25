//! Business logic services.

#![allow(missing_docs)]

pub mod account;
pub mod category;
pub mod comment;
pub mod complaint;
pub mod feed;
pub mod interaction;
pub mod moderation;
pub mod notification;
pub mod projection;

pub use account::{Account, AccountService};
pub use category::{CategoryService, CreateCategoryInput, UpdateCategoryInput};
pub use comment::{CommentService, UpdateCommentInput};
pub use complaint::{
    ComplaintReceipt, ComplaintService, CreateComplaintInput, Location, UpdateComplaintInput,
};
pub use feed::{FeedService, PageRequest};
pub use interaction::{AttachCommentInput, DetachCommentInput, InteractionService, Liker};
pub use moderation::{ModerateInput, ModerationService};
pub use notification::{
    NoOpNotifier, NotificationEvent, Notifier, NotifierService, TracingNotifier,
};
pub use projection::{
    CategorySummary, EnrichedComment, EnrichedComplaint, PublisherSummary, project,
};
