//! Database entities.

pub mod category;
pub mod comment;
pub mod comment_like;
pub mod complaint;
pub mod complaint_like;
pub mod public_agency;
pub mod resident;

pub use category::Entity as Category;
pub use comment::Entity as Comment;
pub use comment_like::Entity as CommentLike;
pub use complaint::Entity as Complaint;
pub use complaint_like::Entity as ComplaintLike;
pub use public_agency::Entity as PublicAgency;
pub use resident::Entity as Resident;
