//! Database repositories.

pub mod category;
pub mod comment;
pub mod complaint;
pub mod feed;
pub mod like;
pub mod public_agency;
pub mod resident;

pub use category::CategoryRepository;
pub use comment::CommentRepository;
pub use complaint::{ComplaintChanges, ComplaintRepository};
pub use feed::{
    AuthorRecord, CommentBundle, ComplaintBundle, ComplaintFilter, FeedRepository, PageQuery,
    RankedComplaint, Seek, SeekValue, SortDirection, SortKey,
};
pub use like::LikeRepository;
pub use public_agency::PublicAgencyRepository;
pub use resident::ResidentRepository;
