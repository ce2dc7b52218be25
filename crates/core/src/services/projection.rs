//! External representation of complaints.
//!
//! Turns hydrated [`ComplaintBundle`]s into the shape served to clients.
//! Anonymity masking happens here, after the join, and the search id and
//! origin address of a complaint are never part of the output.

use chrono::{DateTime, FixedOffset};
use denuncia_db::{
    entities::{category, comment::AuthorKind, complaint::ComplaintStatus, public_agency, resident},
    repositories::{AuthorRecord, CommentBundle, ComplaintBundle},
};
use serde::Serialize;

/// Public identity of a resident or agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublisherSummary {
    pub id: String,
    pub name: String,
    pub photo: Option<String>,
}

impl From<&resident::Model> for PublisherSummary {
    fn from(r: &resident::Model) -> Self {
        Self {
            id: r.id.clone(),
            name: r.name.clone(),
            photo: r.photo.clone(),
        }
    }
}

impl From<&public_agency::Model> for PublisherSummary {
    fn from(a: &public_agency::Model) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            photo: a.photo.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<category::Model> for CategorySummary {
    fn from(c: category::Model) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
        }
    }
}

/// A comment as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedComment {
    pub id: String,
    pub description: String,
    pub likes: Vec<String>,
    pub user_type: AuthorKind,
    pub created: DateTime<FixedOffset>,
    pub publisher: Option<PublisherSummary>,
}

impl From<CommentBundle> for EnrichedComment {
    fn from(bundle: CommentBundle) -> Self {
        let publisher = bundle.author.as_ref().map(|author| match author {
            AuthorRecord::Resident(r) => PublisherSummary::from(r),
            AuthorRecord::PublicAgency(a) => PublisherSummary::from(a),
        });
        Self {
            id: bundle.comment.id,
            description: bundle.comment.description,
            likes: bundle.likes,
            user_type: bundle.comment.author_kind,
            created: bundle.comment.created_at,
            publisher,
        }
    }
}

/// A complaint as served to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedComplaint {
    pub id: String,
    pub category: Option<CategorySummary>,
    pub title: String,
    pub description: String,
    pub publisher: Option<PublisherSummary>,
    pub residents_comments: Vec<EnrichedComment>,
    pub public_agencies_comments: Vec<EnrichedComment>,
    pub likes: Vec<String>,
    pub status: ComplaintStatus,
    pub anonymous: bool,
    pub media: Vec<String>,
    pub location: serde_json::Value,
    pub uf: String,
    pub city: String,
    #[serde(rename = "rejection_reason")]
    pub rejection_reason: Option<String>,
    pub created: DateTime<FixedOffset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance: Option<i64>,
}

/// Shape a hydrated complaint for output.
#[must_use]
pub fn project(bundle: ComplaintBundle) -> EnrichedComplaint {
    let ComplaintBundle {
        complaint,
        relevance,
        category,
        publisher,
        likes,
        comments,
    } = bundle;

    let publisher = if complaint.anonymous {
        None
    } else {
        publisher.as_ref().map(PublisherSummary::from)
    };

    let (residents_comments, public_agencies_comments): (Vec<_>, Vec<_>) = comments
        .into_iter()
        .map(EnrichedComment::from)
        .partition(|c| c.user_type == AuthorKind::Resident);

    let media = complaint.media_uris();

    EnrichedComplaint {
        id: complaint.id,
        category: category.map(CategorySummary::from),
        title: complaint.title,
        description: complaint.description,
        publisher,
        residents_comments,
        public_agencies_comments,
        likes,
        status: complaint.status,
        anonymous: complaint.anonymous,
        media,
        location: complaint.location,
        uf: complaint.uf,
        city: complaint.city,
        rejection_reason: complaint.rejection_reason,
        created: complaint.created_at,
        relevance,
    }
}
