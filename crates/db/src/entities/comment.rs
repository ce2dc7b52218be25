//! Comment entity (resident or agency remark on a complaint).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Which account table a comment author lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum AuthorKind {
    #[sea_orm(string_value = "resident")]
    #[serde(rename = "Resident")]
    Resident,
    #[sea_orm(string_value = "public_agency")]
    #[serde(rename = "PublicAgency")]
    PublicAgency,
}

/// Comment author as a tagged reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentAuthor {
    /// Resident account id.
    Resident(String),
    /// Public agency account id.
    PublicAgency(String),
}

impl CommentAuthor {
    /// Storage tag.
    #[must_use]
    pub const fn kind(&self) -> AuthorKind {
        match self {
            Self::Resident(_) => AuthorKind::Resident,
            Self::PublicAgency(_) => AuthorKind::PublicAgency,
        }
    }

    /// Referenced account id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Resident(id) | Self::PublicAgency(id) => id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub complaint_id: String,

    pub author_kind: AuthorKind,

    pub author_id: String,

    pub description: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::complaint::Entity",
        from = "Column::ComplaintId",
        to = "super::complaint::Column::Id",
        on_delete = "Cascade"
    )]
    Complaint,

    #[sea_orm(has_many = "super::comment_like::Entity")]
    Like,
}

impl Related<super::complaint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Complaint.def()
    }
}

impl Related<super::comment_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Like.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The author as a tagged reference.
    #[must_use]
    pub fn author(&self) -> CommentAuthor {
        match self.author_kind {
            AuthorKind::Resident => CommentAuthor::Resident(self.author_id.clone()),
            AuthorKind::PublicAgency => CommentAuthor::PublicAgency(self.author_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_tag_round_trip() {
        let author = CommentAuthor::PublicAgency("a1".to_string());
        assert_eq!(author.kind(), AuthorKind::PublicAgency);
        assert_eq!(author.id(), "a1");

        let now = chrono::Utc::now().into();
        let model = Model {
            id: "c1".to_string(),
            complaint_id: "x1".to_string(),
            author_kind: author.kind(),
            author_id: author.id().to_string(),
            description: "hello".to_string(),
            created_at: now,
            updated_at: now,
        };
        assert_eq!(model.author(), author);
    }
}
