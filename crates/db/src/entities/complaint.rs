//! Complaint entity (a reported civic incident).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Moderation status of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    #[sea_orm(string_value = "unverified")]
    Unverified,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ComplaintStatus {
    /// Whether an auditor has already reviewed the complaint.
    #[must_use]
    pub const fn is_reviewed(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "complaint")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Short public lookup code
    #[sea_orm(unique)]
    pub search_id: String,

    pub category_id: String,

    pub title: String,

    pub description: String,

    pub anonymous: bool,

    /// Filing resident; absent for complaints filed without an account
    #[sea_orm(nullable)]
    pub publisher_id: Option<String>,

    /// Media URIs (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub media: Json,

    pub status: ComplaintStatus,

    #[sea_orm(nullable)]
    pub rejection_reason: Option<String>,

    /// `GeoJSON` point
    #[sea_orm(column_type = "JsonBinary")]
    pub location: Json,

    pub city: String,

    pub uf: String,

    pub ip_address: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "Restrict"
    )]
    Category,

    #[sea_orm(
        belongs_to = "super::resident::Entity",
        from = "Column::PublisherId",
        to = "super::resident::Column::Id",
        on_delete = "SetNull"
    )]
    Publisher,

    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,

    #[sea_orm(has_many = "super::complaint_like::Entity")]
    Like,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::resident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Publisher.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl Related<super::complaint_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Like.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Media URIs as strings; non-string entries are skipped.
    #[must_use]
    pub fn media_uris(&self) -> Vec<String> {
        self.media
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(ToString::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
