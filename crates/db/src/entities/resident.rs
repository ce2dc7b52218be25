//! Resident entity (citizen accounts, including auditors and admins).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Resident account kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ResidentKind {
    #[sea_orm(string_value = "common")]
    Common,
    #[sea_orm(string_value = "auditor")]
    Auditor,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "resident")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub kind: ResidentKind,

    pub name: String,

    /// Lowercased login email
    #[sea_orm(unique)]
    pub email: String,

    #[sea_orm(nullable)]
    pub photo: Option<String>,

    pub city: String,

    pub uf: String,

    /// API bearer token
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::complaint::Entity")]
    Complaint,
}

impl Related<super::complaint::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Complaint.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this resident may moderate complaints.
    #[must_use]
    pub fn is_auditor(&self) -> bool {
        self.kind == ResidentKind::Auditor
    }

    /// Whether this resident administers the platform.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.kind == ResidentKind::Admin
    }
}
