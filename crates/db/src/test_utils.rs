//! Test utilities for database operations.
//!
//! Provides an in-memory, fully migrated `SQLite` database plus fixture
//! helpers for seeding accounts, categories, complaints, comments and likes.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, FixedOffset, Utc};
use denuncia_common::IdGenerator;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, DbErr, Set};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use tracing::info;

use crate::{
    entities::{
        category, comment,
        comment::CommentAuthor,
        comment_like, complaint,
        complaint::ComplaintStatus,
        complaint_like, public_agency,
        public_agency::AgencyVerification,
        resident,
        resident::ResidentKind,
    },
    migrations::Migrator,
};

/// Complaint to seed. Unset fields take sensible defaults.
#[derive(Debug, Clone)]
pub struct ComplaintFixture {
    /// Category id (must exist).
    pub category_id: String,
    /// Publisher id (must exist when set).
    pub publisher_id: Option<String>,
    /// Anonymity flag.
    pub anonymous: bool,
    /// Moderation status.
    pub status: ComplaintStatus,
    /// Rejection reason.
    pub rejection_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// City.
    pub city: String,
    /// State.
    pub uf: String,
    /// Title.
    pub title: String,
}

impl ComplaintFixture {
    /// Unverified complaint in the default locality, created now.
    #[must_use]
    pub fn new(category_id: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            publisher_id: None,
            anonymous: false,
            status: ComplaintStatus::Unverified,
            rejection_reason: None,
            created_at: Utc::now().fixed_offset(),
            city: "Brumadinho".to_string(),
            uf: "MG".to_string(),
            title: "Buraco na rua".to_string(),
        }
    }

    /// Set the publisher.
    #[must_use]
    pub fn published_by(mut self, publisher_id: impl Into<String>) -> Self {
        self.publisher_id = Some(publisher_id.into());
        self
    }

    /// Mark anonymous.
    #[must_use]
    pub const fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Set the status.
    #[must_use]
    pub const fn with_status(mut self, status: ComplaintStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the creation timestamp.
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<FixedOffset>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the locality.
    #[must_use]
    pub fn in_locality(mut self, city: impl Into<String>, uf: impl Into<String>) -> Self {
        self.city = city.into();
        self.uf = uf.into();
        self
    }

    /// Set the title.
    #[must_use]
    pub fn titled(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// A migrated in-memory database.
pub struct TestDatabase {
    /// Database connection.
    pub conn: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl TestDatabase {
    /// Create a fresh in-memory database and run all migrations.
    ///
    /// The pool is pinned to one connection: every `SQLite` memory
    /// connection is a separate database.
    pub async fn in_memory() -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .idle_timeout(Duration::from_secs(3600))
            .max_lifetime(Duration::from_secs(3600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;
        Migrator::up(&conn, None).await?;

        info!("Created in-memory test database");

        Ok(Self {
            conn: Arc::new(conn),
            id_gen: IdGenerator::new(),
        })
    }

    /// Shared handle to the connection.
    #[must_use]
    pub fn connection(&self) -> Arc<DatabaseConnection> {
        Arc::clone(&self.conn)
    }

    /// Seed a resident.
    pub async fn insert_resident(
        &self,
        kind: ResidentKind,
        name: &str,
    ) -> Result<resident::Model, DbErr> {
        let id = self.id_gen.generate();
        resident::ActiveModel {
            id: Set(id.clone()),
            kind: Set(kind),
            name: Set(name.to_string()),
            email: Set(format!("{id}@example.com")),
            photo: Set(Some(format!("https://example.com/{id}.png"))),
            city: Set("Brumadinho".to_string()),
            uf: Set("MG".to_string()),
            token: Set(Some(format!("token-{id}"))),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Seed a verified public agency.
    pub async fn insert_agency(&self, name: &str) -> Result<public_agency::Model, DbErr> {
        let id = self.id_gen.generate();
        public_agency::ActiveModel {
            id: Set(id.clone()),
            name: Set(name.to_string()),
            email: Set(format!("{id}@agency.example.com")),
            photo: Set(None),
            city: Set("Brumadinho".to_string()),
            uf: Set("MG".to_string()),
            verification: Set(AgencyVerification::Accepted),
            token: Set(Some(format!("token-{id}"))),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Seed a category.
    pub async fn insert_category(&self, name: &str) -> Result<category::Model, DbErr> {
        category::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            description: Set(None),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Seed a complaint.
    pub async fn insert_complaint(
        &self,
        fixture: ComplaintFixture,
    ) -> Result<complaint::Model, DbErr> {
        complaint::ActiveModel {
            id: Set(self.id_gen.generate()),
            search_id: Set(self.id_gen.generate_search_id()),
            category_id: Set(fixture.category_id),
            title: Set(fixture.title),
            description: Set("Descrição do problema".to_string()),
            anonymous: Set(fixture.anonymous),
            publisher_id: Set(fixture.publisher_id),
            media: Set(json!([])),
            status: Set(fixture.status),
            rejection_reason: Set(fixture.rejection_reason),
            location: Set(json!({"type": "Point", "coordinates": [-44.2, -20.14]})),
            city: Set(fixture.city),
            uf: Set(fixture.uf),
            ip_address: Set("127.0.0.1".to_string()),
            created_at: Set(fixture.created_at),
            updated_at: Set(fixture.created_at),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Seed a comment on a complaint.
    pub async fn insert_comment(
        &self,
        complaint_id: &str,
        author: &CommentAuthor,
        description: &str,
    ) -> Result<comment::Model, DbErr> {
        let now = Utc::now().fixed_offset();
        comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            complaint_id: Set(complaint_id.to_string()),
            author_kind: Set(author.kind()),
            author_id: Set(author.id().to_string()),
            description: Set(description.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Seed a complaint like.
    pub async fn insert_complaint_like(
        &self,
        complaint_id: &str,
        resident_id: &str,
    ) -> Result<complaint_like::Model, DbErr> {
        complaint_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            complaint_id: Set(complaint_id.to_string()),
            resident_id: Set(resident_id.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Seed a comment like.
    pub async fn insert_comment_like(
        &self,
        comment_id: &str,
        resident_id: &str,
    ) -> Result<comment_like::Model, DbErr> {
        comment_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            comment_id: Set(comment_id.to_string()),
            resident_id: Set(resident_id.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(self.conn.as_ref())
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_defaults() {
        let fixture = ComplaintFixture::new("cat");
        assert_eq!(fixture.status, ComplaintStatus::Unverified);
        assert!(!fixture.anonymous);
        assert_eq!(fixture.city, "Brumadinho");
        assert_eq!(fixture.uf, "MG");
    }

    #[tokio::test]
    async fn test_in_memory_database_is_migrated() {
        let db = TestDatabase::in_memory().await.unwrap();
        let category = db.insert_category("Iluminação").await.unwrap();
        let resident = db
            .insert_resident(ResidentKind::Common, "João")
            .await
            .unwrap();
        let complaint = db
            .insert_complaint(ComplaintFixture::new(&category.id).published_by(&resident.id))
            .await
            .unwrap();

        assert_eq!(complaint.publisher_id.as_deref(), Some(resident.id.as_str()));
        assert_eq!(complaint.search_id.len(), 5);
    }
}
