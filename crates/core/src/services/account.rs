//! Account resolution and role checks.

use denuncia_common::{AppError, AppResult};
use denuncia_db::{
    entities::{comment::CommentAuthor, public_agency, resident},
    repositories::{PublicAgencyRepository, ResidentRepository},
};

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    /// A resident (common, auditor or admin).
    Resident(resident::Model),
    /// A public agency.
    Agency(public_agency::Model),
}

impl Account {
    /// Account id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Resident(r) => &r.id,
            Self::Agency(a) => &a.id,
        }
    }

    /// The resident behind this account, if any.
    #[must_use]
    pub const fn as_resident(&self) -> Option<&resident::Model> {
        match self {
            Self::Resident(r) => Some(r),
            Self::Agency(_) => None,
        }
    }

    /// Whether the caller is an auditor. Admins are not auditors.
    #[must_use]
    pub fn is_auditor(&self) -> bool {
        self.as_resident().is_some_and(resident::Model::is_auditor)
    }

    /// Whether the caller is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.as_resident().is_some_and(resident::Model::is_admin)
    }

    /// How this account is recorded as a comment author.
    #[must_use]
    pub fn comment_author(&self) -> CommentAuthor {
        match self {
            Self::Resident(r) => CommentAuthor::Resident(r.id.clone()),
            Self::Agency(a) => CommentAuthor::PublicAgency(a.id.clone()),
        }
    }

    /// The resident behind this account, or Forbidden.
    pub fn require_resident(&self) -> AppResult<&resident::Model> {
        self.as_resident()
            .ok_or_else(|| AppError::Forbidden("Only residents can do this".to_string()))
    }

    /// The auditor behind this account, or Forbidden.
    pub fn require_auditor(&self) -> AppResult<&resident::Model> {
        match self.as_resident() {
            Some(r) if r.is_auditor() => Ok(r),
            _ => Err(AppError::Forbidden("Auditor role required".to_string())),
        }
    }

    /// The admin behind this account, or Forbidden.
    pub fn require_admin(&self) -> AppResult<&resident::Model> {
        match self.as_resident() {
            Some(r) if r.is_admin() => Ok(r),
            _ => Err(AppError::Forbidden("Admin role required".to_string())),
        }
    }
}

/// Resolves API tokens to accounts.
#[derive(Clone)]
pub struct AccountService {
    resident_repo: ResidentRepository,
    agency_repo: PublicAgencyRepository,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(resident_repo: ResidentRepository, agency_repo: PublicAgencyRepository) -> Self {
        Self {
            resident_repo,
            agency_repo,
        }
    }

    /// Resolve a bearer token. Residents are checked before agencies.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<Account> {
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }
        if let Some(resident) = self.resident_repo.find_by_token(token).await? {
            return Ok(Account::Resident(resident));
        }
        if let Some(agency) = self.agency_repo.find_by_token(token).await? {
            return Ok(Account::Agency(agency));
        }
        Err(AppError::Unauthorized)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use denuncia_db::entities::{public_agency::AgencyVerification, resident::ResidentKind};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn resident(kind: ResidentKind) -> resident::Model {
        resident::Model {
            id: "r1".to_string(),
            kind,
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            photo: None,
            city: "Brumadinho".to_string(),
            uf: "MG".to_string(),
            token: Some("t".to_string()),
            created_at: Utc::now().into(),
        }
    }

    fn agency() -> public_agency::Model {
        public_agency::Model {
            id: "a1".to_string(),
            name: "Defesa Civil".to_string(),
            email: "dc@example.com".to_string(),
            photo: None,
            city: "Brumadinho".to_string(),
            uf: "MG".to_string(),
            verification: AgencyVerification::Accepted,
            token: Some("ta".to_string()),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn test_roles() {
        let auditor = Account::Resident(resident(ResidentKind::Auditor));
        assert!(auditor.is_auditor());
        assert!(auditor.require_auditor().is_ok());
        assert!(auditor.require_admin().is_err());

        let admin = Account::Resident(resident(ResidentKind::Admin));
        assert!(admin.is_admin());
        assert!(!admin.is_auditor());

        let agency = Account::Agency(agency());
        assert!(matches!(agency.require_resident(), Err(AppError::Forbidden(_))));
        assert_eq!(
            agency.comment_author(),
            CommentAuthor::PublicAgency("a1".to_string())
        );
    }

    #[tokio::test]
    async fn test_authenticate_falls_back_to_agency() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<resident::Model>::new()])
                .append_query_results([[agency()]])
                .into_connection(),
        );
        let service = AccountService::new(
            ResidentRepository::new(Arc::clone(&db)),
            PublicAgencyRepository::new(db),
        );

        let account = service.authenticate_by_token("ta").await.unwrap();
        assert!(matches!(account, Account::Agency(ref a) if a.id == "a1"));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<resident::Model>::new()])
                .append_query_results([Vec::<public_agency::Model>::new()])
                .into_connection(),
        );
        let service = AccountService::new(
            ResidentRepository::new(Arc::clone(&db)),
            PublicAgencyRepository::new(db),
        );

        let result = service.authenticate_by_token("nope").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
