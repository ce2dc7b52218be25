//! Complaint feeds.
//!
//! Every listing in the system is a keyset-paginated scan over complaints
//! with a different filter and access rule. Cursor and parameter validation
//! happens before any store access; each page is bounded by the configured
//! page limit and the store deadline.

use std::time::Duration;

use crate::services::{
    account::Account,
    projection::{EnrichedComplaint, project},
};
use denuncia_common::{AppError, AppResult, Config, config::LocalityConfig, with_deadline};
use denuncia_db::{
    entities::complaint::ComplaintStatus,
    repositories::{
        ComplaintFilter, FeedRepository, PageQuery, Seek, SeekValue, SortDirection, SortKey,
    },
};
use serde::Deserialize;

/// Sort and cursor parameters shared by every feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    #[serde(default)]
    pub sort_based: SortKey,
    #[serde(default)]
    pub order: SortDirection,
    /// Sort value of the last row seen: an integer for relevance, an
    /// RFC 3339 timestamp for created.
    #[serde(default)]
    pub last_value: Option<serde_json::Value>,
    #[serde(default)]
    pub last_id: Option<String>,
}

impl PageRequest {
    /// First page in the given order.
    #[must_use]
    pub fn first(sort_based: SortKey, order: SortDirection) -> Self {
        Self {
            sort_based,
            order,
            last_value: None,
            last_id: None,
        }
    }

    /// Next page after a row with the given sort value and id.
    #[must_use]
    pub fn after(mut self, last_value: serde_json::Value, last_id: impl Into<String>) -> Self {
        self.last_value = Some(last_value);
        self.last_id = Some(last_id.into());
        self
    }

    /// Validate and parse the cursor. `lastValue` and `lastId` come as a pair.
    pub fn seek(&self) -> AppResult<Option<Seek>> {
        let last_value = self.last_value.as_ref().filter(|v| !v.is_null());
        match (last_value, self.last_id.as_deref()) {
            (None, None) => Ok(None),
            (Some(_), None) | (None, Some(_)) => Err(AppError::Validation(
                "lastValue and lastId must be given together".to_string(),
            )),
            (Some(value), Some(last_id)) => {
                if last_id.is_empty() {
                    return Err(AppError::Validation("lastId must not be empty".to_string()));
                }
                let raw = match value {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Number(n) => n.to_string(),
                    other => {
                        return Err(AppError::Validation(format!(
                            "lastValue must be a number or a string (got {other})"
                        )));
                    }
                };
                Ok(Some(Seek {
                    value: SeekValue::parse(self.sort_based, &raw)?,
                    last_id: last_id.to_string(),
                }))
            }
        }
    }
}

/// Feed service: the cursor pagination engine plus its call sites.
#[derive(Clone)]
pub struct FeedService {
    feed_repo: FeedRepository,
    page_limit: u64,
    timeout: Duration,
    locality: LocalityConfig,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub fn new(feed_repo: FeedRepository, config: &Config) -> Self {
        Self {
            feed_repo,
            page_limit: config.feed.page_limit,
            timeout: config.database.operation_timeout(),
            locality: config.locality.clone(),
        }
    }

    /// One page of complaints matching `filter`, strictly after the cursor.
    pub async fn page(
        &self,
        filter: ComplaintFilter,
        request: &PageRequest,
    ) -> AppResult<Vec<EnrichedComplaint>> {
        let seek = request.seek()?;
        let query = PageQuery {
            filter,
            sort: request.sort_based,
            direction: request.order,
            seek,
            limit: self.page_limit,
        };

        tracing::debug!(
            sort = ?query.sort,
            direction = ?query.direction,
            has_filter = query.filter.has_filter(),
            has_cursor = query.seek.is_some(),
            "Fetching complaint page"
        );

        let bundles =
            with_deadline(self.timeout, "complaint page", self.feed_repo.page(&query)).await?;
        Ok(bundles.into_iter().map(project).collect())
    }

    /// Every complaint, optionally of one category. Auditors only.
    pub async fn list(
        &self,
        caller: &Account,
        category: Option<&str>,
        request: &PageRequest,
    ) -> AppResult<Vec<EnrichedComplaint>> {
        request.seek()?;
        caller.require_auditor()?;
        self.page(in_category(ComplaintFilter::default(), category), request)
            .await
    }

    /// Accepted complaints of a supported city, optionally of one category.
    pub async fn by_city(
        &self,
        city: &str,
        uf: &str,
        category: Option<&str>,
        request: &PageRequest,
    ) -> AppResult<Vec<EnrichedComplaint>> {
        request.seek()?;
        self.check_locality(city, uf)?;
        let filter = ComplaintFilter::default()
            .with_status(ComplaintStatus::Accepted)
            .with_locality(city, uf);
        self.page(in_category(filter, category), request).await
    }

    /// The caller's own complaints, looked up by their email.
    pub async fn by_publisher(
        &self,
        caller: &Account,
        email: &str,
        status: Option<ComplaintStatus>,
        request: &PageRequest,
    ) -> AppResult<Vec<EnrichedComplaint>> {
        request.seek()?;
        let resident = caller.require_resident()?;
        if !resident.email.eq_ignore_ascii_case(email.trim()) {
            return Err(AppError::Forbidden(
                "Only the owner can list these complaints".to_string(),
            ));
        }

        let mut filter = ComplaintFilter::default().with_publisher(&resident.id);
        if let Some(status) = status {
            filter = filter.with_status(status);
        }
        self.page(filter, request).await
    }

    /// Complaints of a city in a given status. Auditors only.
    pub async fn by_status_and_city(
        &self,
        caller: &Account,
        status: ComplaintStatus,
        city: &str,
        uf: &str,
        request: &PageRequest,
    ) -> AppResult<Vec<EnrichedComplaint>> {
        request.seek()?;
        caller.require_auditor()?;
        self.check_locality(city, uf)?;
        let filter = ComplaintFilter::default()
            .with_status(status)
            .with_locality(city, uf);
        self.page(filter, request).await
    }

    /// A single complaint by its public search id.
    pub async fn by_search_id(&self, search_id: &str) -> AppResult<EnrichedComplaint> {
        self.single(ComplaintFilter::by_search_id(search_id))
            .await?
            .ok_or_else(|| AppError::ComplaintNotFound(search_id.to_string()))
    }

    /// A single complaint by id.
    pub async fn by_id(&self, id: &str) -> AppResult<EnrichedComplaint> {
        self.single(ComplaintFilter::by_id(id))
            .await?
            .ok_or_else(|| AppError::ComplaintNotFound(id.to_string()))
    }

    async fn single(&self, filter: ComplaintFilter) -> AppResult<Option<EnrichedComplaint>> {
        let query = PageQuery::first(filter, 1);
        let bundles =
            with_deadline(self.timeout, "complaint lookup", self.feed_repo.page(&query)).await?;
        Ok(bundles.into_iter().next().map(project))
    }

    fn check_locality(&self, city: &str, uf: &str) -> AppResult<()> {
        if self.locality.matches(city, uf) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Unsupported locality {city}/{uf}"
            )))
        }
    }
}

fn in_category(filter: ComplaintFilter, category: Option<&str>) -> ComplaintFilter {
    match category {
        Some(id) => filter.with_category(id),
        None => filter,
    }
}
