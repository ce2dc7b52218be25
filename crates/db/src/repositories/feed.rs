//! Complaint feed repository.
//!
//! Keyset pagination over complaints ordered by `(key, id)`, where the key is
//! either the creation timestamp or the derived relevance score
//! (`likes + comments`). Each page is hydrated with its category, publisher,
//! likes and comment threads in a fixed number of batched queries that run in
//! the same transaction as the page query.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use denuncia_common::{AppError, AppResult};
use sea_orm::{
    AccessMode, ColumnTrait, Condition, ConnectionTrait, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, EntityTrait, FromQueryResult, IsolationLevel, Order, QueryFilter,
    QueryOrder, QueryResult, QuerySelect, TransactionTrait, Value,
    sea_query::{Expr, SimpleExpr},
};
use serde::{Deserialize, Serialize};

use crate::entities::{
    Category, Comment, CommentLike, Complaint, ComplaintLike, PublicAgency, Resident, category,
    comment, comment_like, complaint, complaint::ComplaintStatus, complaint_like, public_agency,
    resident,
};

/// Relevance of a complaint row: number of likes plus number of comments.
const RELEVANCE_SQL: &str = "((SELECT COUNT(*) FROM \"complaint_like\" \
     WHERE \"complaint_like\".\"complaint_id\" = \"complaint\".\"id\") + \
     (SELECT COUNT(*) FROM \"comment\" \
     WHERE \"comment\".\"complaint_id\" = \"complaint\".\"id\"))";

const RELEVANCE_ALIAS: &str = "relevance";

/// Equality predicates over indexed complaint columns, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintFilter {
    /// Complaint id.
    pub id: Option<String>,
    /// Public search id.
    pub search_id: Option<String>,
    /// Moderation status.
    pub status: Option<ComplaintStatus>,
    /// City and state, matched together.
    pub locality: Option<(String, String)>,
    /// Filing resident.
    pub publisher_id: Option<String>,
    /// Category.
    pub category_id: Option<String>,
}

impl ComplaintFilter {
    /// Filter matching a single complaint id.
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Filter matching a single search id.
    #[must_use]
    pub fn by_search_id(search_id: impl Into<String>) -> Self {
        Self {
            search_id: Some(search_id.into()),
            ..Self::default()
        }
    }

    /// Restrict to a status.
    #[must_use]
    pub const fn with_status(mut self, status: ComplaintStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restrict to a city and state.
    #[must_use]
    pub fn with_locality(mut self, city: impl Into<String>, uf: impl Into<String>) -> Self {
        self.locality = Some((city.into(), uf.into()));
        self
    }

    /// Restrict to a publisher.
    #[must_use]
    pub fn with_publisher(mut self, publisher_id: impl Into<String>) -> Self {
        self.publisher_id = Some(publisher_id.into());
        self
    }

    /// Restrict to a category.
    #[must_use]
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Whether any predicate is set.
    #[must_use]
    pub const fn has_filter(&self) -> bool {
        self.id.is_some()
            || self.search_id.is_some()
            || self.status.is_some()
            || self.locality.is_some()
            || self.publisher_id.is_some()
            || self.category_id.is_some()
    }

    /// The filter as a query condition. Empty filters match every row.
    #[must_use]
    pub fn condition(&self) -> Condition {
        let mut cond = Condition::all();
        if !self.has_filter() {
            return cond;
        }
        if let Some(ref id) = self.id {
            cond = cond.add(complaint::Column::Id.eq(id.as_str()));
        }
        if let Some(ref search_id) = self.search_id {
            cond = cond.add(complaint::Column::SearchId.eq(search_id.as_str()));
        }
        if let Some(status) = self.status {
            cond = cond.add(complaint::Column::Status.eq(status));
        }
        if let Some((ref city, ref uf)) = self.locality {
            cond = cond
                .add(complaint::Column::City.eq(city.as_str()))
                .add(complaint::Column::Uf.eq(uf.as_str()));
        }
        if let Some(ref publisher_id) = self.publisher_id {
            cond = cond.add(complaint::Column::PublisherId.eq(publisher_id.as_str()));
        }
        if let Some(ref category_id) = self.category_id {
            cond = cond.add(complaint::Column::CategoryId.eq(category_id.as_str()));
        }
        cond
    }
}

/// Primary sort key of a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Creation timestamp.
    #[default]
    Created,
    /// Likes plus comments, computed at read time.
    Relevance,
}

impl FromStr for SortKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "relevance" => Ok(Self::Relevance),
            other => Err(AppError::Validation(format!(
                "sortBased must be one of created, relevance (got {other})"
            ))),
        }
    }
}

/// Sort direction, written `1` (ascending) or `-1` (descending) on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "i8")]
pub enum SortDirection {
    /// Smallest key first.
    Ascending,
    /// Largest key first.
    #[default]
    Descending,
}

impl SortDirection {
    const fn order(self) -> Order {
        match self {
            Self::Ascending => Order::Asc,
            Self::Descending => Order::Desc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Self::Ascending),
            "-1" => Ok(Self::Descending),
            other => Err(AppError::Validation(format!(
                "order must be 1 or -1 (got {other})"
            ))),
        }
    }
}

impl TryFrom<serde_json::Value> for SortDirection {
    type Error = AppError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Number(n) => n.to_string().parse(),
            serde_json::Value::String(s) => s.parse(),
            other => Err(AppError::Validation(format!(
                "order must be 1 or -1 (got {other})"
            ))),
        }
    }
}

impl From<SortDirection> for i8 {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

/// Sort value of the last row of the previous page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeekValue {
    /// Value for [`SortKey::Created`].
    Created(DateTime<FixedOffset>),
    /// Value for [`SortKey::Relevance`].
    Relevance(i64),
}

impl SeekValue {
    /// Parse a raw cursor value for the given sort key.
    pub fn parse(sort: SortKey, raw: &str) -> AppResult<Self> {
        match sort {
            SortKey::Relevance => raw.trim().parse::<i64>().map(Self::Relevance).map_err(|_| {
                AppError::Validation(format!("lastValue must be an integer (got {raw})"))
            }),
            SortKey::Created => DateTime::parse_from_rfc3339(raw.trim())
                .map(|dt| Self::Created(dt.with_timezone(&Utc).fixed_offset()))
                .map_err(|_| {
                    AppError::Validation(format!("lastValue must be an RFC 3339 timestamp (got {raw})"))
                }),
        }
    }

    const fn key(&self) -> SortKey {
        match self {
            Self::Created(_) => SortKey::Created,
            Self::Relevance(_) => SortKey::Relevance,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Created(dt) => dt.into(),
            Self::Relevance(n) => n.into(),
        }
    }
}

/// Keyset cursor: last sort value plus tie-break id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seek {
    /// Sort value of the last row seen.
    pub value: SeekValue,
    /// Id of the last row seen.
    pub last_id: String,
}

/// A fully specified page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    /// Row predicates.
    pub filter: ComplaintFilter,
    /// Primary sort key.
    pub sort: SortKey,
    /// Direction applied to both the key and the id tie-break.
    pub direction: SortDirection,
    /// Resume point.
    pub seek: Option<Seek>,
    /// Maximum number of rows.
    pub limit: u64,
}

impl PageQuery {
    /// First page of `filter` in the default order (newest first).
    #[must_use]
    pub fn first(filter: ComplaintFilter, limit: u64) -> Self {
        Self {
            filter,
            sort: SortKey::default(),
            direction: SortDirection::default(),
            seek: None,
            limit,
        }
    }
}

/// Complaint row with its optional computed relevance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedComplaint {
    /// Stored columns.
    pub complaint: complaint::Model,
    /// Present when the query selected the relevance column.
    pub relevance: Option<i64>,
}

impl FromQueryResult for RankedComplaint {
    fn from_query_result(res: &QueryResult, pre: &str) -> Result<Self, sea_orm::DbErr> {
        Ok(Self {
            complaint: complaint::Model::from_query_result(res, pre)?,
            relevance: res.try_get::<i64>(pre, RELEVANCE_ALIAS).ok(),
        })
    }
}

/// Resolved comment author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorRecord {
    /// Resident author.
    Resident(resident::Model),
    /// Public agency author.
    PublicAgency(public_agency::Model),
}

/// Comment with its author and likes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBundle {
    /// Stored comment.
    pub comment: comment::Model,
    /// Author, if the account still exists.
    pub author: Option<AuthorRecord>,
    /// Ids of residents who liked the comment.
    pub likes: Vec<String>,
}

/// Complaint with everything needed to render it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintBundle {
    /// Stored complaint.
    pub complaint: complaint::Model,
    /// Computed relevance, when sorted by relevance.
    pub relevance: Option<i64>,
    /// Category, if it still exists.
    pub category: Option<category::Model>,
    /// Publisher account, unmasked.
    pub publisher: Option<resident::Model>,
    /// Ids of residents who liked the complaint.
    pub likes: Vec<String>,
    /// Comments in insertion order.
    pub comments: Vec<CommentBundle>,
}

/// Feed repository for keyset-paginated, hydrated complaint pages.
#[derive(Clone)]
pub struct FeedRepository {
    db: Arc<DatabaseConnection>,
}

impl FeedRepository {
    /// Create a new feed repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Fetch one hydrated page.
    ///
    /// Returns the rows strictly after the cursor in `(key, id)` order.
    pub async fn page(&self, query: &PageQuery) -> AppResult<Vec<ComplaintBundle>> {
        if let Some(ref seek) = query.seek {
            if seek.value.key() != query.sort {
                return Err(AppError::Validation(
                    "lastValue does not match the sort key".to_string(),
                ));
            }
        }

        let txn = self.begin_read().await?;
        let rows = Self::select_page(&txn, query).await?;
        let bundles = Self::hydrate(&txn, rows).await?;
        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(bundles)
    }

    /// Fetch a single hydrated complaint by id.
    pub async fn find_bundle(&self, id: &str) -> AppResult<Option<ComplaintBundle>> {
        let query = PageQuery::first(ComplaintFilter::by_id(id), 1);
        Ok(self.page(&query).await?.into_iter().next())
    }

    async fn begin_read(&self) -> AppResult<DatabaseTransaction> {
        let txn = match self.db.get_database_backend() {
            DatabaseBackend::Postgres => {
                self.db
                    .begin_with_config(
                        Some(IsolationLevel::RepeatableRead),
                        Some(AccessMode::ReadOnly),
                    )
                    .await
            }
            _ => self.db.begin().await,
        };
        txn.map_err(|e| AppError::Database(e.to_string()))
    }

    async fn select_page<C: ConnectionTrait>(
        conn: &C,
        query: &PageQuery,
    ) -> AppResult<Vec<RankedComplaint>> {
        let key: SimpleExpr = match query.sort {
            SortKey::Created => Expr::col((Complaint, complaint::Column::CreatedAt)).into(),
            SortKey::Relevance => Expr::cust(RELEVANCE_SQL),
        };

        let mut select = Complaint::find().filter(query.filter.condition());

        if query.sort == SortKey::Relevance {
            select = select.expr_as(Expr::cust(RELEVANCE_SQL), RELEVANCE_ALIAS);
        }

        if let Some(ref seek) = query.seek {
            let value = seek.value.clone().into_value();
            let last_id = seek.last_id.as_str();
            let (past_key, past_id) = match query.direction {
                SortDirection::Ascending => (
                    Expr::expr(key.clone()).gt(value.clone()),
                    complaint::Column::Id.gt(last_id),
                ),
                SortDirection::Descending => (
                    Expr::expr(key.clone()).lt(value.clone()),
                    complaint::Column::Id.lt(last_id),
                ),
            };
            select = select.filter(
                Condition::any().add(past_key).add(
                    Condition::all()
                        .add(Expr::expr(key.clone()).eq(value))
                        .add(past_id),
                ),
            );
        }

        let order = query.direction.order();
        select
            .order_by(key, order.clone())
            .order_by(complaint::Column::Id, order)
            .limit(query.limit)
            .into_model::<RankedComplaint>()
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn hydrate<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<RankedComplaint>,
    ) -> AppResult<Vec<ComplaintBundle>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let complaint_ids: Vec<String> = rows.iter().map(|r| r.complaint.id.clone()).collect();
        let category_ids: HashSet<String> =
            rows.iter().map(|r| r.complaint.category_id.clone()).collect();

        let categories: HashMap<String, category::Model> = Category::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        let complaint_likes = ComplaintLike::find()
            .filter(complaint_like::Column::ComplaintId.is_in(complaint_ids.clone()))
            .order_by_asc(complaint_like::Column::CreatedAt)
            .order_by_asc(complaint_like::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let comments = Comment::find()
            .filter(comment::Column::ComplaintId.is_in(complaint_ids))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let comment_likes = if comments.is_empty() {
            Vec::new()
        } else {
            CommentLike::find()
                .filter(
                    comment_like::Column::CommentId
                        .is_in(comments.iter().map(|c| c.id.clone()).collect::<Vec<_>>()),
                )
                .order_by_asc(comment_like::Column::CreatedAt)
                .order_by_asc(comment_like::Column::Id)
                .all(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
        };

        // Publishers and resident comment authors share one lookup.
        let mut resident_ids: HashSet<String> = rows
            .iter()
            .filter_map(|r| r.complaint.publisher_id.clone())
            .collect();
        let mut agency_ids: HashSet<String> = HashSet::new();
        for c in &comments {
            match c.author_kind {
                comment::AuthorKind::Resident => resident_ids.insert(c.author_id.clone()),
                comment::AuthorKind::PublicAgency => agency_ids.insert(c.author_id.clone()),
            };
        }

        let residents: HashMap<String, resident::Model> = if resident_ids.is_empty() {
            HashMap::new()
        } else {
            Resident::find()
                .filter(resident::Column::Id.is_in(resident_ids))
                .all(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .into_iter()
                .map(|r| (r.id.clone(), r))
                .collect()
        };

        let agencies: HashMap<String, public_agency::Model> = if agency_ids.is_empty() {
            HashMap::new()
        } else {
            PublicAgency::find()
                .filter(public_agency::Column::Id.is_in(agency_ids))
                .all(conn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .into_iter()
                .map(|a| (a.id.clone(), a))
                .collect()
        };

        let mut likes_by_complaint: HashMap<String, Vec<String>> = HashMap::new();
        for like in complaint_likes {
            likes_by_complaint
                .entry(like.complaint_id)
                .or_default()
                .push(like.resident_id);
        }

        let mut likes_by_comment: HashMap<String, Vec<String>> = HashMap::new();
        for like in comment_likes {
            likes_by_comment
                .entry(like.comment_id)
                .or_default()
                .push(like.resident_id);
        }

        let mut comments_by_complaint: HashMap<String, Vec<CommentBundle>> = HashMap::new();
        for c in comments {
            let author = match c.author_kind {
                comment::AuthorKind::Resident => residents
                    .get(&c.author_id)
                    .cloned()
                    .map(AuthorRecord::Resident),
                comment::AuthorKind::PublicAgency => agencies
                    .get(&c.author_id)
                    .cloned()
                    .map(AuthorRecord::PublicAgency),
            };
            let likes = likes_by_comment.remove(&c.id).unwrap_or_default();
            comments_by_complaint
                .entry(c.complaint_id.clone())
                .or_default()
                .push(CommentBundle {
                    comment: c,
                    author,
                    likes,
                });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.complaint.id.clone();
                ComplaintBundle {
                    category: categories.get(&row.complaint.category_id).cloned(),
                    publisher: row
                        .complaint
                        .publisher_id
                        .as_ref()
                        .and_then(|p| residents.get(p).cloned()),
                    likes: likes_by_complaint.remove(&id).unwrap_or_default(),
                    comments: comments_by_complaint.remove(&id).unwrap_or_default(),
                    relevance: row.relevance,
                    complaint: row.complaint,
                }
            })
            .collect())
    }
}
