//! Bool query assembly.

use crate::{
    clause::{Bound, Clause},
    document::Document,
    index::Index,
};
use serde_json::{Map, Value, json};
use std::fmt;

/// Default page size for [`Query::list`].
pub const DEFAULT_PAGE_SIZE: i64 = 100;
/// Default scroll cursor lifetime.
pub const DEFAULT_SCROLL_KEEP_ALIVE: &str = "5m";
/// Default number of documents per scroll batch.
pub const DEFAULT_SCROLL_SIZE: i64 = 1000;

/// Four-bucket boolean predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct BoolQuery {
    /// Must match, excluded from scoring.
    pub filter: Vec<Clause>,
    /// Must match, contributes to score.
    pub must: Vec<Clause>,
    /// Must not match.
    pub must_not: Vec<Clause>,
    /// Optional matches; at least `minimum_should_match` required when present.
    pub should: Vec<Clause>,
    /// Threshold applied only when `should` is non-empty.
    pub minimum_should_match: i32,
}

impl Default for BoolQuery {
    fn default() -> Self {
        Self {
            filter: Vec::new(),
            must: Vec::new(),
            must_not: Vec::new(),
            should: Vec::new(),
            minimum_should_match: 1,
        }
    }
}

impl BoolQuery {
    /// Create an empty bool query.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no bucket holds a clause.
    pub fn is_empty(&self) -> bool {
        self.filter.is_empty()
            && self.must.is_empty()
            && self.must_not.is_empty()
            && self.should.is_empty()
    }

    /// Query DSL form. Empty buckets are left out entirely.
    pub fn to_json(&self) -> Value {
        fn bucket(clauses: &[Clause]) -> Value {
            Value::Array(clauses.iter().map(Clause::to_json).collect())
        }

        let mut bool_query = Map::new();

        if !self.filter.is_empty() {
            bool_query.insert("filter".to_string(), bucket(&self.filter));
        }
        if !self.must.is_empty() {
            bool_query.insert("must".to_string(), bucket(&self.must));
        }
        if !self.must_not.is_empty() {
            bool_query.insert("must_not".to_string(), bucket(&self.must_not));
        }
        if !self.should.is_empty() {
            bool_query.insert("should".to_string(), bucket(&self.should));
            bool_query.insert(
                "minimum_should_match".to_string(),
                json!(self.minimum_should_match),
            );
        }

        json!({ "bool": bool_query })
    }
}

impl fmt::Display for BoolQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// One sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortField {
    /// Field to sort on.
    pub field: String,
    /// Direction.
    pub order: SortOrder,
}

impl SortField {
    /// Query DSL form.
    pub fn to_json(&self) -> Value {
        json!({ &self.field: { "order": self.order.as_str() } })
    }
}

/// Query builder bound to one index handle.
///
/// Obtained from [`Index::query`]. Methods consume and return the builder so
/// calls chain:
///
/// ```rust,no_run
/// # use quarry_search::{Document, Index, SortOrder, gte};
/// # #[derive(Default, serde::Serialize, serde::Deserialize)]
/// # struct Article { title: String }
/// # impl Document for Article {}
/// # async fn run(articles: Index<Article>) -> quarry_search::Result<()> {
/// let page = articles
///     .query()
///     .term("status", "published")
///     .must_match("title", "rust")
///     .range("views", [gte(100)])
///     .order_by("views", SortOrder::Desc)
///     .page(2, 20)
///     .list()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Query<T: Document> {
    pub(crate) index: Index<T>,
    pub(crate) bool_query: BoolQuery,
    pub(crate) sort: Vec<SortField>,
    pub(crate) size: i64,
    pub(crate) from: i64,
    pub(crate) scroll_keep_alive: String,
    pub(crate) scroll_size: i64,
}

impl<T: Document> Query<T> {
    pub(crate) fn new(index: Index<T>) -> Self {
        Self {
            index,
            bool_query: BoolQuery::default(),
            sort: Vec::new(),
            size: DEFAULT_PAGE_SIZE,
            from: 0,
            scroll_keep_alive: DEFAULT_SCROLL_KEEP_ALIVE.to_string(),
            scroll_size: DEFAULT_SCROLL_SIZE,
        }
    }

    /// Add a filter clause.
    pub fn add_filter(mut self, clause: Clause) -> Self {
        self.bool_query.filter.push(clause);
        self
    }

    /// Add a must clause.
    pub fn add_must(mut self, clause: Clause) -> Self {
        self.bool_query.must.push(clause);
        self
    }

    /// Add a must_not clause.
    pub fn add_must_not(mut self, clause: Clause) -> Self {
        self.bool_query.must_not.push(clause);
        self
    }

    /// Add a should clause.
    pub fn add_should(mut self, clause: Clause) -> Self {
        self.bool_query.should.push(clause);
        self
    }

    /// Minimum number of should clauses that must match. Defaults to 1.
    pub fn minimum_should_match(mut self, min: i32) -> Self {
        self.bool_query.minimum_should_match = min;
        self
    }

    // =========================================================================
    // Filter
    // =========================================================================

    /// Term in filter.
    pub fn term(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_filter(Clause::term(field, value))
    }

    /// Terms in filter.
    pub fn terms<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_filter(Clause::terms(field, values))
    }

    /// Match in filter.
    pub fn match_query(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_filter(Clause::matches(field, value))
    }

    /// Match phrase in filter.
    pub fn match_phrase(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_filter(Clause::match_phrase(field, value))
    }

    /// Range in filter.
    pub fn range(self, field: impl Into<String>, bounds: impl IntoIterator<Item = Bound>) -> Self {
        self.add_filter(Clause::range(field, bounds))
    }

    /// Exists in filter.
    pub fn exists(self, field: impl Into<String>) -> Self {
        self.add_filter(Clause::exists(field))
    }

    // =========================================================================
    // Must
    // =========================================================================

    /// Term in must.
    pub fn must_term(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_must(Clause::term(field, value))
    }

    /// Terms in must.
    pub fn must_terms<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_must(Clause::terms(field, values))
    }

    /// Match in must.
    pub fn must_match(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_must(Clause::matches(field, value))
    }

    /// Match phrase in must.
    pub fn must_match_phrase(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_must(Clause::match_phrase(field, value))
    }

    /// Range in must.
    pub fn must_range(
        self,
        field: impl Into<String>,
        bounds: impl IntoIterator<Item = Bound>,
    ) -> Self {
        self.add_must(Clause::range(field, bounds))
    }

    /// Exists in must.
    pub fn must_exist(self, field: impl Into<String>) -> Self {
        self.add_must(Clause::exists(field))
    }

    // =========================================================================
    // Must not
    // =========================================================================

    /// Term in must_not.
    pub fn must_not_term(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_must_not(Clause::term(field, value))
    }

    /// Terms in must_not.
    pub fn must_not_terms<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_must_not(Clause::terms(field, values))
    }

    /// Match in must_not.
    pub fn must_not_match(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_must_not(Clause::matches(field, value))
    }

    /// Match phrase in must_not.
    pub fn must_not_match_phrase(
        self,
        field: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.add_must_not(Clause::match_phrase(field, value))
    }

    /// Range in must_not.
    pub fn must_not_range(
        self,
        field: impl Into<String>,
        bounds: impl IntoIterator<Item = Bound>,
    ) -> Self {
        self.add_must_not(Clause::range(field, bounds))
    }

    /// Exists in must_not.
    pub fn must_not_exist(self, field: impl Into<String>) -> Self {
        self.add_must_not(Clause::exists(field))
    }

    // =========================================================================
    // Should
    // =========================================================================

    /// Term in should.
    pub fn should_term(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_should(Clause::term(field, value))
    }

    /// Terms in should.
    pub fn should_terms<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.add_should(Clause::terms(field, values))
    }

    /// Match in should.
    pub fn should_match(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_should(Clause::matches(field, value))
    }

    /// Match phrase in should.
    pub fn should_match_phrase(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.add_should(Clause::match_phrase(field, value))
    }

    /// Range in should.
    pub fn should_range(
        self,
        field: impl Into<String>,
        bounds: impl IntoIterator<Item = Bound>,
    ) -> Self {
        self.add_should(Clause::range(field, bounds))
    }

    /// Exists in should.
    pub fn should_exist(self, field: impl Into<String>) -> Self {
        self.add_should(Clause::exists(field))
    }

    // =========================================================================
    // Sorting, paging, scrolling
    // =========================================================================

    /// Append a sort key. Keys apply in the order added.
    pub fn order_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push(SortField {
            field: field.into(),
            order,
        });
        self
    }

    /// Select a page. `page_num` starts at 1; negative inputs clamp to 0, and
    /// page 0 behaves like page 1. Offsets past `i64::MAX` saturate.
    pub fn page(mut self, page_num: i64, page_size: i64) -> Self {
        let page_num = page_num.max(0);
        let page_size = page_size.max(0);
        self.size = page_size;
        self.from = (page_num - 1).max(0).saturating_mul(page_size);
        self
    }

    /// Scroll cursor lifetime, e.g. `"5m"`.
    pub fn scroll_alive(mut self, keep_alive: impl Into<String>) -> Self {
        self.scroll_keep_alive = keep_alive.into();
        self
    }

    /// Documents fetched per scroll batch.
    pub fn scroll_size(mut self, size: i64) -> Self {
        self.scroll_size = size;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The assembled bool query.
    pub fn bool_query(&self) -> &BoolQuery {
        &self.bool_query
    }

    /// Sort keys in priority order.
    pub fn sort_fields(&self) -> &[SortField] {
        &self.sort
    }

    /// Page size used by [`Query::list`].
    pub fn page_size(&self) -> i64 {
        self.size
    }

    /// Zero-based offset used by [`Query::list`].
    pub fn offset(&self) -> i64 {
        self.from
    }

    /// Scroll cursor lifetime.
    pub fn keep_alive(&self) -> &str {
        &self.scroll_keep_alive
    }

    /// Scroll batch size.
    pub fn batch_size(&self) -> i64 {
        self.scroll_size
    }
}

impl<T: Document> fmt::Display for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.bool_query, f)
    }
}

impl<T: Document> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("indices", &self.index.names())
            .field("bool_query", &self.bool_query)
            .field("sort", &self.sort)
            .field("size", &self.size)
            .field("from", &self.from)
            .finish()
    }
}
