//! Transport seam between the query layer and the search engine.

use crate::{error::Result, query::SortField};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};

/// Everything the engine needs to run one search or open one scroll.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Target indices.
    pub indices: Vec<String>,
    /// Document type discriminator.
    pub doc_type: String,
    /// Compiled query DSL.
    pub query: Value,
    /// Source fields to return. `None` returns the whole body, an empty
    /// list disables `_source`.
    pub source: Option<Vec<String>>,
    /// Sort keys in priority order.
    pub sort: Vec<SortField>,
    /// Page or batch size.
    pub size: i64,
    /// Offset; scrolls leave this unset.
    pub from: Option<i64>,
}

impl SearchRequest {
    /// Build the request body.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();

        body.insert("query".to_string(), self.query.clone());

        match &self.source {
            Some(fields) if fields.is_empty() => {
                body.insert("_source".to_string(), json!(false));
            }
            Some(fields) => {
                body.insert("_source".to_string(), json!({ "includes": fields }));
            }
            None => {}
        }

        if !self.sort.is_empty() {
            body.insert(
                "sort".to_string(),
                Value::Array(self.sort.iter().map(SortField::to_json).collect()),
            );
        }

        body.insert("size".to_string(), json!(self.size));

        if let Some(from) = self.from {
            body.insert("from".to_string(), json!(from));
        }

        Value::Object(body)
    }

    /// Indices joined for a single multi-index call.
    pub fn index_path(&self) -> String {
        self.indices.join(",")
    }
}

/// Search or scroll response as returned by the engine.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawSearchResponse {
    /// Cursor identifier, present on scroll responses.
    #[serde(rename = "_scroll_id", default)]
    pub scroll_id: Option<String>,
    /// Hit container. Absent only on malformed responses.
    #[serde(default)]
    pub hits: Option<RawHits>,
}

impl RawSearchResponse {
    /// Response carrying the given hits and total.
    pub fn with_hits(total: u64, hits: Vec<RawHit>) -> Self {
        Self {
            scroll_id: None,
            hits: Some(RawHits {
                total,
                hits: Some(hits),
            }),
        }
    }

    /// Attach a cursor identifier.
    pub fn scroll_id(mut self, scroll_id: impl Into<String>) -> Self {
        self.scroll_id = Some(scroll_id.into());
        self
    }

    /// Number of hits in this batch, zero when the container is missing.
    pub fn hit_count(&self) -> usize {
        self.hits
            .as_ref()
            .and_then(|h| h.hits.as_ref())
            .map_or(0, Vec::len)
    }

    /// True when both the container and its hit list are present.
    pub fn has_hits_container(&self) -> bool {
        matches!(&self.hits, Some(RawHits { hits: Some(_), .. }))
    }
}

/// Hit container.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawHits {
    /// Total matches across all pages.
    #[serde(default, deserialize_with = "deserialize_total")]
    pub total: u64,
    /// Hits in this page or batch.
    #[serde(default)]
    pub hits: Option<Vec<RawHit>>,
}

/// One hit: stored body plus engine metadata.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawHit {
    /// Document id.
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Index holding the document.
    #[serde(rename = "_index", default)]
    pub index: String,
    /// Document type, omitted by typeless engines.
    #[serde(rename = "_type", default)]
    pub doc_type: Option<String>,
    /// Document version.
    #[serde(rename = "_version", default)]
    pub version: Option<i64>,
    /// Relevance score; null for unscored queries.
    #[serde(rename = "_score", default)]
    pub score: Option<f64>,
    /// Stored document body.
    #[serde(rename = "_source", default)]
    pub source: Option<Value>,
}

impl RawHit {
    /// Hit with an id, index and body.
    pub fn new(id: impl Into<String>, index: impl Into<String>, source: Value) -> Self {
        Self {
            id: id.into(),
            index: index.into(),
            source: Some(source),
            ..Self::default()
        }
    }
}

// Engines report the total either as a number or as `{ "value", "relation" }`.
fn deserialize_total<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Total {
        Count(u64),
        Object { value: u64 },
    }

    Ok(match Option::<Total>::deserialize(deserializer)? {
        Some(Total::Count(n)) | Some(Total::Object { value: n }) => n,
        None => 0,
    })
}

/// Operations the query layer needs from a search engine.
///
/// [`crate::OpenSearchTransport`] talks to a real cluster; tests plug in an
/// in-memory implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Run one paged search.
    async fn search(&self, request: &SearchRequest) -> Result<RawSearchResponse>;

    /// Run the first request of a scroll, keeping the cursor alive for `keep_alive`.
    async fn open_scroll(
        &self,
        request: &SearchRequest,
        keep_alive: &str,
    ) -> Result<RawSearchResponse>;

    /// Advance a cursor. Fails with [`crate::SearchError::ScrollExhausted`]
    /// once no batches remain.
    async fn scroll(&self, scroll_id: &str, keep_alive: &str) -> Result<RawSearchResponse>;

    /// Release a cursor.
    async fn clear_scroll(&self, scroll_id: &str) -> Result<()>;

    /// Fetch one document. `Ok(None)` when it does not exist.
    async fn get(&self, index: &str, doc_type: &str, id: &str) -> Result<Option<RawHit>>;

    /// Create or replace one document.
    async fn index(&self, index: &str, doc_type: &str, id: &str, body: Value) -> Result<()>;

    /// Merge a partial body into an existing document.
    async fn update(&self, index: &str, doc_type: &str, id: &str, partial: Value) -> Result<()>;

    /// Delete one document. `Ok(false)` when it did not exist.
    async fn delete(&self, index: &str, doc_type: &str, id: &str) -> Result<bool>;

    /// Create an index with a settings/mappings body.
    async fn create_index(&self, name: &str, body: Value) -> Result<()>;

    /// Delete one or more indices in one call.
    async fn delete_index(&self, names: &[String]) -> Result<()>;

    /// Check whether an index exists.
    async fn index_exists(&self, name: &str) -> Result<bool>;

    /// Check that the engine answers.
    async fn ping(&self) -> Result<bool>;
}
