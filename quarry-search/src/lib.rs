//! Typed query building and scroll streaming over a document search engine.
//!
//! This crate provides:
//! - Bool queries assembled from term, terms, match, phrase, range and exists
//!   clauses across the filter, must, must-not and should buckets
//! - Paged searches and scroll cursors with background prefetch
//! - Translation of hits into typed documents, with metadata slots bound to
//!   the engine's id, index, type, version and score
//! - Single-document CRUD and index administration
//!
//! # Example
//!
//! ```rust,no_run
//! use quarry_search::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Article {
//!     title: String,
//!     views: i64,
//!     #[serde(default, skip_serializing)]
//!     id: String,
//! }
//!
//! impl Document for Article {
//!     fn metadata() -> Vec<(MetaField, &'static str)> {
//!         vec![(MetaField::Id, "id")]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = SearchClient::new(SearchConfig::new("http://localhost:9200"))?;
//!     let articles = client.index::<Article>("articles");
//!
//!     let page = articles
//!         .query()
//!         .match_query("title", "rust")
//!         .range("views", [gte(10)])
//!         .page(1, 20)
//!         .list()
//!         .await?;
//!     println!("{} of {}", page.len(), page.total);
//!
//!     let mut scroll = articles.query().exists("title").scroll().await?;
//!     while let Some(article) = scroll.next().await? {
//!         println!("{}: {}", article.id, article.title);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod clause;
mod client;
mod config;
mod document;
mod engine;
mod error;
mod index;
mod query;
mod scroll;
mod search;
mod settings;
mod translate;
mod transport;

pub use clause::{Bound, Clause, Range, gt, gte, lt, lte};
pub use client::SearchClient;
pub use config::{DEFAULT_DOC_TYPE, SearchConfig};
pub use document::{Document, MetaField, Metadata, Schema, SchemaBuilder, SlotKind};
pub use engine::OpenSearchTransport;
pub use error::{Result, SearchError};
pub use index::Index;
pub use query::{
    BoolQuery, DEFAULT_PAGE_SIZE, DEFAULT_SCROLL_KEEP_ALIVE, DEFAULT_SCROLL_SIZE, Query,
    SortField, SortOrder,
};
pub use scroll::{Scroll, ScrollState};
pub use settings::IndexSettings;
pub use translate::SearchResult;
pub use transport::{RawHit, RawHits, RawSearchResponse, SearchRequest, Transport};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        Clause, Document, Index, IndexSettings, MetaField, Query, Result, Scroll, SearchClient,
        SearchConfig, SearchError, SearchResult, SortOrder, gt, gte, lt, lte,
    };
}
