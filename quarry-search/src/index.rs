//! Index handles and single-document operations.

use crate::{
    config::split_list,
    document::{Document, Metadata, Schema},
    error::{Result, SearchError},
    query::Query,
    transport::Transport,
};
use quarry_log::debug;
use serde::Serialize;
use std::{fmt, sync::Arc};

/// Handle to one or more indices holding documents of type `T`.
///
/// Created by [`crate::SearchClient::index`]. Searches span every named
/// index; single-document operations target the first one.
pub struct Index<T> {
    names: Arc<Vec<String>>,
    doc_type: String,
    schema: Arc<Schema<T>>,
    transport: Arc<dyn Transport>,
}

impl<T: Document> Index<T> {
    pub(crate) fn new(names: &str, doc_type: &str, transport: Arc<dyn Transport>) -> Self {
        Self {
            names: Arc::new(split_list(names)),
            doc_type: doc_type.to_string(),
            schema: Arc::new(Schema::of()),
            transport,
        }
    }

    /// Replace the derived schema with a hand-built one.
    pub fn with_schema(mut self, schema: Schema<T>) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    /// Override the document type. Anything other than `_doc` may not be
    /// accepted by newer engines.
    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = doc_type.into();
        self
    }

    /// Index names, trimmed.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Document type discriminator.
    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// Schema used for projection and translation.
    pub fn schema(&self) -> &Schema<T> {
        &self.schema
    }

    pub(crate) fn shared_schema(&self) -> Arc<Schema<T>> {
        self.schema.clone()
    }

    pub(crate) fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    fn primary(&self) -> Result<&str> {
        self.names
            .first()
            .map(String::as_str)
            .ok_or_else(|| SearchError::Config("Index handle has no index name".to_string()))
    }

    /// Start a query against these indices.
    pub fn query(&self) -> Query<T> {
        Query::new(self.clone())
    }

    /// Store a document under `id`, replacing any existing one.
    pub async fn save(&self, id: &str, doc: &T) -> Result<()> {
        let index = self.primary()?;
        debug!("Saving document {} in index {}", id, index);

        let body = self.schema.to_body(doc)?;
        self.transport.index(index, &self.doc_type, id, body).await
    }

    /// Fetch a document by id. A missing document is `Ok(None)`.
    pub async fn find(&self, id: &str) -> Result<Option<T>> {
        let index = self.primary()?;
        debug!("Getting document {} from index {}", id, index);

        let Some(hit) = self.transport.get(index, &self.doc_type, id).await? else {
            return Ok(None);
        };

        let meta = Metadata {
            id: hit.id.clone(),
            index: if hit.index.is_empty() {
                index.to_string()
            } else {
                hit.index.clone()
            },
            doc_type: hit.doc_type.clone().unwrap_or_else(|| self.doc_type.clone()),
            version: hit.version,
            score: None,
        };

        self.schema.to_document(hit.source.as_ref(), &meta).map(Some)
    }

    /// Merge `updates` into the stored document.
    pub async fn update(&self, id: &str, updates: impl Serialize) -> Result<()> {
        let index = self.primary()?;
        debug!("Updating document {} in index {}", id, index);

        let partial = serde_json::to_value(updates)?;
        self.transport.update(index, &self.doc_type, id, partial).await
    }

    /// Delete a document. Returns `false` when it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let index = self.primary()?;
        debug!("Deleting document {} from index {}", id, index);

        self.transport.delete(index, &self.doc_type, id).await
    }
}

impl<T> Clone for Index<T> {
    fn clone(&self) -> Self {
        Self {
            names: self.names.clone(),
            doc_type: self.doc_type.clone(),
            schema: self.schema.clone(),
            transport: self.transport.clone(),
        }
    }
}

impl<T> fmt::Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Index")
            .field("names", &self.names)
            .field("doc_type", &self.doc_type)
            .field("schema", &self.schema)
            .finish()
    }
}
