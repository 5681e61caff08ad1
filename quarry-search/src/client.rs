//! Search client: index handles and index administration.

use crate::{
    config::{SearchConfig, split_list},
    document::Document,
    engine::OpenSearchTransport,
    error::{Result, SearchError},
    index::Index,
    settings::IndexSettings,
    transport::Transport,
};
use quarry_log::{debug, info};
use std::{fmt, sync::Arc};

/// Entry point to a search engine.
///
/// ```rust,no_run
/// use quarry_search::{SearchClient, SearchConfig};
///
/// # async fn run() -> quarry_search::Result<()> {
/// let client = SearchClient::connect(SearchConfig::new("http://localhost:9200")).await?;
/// assert!(client.ping().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn Transport>,
    config: Arc<SearchConfig>,
}

impl SearchClient {
    /// Build a client over [`OpenSearchTransport`]. No request is sent.
    pub fn new(config: SearchConfig) -> Result<Self> {
        let transport = OpenSearchTransport::new(&config)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Build a client and, when the config asks for it, ping the engine.
    pub async fn connect(config: SearchConfig) -> Result<Self> {
        let client = Self::new(config)?;
        if client.config.health_check {
            client.check_health().await?;
        }
        Ok(client)
    }

    /// Fail unless the engine answers a ping within the configured
    /// `connect_timeout`.
    pub async fn check_health(&self) -> Result<()> {
        debug!("Checking engine health");
        let limit = self.config.connect_timeout;
        let answered = tokio::time::timeout(limit, self.ping())
            .await
            .map_err(|_| {
                SearchError::transport(504, format!("Engine did not answer ping within {:?}", limit))
            })??;
        if !answered {
            return Err(SearchError::transport(503, "Engine did not answer ping"));
        }
        info!("Search engine is healthy");
        Ok(())
    }

    /// Build a client over any transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: SearchConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The shared transport.
    pub fn transport(&self) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    /// Handle to the comma-separated `names`, holding documents of type `T`.
    pub fn index<T: Document>(&self, names: &str) -> Index<T> {
        Index::new(names, &self.config.doc_type, self.transport.clone())
    }

    /// Create an index.
    pub async fn create_index(&self, name: &str, settings: IndexSettings) -> Result<()> {
        info!("Creating index: {}", name);
        self.transport.create_index(name, settings.to_json()).await
    }

    /// Delete one or more comma-separated indices in a single call.
    pub async fn delete_index(&self, names: &str) -> Result<()> {
        let names = split_list(names);
        if names.is_empty() {
            return Err(SearchError::Config("No index name given".to_string()));
        }

        info!("Deleting indices: {}", names.join(","));
        self.transport.delete_index(&names).await
    }

    /// Check if an index exists.
    pub async fn index_exists(&self, name: &str) -> Result<bool> {
        debug!("Checking if index exists: {}", name);
        self.transport.index_exists(name).await
    }

    /// True when the engine answers.
    pub async fn ping(&self) -> Result<bool> {
        self.transport.ping().await
    }
}

impl fmt::Debug for SearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchClient")
            .field("urls", &self.config.urls)
            .field("doc_type", &self.config.doc_type)
            .finish()
    }
}
