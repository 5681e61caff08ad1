//! Client configuration.

use crate::error::{Result, SearchError};
use std::time::Duration;

/// Document type sent with every request unless overridden.
pub const DEFAULT_DOC_TYPE: &str = "_doc";

/// Search client configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Engine URLs.
    pub urls: Vec<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password.
    pub password: Option<String>,
    /// How long the health check waits for the engine to answer a ping.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Document type discriminator for new index handles.
    pub doc_type: String,
    /// Ping the engine while constructing the client.
    pub health_check: bool,
}

impl SearchConfig {
    /// Create a configuration from a comma-separated host list.
    ///
    /// ```rust
    /// use quarry_search::SearchConfig;
    ///
    /// let config = SearchConfig::new("http://a:9200, http://b:9200");
    /// assert_eq!(config.urls, vec!["http://a:9200", "http://b:9200"]);
    /// ```
    pub fn new(hosts: impl AsRef<str>) -> Self {
        Self {
            urls: split_list(hosts.as_ref()),
            username: None,
            password: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            doc_type: DEFAULT_DOC_TYPE.to_string(),
            health_check: false,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// - `QUARRY_SEARCH_URLS`: comma-separated engine URLs (required)
    /// - `QUARRY_SEARCH_USERNAME` / `QUARRY_SEARCH_PASSWORD`: basic auth
    /// - `QUARRY_SEARCH_TIMEOUT`: request timeout in seconds
    /// - `QUARRY_SEARCH_DOC_TYPE`: document type discriminator
    /// - `QUARRY_SEARCH_HEALTH_CHECK`: ping on construction when set
    pub fn from_env() -> Result<Self> {
        let urls = std::env::var("QUARRY_SEARCH_URLS")
            .map_err(|_| SearchError::Config("QUARRY_SEARCH_URLS not set".into()))?;

        let mut config = Self::new(urls);

        if let (Ok(user), Ok(pass)) = (
            std::env::var("QUARRY_SEARCH_USERNAME"),
            std::env::var("QUARRY_SEARCH_PASSWORD"),
        ) {
            config = config.with_basic_auth(user, pass);
        }

        if let Ok(timeout) = std::env::var("QUARRY_SEARCH_TIMEOUT") {
            let secs: u64 = timeout
                .trim()
                .parse()
                .map_err(|_| SearchError::Config("Invalid QUARRY_SEARCH_TIMEOUT".into()))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(doc_type) = std::env::var("QUARRY_SEARCH_DOC_TYPE") {
            config.doc_type = doc_type;
        }

        if std::env::var("QUARRY_SEARCH_HEALTH_CHECK").is_ok() {
            config.health_check = true;
        }

        Ok(config)
    }

    /// Set basic authentication credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set how long the health check waits for a ping answer.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the default document type for index handles.
    pub fn with_doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = doc_type.into();
        self
    }

    /// Ping the engine when the client is built.
    pub fn with_health_check(mut self, enabled: bool) -> Self {
        self.health_check = enabled;
        self
    }

    /// First configured URL, which the client connects to.
    pub fn primary_url(&self) -> Result<&str> {
        self.urls
            .first()
            .map(String::as_str)
            .ok_or_else(|| SearchError::Config("No URLs provided".to_string()))
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub(crate) fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
