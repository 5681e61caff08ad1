//! Error types for search operations.

use thiserror::Error;

/// Search error type.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The engine answered with a failure status.
    #[error("Transport error ({status}): {reason}")]
    Transport {
        /// HTTP status code returned by the engine.
        status: u16,
        /// Failure reason reported by the engine.
        reason: String,
    },

    /// Network-level failure from the opensearch client.
    #[error("Client error: {0}")]
    Client(#[from] opensearch::Error),

    /// The response carried no hit container.
    #[error("Hits result not found in search response")]
    EmptyResult,

    /// A document body could not be decoded into the schema type.
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The scroll cursor has no further batches.
    #[error("Scroll exhausted")]
    ScrollExhausted,

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Index already exists.
    #[error("Index already exists: {0}")]
    IndexExists(String),

    /// Index not found.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// Document not found.
    #[error("Document not found: {index}/{id}")]
    DocumentNotFound {
        /// Index name.
        index: String,
        /// Document ID.
        id: String,
    },
}

impl SearchError {
    /// Build a transport error from a status code and reason.
    pub fn transport(status: u16, reason: impl Into<String>) -> Self {
        SearchError::Transport {
            status,
            reason: reason.into(),
        }
    }

    /// True for failures reported by the engine or the network.
    pub fn is_transport(&self) -> bool {
        matches!(self, SearchError::Transport { .. } | SearchError::Client(_))
    }

    /// True for the end-of-cursor sentinel.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, SearchError::ScrollExhausted)
    }
}

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
