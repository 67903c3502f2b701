//! Error types for wikirace
//!
//! One error enum for the whole article-resolution layer. The variants
//! separate "this title does not exist" (recoverable, the caller can pick a
//! different link) from "the index or corpus is broken" (not retried).

use thiserror::Error;

/// Result type alias using WikiError
pub type Result<T> = std::result::Result<T, WikiError>;

/// Unified error type for wikirace operations
#[derive(Debug, Error)]
pub enum WikiError {
    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    /// Title and all of its case fallbacks are absent, or the located shard
    /// holds no record with the matched title.
    #[error("Article not found: {0}")]
    ArticleNotFound(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    #[error("Failed to open index store: {0}")]
    StoreOpen(String),

    #[error("Index build failed: {0}")]
    Build(String),

    // -------------------------------------------------------------------------
    // Remote Errors
    // -------------------------------------------------------------------------
    #[error("Remote fetch failed for {key}: {source}")]
    RemoteFetch {
        key: String,
        #[source]
        source: object_store::Error,
    },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Configuration(String),

    // -------------------------------------------------------------------------
    // Corpus Errors
    // -------------------------------------------------------------------------
    /// A shard line is not valid JSON (or not valid UTF-8).
    #[error("Shard parse error: {0}")]
    Parse(String),

    /// A shard record is valid JSON but lacks a required field.
    #[error("Malformed shard record: {0}")]
    MalformedRecord(String),

    // -------------------------------------------------------------------------
    // Everything Else
    // -------------------------------------------------------------------------
    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WikiError {
    /// True when the article is simply absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, WikiError::ArticleNotFound(_))
    }

    /// True when asking again with a different title can succeed.
    ///
    /// Every other kind means the store or the corpus is unusable.
    pub fn is_retryable(&self) -> bool {
        self.is_not_found()
    }

    /// True when a remote object does not exist.
    pub fn is_remote_not_found(&self) -> bool {
        matches!(
            self,
            WikiError::RemoteFetch {
                source: object_store::Error::NotFound { .. },
                ..
            }
        )
    }

    /// Fold unexpected errors into [`WikiError::Runtime`].
    ///
    /// Known kinds pass through unchanged; anything else keeps only its
    /// message.
    pub fn into_runtime(self) -> WikiError {
        match self {
            WikiError::Io(e) => WikiError::Runtime(e.to_string()),
            WikiError::Build(msg) => WikiError::Runtime(msg),
            other => other,
        }
    }
}
