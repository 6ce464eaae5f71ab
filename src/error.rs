//! Error types for the extraction, search and matching pipeline.

use std::time::Duration;

/// Error type for pipeline operations.
///
/// Most pipeline stages absorb failure into "empty" results; this type is
/// what the fallible entry points (`try_search`, rule loading, settings)
/// report.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The selector rule table is unusable.
    #[error("invalid selector rules: {0}")]
    InvalidRules(String),

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The marketplace answered with a non-success status.
    #[error("marketplace returned HTTP {0}")]
    Status(u16),

    /// The marketplace body was JSON but not the expected shape.
    #[error("malformed search response: {0}")]
    MalformedResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid settings: {0}")]
    InvalidConfig(String),

    /// The caller-side wait for search results elapsed.
    #[error("search timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
