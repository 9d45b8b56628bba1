//! Error types shared by the service layer.
//!
//! The aggregation engine itself is total and never returns these; they only
//! describe failures around it (transport, taxonomy loading, configuration).

use std::time::Duration;
use thiserror::Error;

/// Failure while fetching series from the upstream tagging API.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx response from the upstream API.
    #[error("HTTP error: {0}")]
    Http(u16),
    /// Connection-level failure (DNS, TLS, reset, ...).
    #[error("Transport error: {0}")]
    Transport(String),
    /// The body could not be decoded into a series map.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The shared deadline for a comparison fetch elapsed.
    #[error("Upstream timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(status) => *status >= 500 || *status == 429,
            FetchError::Transport(_) => true,
            FetchError::Decode(_) | FetchError::Timeout(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            FetchError::Http(status.as_u16())
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

/// Failure while loading taxonomy tables.
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("Failed to read taxonomy file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid taxonomy JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Duplicate entity id '{0}' in taxonomy")]
    DuplicateId(String),
}

/// Failure while building the runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid upstream URL '{value}': {reason}")]
    InvalidUpstreamUrl { value: String, reason: String },
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
}
