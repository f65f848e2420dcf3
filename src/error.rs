//! Error types for the template client
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use thiserror::Error;

// == API Error Enum ==
/// Failure raised by a single request attempt.
///
/// The retry wrapper branches on the variant; the API client converts every
/// variant into a failed `ApiResponse` before it reaches the UI layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Connectivity problem or per-attempt timeout
    #[error("{0}")]
    Network(String),

    /// HTTP 429, carries the server-provided wait time
    #[error("{message}")]
    RateLimit {
        message: String,
        retry_after: Option<Duration>,
    },

    /// HTTP 5xx
    #[error("{message}")]
    ServiceUnavailable { message: String, status: u16 },

    /// Any other non-2xx status or unexpected failure
    #[error("{message}")]
    Api {
        message: String,
        status: Option<u16>,
    },
}

impl ApiError {
    /// Builds a generic API failure without a status code.
    pub fn api(message: impl Into<String>) -> Self {
        ApiError::Api {
            message: message.into(),
            status: None,
        }
    }

    /// Returns the HTTP status associated with the failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Network(_) => None,
            ApiError::RateLimit { .. } => Some(429),
            ApiError::ServiceUnavailable { status, .. } => Some(*status),
            ApiError::Api { status, .. } => *status,
        }
    }

    /// Returns the wait requested by the server for rate-limit failures.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Generic API failures are never retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ApiError::Api { .. })
    }
}

// == Cache Error Enum ==
/// Disk-tier failures. Logged and swallowed by the cache manager.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Filesystem failure while reading, writing or listing entries
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed on-disk record
    #[error("Corrupted cache record: {0}")]
    Corrupt(serde_json::Error),

    /// Entry could not be encoded
    #[error("Failed to serialize cache entry: {0}")]
    Serialize(serde_json::Error),
}

// == Validation Error Enum ==
/// Reasons a template name is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("template name is empty")]
    Empty,

    #[error("template name is {0} characters long (max 100)")]
    TooLong(usize),

    #[error("template name has no alphanumeric character")]
    NoAlphanumeric,

    #[error("template name contains suspicious sequence {0:?}")]
    SuspiciousPattern(&'static str),
}

// == Result Type Alias ==
/// Convenience Result type for cache disk operations.
pub type Result<T> = std::result::Result<T, CacheError>;
