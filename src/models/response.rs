//! Response DTOs for the template client
//!
//! Defines the values handed to collaborators after each operation.

use serde::Serialize;

use crate::cache::CacheStats;

/// Outcome of an API client operation.
///
/// Failures are encoded in `success` and `error_message`; `data` still carries
/// something displayable (an empty list, a fallback comment block, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub error_message: Option<String>,
    pub status_code: Option<u16>,
    /// Wall-clock duration of the request in seconds
    pub response_time: Option<f64>,
    pub from_cache: bool,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error_message: None,
            status_code: None,
            response_time: None,
            from_cache: false,
        }
    }

    /// Creates a successful response served from the cache.
    pub fn cached(data: T) -> Self {
        Self {
            from_cache: true,
            ..Self::ok(data)
        }
    }

    /// Creates a failed response that still carries displayable data.
    pub fn failure(data: T, error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            data,
            error_message: Some(error_message.into()),
            status_code: None,
            response_time: None,
            from_cache: false,
        }
    }

    /// Replaces the payload, keeping the metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            success: self.success,
            data: f(self.data),
            error_message: self.error_message,
            status_code: self.status_code,
            response_time: self.response_time,
            from_cache: self.from_cache,
        }
    }
}

/// Payload of `test_connection`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionReport {
    /// "connected", "failed" or "error"
    pub status: String,
    pub response_time: Option<f64>,
    pub api_url: String,
    pub cache_stats: Option<CacheStats>,
}

impl ConnectionReport {
    /// Report for a connectivity check that did not succeed.
    pub fn unreachable(status: &str, api_url: &str) -> Self {
        Self {
            status: status.to_string(),
            response_time: None,
            api_url: api_url.to_string(),
            cache_stats: None,
        }
    }
}

/// Diagnostics returned by `ApiClient::get_stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiStats {
    pub requests_made: u64,
    /// Average seconds per successful request
    pub avg_response_time: f64,
    /// errors / max(1, requests_made)
    pub error_rate: f64,
    pub base_url: String,
    /// Per-attempt timeout in seconds
    pub timeout: u64,
    pub retry_attempts: u32,
    pub cache_stats: CacheStats,
    /// Client-level cache hits / max(1, hits + misses)
    pub cache_hit_rate: f64,
    pub total_cache_operations: u64,
}
