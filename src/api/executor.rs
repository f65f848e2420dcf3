//! HTTP Request Executor
//!
//! Issues a single rate-limited GET against the template service and
//! classifies failures into `ApiError` variants for the retry wrapper.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::api::RateLimiter;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::ApiResponse;

/// Wait applied to a 429 response without a usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

// == Fetcher ==
/// One attempt at fetching a plain-text resource.
///
/// The retry wrapper and the API client only depend on this seam.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Performs one GET. `timeout` overrides the configured per-attempt timeout.
    async fn make_request(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse<String>, ApiError>;

    /// Counters accumulated by this fetcher.
    fn stats(&self) -> RequestStats {
        RequestStats::default()
    }
}

// == Request Stats ==
/// Running counters of the executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestStats {
    /// Successful requests
    pub requests_made: u64,
    /// Failed attempts of any kind
    pub errors: u64,
    /// Sum of successful request durations, in seconds
    pub total_response_time: f64,
}

// == Request Executor ==
/// reqwest-backed `Fetcher` with rate limiting and running counters.
#[derive(Debug)]
pub struct RequestExecutor {
    client: Client,
    user_agent: String,
    timeout: Duration,
    rate_limiter: RateLimiter,
    stats: Mutex<RequestStats>,
}

impl RequestExecutor {
    /// Builds an executor from the client configuration.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .build()
            .map_err(|e| ApiError::api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout(),
            rate_limiter: RateLimiter::new(Duration::from_millis(config.rate_limit_interval_ms)),
            stats: Mutex::new(RequestStats::default()),
        })
    }

    fn lock_stats(&self) -> MutexGuard<'_, RequestStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_error(&self) {
        self.lock_stats().errors += 1;
    }

    async fn dispatch(&self, url: &str, timeout: Duration) -> Result<ApiResponse<String>, ApiError> {
        let start = Instant::now();

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "text/plain")
            .header(ACCEPT_ENCODING, "identity")
            .send()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status, response.headers().get(RETRY_AFTER)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(e, timeout))?;
        let response_time = start.elapsed().as_secs_f64();

        {
            let mut stats = self.lock_stats();
            stats.requests_made += 1;
            stats.total_response_time += response_time;
        }
        debug!("API request to {} took {:.3}s", url, response_time);

        Ok(ApiResponse {
            status_code: Some(status.as_u16()),
            response_time: Some(response_time),
            ..ApiResponse::ok(body)
        })
    }
}

#[async_trait]
impl Fetcher for RequestExecutor {
    async fn make_request(
        &self,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<ApiResponse<String>, ApiError> {
        self.rate_limiter.wait_if_needed().await;
        let result = self.dispatch(url, timeout.unwrap_or(self.timeout)).await;
        self.rate_limiter.mark_request().await;

        if result.is_err() {
            self.record_error();
        }
        result
    }

    fn stats(&self) -> RequestStats {
        self.lock_stats().clone()
    }
}

// == Classification ==
fn classify_transport_error(err: reqwest::Error, timeout: Duration) -> ApiError {
    if err.is_timeout() {
        ApiError::Network(format!("Request timeout after {}s", timeout.as_secs_f64()))
    } else if err.is_connect() || err.is_request() {
        ApiError::Network(format!("Network error: {}", err))
    } else {
        ApiError::api(format!("Unexpected error: {}", err))
    }
}

/// Maps a non-2xx status to the failure kind the retry wrapper expects.
pub fn classify_status(
    status: StatusCode,
    retry_after: Option<&reqwest::header::HeaderValue>,
) -> ApiError {
    let message = format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    );

    if status == StatusCode::TOO_MANY_REQUESTS {
        // Absent header waits the default; a malformed one leaves the wait to backoff.
        let retry_after = match retry_after {
            None => Some(DEFAULT_RETRY_AFTER),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs),
        };
        ApiError::RateLimit {
            message,
            retry_after,
        }
    } else if status.is_server_error() {
        ApiError::ServiceUnavailable {
            message,
            status: status.as_u16(),
        }
    } else {
        ApiError::Api {
            message,
            status: Some(status.as_u16()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_classify_rate_limit_with_header() {
        let header = HeaderValue::from_static("7");
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, Some(&header));
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
        assert_eq!(err.to_string(), "HTTP 429: Too Many Requests");
    }

    #[test]
    fn test_classify_rate_limit_missing_header_waits_default() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, None);
        assert_eq!(err.retry_after(), Some(DEFAULT_RETRY_AFTER));
    }

    #[test]
    fn test_classify_rate_limit_malformed_header_defers_to_backoff() {
        for raw in ["soon", "Wed, 21 Oct 2015 07:28:00 GMT", "-5"] {
            let header = HeaderValue::from_static(raw);
            let err = classify_status(StatusCode::TOO_MANY_REQUESTS, Some(&header));
            assert!(matches!(err, ApiError::RateLimit { .. }));
            assert_eq!(err.retry_after(), None, "{raw}");
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_classify_server_errors() {
        for status in [StatusCode::INTERNAL_SERVER_ERROR, StatusCode::BAD_GATEWAY] {
            assert!(matches!(
                classify_status(status, None),
                ApiError::ServiceUnavailable { .. }
            ));
        }
    }

    #[test]
    fn test_classify_client_errors() {
        let err = classify_status(StatusCode::NOT_FOUND, None);
        assert_eq!(
            err,
            ApiError::Api {
                message: "HTTP 404: Not Found".to_string(),
                status: Some(404)
            }
        );
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let config = Config {
            rate_limit_interval_ms: 0,
            ..Config::default()
        };
        let executor = RequestExecutor::new(&config).unwrap();

        // Port 9 (discard) on localhost is expected to refuse connections.
        let result = executor
            .make_request("http://127.0.0.1:9/list", Some(Duration::from_secs(2)))
            .await;
        assert!(matches!(result, Err(ApiError::Network(_))));
        assert_eq!(executor.stats().errors, 1);
        assert_eq!(executor.stats().requests_made, 0);
    }
}
