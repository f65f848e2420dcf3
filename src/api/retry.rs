//! Retry with exponential backoff
//!
//! Network, 5xx and 429 failures are retried; generic API failures are not.

use std::time::Duration;

use tracing::warn;

use crate::api::Fetcher;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::ApiResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Backoff after attempt `n` (0-based) is `backoff_base * 2^n`
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff_base: Duration) -> Self {
        Self {
            attempts,
            backoff_base,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_backoff_base_ms),
        )
    }

    /// Exponential backoff for a 0-based attempt index.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(1u32 << attempt.min(16))
    }

    /// Wait before the next attempt after `err`.
    ///
    /// A server-provided `Retry-After` wins unless it is zero.
    fn wait_for(&self, err: &ApiError, attempt: u32) -> Duration {
        match err.retry_after() {
            Some(wait) if !wait.is_zero() => wait,
            _ => self.backoff(attempt),
        }
    }

    /// Calls `fetcher` until it succeeds, hits a non-retryable failure, or
    /// runs out of attempts. The last failure is propagated.
    pub async fn execute<F>(&self, fetcher: &F, url: &str) -> Result<ApiResponse<String>, ApiError>
    where
        F: Fetcher + ?Sized,
    {
        let mut last_error = None;

        for attempt in 0..self.attempts {
            let err = match fetcher.make_request(url, None).await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            if !err.is_retryable() || attempt + 1 >= self.attempts {
                return Err(err);
            }

            let wait = self.wait_for(&err, attempt);
            match &err {
                ApiError::RateLimit { .. } => warn!(
                    "Rate limited, waiting {:.1}s before retry {}",
                    wait.as_secs_f64(),
                    attempt + 1
                ),
                _ => warn!(
                    "Request failed ({}), retrying in {:.1}s (attempt {})",
                    err,
                    wait.as_secs_f64(),
                    attempt + 1
                ),
            }
            tokio::time::sleep(wait).await;
            last_error = Some(err);
        }

        Err(last_error.unwrap_or_else(|| ApiError::api("All retry attempts failed")))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}
