//! Configuration Module
//!
//! Handles loading and managing client configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default template service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://www.toptal.com/developers/gitignore/api";

/// Client configuration parameters.
///
/// Constructed once and passed to each component; nothing reads it globally.
#[derive(Debug, Clone)]
pub struct Config {
    /// Template service base URL (no trailing slash)
    pub base_url: String,
    /// Per-attempt HTTP timeout in seconds
    pub timeout_secs: u64,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Total attempts made by the retry wrapper
    pub retry_attempts: u32,
    /// Unit of the exponential backoff, in milliseconds
    pub retry_backoff_base_ms: u64,
    /// Minimum spacing between outbound requests, in milliseconds
    pub rate_limit_interval_ms: u64,
    /// Default TTL in seconds for cached entries
    pub cache_ttl: u64,
    /// Directory holding `<key>.cache` files
    pub cache_dir: PathBuf,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Whether search engines compare case-sensitively
    pub case_sensitive_search: bool,
    /// Default cap on search results
    pub max_results: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `IGNTUI_API_URL` - Template service base URL
    /// - `IGNTUI_API_TIMEOUT` - Per-attempt timeout in seconds (default: 10)
    /// - `IGNTUI_USER_AGENT` - User-Agent header (default: igntui/<version>)
    /// - `IGNTUI_RETRY_ATTEMPTS` - Attempts per request (default: 3)
    /// - `IGNTUI_RETRY_BACKOFF_MS` - Backoff unit in ms (default: 1000)
    /// - `IGNTUI_RATE_LIMIT_MS` - Minimum request spacing in ms (default: 100)
    /// - `IGNTUI_CACHE_TTL` - Cache TTL in seconds (default: 3600)
    /// - `IGNTUI_CACHE_DIR` - Cache directory (default: <user cache>/igntui)
    /// - `IGNTUI_CLEANUP_INTERVAL` - Expiry sweep interval in seconds (default: 300)
    /// - `IGNTUI_CASE_SENSITIVE` - Case-sensitive search (default: false)
    /// - `IGNTUI_MAX_RESULTS` - Search result cap (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("IGNTUI_API_URL")
                .ok()
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.base_url),
            timeout_secs: parse_var("IGNTUI_API_TIMEOUT").unwrap_or(defaults.timeout_secs),
            user_agent: env::var("IGNTUI_USER_AGENT")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.user_agent),
            retry_attempts: parse_var("IGNTUI_RETRY_ATTEMPTS").unwrap_or(defaults.retry_attempts),
            retry_backoff_base_ms: parse_var("IGNTUI_RETRY_BACKOFF_MS")
                .unwrap_or(defaults.retry_backoff_base_ms),
            rate_limit_interval_ms: parse_var("IGNTUI_RATE_LIMIT_MS")
                .unwrap_or(defaults.rate_limit_interval_ms),
            cache_ttl: parse_var("IGNTUI_CACHE_TTL").unwrap_or(defaults.cache_ttl),
            cache_dir: env::var("IGNTUI_CACHE_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            cleanup_interval: parse_var("IGNTUI_CLEANUP_INTERVAL")
                .unwrap_or(defaults.cleanup_interval),
            case_sensitive_search: parse_var("IGNTUI_CASE_SENSITIVE")
                .unwrap_or(defaults.case_sensitive_search),
            max_results: parse_var("IGNTUI_MAX_RESULTS").unwrap_or(defaults.max_results),
        }
    }

    /// Per-attempt HTTP timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Expiry sweep period; `None` when the sweep is disabled with 0.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval > 0).then(|| Duration::from_secs(self.cleanup_interval))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            user_agent: format!("igntui/{}", env!("CARGO_PKG_VERSION")),
            retry_attempts: 3,
            retry_backoff_base_ms: 1000,
            rate_limit_interval_ms: 100,
            cache_ttl: 3600,
            cache_dir: default_cache_dir(),
            cleanup_interval: 300,
            case_sensitive_search: false,
            max_results: 100,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
        .unwrap_or_else(env::temp_dir)
        .join("igntui")
}
