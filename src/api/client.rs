//! Template API Client
//!
//! Cache-first access to the template catalog and to combined template
//! content. Every operation returns an `ApiResponse`; no error escapes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::api::{clean_template_names, parse_template_list, Fetcher, RequestExecutor, RetryPolicy};
use crate::cache::{CacheManager, CacheStats, TemplateCache};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{ApiResponse, ApiStats, ConnectionReport};

/// Content returned when nothing is selected.
pub const NO_SELECTION_PLACEHOLDER: &str =
    "# No templates selected\n# Select templates from the Available Templates panel";

// == API Client ==
pub struct ApiClient {
    base_url: String,
    timeout_secs: u64,
    fetcher: Arc<dyn Fetcher>,
    retry_policy: RetryPolicy,
    template_cache: TemplateCache,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl ApiClient {
    /// Builds a client with the reqwest executor and an on-disk cache at
    /// `config.cache_dir`.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let executor = RequestExecutor::new(config)?;
        let cache = CacheManager::new(&config.cache_dir, config.cache_ttl)?;
        Ok(Self::with_parts(config, Arc::new(executor), Arc::new(cache)))
    }

    /// Builds a client around an existing fetcher and cache manager.
    pub fn with_parts(config: &Config, fetcher: Arc<dyn Fetcher>, cache: Arc<CacheManager>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
            fetcher,
            retry_policy: RetryPolicy::from_config(config),
            template_cache: TemplateCache::new(cache),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache_manager(&self) -> &Arc<CacheManager> {
        self.template_cache.manager()
    }

    pub fn template_cache(&self) -> &TemplateCache {
        &self.template_cache
    }

    fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<ApiResponse<String>, ApiError> {
        self.retry_policy.execute(self.fetcher.as_ref(), url).await
    }

    // == List Templates ==
    /// Returns the template catalog, from cache unless `force_refresh`.
    pub async fn list_templates(&self, force_refresh: bool) -> ApiResponse<Vec<String>> {
        if !force_refresh {
            if let Some(templates) = self.template_cache.get_template_list() {
                debug!("Using cached template list");
                self.record_cache_hit();
                return ApiResponse::cached(templates);
            }
        }

        self.record_cache_miss();
        let url = format!("{}/list", self.base_url);

        match self.fetch_with_retry(&url).await {
            Ok(response) => {
                let response = response.map(|body| parse_template_list(&body));
                self.template_cache.set_template_list(&response.data);
                info!("Fetched {} templates from API", response.data.len());
                response
            }
            Err(err) => {
                error!("Failed to fetch template list: {}", err);
                ApiResponse {
                    status_code: err.status_code(),
                    ..ApiResponse::failure(Vec::new(), err.to_string())
                }
            }
        }
    }

    // == Get Templates ==
    /// Returns the combined content for the named templates.
    ///
    /// Invalid names are dropped; on fetch failure `data` holds a commented
    /// fallback block naming the error and the requested templates.
    pub async fn get_templates<S: AsRef<str>>(
        &self,
        names: &[S],
        force_refresh: bool,
    ) -> ApiResponse<String> {
        if names.is_empty() {
            return ApiResponse::ok(NO_SELECTION_PLACEHOLDER.to_string());
        }

        let clean_names = clean_template_names(names);
        if clean_names.is_empty() {
            return ApiResponse::failure(String::new(), "No valid templates provided");
        }

        if !force_refresh {
            if let Some(content) = self.template_cache.get_template_content(&clean_names) {
                debug!("Using cached content for {} templates", clean_names.len());
                self.record_cache_hit();
                return ApiResponse::cached(content);
            }
        }

        self.record_cache_miss();
        let url = format!("{}/{}", self.base_url, clean_names.join(",").to_lowercase());

        match self.fetch_with_retry(&url).await {
            Ok(response) => {
                self.template_cache
                    .set_template_content(&clean_names, &response.data);
                info!("Fetched content for templates: {}", clean_names.join(", "));
                response
            }
            Err(err) => {
                error!("Failed to fetch template content: {}", err);
                ApiResponse {
                    status_code: err.status_code(),
                    ..ApiResponse::failure(fallback_content(&err, &clean_names), err.to_string())
                }
            }
        }
    }

    // == Test Connection ==
    /// Single unretried request to check connectivity and latency.
    pub async fn test_connection(&self) -> ApiResponse<ConnectionReport> {
        info!("Testing API connectivity...");
        let url = format!("{}/list?limit=1", self.base_url);

        match self.fetcher.make_request(&url, None).await {
            Ok(response) if response.success => {
                let report = ConnectionReport {
                    status: "connected".to_string(),
                    response_time: response.response_time,
                    api_url: self.base_url.clone(),
                    cache_stats: Some(self.cache_manager().get_stats()),
                };
                ApiResponse {
                    status_code: response.status_code,
                    response_time: response.response_time,
                    ..ApiResponse::ok(report)
                }
            }
            Ok(_) => ApiResponse::failure(
                ConnectionReport::unreachable("failed", &self.base_url),
                "API test request failed",
            ),
            Err(err) => {
                error!("API connection test failed: {}", err);
                ApiResponse {
                    status_code: err.status_code(),
                    ..ApiResponse::failure(
                        ConnectionReport::unreachable("error", &self.base_url),
                        err.to_string(),
                    )
                }
            }
        }
    }

    // == Stats ==
    pub fn get_stats(&self) -> ApiStats {
        let request_stats = self.fetcher.stats();
        let requests_made = request_stats.requests_made;
        let avg_response_time = if requests_made > 0 {
            request_stats.total_response_time / requests_made as f64
        } else {
            0.0
        };
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let misses = self.cache_misses.load(Ordering::Relaxed);

        ApiStats {
            requests_made,
            avg_response_time,
            error_rate: request_stats.errors as f64 / requests_made.max(1) as f64,
            base_url: self.base_url.clone(),
            timeout: self.timeout_secs,
            retry_attempts: self.retry_policy.attempts,
            cache_stats: self.cache_stats(),
            cache_hit_rate: hits as f64 / (hits + misses).max(1) as f64,
            total_cache_operations: hits + misses,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache_manager().get_stats()
    }

    /// Drops every cached list and bundle. Returns the number removed.
    pub fn clear_cache(&self) -> usize {
        let cleared = self.cache_manager().clear();
        info!("Cleared all API cache data");
        cleared
    }

    /// Drops cached bundles that include a template matching `name`.
    pub fn invalidate_template(&self, name: &str) -> usize {
        self.template_cache.invalidate_template_content(name)
    }
}

fn fallback_content(err: &ApiError, names: &[String]) -> String {
    format!(
        "# Error generating content: {err}\n\
         # Selected templates: {names}\n\
         #\n\
         # This error typically means:\n\
         # - Network connectivity issues\n\
         # - Invalid template names\n\
         # - API service temporarily unavailable\n\
         #\n\
         # Try refreshing the template list or check your internet connection.",
        names = names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::api::RequestStats;

    /// Answers every request from a closure and records the URLs it saw.
    struct FakeFetcher {
        respond: Box<dyn Fn(&str) -> Result<ApiResponse<String>, ApiError> + Send + Sync>,
        urls: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn new(
            respond: impl Fn(&str) -> Result<ApiResponse<String>, ApiError> + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                respond: Box::new(respond),
                urls: Mutex::new(Vec::new()),
            })
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn make_request(
            &self,
            url: &str,
            _timeout: Option<Duration>,
        ) -> Result<ApiResponse<String>, ApiError> {
            self.urls.lock().unwrap().push(url.to_string());
            (self.respond)(url)
        }

        fn stats(&self) -> RequestStats {
            let count = self.urls.lock().unwrap().len() as u64;
            RequestStats {
                requests_made: count,
                errors: 0,
                total_response_time: 0.5 * count as f64,
            }
        }
    }

    fn test_config() -> Config {
        Config {
            base_url: "http://templates.test/api/".to_string(),
            retry_attempts: 2,
            retry_backoff_base_ms: 1,
            ..Config::default()
        }
    }

    fn client_with(fetcher: Arc<FakeFetcher>) -> (TempDir, ApiClient) {
        let tmp = TempDir::new().unwrap();
        let cache = Arc::new(CacheManager::new(tmp.path(), 3600).unwrap());
        let client = ApiClient::with_parts(&test_config(), fetcher, cache);
        (tmp, client)
    }

    fn echo_fetcher() -> Arc<FakeFetcher> {
        FakeFetcher::new(|url| {
            let body = if url.ends_with("/list") {
                "rust,Python\nnode,python".to_string()
            } else {
                format!("# content for {}", url.rsplit('/').next().unwrap_or_default())
            };
            Ok(ApiResponse {
                status_code: Some(200),
                ..ApiResponse::ok(body)
            })
        })
    }

    #[tokio::test]
    async fn test_list_templates_fetches_then_caches() {
        let fetcher = echo_fetcher();
        let (_tmp, client) = client_with(fetcher.clone());

        let first = client.list_templates(false).await;
        assert!(first.success);
        assert!(!first.from_cache);
        assert_eq!(first.data, vec!["node", "Python", "python", "rust"]);
        assert_eq!(fetcher.urls(), vec!["http://templates.test/api/list"]);

        let second = client.list_templates(false).await;
        assert!(second.from_cache);
        assert_eq!(second.data, first.data);
        assert_eq!(fetcher.urls().len(), 1);

        let refreshed = client.list_templates(true).await;
        assert!(!refreshed.from_cache);
        assert_eq!(fetcher.urls().len(), 2);
    }

    #[tokio::test]
    async fn test_list_templates_failure_returns_empty() {
        let fetcher = FakeFetcher::new(|_| Err(ApiError::api("HTTP 403: Forbidden")));
        let (_tmp, client) = client_with(fetcher);

        let response = client.list_templates(false).await;
        assert!(!response.success);
        assert!(response.data.is_empty());
        assert_eq!(response.error_message.as_deref(), Some("HTTP 403: Forbidden"));
    }

    #[tokio::test]
    async fn test_get_templates_empty_selection_makes_no_request() {
        let fetcher = echo_fetcher();
        let (_tmp, client) = client_with(fetcher.clone());

        let response = client.get_templates::<&str>(&[], false).await;
        assert!(response.success);
        assert_eq!(response.data, NO_SELECTION_PLACEHOLDER);
        assert!(fetcher.urls().is_empty());
    }

    #[tokio::test]
    async fn test_get_templates_all_invalid_fails() {
        let fetcher = echo_fetcher();
        let (_tmp, client) = client_with(fetcher.clone());

        let response = client.get_templates(&["../evil"], false).await;
        assert!(!response.success);
        assert_eq!(
            response.error_message.as_deref(),
            Some("No valid templates provided")
        );
        assert!(fetcher.urls().is_empty());
    }

    #[tokio::test]
    async fn test_get_templates_builds_url_and_caches() {
        let fetcher = echo_fetcher();
        let (_tmp, client) = client_with(fetcher.clone());

        let response = client.get_templates(&["Python", "../evil", "Node"], false).await;
        assert!(response.success);
        assert_eq!(response.data, "# content for python,node");
        assert_eq!(
            fetcher.urls(),
            vec!["http://templates.test/api/python,node"]
        );

        let cached = client.get_templates(&["node", "PYTHON"], false).await;
        assert!(cached.from_cache);
        assert_eq!(cached.data, "# content for python,node");
        assert_eq!(fetcher.urls().len(), 1);
    }

    #[tokio::test]
    async fn test_get_templates_failure_returns_fallback_block() {
        let fetcher = FakeFetcher::new(|_| {
            Err(ApiError::ServiceUnavailable {
                message: "HTTP 503: Service Unavailable".into(),
                status: 503,
            })
        });
        let (_tmp, client) = client_with(fetcher.clone());

        let response = client.get_templates(&["rust", "go"], false).await;
        assert!(!response.success);
        assert_eq!(response.status_code, Some(503));
        assert!(response
            .data
            .starts_with("# Error generating content: HTTP 503: Service Unavailable"));
        assert!(response.data.contains("# Selected templates: rust, go"));
        // One retry under the test policy.
        assert_eq!(fetcher.urls().len(), 2);
        assert_eq!(client.template_cache().get_template_content(&["rust", "go"]), None);
    }

    #[tokio::test]
    async fn test_connection_report() {
        let fetcher = echo_fetcher();
        let (_tmp, client) = client_with(fetcher.clone());

        let response = client.test_connection().await;
        assert!(response.success);
        assert_eq!(response.data.status, "connected");
        assert_eq!(response.data.api_url, "http://templates.test/api");
        assert!(response.data.cache_stats.is_some());
        assert_eq!(
            fetcher.urls(),
            vec!["http://templates.test/api/list?limit=1"]
        );
    }

    #[tokio::test]
    async fn test_connection_is_not_retried() {
        let fetcher = FakeFetcher::new(|_| Err(ApiError::Network("Network error: refused".into())));
        let (_tmp, client) = client_with(fetcher.clone());

        let response = client.test_connection().await;
        assert!(!response.success);
        assert_eq!(response.data.status, "error");
        assert_eq!(fetcher.urls().len(), 1);
    }

    #[tokio::test]
    async fn test_stats_and_cache_management() {
        let fetcher = echo_fetcher();
        let (_tmp, client) = client_with(fetcher);

        client.get_templates(&["python", "node"], false).await;
        client.get_templates(&["python", "node"], false).await;
        client.get_templates(&["rust"], false).await;

        let stats = client.get_stats();
        assert_eq!(stats.requests_made, 2);
        assert_eq!(stats.avg_response_time, 0.5);
        assert_eq!(stats.total_cache_operations, 3);
        assert!((stats.cache_hit_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.retry_attempts, 2);

        assert_eq!(client.invalidate_template("Node"), 1);
        assert!(client.clear_cache() > 0);
        assert_eq!(client.cache_stats().memory_entries, 0);
    }
}
