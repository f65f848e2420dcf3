//! API Module
//!
//! Network side of the template client: request spacing, a single-attempt
//! executor, the retry policy, name rules and the cache-first client.
//!
//! # Endpoints used
//! - `GET {base_url}/list` - Comma/newline-delimited template catalog
//! - `GET {base_url}/{a,b,c}` - Combined content for the named templates

pub mod client;
pub mod executor;
pub mod names;
pub mod rate_limiter;
pub mod retry;

pub use client::{ApiClient, NO_SELECTION_PLACEHOLDER};
pub use executor::{classify_status, Fetcher, RequestExecutor, RequestStats, DEFAULT_RETRY_AFTER};
pub use names::{
    clean_template_names, is_valid_template_name, parse_template_list, sanitize_template_name,
    validate_template_name, MAX_TEMPLATE_NAME_LEN,
};
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
