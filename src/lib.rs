//! igntui - gitignore template browser core
//!
//! Fetches `.gitignore` templates from a remote template service through a
//! two-tier TTL cache, and searches the catalog with fuzzy, exact or regex
//! matching.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod search;
pub mod tasks;

pub use api::ApiClient;
pub use cache::{CacheManager, TemplateCache};
pub use config::Config;
pub use search::{SearchManager, SearchMode};
pub use tasks::{spawn_cleanup_task, spawn_operation};
