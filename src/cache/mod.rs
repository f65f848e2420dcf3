//! Cache Module
//!
//! Provides a two-tier (memory + disk) cache with TTL expiration, plus the
//! template-specific key rules layered on top of it.

mod disk;
mod entry;
mod stats;
mod store;
mod template;


// Re-export public types
pub use disk::{DiskTier, CACHE_FILE_EXTENSION};
pub use entry::CacheEntry;
pub use stats::{CacheCounters, CacheStats};
pub use store::CacheManager;
pub use template::{
    content_key, normalize_names, TemplateCache, TEMPLATE_CONTENT_PREFIX, TEMPLATE_LIST_KEY,
};
