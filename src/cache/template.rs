//! Template Cache Module
//!
//! Typed facade over `CacheManager` for the template list and for combined
//! content bundles keyed by an order- and case-insensitive name set.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::cache::CacheManager;

/// Singleton key of the template list.
pub const TEMPLATE_LIST_KEY: &str = "gitignore_templates_list";

/// Prefix shared by every content-bundle key.
pub const TEMPLATE_CONTENT_PREFIX: &str = "gitignore_content_";

/// Number of decimal digits in a content key suffix.
const CONTENT_KEY_DIGITS: u32 = 6;

// == Content Record ==
/// Stored value of a content-bundle key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ContentRecord {
    /// Normalized, sorted names the bundle was generated from
    names: Vec<String>,
    content: String,
}

// == Key Derivation ==
/// Lowercases, trims and sorts a name set. Duplicates collapse.
pub fn normalize_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut normalized: Vec<String> = names
        .iter()
        .map(|name| name.as_ref().trim().to_lowercase())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// Derives the content key for a name set.
///
/// The suffix is a stable 6-digit number taken from the SHA-256 digest of the
/// normalized names joined with commas, so it survives process restarts.
pub fn content_key<S: AsRef<str>>(names: &[S]) -> String {
    content_key_for_normalized(&normalize_names(names))
}

fn content_key_for_normalized(normalized: &[String]) -> String {
    let digest = Sha256::digest(normalized.join(",").as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let suffix = u64::from_be_bytes(prefix) % 10u64.pow(CONTENT_KEY_DIGITS);
    format!(
        "{TEMPLATE_CONTENT_PREFIX}{suffix:0width$}",
        width = CONTENT_KEY_DIGITS as usize
    )
}

// == Template Cache ==
/// Knows the key rules; all storage goes through the shared `CacheManager`.
#[derive(Debug, Clone)]
pub struct TemplateCache {
    manager: Arc<CacheManager>,
}

impl TemplateCache {
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self { manager }
    }

    /// The underlying cache manager.
    pub fn manager(&self) -> &Arc<CacheManager> {
        &self.manager
    }

    // == Template List ==
    pub fn get_template_list(&self) -> Option<Vec<String>> {
        let mut templates = None;
        self.manager.get_matching(TEMPLATE_LIST_KEY, |value| {
            templates = Vec::<String>::deserialize(value).ok();
            templates.is_some()
        })?;
        templates
    }

    pub fn set_template_list(&self, templates: &[String]) {
        self.manager
            .set(TEMPLATE_LIST_KEY, Value::from(templates.to_vec()), None);
    }

    // == Template Content ==
    /// Returns the cached bundle for this exact name set.
    ///
    /// A record generated from a different set that happens to share the key
    /// suffix is treated as a miss.
    pub fn get_template_content<S: AsRef<str>>(&self, names: &[S]) -> Option<String> {
        let normalized = normalize_names(names);
        let key = content_key_for_normalized(&normalized);
        let mut content = None;
        self.manager.get_matching(&key, |value| {
            match ContentRecord::deserialize(value) {
                Ok(record) if record.names == normalized => content = Some(record.content),
                Ok(record) => debug!(
                    "Content key {} holds {:?}, requested {:?}",
                    key, record.names, normalized
                ),
                Err(err) => debug!("Undecodable content record {}: {}", key, err),
            }
            content.is_some()
        })?;
        content
    }

    pub fn set_template_content<S: AsRef<str>>(&self, names: &[S], content: &str) {
        let normalized = normalize_names(names);
        let key = content_key_for_normalized(&normalized);
        let record = ContentRecord {
            names: normalized,
            content: content.to_string(),
        };
        match serde_json::to_value(record) {
            Ok(value) => self.manager.set(&key, value, None),
            Err(err) => debug!("Skipping content cache for {}: {}", key, err),
        }
    }

    // == Invalidate ==
    /// Deletes every content bundle whose name set contains a name matching
    /// `name` as a case-insensitive substring.
    ///
    /// Returns the number of bundles removed.
    pub fn invalidate_template_content(&self, name: &str) -> usize {
        let needle = name.trim().to_lowercase();
        let mut invalidated = 0usize;

        for key in self.manager.keys_with_prefix(TEMPLATE_CONTENT_PREFIX) {
            let Some(record) = self
                .manager
                .peek(&key)
                .and_then(|value| serde_json::from_value::<ContentRecord>(value).ok())
            else {
                continue;
            };

            let matches = record.names.iter().any(|n| n.contains(&needle));
            if matches && self.manager.delete(&key) {
                invalidated += 1;
            }
        }

        if invalidated > 0 {
            info!(
                "Invalidated {} cache entries for template: {}",
                invalidated, name
            );
        }
        invalidated
    }
}
