//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// Represents a single cache entry with value and access metadata.
///
/// This is also the on-disk record format of a `<key>.cache` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The stored value
    pub data: Value,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time to live in seconds
    pub ttl: u64,
    /// Number of successful reads
    #[serde(default)]
    pub access_count: u64,
    /// Time of the last successful read
    #[serde(default)]
    pub last_access: Option<DateTime<Utc>>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with the current time.
    ///
    /// # Arguments
    /// * `data` - The value to store
    /// * `ttl` - TTL in seconds
    pub fn new(data: Value, ttl: u64) -> Self {
        Self::with_created_at(data, Utc::now(), ttl)
    }

    /// Creates an entry with an explicit creation time.
    pub fn with_created_at(data: Value, created_at: DateTime<Utc>, ttl: u64) -> Self {
        Self {
            data,
            created_at,
            ttl,
            access_count: 0,
            last_access: None,
        }
    }

    // == Expiry ==
    /// Returns the instant after which the entry is stale.
    ///
    /// `None` when the TTL is too large to represent, i.e. never.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.ttl).ok()?;
        self.created_at
            .checked_add_signed(Duration::try_seconds(secs)?)
    }

    /// Checks if the entry has expired.
    ///
    /// The entry is still valid at exactly `created_at + ttl` and expires
    /// strictly after it.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Expiry check against a caller-supplied clock reading.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expires| now > expires)
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self) {
        self.access_count += 1;
        self.last_access = Some(Utc::now());
    }

    /// Remaining lifetime in seconds, zero once expired.
    pub fn ttl_remaining(&self) -> u64 {
        match self.expires_at() {
            Some(expires) => u64::try_from((expires - Utc::now()).num_seconds()).unwrap_or(0),
            None => u64::MAX,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(json!("test_value"), 60);

        assert_eq!(entry.data, json!("test_value"));
        assert_eq!(entry.ttl, 60);
        assert_eq!(entry.access_count, 0);
        assert!(entry.last_access.is_none());
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(json!("test_value"), 1);

        assert!(!entry.is_expired());

        sleep(std::time::Duration::from_millis(1100));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let created = Utc::now();
        let entry = CacheEntry::with_created_at(json!(1), created, 10);

        assert!(!entry.is_expired_at(created + Duration::seconds(10)));
        assert!(entry.is_expired_at(created + Duration::seconds(10) + Duration::milliseconds(1)));
    }

    #[test]
    fn test_touch_records_access() {
        let mut entry = CacheEntry::new(json!(["python"]), 60);
        entry.touch();
        entry.touch();

        assert_eq!(entry.access_count, 2);
        assert!(entry.last_access.is_some());
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = CacheEntry::new(json!("v"), 10);
        let remaining = entry.ttl_remaining();
        assert!(remaining <= 10);
        assert!(remaining >= 9);

        let stale = CacheEntry::with_created_at(json!("v"), Utc::now() - Duration::hours(2), 60);
        assert_eq!(stale.ttl_remaining(), 0);
    }

    #[test]
    fn test_record_format_on_disk() {
        let entry = CacheEntry::new(json!("content"), 3600);
        let encoded = serde_json::to_value(&entry).unwrap();

        for field in ["data", "created_at", "ttl", "access_count", "last_access"] {
            assert!(encoded.get(field).is_some(), "missing field {field}");
        }
    }

    #[test]
    fn test_missing_access_fields_default() {
        let raw = r#"{"data":"x","created_at":"2024-01-01T00:00:00Z","ttl":5}"#;
        let entry: CacheEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.access_count, 0);
        assert!(entry.last_access.is_none());
        assert!(entry.is_expired());
    }
}
