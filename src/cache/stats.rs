//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use std::path::PathBuf;

use serde::Serialize;

// == Cache Counters ==
/// Running counters updated under the cache manager's lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheCounters {
    /// Successful retrievals from either tier
    pub hits: u64,
    /// Retrievals that found nothing usable
    pub misses: u64,
    /// Entries written
    pub sets: u64,
    /// Explicit deletions that removed something
    pub deletes: u64,
    /// Entries dropped because they expired
    pub evictions: u64,
    /// Records successfully read from disk
    pub disk_reads: u64,
    /// Records successfully written to disk
    pub disk_writes: u64,
}

impl CacheCounters {
    // == Constructor ==
    /// Creates a new set of counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total `get` calls observed.
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / max(1, hits + misses), so 0.0 before any request.
    pub fn hit_rate(&self) -> f64 {
        self.hits as f64 / self.total_requests().max(1) as f64
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    pub fn record_evictions(&mut self, count: u64) {
        self.evictions += count;
    }

    pub fn record_disk_read(&mut self) {
        self.disk_reads += 1;
    }

    pub fn record_disk_write(&mut self) {
        self.disk_writes += 1;
    }
}

// == Cache Stats ==
/// Point-in-time report returned by `CacheManager::get_stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub hit_rate: f64,
    pub total_requests: u64,
    pub memory_entries: usize,
    pub disk_entries: usize,
    pub cache_dir: PathBuf,
    /// Default TTL in seconds
    pub default_ttl: u64,
    #[serde(flatten)]
    pub counters: CacheCounters,
}

impl CacheStats {
    /// Builds a report from the counters and current tier sizes.
    pub fn new(
        counters: CacheCounters,
        memory_entries: usize,
        disk_entries: usize,
        cache_dir: PathBuf,
        default_ttl: u64,
    ) -> Self {
        Self {
            hit_rate: counters.hit_rate(),
            total_requests: counters.total_requests(),
            memory_entries,
            disk_entries,
            cache_dir,
            default_ttl,
            counters,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let counters = CacheCounters::new();
        assert_eq!(counters, CacheCounters::default());
        assert_eq!(counters.total_requests(), 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let counters = CacheCounters::new();
        assert_eq!(counters.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let mut counters = CacheCounters::new();
        counters.record_hit();
        counters.record_hit();
        counters.record_hit();
        assert_eq!(counters.hit_rate(), 1.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut counters = CacheCounters::new();
        counters.record_hit();
        counters.record_miss();
        assert_eq!(counters.hit_rate(), 0.5);
        assert_eq!(counters.total_requests(), 2);
    }

    #[test]
    fn test_record_evictions() {
        let mut counters = CacheCounters::new();
        counters.record_evictions(2);
        counters.record_evictions(1);
        assert_eq!(counters.evictions, 3);
    }

    #[test]
    fn test_stats_report_serializes_flat() {
        let mut counters = CacheCounters::new();
        counters.record_hit();
        counters.record_disk_write();
        let stats = CacheStats::new(counters, 1, 2, PathBuf::from("/tmp/igntui"), 3600);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["hits"], 1);
        assert_eq!(json["disk_writes"], 1);
        assert_eq!(json["memory_entries"], 1);
        assert_eq!(json["disk_entries"], 2);
        assert_eq!(json["hit_rate"], 1.0);
        assert_eq!(json["default_ttl"], 3600);
    }
}
