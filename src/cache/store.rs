//! Cache Store Module
//!
//! Two-tier cache engine: a HashMap memory tier in front of a best-effort
//! disk tier, with lazy TTL expiration and an explicit sweep.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheCounters, CacheEntry, CacheStats, DiskTier};
use crate::error::Result;

// == Cache State ==
/// Everything guarded by the manager's lock.
#[derive(Debug)]
struct CacheState {
    /// Memory tier, authoritative for the process lifetime
    memory: HashMap<String, CacheEntry>,
    /// Persistent tier
    disk: DiskTier,
    /// Performance counters
    counters: CacheCounters,
}

impl CacheState {
    /// Reads a disk record, deleting it if it is corrupt.
    fn read_disk(&mut self, key: &str) -> Option<CacheEntry> {
        match self.disk.load(key) {
            Ok(Some(entry)) => {
                self.counters.record_disk_read();
                Some(entry)
            }
            Ok(None) => None,
            Err(err) => {
                warn!("Failed to load cache record {}: {}", key, err);
                self.disk.remove(key);
                None
            }
        }
    }

    fn write_disk(&mut self, key: &str, entry: &CacheEntry) {
        if !DiskTier::accepts_key(key) {
            debug!("Key {:?} kept in memory only", key);
            return;
        }
        match self.disk.save(key, entry) {
            Ok(()) => self.counters.record_disk_write(),
            Err(err) => warn!("Failed to save cache record {}: {}", key, err),
        }
    }

    fn disk_keys(&self) -> Vec<String> {
        self.disk.keys().unwrap_or_else(|err| {
            warn!("Failed to list cache directory: {}", err);
            Vec::new()
        })
    }
}

// == Cache Manager ==
/// Thread-safe key/value cache with TTL, memory and disk tiers.
///
/// Every operation runs under one mutex, so read-modify-write sequences on a
/// key are atomic with respect to other threads of the process.
#[derive(Debug)]
pub struct CacheManager {
    state: Mutex<CacheState>,
    cache_dir: PathBuf,
    default_ttl: u64,
}

impl CacheManager {
    // == Constructor ==
    /// Opens the cache directory and warm-loads non-expired records.
    ///
    /// # Arguments
    /// * `cache_dir` - Directory for `<key>.cache` files, created if missing
    /// * `default_ttl` - TTL in seconds for `set` calls without one
    pub fn new(cache_dir: impl AsRef<Path>, default_ttl: u64) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        let disk = DiskTier::open(&cache_dir)?;
        let manager = Self {
            state: Mutex::new(CacheState {
                memory: HashMap::new(),
                disk,
                counters: CacheCounters::new(),
            }),
            cache_dir,
            default_ttl,
        };
        manager.warm_load();
        debug!(
            "Initialized cache manager with directory: {}",
            manager.cache_dir.display()
        );
        Ok(manager)
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Warm Load ==
    fn warm_load(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;
        let mut loaded = 0usize;

        for key in state.disk_keys() {
            match state.read_disk(&key) {
                Some(entry) if !entry.is_expired() => {
                    state.memory.insert(key, entry);
                    loaded += 1;
                }
                Some(_) => {
                    state.disk.remove(&key);
                }
                None => {}
            }
        }

        if loaded > 0 {
            info!("Loaded {} cache entries from disk", loaded);
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Memory is checked first, then disk; a disk hit is promoted into memory.
    /// Expired entries are removed from both tiers and counted as misses.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_matching(key, |_| true)
    }

    /// Like [`get`](Self::get), but a live value rejected by `accept` counts
    /// as a miss and is neither touched nor promoted.
    pub fn get_matching(&self, key: &str, accept: impl FnOnce(&Value) -> bool) -> Option<Value> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if let Some(entry) = state.memory.get_mut(key) {
            if entry.is_expired() {
                state.memory.remove(key);
                state.disk.remove(key);
                state.counters.record_evictions(1);
                state.counters.record_miss();
                debug!("Cache entry expired: {}", key);
                return None;
            }
            if !accept(&entry.data) {
                state.counters.record_miss();
                debug!("Cache entry rejected: {}", key);
                return None;
            }
            entry.touch();
            let value = entry.data.clone();
            state.counters.record_hit();
            debug!("Cache hit for key: {} ({}s left)", key, entry.ttl_remaining());
            return Some(value);
        }

        match state.read_disk(key) {
            Some(entry) if entry.is_expired() => {
                state.disk.remove(key);
                state.counters.record_evictions(1);
                state.counters.record_miss();
                None
            }
            Some(mut entry) => {
                if !accept(&entry.data) {
                    state.counters.record_miss();
                    debug!("Disk cache entry rejected: {}", key);
                    return None;
                }
                entry.touch();
                let value = entry.data.clone();
                debug!("Disk cache hit for key: {} ({}s left)", key, entry.ttl_remaining());
                state.memory.insert(key.to_string(), entry);
                state.counters.record_hit();
                Some(value)
            }
            None => {
                state.counters.record_miss();
                None
            }
        }
    }

    // == Peek ==
    /// Reads a live value without touching counters, access metadata or tiers.
    pub fn peek(&self, key: &str) -> Option<Value> {
        let state = self.lock();
        if let Some(entry) = state.memory.get(key) {
            return (!entry.is_expired()).then(|| entry.data.clone());
        }
        match state.disk.load(key) {
            Ok(Some(entry)) if !entry.is_expired() => Some(entry.data),
            _ => None,
        }
    }

    // == Set ==
    /// Stores a value in both tiers, replacing any previous entry.
    ///
    /// Disk failures are logged; the memory tier still holds the value.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL in seconds (uses default_ttl if None)
    pub fn set(&self, key: &str, value: Value, ttl: Option<u64>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.store_entry(key, CacheEntry::new(value, ttl));
        debug!("Cached value for key: {} (TTL: {}s)", key, ttl);
    }

    fn store_entry(&self, key: &str, entry: CacheEntry) {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.write_disk(key, &entry);
        state.memory.insert(key.to_string(), entry);
        state.counters.record_set();
    }

    // == Delete ==
    /// Removes an entry from both tiers.
    ///
    /// Returns whether anything was removed.
    pub fn delete(&self, key: &str) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        let in_memory = state.memory.remove(key).is_some();
        let on_disk = state.disk.remove(key);
        let deleted = in_memory || on_disk;

        if deleted {
            state.counters.record_delete();
            debug!("Deleted cache entry: {}", key);
        }
        deleted
    }

    // == Clear ==
    /// Removes every entry from both tiers.
    ///
    /// Returns memory entries plus disk files removed.
    pub fn clear(&self) -> usize {
        let mut guard = self.lock();
        let state = &mut *guard;
        let memory_count = state.memory.len();
        state.memory.clear();

        let disk_count = state
            .disk_keys()
            .iter()
            .filter(|key| state.disk.remove(key))
            .count();

        let total = memory_count + disk_count;
        info!("Cleared {} cache entries", total);
        total
    }

    // == Cleanup Expired ==
    /// Removes expired entries from both tiers, including disk records that
    /// were never requested again.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut guard = self.lock();
        let state = &mut *guard;

        let expired_keys: Vec<String> = state
            .memory
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            state.memory.remove(key);
            state.disk.remove(key);
        }

        let mut disk_cleaned = 0usize;
        for key in state.disk_keys() {
            if state.memory.contains_key(&key) {
                continue;
            }
            if let Some(entry) = state.read_disk(&key) {
                if entry.is_expired() && state.disk.remove(&key) {
                    disk_cleaned += 1;
                }
            }
        }

        let total = expired_keys.len() + disk_cleaned;
        state.counters.record_evictions(total as u64);

        if total > 0 {
            info!("Cleaned up {} expired cache entries", total);
        }
        total
    }

    // == Keys ==
    /// Lists keys with the given prefix across both tiers.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let state = self.lock();
        let mut keys: BTreeSet<String> = state
            .memory
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        keys.extend(
            state
                .disk_keys()
                .into_iter()
                .filter(|key| key.starts_with(prefix)),
        );
        keys.into_iter().collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn get_stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats::new(
            state.counters.clone(),
            state.memory.len(),
            state.disk_keys().len(),
            self.cache_dir.clone(),
            self.default_ttl,
        )
    }

    /// Directory holding the disk tier.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Default TTL in seconds.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// Number of entries in the memory tier.
    pub fn len(&self) -> usize {
        self.lock().memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().memory.is_empty()
    }
}
