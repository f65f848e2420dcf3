//! Disk Tier Module
//!
//! One JSON record per key, stored as `<key>.cache` under the cache directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

/// File extension of cache records.
pub const CACHE_FILE_EXTENSION: &str = "cache";

// == Disk Tier ==
/// Best-effort persistent tier. Callers serialize access.
#[derive(Debug, Clone)]
pub struct DiskTier {
    dir: PathBuf,
}

impl DiskTier {
    /// Opens the tier, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns true if the key can be used as a file stem.
    pub fn accepts_key(key: &str) -> bool {
        !key.is_empty()
            && key != "."
            && !key.contains("..")
            && !key.contains(['/', '\\', '\0'])
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{CACHE_FILE_EXTENSION}"))
    }

    // == Load ==
    /// Reads one record.
    ///
    /// Returns `Ok(None)` when no file exists and `CacheError::Corrupt` when
    /// the file does not hold a valid record.
    pub fn load(&self, key: &str) -> Result<Option<CacheEntry>> {
        if !Self::accepts_key(key) {
            return Ok(None);
        }
        let raw = match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(CacheError::Corrupt)
    }

    // == Save ==
    /// Writes one record, replacing any previous file.
    pub fn save(&self, key: &str, entry: &CacheEntry) -> Result<()> {
        if !Self::accepts_key(key) {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("key {key:?} is not a valid file name"),
            )
            .into());
        }
        let encoded = serde_json::to_string(entry).map_err(CacheError::Serialize)?;
        fs::write(self.path_for(key), encoded)?;
        Ok(())
    }

    // == Remove ==
    /// Deletes one record. Returns whether a file was removed.
    pub fn remove(&self, key: &str) -> bool {
        if !Self::accepts_key(key) {
            return false;
        }
        fs::remove_file(self.path_for(key)).is_ok()
    }

    // == Keys ==
    /// Lists the keys of every record in the directory.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(CACHE_FILE_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}
