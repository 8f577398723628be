//! Generation record: the fingerprint of every output confirmed on disk.
//!
//! The record lives at `<out_root>/.cache/cache.json` and maps each output
//! path (relative to the output root, `/`-separated) to the fingerprint of
//! the content last written there. An output whose fingerprint is unchanged
//! and whose file still exists is not rewritten.
//!
//! Entries are only recorded after a confirmed write. A failed write drops
//! the entry so the next run retries it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use datagen_core::Fingerprint;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Directory under the output root holding the record.
pub const CACHE_DIR: &str = ".cache";
/// Record file name inside [`CACHE_DIR`].
pub const CACHE_FILE: &str = "cache.json";

const CACHE_VERSION: u32 = 1;

/// Errors from reading or writing the record.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("failed to read generation record {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write generation record {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize generation record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk form of the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    updated_at: String,
    entries: BTreeMap<String, Fingerprint>,
}

/// Fingerprints of the previous run, and of the outputs confirmed in this one.
#[derive(Debug)]
pub struct HashCache {
    path: PathBuf,
    updated_at: Option<String>,
    previous: BTreeMap<String, Fingerprint>,
    current: BTreeMap<String, Fingerprint>,
    touched: BTreeSet<String>,
}

impl HashCache {
    /// Location of the record for an output root.
    pub fn record_path(out_root: &Path) -> PathBuf {
        out_root.join(CACHE_DIR).join(CACHE_FILE)
    }

    /// An empty record that will be saved under `out_root`.
    pub fn empty(out_root: &Path) -> Self {
        Self {
            path: Self::record_path(out_root),
            updated_at: None,
            previous: BTreeMap::new(),
            current: BTreeMap::new(),
            touched: BTreeSet::new(),
        }
    }

    /// Loads the record for `out_root`.
    ///
    /// A missing record is empty. An unreadable or corrupt one is logged and
    /// treated as empty, which only costs a full rewrite.
    pub fn load(out_root: &Path) -> Result<Self, CacheError> {
        let mut cache = Self::empty(out_root);

        let json = match fs::read_to_string(&cache.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %cache.path.display(), "no generation record yet");
                return Ok(cache);
            }
            Err(source) => {
                return Err(CacheError::Read {
                    path: cache.path,
                    source,
                })
            }
        };

        match serde_json::from_str::<CacheFile>(&json) {
            Ok(file) if file.version == CACHE_VERSION => {
                cache.updated_at = Some(file.updated_at);
                cache.previous = file.entries;
            }
            Ok(file) => {
                warn!(
                    path = %cache.path.display(),
                    version = file.version,
                    "ignoring generation record with unknown version"
                );
            }
            Err(e) => {
                warn!(path = %cache.path.display(), error = %e, "ignoring corrupt generation record");
            }
        }

        Ok(cache)
    }

    /// Path of the record file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Timestamp of the last save, if the record was loaded from disk.
    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    /// Fingerprint recorded by the previous run.
    pub fn previous(&self, output: &str) -> Option<&Fingerprint> {
        self.previous.get(output)
    }

    /// Whether the previous run recorded exactly this fingerprint.
    pub fn is_current(&self, output: &str, fingerprint: &Fingerprint) -> bool {
        self.previous(output) == Some(fingerprint)
    }

    /// Confirms an output whose write succeeded.
    pub fn record(&mut self, output: &str, fingerprint: Fingerprint) {
        self.touched.insert(output.to_string());
        self.current.insert(output.to_string(), fingerprint);
    }

    /// Carries forward an output that was up to date and not rewritten.
    pub fn keep(&mut self, output: &str, fingerprint: Fingerprint) {
        self.record(output, fingerprint);
    }

    /// Forgets an output whose write failed, so the next run retries it.
    pub fn invalidate(&mut self, output: &str) {
        self.touched.insert(output.to_string());
        self.current.remove(output);
    }

    /// Outputs recorded previously that this run has not produced.
    pub fn stale(&self) -> Vec<String> {
        self.previous
            .keys()
            .filter(|k| !self.touched.contains(*k))
            .cloned()
            .collect()
    }

    /// Removes stale outputs from the record and returns them.
    pub fn drop_stale(&mut self) -> Vec<String> {
        let stale = self.stale();
        for output in &stale {
            self.previous.remove(output);
        }
        stale
    }

    /// Entries that would be saved now: everything confirmed this run, plus
    /// previous entries this run has not touched.
    pub fn entries(&self) -> BTreeMap<String, Fingerprint> {
        let mut entries = self.current.clone();
        for (output, fingerprint) in &self.previous {
            if !self.touched.contains(output) {
                entries.insert(output.clone(), *fingerprint);
            }
        }
        entries
    }

    /// Number of entries in the previous run's record.
    pub fn previous_len(&self) -> usize {
        self.previous.len()
    }

    /// Writes the record to disk.
    pub fn save(&self) -> Result<(), CacheError> {
        let file = CacheFile {
            version: CACHE_VERSION,
            updated_at: chrono::Utc::now().to_rfc3339(),
            entries: self.entries(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| CacheError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        fs::write(&self.path, json).map_err(|source| CacheError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), entries = file.entries.len(), "saved generation record");
        Ok(())
    }

    /// Deletes the record for `out_root`. Returns whether one existed.
    pub fn clear(out_root: &Path) -> Result<bool, CacheError> {
        let path = Self::record_path(out_root);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Write { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fp(s: &str) -> Fingerprint {
        Fingerprint::of_bytes(s.as_bytes())
    }

    #[test]
    fn test_missing_record_is_empty() {
        let tmp = TempDir::new().unwrap();
        let cache = HashCache::load(tmp.path()).unwrap();
        assert_eq!(cache.previous_len(), 0);
        assert!(cache.updated_at().is_none());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let mut cache = HashCache::load(tmp.path()).unwrap();
        cache.record("assets/a/textures/x.png", fp("x"));
        cache.save().unwrap();

        let loaded = HashCache::load(tmp.path()).unwrap();
        assert!(loaded.is_current("assets/a/textures/x.png", &fp("x")));
        assert!(!loaded.is_current("assets/a/textures/x.png", &fp("y")));
        assert!(loaded.updated_at().is_some());
    }

    #[test]
    fn test_corrupt_record_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = HashCache::record_path(tmp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let cache = HashCache::load(tmp.path()).unwrap();
        assert_eq!(cache.previous_len(), 0);
    }

    #[test]
    fn test_invalidate_drops_previous_entry() {
        let tmp = TempDir::new().unwrap();
        let mut cache = HashCache::empty(tmp.path());
        cache.record("a.png", fp("a"));
        cache.save().unwrap();

        let mut cache = HashCache::load(tmp.path()).unwrap();
        cache.invalidate("a.png");
        assert!(!cache.entries().contains_key("a.png"));
        assert!(cache.stale().is_empty());
    }

    #[test]
    fn test_untouched_entries_survive_until_dropped() {
        let tmp = TempDir::new().unwrap();
        let mut cache = HashCache::empty(tmp.path());
        cache.record("a.png", fp("a"));
        cache.record("b.png", fp("b"));
        cache.save().unwrap();

        let mut cache = HashCache::load(tmp.path()).unwrap();
        cache.keep("a.png", fp("a"));
        assert_eq!(cache.stale(), vec!["b.png".to_string()]);
        assert!(cache.entries().contains_key("b.png"));

        assert_eq!(cache.drop_stale(), vec!["b.png".to_string()]);
        assert!(!cache.entries().contains_key("b.png"));
        assert!(cache.entries().contains_key("a.png"));
    }

    #[test]
    fn test_clear() {
        let tmp = TempDir::new().unwrap();
        assert!(!HashCache::clear(tmp.path()).unwrap());
        HashCache::empty(tmp.path()).save().unwrap();
        assert!(HashCache::clear(tmp.path()).unwrap());
        assert!(!HashCache::record_path(tmp.path()).exists());
    }
}
