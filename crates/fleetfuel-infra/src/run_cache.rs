//! Cache of computed consumption runs
//!
//! Keyed by a SHA-256 over the bytes of the three input files, the tolerance
//! and the cache format version. Any change to an input yields a new key, so
//! stale entries are never served; they are only garbage until `clear`.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use fleetfuel_domain::model::ConsumptionRun;
use fleetfuel_types::{CacheError, Result};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Bump when ConsumptionRun's serialized shape changes
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Cache manager for consumption runs
pub struct RunCache {
    cache_dir: PathBuf,
}

impl RunCache {
    /// Create a new cache manager
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&cache_dir)?;
        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Fingerprint the inputs of one run (streaming hash per file)
    pub fn fingerprint(inputs: &[&Path], tolerance: f64) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(CACHE_FORMAT_VERSION.to_le_bytes());
        hasher.update(tolerance.to_bits().to_le_bytes());

        for path in inputs {
            let file = File::open(path)?;
            let length = file.metadata()?.len();
            hasher.update(length.to_le_bytes());
            let mut reader = BufReader::new(file);
            io::copy(&mut reader, &mut hasher)?;
        }

        let key = format!("{:x}", hasher.finalize());
        debug!(key = %key, "computed run fingerprint");
        Ok(key)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", key))
    }

    /// Get a cached run
    pub fn get(&self, key: &str) -> Result<Option<ConsumptionRun>> {
        let cache_path = self.entry_path(key);
        if !cache_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&cache_path)?;
        let run = serde_json::from_str(&content)
            .map_err(|e| CacheError::Corrupted(format!("{}: {}", cache_path.display(), e)))?;
        Ok(Some(run))
    }

    /// Store a run
    pub fn set(&self, key: &str, run: &ConsumptionRun) -> Result<()> {
        let content = serde_json::to_string(run)?;
        fs::write(self.entry_path(key), content)
            .map_err(|e| CacheError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Drop one entry (used after a corrupted read)
    pub fn remove(&self, key: &str) -> Result<()> {
        let cache_path = self.entry_path(key);
        if cache_path.exists() {
            fs::remove_file(cache_path)?;
        }
        Ok(())
    }

    /// Clear all cached runs
    pub fn clear(&self) -> Result<usize> {
        let mut count = 0;

        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                fs::remove_file(&path)?;
                count += 1;
            }
        }

        Ok(count)
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let mut count = 0;
        let mut total_size = 0u64;

        for entry in fs::read_dir(&self.cache_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                count += 1;
                if let Ok(metadata) = fs::metadata(&path) {
                    total_size += metadata.len();
                }
            }
        }

        Ok(CacheStats {
            entry_count: count,
            total_size_bytes: total_size,
            cache_dir: self.cache_dir.clone(),
        })
    }
}

/// Cache statistics
#[derive(Debug)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size_bytes: u64,
    pub cache_dir: PathBuf,
}

impl CacheStats {
    pub fn display(&self) -> String {
        let size_kb = self.total_size_bytes as f64 / 1024.0;
        format!(
            "Run Cache\n\
             =========\n\
             Entries:    {}\n\
             Total size: {:.2} KB\n\
             Location:   {}",
            self.entry_count,
            size_kb,
            self.cache_dir.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetfuel_types::Error;
    use tempfile::tempdir;

    fn sample_run() -> ConsumptionRun {
        ConsumptionRun {
            tolerance: 0.1,
            records: Vec::new(),
            rejected: Vec::new(),
            quality: Vec::new(),
            empty_inputs: Vec::new(),
        }
    }

    #[test]
    fn test_fingerprint_tracks_content_and_tolerance() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        fs::write(&a, "PATENTE;LITROS\nABC123;10\n").unwrap();
        fs::write(&b, "PATENTE;KM\nABC123;100\n").unwrap();

        let (a, b) = (a.as_path(), b.as_path());

        let first = RunCache::fingerprint(&[a, b], 0.1).unwrap();
        assert_eq!(first, RunCache::fingerprint(&[a, b], 0.1).unwrap());
        assert_ne!(first, RunCache::fingerprint(&[a, b], 0.2).unwrap());
        assert_ne!(first, RunCache::fingerprint(&[b, a], 0.1).unwrap());

        fs::write(a, "PATENTE;LITROS\nABC123;11\n").unwrap();
        assert_ne!(first, RunCache::fingerprint(&[a, b], 0.1).unwrap());
    }

    #[test]
    fn test_set_get_clear() {
        let dir = tempdir().unwrap();
        let cache = RunCache::new(dir.path().join("cache")).unwrap();

        assert!(cache.get("missing").unwrap().is_none());
        cache.set("k1", &sample_run()).unwrap();
        assert_eq!(cache.get("k1").unwrap(), Some(sample_run()));

        let stats = cache.stats().unwrap();
        assert_eq!(stats.entry_count, 1);
        assert!(stats.display().contains("Entries:    1"));

        assert_eq!(cache.clear().unwrap(), 1);
        assert!(cache.get("k1").unwrap().is_none());
    }

    #[test]
    fn test_corrupted_entry() {
        let dir = tempdir().unwrap();
        let cache = RunCache::new(dir.path().to_path_buf()).unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        assert!(matches!(
            cache.get("bad"),
            Err(Error::Cache(CacheError::Corrupted(_)))
        ));
        cache.remove("bad").unwrap();
        assert!(cache.get("bad").unwrap().is_none());
    }
}
