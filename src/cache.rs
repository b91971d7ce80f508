//! Two-tier cache for registry metadata.
//!
//! [`TieredCache`] keeps an in-process map for the lifetime of a run in front
//! of a [`DiskCache`], a directory of small JSON files with a TTL. Both tiers
//! treat every failure as a miss: a corrupt or unreadable entry simply means
//! the package is fetched again.
//!
//! # Cache Location
//!
//! The default directory is platform-specific:
//! - Linux: `~/.cache/depcop/`
//! - macOS: `~/Library/Caches/depcop/`
//! - Windows: `%LOCALAPPDATA%\depcop\`
//!
//! # Example
//!
//! ```no_run
//! use depcop::cache::{DiskCache, MetadataCache, TieredCache};
//! use depcop::RegistryMetadata;
//! use std::time::Duration;
//!
//! let disk = DiskCache::new(DiskCache::default_dir(), Duration::from_secs(3600));
//! let cache = TieredCache::new(disk);
//!
//! cache.put("monolog/monolog", &RegistryMetadata::unknown());
//! assert!(cache.get("monolog/monolog").is_some());
//! ```

use crate::error::Result;
use crate::model::RegistryMetadata;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Default cache TTL in seconds.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Lookup and store of per-package metadata.
///
/// Implementations must never fail loudly: a lookup either finds a fresh
/// entry or reports absence.
pub trait MetadataCache: Send + Sync {
    fn get(&self, name: &str) -> Option<RegistryMetadata>;
    fn put(&self, name: &str, metadata: &RegistryMetadata);
}

/// On-disk form of one entry.
#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    stored_at: DateTime<Utc>,
    payload: T,
}

/// A file-based cache with TTL support.
///
/// Each key is stored as `<sha256(key)>.json` holding the payload and the
/// time it was written.
pub struct DiskCache {
    dir: PathBuf,
    ttl: Duration,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
        }
    }

    /// Platform cache directory for depcop.
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("depcop")
    }

    /// Ensures the cache directory exists.
    fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Converts a cache key to a collision-resistant filename.
    fn cache_path(&self, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        self.dir.join(format!("{:x}.json", hasher.finalize()))
    }

    fn is_fresh(&self, stored_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match (now - stored_at).to_std() {
            Ok(elapsed) => elapsed < self.ttl,
            // Written "in the future" by a skewed clock; keep it.
            Err(_) => true,
        }
    }

    /// Retrieves a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist, can't be decoded, or has
    /// expired. Expired entries are removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.cache_path(key);

        let content = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Discarding unreadable cache entry for {}: {}", key, e);
                return None;
            }
        };

        if !self.is_fresh(entry.stored_at, Utc::now()) {
            debug!("Cache entry for {} expired", key);
            let _ = fs::remove_file(&path);
            return None;
        }

        Some(entry.payload)
    }

    /// Stores a value in the cache, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or
    /// the file cannot be written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.write_entry(key, value, Utc::now())
    }

    fn write_entry<T: Serialize>(&self, key: &str, value: &T, stored_at: DateTime<Utc>) -> Result<()> {
        self.ensure_dir()?;
        let entry = CacheEntry {
            stored_at,
            payload: value,
        };
        let content = serde_json::to_string(&entry)?;
        fs::write(self.cache_path(key), content)?;
        Ok(())
    }

    /// Clears all cached entries.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be read.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        if self.dir.exists() {
            for entry in fs::read_dir(&self.dir)?.flatten() {
                let path = entry.path();
                if path.extension().map(|e| e == "json").unwrap_or(false)
                    && fs::remove_file(&path).is_ok()
                {
                    removed += 1;
                }
            }
        }
        Ok(removed)
    }
}

/// Memory tier in front of an optional [`DiskCache`].
pub struct TieredCache {
    memory: Mutex<HashMap<String, RegistryMetadata>>,
    disk: Option<DiskCache>,
}

impl TieredCache {
    pub fn new(disk: DiskCache) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            disk: Some(disk),
        }
    }

    /// A cache that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            disk: None,
        }
    }

    fn remember(&self, name: &str, metadata: &RegistryMetadata) {
        if let Ok(mut memory) = self.memory.lock() {
            memory.insert(name.to_string(), metadata.clone());
        }
    }
}

impl MetadataCache for TieredCache {
    fn get(&self, name: &str) -> Option<RegistryMetadata> {
        if let Some(hit) = self
            .memory
            .lock()
            .ok()
            .and_then(|memory| memory.get(name).cloned())
        {
            return Some(hit);
        }

        let hit: RegistryMetadata = self.disk.as_ref()?.get(name)?;
        self.remember(name, &hit);
        Some(hit)
    }

    fn put(&self, name: &str, metadata: &RegistryMetadata) {
        self.remember(name, metadata);

        if let Some(disk) = &self.disk {
            if let Err(e) = disk.set(name, metadata) {
                debug!("Could not persist cache entry for {}: {}", name, e);
            }
        }
    }
}
