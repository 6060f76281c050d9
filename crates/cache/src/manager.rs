//! Build cache manager for handling cache file operations

use crate::cache::BuildCache;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Build cache manager for handling cache file operations
pub struct CacheManager {
    cache_path: PathBuf,
}

impl CacheManager {
    /// Name of the cache file inside the intermediate directory
    pub const FILE_NAME: &'static str = "contentpipe.cache";

    /// Create a new cache manager
    pub fn new(cache_path: PathBuf) -> Self {
        Self { cache_path }
    }

    /// Create a manager for the cache inside `intermediate_dir`
    pub fn in_directory(intermediate_dir: &Path) -> Self {
        Self::new(intermediate_dir.join(Self::FILE_NAME))
    }

    /// Get the cache path
    pub fn path(&self) -> &Path {
        &self.cache_path
    }

    /// Load the cache, or start empty.
    ///
    /// A corrupt or incompatible cache is discarded with a warning; it only
    /// costs a full rebuild.
    pub fn load_or_create(&self) -> BuildCache {
        if !self.cache_path.exists() {
            return BuildCache::new();
        }

        match BuildCache::from_file(&self.cache_path) {
            Ok(cache) => cache,
            Err(e) => {
                warn!("Discarding build cache {:?}: {}", self.cache_path, e);
                BuildCache::new()
            }
        }
    }

    /// Save cache
    pub fn save(&self, cache: &BuildCache) -> Result<()> {
        cache.save_to_file(&self.cache_path)
    }

    /// Remove the cache file
    pub fn clear(&self) -> Result<()> {
        if self.cache_path.exists() {
            std::fs::remove_file(&self.cache_path)?;
        }
        Ok(())
    }

    /// Clean up entries older than `max_age_hours`, returns how many were removed
    pub fn cleanup_stale_entries(&self, max_age_hours: u64) -> Result<usize> {
        let mut cache = self.load_or_create();
        let before = cache.entries.len();
        cache.entries.retain(|_, entry| !entry.is_stale(max_age_hours));
        let removed = before - cache.entries.len();

        if removed > 0 {
            self.save(&cache)?;
        }

        Ok(removed)
    }
}
