//! Build cache file

use crate::types::{BuildStatistics, CacheEntry, ChangeReason, Fingerprint};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Incremental state of every built source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildCache {
    /// Cache format version
    pub version: String,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Tool version that wrote the cache
    pub tool_version: String,

    /// Entries keyed by source path
    pub entries: BTreeMap<String, CacheEntry>,

    /// Statistics of the most recent build
    #[serde(default)]
    pub statistics: BuildStatistics,
}

impl Default for BuildCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildCache {
    pub const VERSION: &'static str = "1.0";

    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            version: Self::VERSION.to_string(),
            updated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: BTreeMap::new(),
            statistics: BuildStatistics::default(),
        }
    }

    /// Load cache from disk
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!("Build cache does not exist: {:?}", path));
        }

        let content = std::fs::read_to_string(path)?;
        let cache: BuildCache = serde_yaml::from_str(&content)?;
        if cache.version != Self::VERSION {
            return Err(anyhow!(
                "Unsupported build cache version {} in {:?}",
                cache.version,
                path
            ));
        }
        Ok(cache)
    }

    /// Save cache to disk
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Decide whether `source` must be rebuilt.
    ///
    /// Returns `None` when the cached build is still valid: same source hash,
    /// same dependency set and hashes, same binding, and the output exists.
    pub fn change_reason(
        &self,
        source: &str,
        fingerprint: &Fingerprint,
        binding: &str,
    ) -> Option<ChangeReason> {
        let Some(entry) = self.entries.get(source) else {
            return Some(ChangeReason::New);
        };

        if entry.binding != binding {
            return Some(ChangeReason::BindingChanged);
        }

        if entry.sha256 != fingerprint.sha256 {
            return Some(ChangeReason::SourceChanged);
        }

        for (dependency, sha256) in &fingerprint.dependencies {
            if entry.dependencies.get(dependency) != Some(sha256) {
                return Some(ChangeReason::DependencyChanged(dependency.clone()));
            }
        }
        if let Some(removed) = entry
            .dependencies
            .keys()
            .find(|dep| !fingerprint.dependencies.contains_key(*dep))
        {
            return Some(ChangeReason::DependencyChanged(removed.clone()));
        }

        if !entry.output.exists() {
            return Some(ChangeReason::OutputMissing);
        }

        None
    }

    /// Record a successful build
    pub fn record(&mut self, source: String, entry: CacheEntry) {
        self.updated_at = Utc::now();
        self.entries.insert(source, entry);
    }

    /// Forget a source, e.g. after its compilation failed
    pub fn forget(&mut self, source: &str) -> Option<CacheEntry> {
        self.entries.remove(source)
    }

    /// Drop entries for sources no longer part of the build
    pub fn retain_sources<'a, I>(&mut self, sources: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: std::collections::HashSet<&str> = sources.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|source, _| {
            let kept = keep.contains(source.as_str());
            if !kept {
                debug!("Dropping cache entry for removed source {}", source);
            }
            kept
        });
        before - self.entries.len()
    }
}
