//! Build cache types and data structures

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Calculate the SHA256 hash of a string
pub fn hash_string(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Cached state of one built source file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// SHA256 of the source file at build time
    pub sha256: String,

    /// SHA256 of every dependency at build time, keyed by path
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    /// Hash of the importer/processor binding used for the build
    pub binding: String,

    /// Output written by the compiler
    pub output: PathBuf,

    /// Build timestamp
    pub built_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create a new cache entry from a fresh fingerprint
    pub fn new(fingerprint: Fingerprint, binding: String, output: PathBuf) -> Self {
        Self {
            sha256: fingerprint.sha256,
            dependencies: fingerprint.dependencies,
            binding,
            output,
            built_at: Utc::now(),
        }
    }

    /// Check if the entry is stale (older than specified duration)
    pub fn is_stale(&self, max_age_hours: u64) -> bool {
        let age = Utc::now().signed_duration_since(self.built_at);
        age.num_hours() > max_age_hours as i64
    }
}

/// Current checksums of a source file and its dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub sha256: String,
    pub dependencies: BTreeMap<String, String>,
}

impl Fingerprint {
    /// Hash `source` and every path in `dependencies`
    pub fn compute(source: &Path, dependencies: &[PathBuf]) -> Result<Self> {
        let sha256 = FileChecksum::from_file(source)?.sha256;

        let mut deps = BTreeMap::new();
        for dependency in dependencies {
            let checksum = FileChecksum::from_file(dependency)?;
            deps.insert(dependency.to_string_lossy().replace('\\', "/"), checksum.sha256);
        }

        Ok(Self {
            sha256,
            dependencies: deps,
        })
    }
}

/// Why a source file must be rebuilt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeReason {
    /// The caller asked for a full rebuild
    Forced,

    /// The file has never been built
    New,

    /// The previous output no longer exists
    OutputMissing,

    /// The file itself changed
    SourceChanged,

    /// A dependency was added, removed or changed
    DependencyChanged(String),

    /// The importer, processor or parameters changed
    BindingChanged,
}

impl std::fmt::Display for ChangeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeReason::Forced => f.write_str("rebuild requested"),
            ChangeReason::New => f.write_str("not built yet"),
            ChangeReason::OutputMissing => f.write_str("output missing"),
            ChangeReason::SourceChanged => f.write_str("source changed"),
            ChangeReason::DependencyChanged(dep) => write!(f, "dependency {dep} changed"),
            ChangeReason::BindingChanged => f.write_str("importer or processor settings changed"),
        }
    }
}

/// File checksum information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChecksum {
    /// SHA256 checksum
    pub sha256: String,

    /// File size in bytes
    pub size: u64,

    /// Last modified timestamp
    pub modified_at: DateTime<Utc>,
}

impl FileChecksum {
    /// Calculate checksum from file content
    pub fn from_file(path: &Path) -> Result<Self> {
        let metadata =
            fs::metadata(path).with_context(|| format!("cannot stat {}", path.display()))?;
        let content = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;

        let mut hasher = Sha256::new();
        hasher.update(&content);
        let sha256 = hex::encode(hasher.finalize());

        let modified_at = DateTime::from(metadata.modified()?);

        Ok(Self {
            sha256,
            size: metadata.len(),
            modified_at,
        })
    }
}

/// Statistics of the most recent build
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BuildStatistics {
    /// Files passed to the compiler
    pub built: usize,

    /// Files skipped because nothing changed
    pub skipped: usize,

    /// Files copied verbatim
    pub copied: usize,

    /// Files whose compilation failed
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_checksum() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("hero.png");
        fs::write(&file, "test content").unwrap();

        let checksum = FileChecksum::from_file(&file).unwrap();
        assert_eq!(checksum.size, 12);
        assert_eq!(checksum.sha256, hash_string("test content"));
    }

    #[test]
    fn test_fingerprint_tracks_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("level.tmx");
        let tileset = temp_dir.path().join("tiles.tsx");
        fs::write(&source, "map").unwrap();
        fs::write(&tileset, "tiles").unwrap();

        let fingerprint = Fingerprint::compute(&source, &[tileset.clone()]).unwrap();
        assert_eq!(fingerprint.dependencies.len(), 1);

        fs::write(&tileset, "tiles v2").unwrap();
        let changed = Fingerprint::compute(&source, &[tileset]).unwrap();
        assert_eq!(fingerprint.sha256, changed.sha256);
        assert_ne!(fingerprint.dependencies, changed.dependencies);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(FileChecksum::from_file(&temp_dir.path().join("missing.wav")).is_err());
    }
}
