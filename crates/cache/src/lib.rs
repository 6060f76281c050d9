//! Incremental build cache for change detection between content builds

pub mod cache;
pub mod manager;
pub mod types;

pub use cache::BuildCache;
pub use manager::CacheManager;
pub use types::{
    hash_string, BuildStatistics, CacheEntry, ChangeReason, FileChecksum, Fingerprint,
};
