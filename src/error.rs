//! Error taxonomy for manifest resolution and build orchestration

use std::path::PathBuf;

use contentpipe_plugin::ValueError;

use crate::plugin::Catalog;

/// A single plugin module failed to load or describe its types
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("failed to load plugin module {module}: {reason}")]
pub struct DiscoveryError {
    /// Reference or path of the module
    pub module: String,

    /// Why loading failed
    pub reason: String,
}

impl DiscoveryError {
    pub fn new(module: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            module: module.into(),
            reason: reason.to_string(),
        }
    }
}

/// Discovery finished but some modules could not be loaded.
///
/// The catalog built from the modules that did load is carried along; it is
/// complete and usable.
#[derive(thiserror::Error, Debug, Clone)]
#[error("{} plugin module(s) failed to load", failures.len())]
pub struct PartialLoadError {
    pub catalog: Box<Catalog>,
    pub failures: Vec<DiscoveryError>,
}

/// A content path tried to escape its root with a `../` segment
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("path {path:?} must not contain '../'")]
pub struct PathEscapeError {
    pub path: String,
}

/// A glob expansion failed for one entry
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot expand {pattern:?} in {directory:?}: {reason}")]
pub struct ExpansionError {
    pub directory: PathBuf,
    pub pattern: String,
    pub reason: String,
}

/// Application error types
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    PartialLoad(#[from] PartialLoadError),

    #[error(transparent)]
    PathEscape(#[from] PathEscapeError),

    #[error(transparent)]
    Expansion(#[from] ExpansionError),

    #[error("Build engine failed: {0}")]
    BuildEngine(String),

    #[error("A content build is already running")]
    BuildAlreadyRunning,

    #[error("Content category {0:?} already exists")]
    DuplicateCategory(String),

    #[error("Unknown content category {0:?}")]
    UnknownCategory(String),

    #[error("Invalid parameter {key:?}: {source}")]
    Parameter {
        key: String,
        #[source]
        source: ValueError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(e: serde_yaml::Error) -> Self {
        PipelineError::Manifest(e.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(e: serde_json::Error) -> Self {
        PipelineError::Manifest(e.to_string())
    }
}

/// Result type for the library
pub type PipelineResult<T> = Result<T, PipelineError>;
