//! Build engine contract and the local reference engine
//!
//! The orchestrator hands a [`BuildRequest`] to a [`BuildEngine`] and awaits
//! its [`BuildSummary`]. What the engine does with each file is its own
//! business; [`LocalBuildEngine`] copies files and feeds changed sources to a
//! [`ContentCompiler`].

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::{GraphicsProfile, TargetPlatform};

mod compiler;
mod local;


pub use compiler::{CommandCompiler, CompileJob, ContentCompiler};
pub use local::{clean, LocalBuildEngine, OUTPUT_EXTENSION};

/// Importer, processor and parameters a build file is compiled with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBinding {
    pub importer: String,
    pub processor: String,
    pub parameters: BTreeMap<String, String>,
}

impl FileBinding {
    /// Stable text form used to detect binding changes between builds
    pub fn fingerprint(&self) -> String {
        let mut text = format!("{}|{}", self.importer, self.processor);
        for (key, value) in &self.parameters {
            text.push_str(&format!("|{key}={value}"));
        }
        contentpipe_cache::hash_string(&text)
    }
}

/// Everything an engine needs for one run
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    /// Content root on disk
    pub root: PathBuf,

    pub output_dir: PathBuf,
    pub intermediate_dir: PathBuf,
    pub platform: TargetPlatform,
    pub graphics_profile: GraphicsProfile,
    pub compress: bool,

    pub copy_files: Vec<PathBuf>,
    pub build_files: Vec<PathBuf>,

    /// Binding of every build file
    pub bindings: BTreeMap<PathBuf, FileBinding>,

    /// Extra watched files per build file
    pub dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,

    /// Ignore the incremental cache for this run
    pub rebuild: bool,
}

/// Outcome counts of a build run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub copied: usize,
    pub built: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BuildSummary {
    pub fn succeeded(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} built, {} skipped, {} copied, {} failed",
            self.built, self.skipped, self.copied, self.failed
        )
    }
}

/// Log sink handed to build engines
pub trait BuildLogger: Send + Sync {
    fn message(&self, message: &str);
    fn warning(&self, message: &str);
    fn important(&self, message: &str);
}

/// Forwards engine output to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBuildLogger;

impl BuildLogger for TracingBuildLogger {
    fn message(&self, message: &str) {
        tracing::debug!(target: "contentpipe::engine", "{}", message);
    }

    fn warning(&self, message: &str) {
        warn!(target: "contentpipe::engine", "{}", message);
    }

    fn important(&self, message: &str) {
        info!(target: "contentpipe::engine", "{}", message);
    }
}

/// An external build engine
#[async_trait]
pub trait BuildEngine: Send + Sync {
    /// Run one build. An error, or a summary with failures, fails the build.
    async fn build(&self, request: &BuildRequest, logger: &dyn BuildLogger)
        -> Result<BuildSummary>;
}
