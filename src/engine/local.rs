//! Local incremental build engine

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use contentpipe_cache::{BuildStatistics, CacheEntry, CacheManager, ChangeReason, Fingerprint};

use super::{BuildEngine, BuildLogger, BuildRequest, BuildSummary, CompileJob, ContentCompiler};
use crate::utils::display_path;

/// Extension of compiled outputs
pub const OUTPUT_EXTENSION: &str = "xnb";

/// Copies files and compiles changed sources through a [`ContentCompiler`]
pub struct LocalBuildEngine {
    compiler: Arc<dyn ContentCompiler>,
}

impl LocalBuildEngine {
    /// Create a new engine compiling with `compiler`
    pub fn new(compiler: Arc<dyn ContentCompiler>) -> Self {
        Self { compiler }
    }

    async fn copy_files(&self, request: &BuildRequest, logger: &dyn BuildLogger) -> (usize, usize) {
        let mut copied = 0;
        let mut failed = 0;

        for source in &request.copy_files {
            let target = request
                .output_dir
                .join(relative_to_root(&request.root, source));

            match copy_if_changed(source, &target, request.rebuild).await {
                Ok(true) => {
                    logger.message(&format!("Copied {}", display_path(source)));
                    copied += 1;
                }
                Ok(false) => {
                    logger.message(&format!("Skipped {} (up to date)", display_path(source)));
                }
                Err(e) => {
                    logger.warning(&format!("Failed to copy {}: {:#}", display_path(source), e));
                    failed += 1;
                }
            }
        }

        (copied, failed)
    }
}

#[async_trait]
impl BuildEngine for LocalBuildEngine {
    async fn build(&self, request: &BuildRequest, logger: &dyn BuildLogger) -> Result<BuildSummary> {
        let mut summary = BuildSummary::default();

        let (copied, copy_failures) = self.copy_files(request, logger).await;
        summary.copied = copied;
        summary.failed += copy_failures;

        report_shared_outputs(request, logger);

        let manager = CacheManager::in_directory(&request.intermediate_dir);
        let mut cache = manager.load_or_create();

        for source in &request.build_files {
            let key = display_path(source);
            let binding = request.bindings.get(source).cloned().unwrap_or_default();
            let dependencies = request
                .dependencies
                .get(source)
                .cloned()
                .unwrap_or_default();
            let output = output_path(request, source);

            let fingerprint = match Fingerprint::compute(source, &dependencies) {
                Ok(fingerprint) => fingerprint,
                Err(e) => {
                    logger.warning(&format!("Cannot read {}: {:#}", key, e));
                    cache.forget(&key);
                    summary.failed += 1;
                    continue;
                }
            };

            let binding_key = binding.fingerprint();
            let reason = if request.rebuild {
                Some(ChangeReason::Forced)
            } else {
                cache.change_reason(&key, &fingerprint, &binding_key)
            };

            let Some(reason) = reason else {
                logger.message(&format!("Skipped {} (up to date)", key));
                summary.skipped += 1;
                continue;
            };

            logger.message(&format!("Building {} ({})", key, reason));
            let job = CompileJob {
                source: source.clone(),
                output: output.clone(),
                binding,
                dependencies,
                platform: request.platform,
                graphics_profile: request.graphics_profile,
                compress: request.compress,
            };

            if let Some(parent) = output.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            match self.compiler.compile(&job).await {
                Ok(()) => {
                    cache.record(key, CacheEntry::new(fingerprint, binding_key, output));
                    summary.built += 1;
                }
                Err(e) => {
                    logger.warning(&format!("Failed to build {}: {:#}", key, e));
                    cache.forget(&key);
                    summary.failed += 1;
                }
            }
        }

        let sources: Vec<String> = request.build_files.iter().map(|p| display_path(p)).collect();
        cache.retain_sources(sources.iter().map(String::as_str));
        cache.statistics = BuildStatistics {
            built: summary.built,
            skipped: summary.skipped,
            copied: summary.copied,
            failed: summary.failed,
        };
        manager
            .save(&cache)
            .with_context(|| format!("Failed to save build cache {:?}", manager.path()))?;

        logger.important(&format!("Build finished: {}", summary));
        Ok(summary)
    }
}

/// Output location of a compiled build file
fn output_path(request: &BuildRequest, source: &Path) -> PathBuf {
    request
        .output_dir
        .join(relative_to_root(&request.root, source))
        .with_extension(OUTPUT_EXTENSION)
}

/// Warn about build files compiling to the same output; the later one wins
fn report_shared_outputs(request: &BuildRequest, logger: &dyn BuildLogger) {
    let mut owners: HashMap<PathBuf, &Path> = HashMap::new();

    for source in &request.build_files {
        let output = output_path(request, source);
        if let Some(owner) = owners.get(&output) {
            logger.warning(&format!(
                "{} and {} both compile to {}",
                display_path(owner),
                display_path(source),
                display_path(&output)
            ));
        } else {
            owners.insert(output, source);
        }
    }
}

/// Path below the content root, or just the file name for files outside it
fn relative_to_root(root: &Path, source: &Path) -> PathBuf {
    match source.strip_prefix(root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| source.to_path_buf()),
    }
}

async fn copy_if_changed(source: &Path, target: &Path, force: bool) -> Result<bool> {
    if !force {
        if let (Ok(src), Ok(dst)) = (
            tokio::fs::metadata(source).await,
            tokio::fs::metadata(target).await,
        ) {
            if let (Ok(src_time), Ok(dst_time)) = (src.modified(), dst.modified()) {
                if src.len() == dst.len() && src_time <= dst_time {
                    return Ok(false);
                }
            }
        }
    }

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(source, target).await?;
    Ok(true)
}

/// Remove the build cache and the output directory
pub async fn clean(intermediate_dir: &Path, output_dir: &Path) -> Result<()> {
    CacheManager::in_directory(intermediate_dir).clear()?;

    if tokio::fs::metadata(output_dir).await.is_ok() {
        debug!("Removing output directory {:?}", output_dir);
        tokio::fs::remove_dir_all(output_dir)
            .await
            .with_context(|| format!("Failed to remove {:?}", output_dir))?;
    }
    Ok(())
}
