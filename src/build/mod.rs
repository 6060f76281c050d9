//! Build orchestration: resolution, reordering and the build state machine

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{error, info, warn};

use crate::config::{ContentList, ManifestSettings, MoveDirection};
use crate::content::ContentItem;
use crate::engine::{BuildEngine, BuildLogger, BuildRequest};
use crate::error::{PipelineError, PipelineResult};
use crate::utils::{format_duration, normalize_root};

mod expand;
mod resolve;
mod state;

#[cfg(test)]
mod tests;

pub use expand::expand;
pub use resolve::{resolve, ResolvedContent};
pub use state::{BuildHandle, BuildOptions, BuildReport, BuildState};

use state::RunningGuard;

/// Swap the entry at `index` with its neighbour in both the manifest list and
/// the item list. Returns the entry's new index, or `None` at the edges.
pub fn reorder(
    content: &mut ContentList,
    items: &mut [ContentItem],
    index: usize,
    direction: MoveDirection,
) -> Option<usize> {
    let target = content.move_entry(index, direction)?;
    if index < items.len() && target < items.len() {
        items.swap(index, target);
    }
    Some(target)
}

/// Drives builds of resolved content through a build engine.
///
/// One build at a time; the [`BuildHandle`] cancels it from elsewhere.
pub struct BuildOrchestrator {
    handle: BuildHandle,
    options: BuildOptions,

    /// Forces a full rebuild for the current run only
    rebuild: AtomicBool,
}

impl Default for BuildOrchestrator {
    fn default() -> Self {
        Self::new(BuildOptions::default())
    }
}

impl BuildOrchestrator {
    /// Create a new orchestrator
    pub fn new(options: BuildOptions) -> Self {
        Self {
            handle: BuildHandle::new(),
            options,
            rebuild: AtomicBool::new(false),
        }
    }

    pub fn handle(&self) -> BuildHandle {
        self.handle.clone()
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: BuildOptions) {
        self.options = options;
    }

    pub async fn state(&self) -> BuildState {
        self.handle.state().await
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    /// Whether the current run ignores the engine's cache
    pub fn is_rebuilding(&self) -> bool {
        self.rebuild.load(Ordering::SeqCst)
    }

    /// Resolve and build `items`.
    ///
    /// Returns `BuildAlreadyRunning` if another build is active. Every other
    /// outcome, including failures, is reported through the [`BuildReport`].
    pub async fn build(
        &self,
        items: &[ContentItem],
        settings: &ManifestSettings,
        base_dir: &Path,
        engine: &dyn BuildEngine,
        logger: &dyn BuildLogger,
        rebuild_now: bool,
    ) -> PipelineResult<BuildReport> {
        if self.handle.running.swap(true, Ordering::SeqCst) {
            return Err(PipelineError::BuildAlreadyRunning);
        }
        let _running = RunningGuard(&self.handle.running);

        self.handle.cancel.store(false, Ordering::SeqCst);
        self.handle.debugger_attached.store(false, Ordering::SeqCst);
        self.rebuild.store(rebuild_now, Ordering::SeqCst);

        let started = Instant::now();
        let mut report = BuildReport {
            state: BuildState::Resolving,
            copy_files: 0,
            build_files: 0,
            summary: None,
            error: None,
            duration: Default::default(),
        };

        let state = self
            .run(items, settings, base_dir, engine, logger, &mut report)
            .await;

        self.rebuild.store(false, Ordering::SeqCst);
        self.handle.set_state(state).await;
        report.state = state;
        report.duration = started.elapsed();

        info!(
            "Content build {} in {}",
            state,
            format_duration(report.duration)
        );
        Ok(report)
    }

    async fn run(
        &self,
        items: &[ContentItem],
        settings: &ManifestSettings,
        base_dir: &Path,
        engine: &dyn BuildEngine,
        logger: &dyn BuildLogger,
        report: &mut BuildReport,
    ) -> BuildState {
        self.handle.set_state(BuildState::Resolving).await;
        let resolved = match resolve(items, settings, base_dir) {
            Ok(resolved) => resolved,
            Err(e) => {
                error!("{}", e);
                report.error = Some(e.to_string());
                return BuildState::Failed;
            }
        };
        report.copy_files = resolved.copy_files.len();
        report.build_files = resolved.build_files.len();

        if self.options.wait_for_debugger {
            self.handle.set_state(BuildState::WaitingForDebugger).await;
            info!("Waiting for a debugger to attach");
            loop {
                if self.handle.is_canceled() {
                    return BuildState::Canceled;
                }
                if self.handle.debugger_attached.load(Ordering::SeqCst) {
                    break;
                }
                tokio::time::sleep(self.options.debugger_poll).await;
            }
        }

        if self.handle.is_canceled() {
            return BuildState::Canceled;
        }

        self.handle.set_state(BuildState::Building).await;
        let request = build_request(resolved, settings, base_dir, self.is_rebuilding());

        match engine.build(&request, logger).await {
            Ok(summary) => {
                report.summary = Some(summary);
                if summary.succeeded() {
                    BuildState::Finished
                } else {
                    warn!("Content build finished with {} failures", summary.failed);
                    report.error = Some(format!("{} files failed to build", summary.failed));
                    BuildState::Failed
                }
            }
            Err(e) => {
                let e = PipelineError::BuildEngine(format!("{:#}", e));
                error!("{}", e);
                report.error = Some(e.to_string());
                BuildState::Failed
            }
        }
    }
}

/// Engine request for resolved content under `settings`
pub fn build_request(
    resolved: ResolvedContent,
    settings: &ManifestSettings,
    base_dir: &Path,
    rebuild: bool,
) -> BuildRequest {
    BuildRequest {
        root: base_dir.join(normalize_root(&settings.root)),
        output_dir: base_dir.join(&settings.output_dir),
        intermediate_dir: base_dir.join(&settings.intermediate_dir),
        platform: settings.platform,
        graphics_profile: settings.graphics_profile,
        compress: settings.compress,
        copy_files: resolved.copy_files,
        build_files: resolved.build_files,
        bindings: resolved.bindings,
        dependencies: resolved.dependencies,
        rebuild,
    }
}
