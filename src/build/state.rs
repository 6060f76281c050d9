//! Build state and the handle used to observe and cancel builds

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::engine::BuildSummary;

/// Phase of the current or last build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum BuildState {
    #[default]
    Idle,
    Resolving,
    WaitingForDebugger,
    Building,
    Finished,
    Canceled,
    Failed,
}

impl BuildState {
    /// Whether the state ends a build
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BuildState::Finished | BuildState::Canceled | BuildState::Failed
        )
    }
}

impl std::fmt::Display for BuildState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildState::Idle => "idle",
            BuildState::Resolving => "resolving",
            BuildState::WaitingForDebugger => "waiting for debugger",
            BuildState::Building => "building",
            BuildState::Finished => "finished",
            BuildState::Canceled => "canceled",
            BuildState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Build options
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Pause before dispatch until a debugger attaches or the build is canceled
    pub wait_for_debugger: bool,

    /// Poll interval while waiting
    pub debugger_poll: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            wait_for_debugger: false,
            debugger_poll: Duration::from_millis(100),
        }
    }
}

/// Outcome of one build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub state: BuildState,

    /// Number of resolved copy files
    pub copy_files: usize,

    /// Number of resolved build files
    pub build_files: usize,

    pub summary: Option<BuildSummary>,
    pub error: Option<String>,
    pub duration: Duration,
}

/// Cloneable view of a build orchestrator, usable from other tasks
#[derive(Debug, Clone)]
pub struct BuildHandle {
    pub(super) state: Arc<RwLock<BuildState>>,
    pub(super) cancel: Arc<AtomicBool>,
    pub(super) debugger_attached: Arc<AtomicBool>,
    pub(super) running: Arc<AtomicBool>,
}

impl BuildHandle {
    pub(super) fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(BuildState::Idle)),
            cancel: Arc::new(AtomicBool::new(false)),
            debugger_attached: Arc::new(AtomicBool::new(false)),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cooperative cancellation of the running build
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Signal that a debugger attached, ending the debugger wait
    pub fn attach_debugger(&self) {
        self.debugger_attached.store(true, Ordering::SeqCst);
    }

    pub async fn state(&self) -> BuildState {
        *self.state.read().await
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(super) fn is_canceled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub(super) async fn set_state(&self, state: BuildState) {
        *self.state.write().await = state;
    }
}

/// Clears the running flag when a build ends, however it ends
pub(super) struct RunningGuard<'a>(pub(super) &'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
