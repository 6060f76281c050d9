//! Content compilers invoked by the local engine

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use super::FileBinding;
use crate::config::{GraphicsProfile, TargetPlatform};

/// One file to compile
#[derive(Debug, Clone)]
pub struct CompileJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub binding: FileBinding,
    pub dependencies: Vec<PathBuf>,
    pub platform: TargetPlatform,
    pub graphics_profile: GraphicsProfile,
    pub compress: bool,
}

/// Compiles a single source file into its output
#[async_trait]
pub trait ContentCompiler: Send + Sync {
    async fn compile(&self, job: &CompileJob) -> Result<()>;
}

/// Runs an external program once per file
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandCompiler {
    /// Create a new compiler running `program`
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Arguments passed before the per-file arguments
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Command line for `job`, without the program
    pub fn arguments(&self, job: &CompileJob) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.push("--importer".to_string());
        args.push(job.binding.importer.clone());
        args.push("--processor".to_string());
        args.push(job.binding.processor.clone());
        for (key, value) in &job.binding.parameters {
            args.push("--param".to_string());
            args.push(format!("{key}={value}"));
        }
        args.push("--platform".to_string());
        args.push(job.platform.to_string());
        args.push("--profile".to_string());
        args.push(job.graphics_profile.to_string());
        if job.compress {
            args.push("--compress".to_string());
        }
        args.push("--output".to_string());
        args.push(job.output.to_string_lossy().into_owned());
        args.push(job.source.to_string_lossy().into_owned());
        args
    }
}

#[async_trait]
impl ContentCompiler for CommandCompiler {
    async fn compile(&self, job: &CompileJob) -> Result<()> {
        let args = self.arguments(job);
        debug!("Running {:?} {:?}", self.program, args);

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .output()
            .await
            .with_context(|| format!("Failed to start compiler {:?}", self.program))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);
        Err(anyhow!(
            "compiler exited with code {}: {}",
            exit_code,
            stderr.trim()
        ))
    }
}
