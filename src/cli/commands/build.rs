//! Build command implementation

use crate::build::{BuildOptions, BuildState};
use crate::cli::utils;
use crate::engine::{CommandCompiler, LocalBuildEngine, TracingBuildLogger};
use crate::utils::format_duration;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use std::sync::Arc;
use tracing::{info, warn};

pub fn command() -> Command {
    Command::new("build")
        .about("Build every content entry of the manifest")
        .arg(utils::manifest_arg())
        .arg(
            clap::Arg::new("rebuild")
                .short('r')
                .long("rebuild")
                .help("Rebuild everything, ignoring the build cache")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("compiler")
                .long("compiler")
                .help("Program invoked once per build file")
                .value_name("PROGRAM")
                .default_value("contentpipe-compiler"),
        )
        .arg(
            clap::Arg::new("compiler-arg")
                .long("compiler-arg")
                .help("Extra argument passed to the compiler before the generated ones")
                .value_name("ARG")
                .action(clap::ArgAction::Append)
                .allow_hyphen_values(true),
        )
        .arg(
            clap::Arg::new("wait-for-debugger")
                .long("wait-for-debugger")
                .help("Pause before building until Enter is pressed")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let mut pipeline = utils::open_pipeline(matches)?;
    pipeline.set_build_options(BuildOptions {
        wait_for_debugger: matches.get_flag("wait-for-debugger"),
        ..Default::default()
    });

    let compiler_args: Vec<String> = matches
        .get_many::<String>("compiler-arg")
        .map(|args| args.cloned().collect())
        .unwrap_or_default();
    let compiler =
        CommandCompiler::new(utils::required(matches, "compiler")?).with_args(compiler_args);
    let engine = LocalBuildEngine::new(Arc::new(compiler));

    let handle = pipeline.build_handle();
    let cancel_handle = handle.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, canceling the build");
            cancel_handle.cancel();
        }
    });

    if matches.get_flag("wait-for-debugger") {
        println!("Attach a debugger, then press Enter to continue.");
        let attach_handle = handle.clone();
        tokio::task::spawn_blocking(move || {
            let mut line = String::new();
            if std::io::stdin().read_line(&mut line).is_ok() {
                attach_handle.attach_debugger();
            }
        });
    }

    let rebuild = matches.get_flag("rebuild");
    info!("Starting content build{}", if rebuild { " (rebuild)" } else { "" });
    let report = pipeline.build(&engine, &TracingBuildLogger, rebuild).await?;
    ctrl_c.abort();

    println!(
        "Build {}: {} build file(s), {} copy file(s) in {}",
        report.state,
        report.build_files,
        report.copy_files,
        format_duration(report.duration)
    );
    if let Some(summary) = &report.summary {
        println!("  {}", summary);
    }

    match report.state {
        BuildState::Finished => Ok(()),
        state => Err(anyhow!(
            "Build {}{}",
            state,
            report
                .error
                .map(|e| format!(": {}", e))
                .unwrap_or_default()
        )),
    }
}
