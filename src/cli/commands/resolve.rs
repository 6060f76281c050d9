//! Resolve command implementation

use crate::cli::utils;
use crate::utils::display_path;
use anyhow::Result;
use clap::{ArgMatches, Command};
use serde_json::json;
use tracing::{info, warn};

pub fn command() -> Command {
    Command::new("resolve")
        .about("Expand the manifest into the files a build would process")
        .arg(utils::manifest_arg())
        .arg(
            clap::Arg::new("json")
                .long("json")
                .help("Print the resolved files as JSON")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let pipeline = utils::open_pipeline(matches)?;
    let resolved = pipeline.resolve()?;

    info!(
        "Resolved {} build file(s) and {} copy file(s)",
        resolved.build_files.len(),
        resolved.copy_files.len()
    );
    for error in &resolved.errors {
        warn!("{}", error);
    }

    if matches.get_flag("json") {
        let build: Vec<_> = resolved
            .build_files
            .iter()
            .map(|file| {
                json!({
                    "path": display_path(file),
                    "binding": resolved.bindings.get(file),
                    "dependencies": resolved
                        .dependencies
                        .get(file)
                        .map(|deps| deps.iter().map(|d| display_path(d)).collect::<Vec<_>>())
                        .unwrap_or_default(),
                })
            })
            .collect();
        let copy: Vec<_> = resolved.copy_files.iter().map(|f| display_path(f)).collect();
        let errors: Vec<_> = resolved.errors.iter().map(|e| e.to_string()).collect();

        let output = json!({ "build": build, "copy": copy, "errors": errors });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Build files ({}):", resolved.build_files.len());
    for file in &resolved.build_files {
        match resolved.bindings.get(file) {
            Some(binding) => println!(
                "  {} [{} -> {}]",
                display_path(file),
                binding.importer,
                binding.processor
            ),
            None => println!("  {}", display_path(file)),
        }
    }

    println!("Copy files ({}):", resolved.copy_files.len());
    for file in &resolved.copy_files {
        println!("  {}", display_path(file));
    }

    if !resolved.errors.is_empty() {
        println!("Skipped entries ({}):", resolved.errors.len());
        for error in &resolved.errors {
            println!("  {}", error);
        }
    }

    Ok(())
}
