//! Validate command implementation

use crate::cli::utils;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use tracing::info;

pub fn command() -> Command {
    Command::new("validate")
        .about("Validate a content manifest against the discovered plugins")
        .arg(utils::manifest_arg())
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    info!("Validating content manifest");

    let pipeline = utils::open_pipeline(matches)?;
    let settings = pipeline.settings();
    let mut problems = 0;

    println!("Manifest: {:?}", pipeline.manifest_path().unwrap_or(pipeline.base_dir()));
    println!("Platform: {} ({})", settings.platform, settings.graphics_profile);
    println!("Content entries: {}", pipeline.items().len());
    println!(
        "Importers: {}, processors: {}",
        pipeline.catalog().importers().len() - 1,
        pipeline.catalog().processors().len() - 1
    );

    for failure in pipeline.registry().failures() {
        println!("  ✗ {}", failure);
        problems += 1;
    }

    for mismatch in pipeline.binding_mismatches() {
        println!(
            "  ✗ {}: {} {:?} is not available",
            mismatch.category, mismatch.kind, mismatch.name
        );
        problems += 1;
    }

    match pipeline.resolve() {
        Ok(resolved) => {
            for error in &resolved.errors {
                println!("  ✗ {}", error);
                problems += 1;
            }
            println!(
                "Resolved {} build file(s) and {} copy file(s)",
                resolved.build_files.len(),
                resolved.copy_files.len()
            );
        }
        Err(e) => {
            println!("  ✗ {}", e);
            problems += 1;
        }
    }

    if problems > 0 {
        return Err(anyhow!("{} problem(s) found", problems));
    }

    println!("Manifest is valid!");
    Ok(())
}
