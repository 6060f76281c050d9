//! CLI command implementations

use anyhow::Result;
use clap::{ArgMatches, Command};

pub mod commands;

/// Main CLI application
pub struct CliApp;

impl CliApp {
    /// Create the CLI application
    pub fn app() -> Command {
        Command::new("contentpipe")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Resolve asset manifests against content plugins and build them")
            .subcommand_negates_reqs(true)
            .subcommand(commands::init::command())
            .subcommand(commands::validate::command())
            .subcommand(commands::plugins::command())
            .subcommand(commands::resolve::command())
            .subcommand(commands::build::command())
            .subcommand(commands::clean::command())
            .subcommand(commands::content::command())
    }

    /// Run the CLI application
    pub async fn run(matches: &ArgMatches) -> Result<()> {
        match matches.subcommand() {
            Some(("init", sub_matches)) => commands::init::run(sub_matches).await,
            Some(("validate", sub_matches)) => commands::validate::run(sub_matches).await,
            Some(("plugins", sub_matches)) => commands::plugins::run(sub_matches).await,
            Some(("resolve", sub_matches)) => commands::resolve::run(sub_matches).await,
            Some(("build", sub_matches)) => commands::build::run(sub_matches).await,
            Some(("clean", sub_matches)) => commands::clean::run(sub_matches).await,
            Some(("content", sub_matches)) => commands::content::run(sub_matches).await,
            _ => {
                // No subcommand provided, show help
                let _ = Self::app().print_help();
                Ok(())
            }
        }
    }
}

/// Common CLI utilities
pub mod utils {
    use anyhow::{anyhow, Context, Result};
    use clap::{Arg, ArgMatches};
    use std::path::PathBuf;
    use std::sync::Arc;

    use crate::{ContentPipeline, ManifestModuleLoader};

    /// Manifest file names searched in the working directory
    pub const DEFAULT_MANIFESTS: [&str; 4] =
        ["Content.yaml", "Content.yml", "content.yaml", "Content.json"];

    /// The `--manifest` argument shared by every command
    pub fn manifest_arg() -> Arg {
        Arg::new("manifest")
            .short('m')
            .long("manifest")
            .help("Manifest file path")
            .value_name("FILE")
    }

    /// Get manifest file path from arguments or use default
    pub fn get_manifest_path(matches: &ArgMatches) -> Result<PathBuf> {
        if let Some(manifest_path) = matches.get_one::<String>("manifest") {
            return Ok(PathBuf::from(manifest_path));
        }

        DEFAULT_MANIFESTS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
            .ok_or_else(|| {
                anyhow!("No manifest found. Use --manifest to specify a file or create one with 'contentpipe init'")
            })
    }

    /// Open the manifest named by the arguments
    pub fn open_pipeline(matches: &ArgMatches) -> Result<ContentPipeline> {
        let manifest_path = get_manifest_path(matches)?;
        let pipeline = ContentPipeline::open(&manifest_path, Arc::new(ManifestModuleLoader))
            .with_context(|| format!("Failed to open manifest {:?}", manifest_path))?;
        Ok(pipeline)
    }

    /// Value of an argument clap guarantees to be present
    pub fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
        matches
            .get_one::<String>(name)
            .ok_or_else(|| anyhow!("Missing argument {}", name))
    }
}
