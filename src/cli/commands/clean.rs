//! Clean command implementation

use crate::cli::utils;
use crate::engine;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use contentpipe_cache::CacheManager;
use tracing::info;

pub fn command() -> Command {
    Command::new("clean")
        .about("Remove build outputs and the build cache")
        .arg(utils::manifest_arg())
        .arg(
            clap::Arg::new("max-age")
                .short('a')
                .long("max-age")
                .help("Only drop cache entries older than this many hours, keeping outputs")
                .value_name("HOURS"),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let pipeline = utils::open_pipeline(matches)?;
    let settings = pipeline.settings();
    let intermediate_dir = pipeline.base_dir().join(&settings.intermediate_dir);
    let output_dir = pipeline.base_dir().join(&settings.output_dir);

    if let Some(max_age) = matches.get_one::<String>("max-age") {
        let max_age: u64 = max_age
            .parse()
            .map_err(|_| anyhow!("Invalid max-age value"))?;

        info!("Dropping cache entries older than {} hours", max_age);
        let removed = CacheManager::in_directory(&intermediate_dir).cleanup_stale_entries(max_age)?;
        println!("Removed {} stale cache entries", removed);
        return Ok(());
    }

    info!("Cleaning {:?} and {:?}", intermediate_dir, output_dir);
    engine::clean(&intermediate_dir, &output_dir).await?;

    println!("Clean completed!");
    println!("Build cache: {:?}", CacheManager::in_directory(&intermediate_dir).path());
    println!("Output directory: {:?}", output_dir);
    Ok(())
}
