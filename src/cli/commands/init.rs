//! Init command implementation

use crate::cli::utils;
use crate::config::{BuildAction, ContentEntry, TargetPlatform};
use crate::Manifest;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

pub fn command() -> Command {
    Command::new("init")
        .about("Create a new content manifest")
        .arg(
            clap::Arg::new("output")
                .short('o')
                .long("output")
                .help("Output file path")
                .value_name("FILE")
                .default_value("Content.yaml"),
        )
        .arg(
            clap::Arg::new("root")
                .long("root")
                .help("Directory content paths are relative to")
                .value_name("DIR"),
        )
        .arg(
            clap::Arg::new("platform")
                .short('p')
                .long("platform")
                .help("Target platform")
                .value_name("PLATFORM"),
        )
        .arg(
            clap::Arg::new("example")
                .short('e')
                .long("example")
                .help("Create example content entries")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("force")
                .short('f')
                .long("force")
                .help("Overwrite an existing manifest")
                .action(clap::ArgAction::SetTrue),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let output_path = PathBuf::from(utils::required(matches, "output")?);
    if output_path.exists() && !matches.get_flag("force") {
        return Err(anyhow!(
            "{:?} already exists, use --force to overwrite it",
            output_path
        ));
    }

    info!("Initializing manifest: {:?}", output_path);

    let mut manifest = Manifest::default();
    if let Some(root) = matches.get_one::<String>("root") {
        manifest.settings.root = root.clone();
    }
    if let Some(platform) = matches.get_one::<String>("platform") {
        manifest.settings.platform = platform
            .parse::<TargetPlatform>()
            .map_err(|e| anyhow!(e))?;
    }

    let example = matches.get_flag("example");
    if example {
        add_example_content(&mut manifest)?;
    }

    manifest.save_to_file(&output_path)?;

    info!("Manifest created: {:?}", output_path);

    if example {
        println!("Example manifest created with sample content entries.");
        println!("Edit the file or use 'contentpipe content' to customize it.");
    } else {
        println!("Empty manifest created.");
        println!("Add content with 'contentpipe content add' to get started.");
    }

    Ok(())
}

fn add_example_content(manifest: &mut Manifest) -> Result<()> {
    manifest.content.push(
        ContentEntry::new("textures", "images/*.png")
            .with_importer("TextureImporter")
            .with_processor("TextureProcessor"),
    )?;
    manifest.content.push(
        ContentEntry::new("sounds", "audio/*.wav")
            .with_importer("WavImporter")
            .with_processor("SoundEffectProcessor"),
    )?;
    manifest
        .content
        .push(ContentEntry::new("data", "data/*.txt").with_action(BuildAction::Copy))?;
    Ok(())
}
