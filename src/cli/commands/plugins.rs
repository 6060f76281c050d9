//! Plugin catalog CLI commands

use crate::cli::utils;
use crate::plugin::{Catalog, ImporterDescriptor, ManifestModuleLoader, PluginRegistry, ProcessorDescriptor};
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Args};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Args)]
pub struct ListArgs {
    /// Only list importers
    #[arg(long)]
    importers: bool,

    /// Only list processors
    #[arg(long)]
    processors: bool,

    /// Print the catalog as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Type or display name
    name: String,
}

/// Catalog as printed by `plugins list --json`
#[derive(Serialize)]
struct CatalogListing<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    importers: Option<Vec<&'a ImporterDescriptor>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    processors: Option<Vec<&'a ProcessorDescriptor>>,
}

/// Create the plugins command
pub fn command() -> clap::Command {
    clap::Command::new("plugins")
        .about("Inspect the importer and processor catalog")
        .arg(utils::manifest_arg().global(true))
        .subcommand(
            clap::Command::new("list")
                .about("List discovered importers and processors")
                .arg(clap::Arg::new("importers").long("importers").help("Only list importers").action(clap::ArgAction::SetTrue))
                .arg(clap::Arg::new("processors").long("processors").help("Only list processors").action(clap::ArgAction::SetTrue))
                .arg(clap::Arg::new("json").long("json").help("Print the catalog as JSON").action(clap::ArgAction::SetTrue)),
        )
        .subcommand(
            clap::Command::new("info")
                .about("Show an importer or processor")
                .arg(clap::arg!(<NAME> "Type or display name")),
        )
}

/// Run plugins command
pub async fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("list", sub_matches)) => {
            let args = ListArgs {
                importers: sub_matches.get_flag("importers"),
                processors: sub_matches.get_flag("processors"),
                json: sub_matches.get_flag("json"),
            };
            run_list(&load_catalog(sub_matches)?, args)
        }
        Some(("info", sub_matches)) => {
            let args = InfoArgs {
                name: utils::required(sub_matches, "NAME")?.clone(),
            };
            run_info(&load_catalog(sub_matches)?, args)
        }
        _ => {
            let _ = command().print_help();
            Ok(())
        }
    }
}

/// Catalog of the manifest's references, or of the built-in library when no
/// manifest is around
fn load_catalog(matches: &ArgMatches) -> Result<Catalog> {
    if utils::get_manifest_path(matches).is_ok() {
        let pipeline = utils::open_pipeline(matches)?;
        return Ok(pipeline.catalog().clone());
    }

    info!("No manifest found, listing the built-in library only");
    let mut registry = PluginRegistry::new(Arc::new(ManifestModuleLoader));
    if let Err(e) = registry.load(&[], Path::new(".")) {
        warn!("{}", e);
    }
    Ok(registry.catalog().clone())
}

fn run_list(catalog: &Catalog, args: ListArgs) -> Result<()> {
    // Neither flag means both
    let show_importers = args.importers || !args.processors;
    let show_processors = args.processors || !args.importers;

    let importers: Vec<_> = catalog.importers().iter().skip(1).map(Arc::as_ref).collect();
    let processors: Vec<_> = catalog.processors().iter().skip(1).map(Arc::as_ref).collect();

    if args.json {
        let listing = CatalogListing {
            importers: show_importers.then_some(importers),
            processors: show_processors.then_some(processors),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if show_importers {
        println!("Importers ({}):", importers.len());
        println!("{:<30} {:<40} {:<30} EXTENSIONS", "TYPE", "NAME", "DEFAULT PROCESSOR");
        println!("{}", "-".repeat(115));
        for importer in &importers {
            let extensions = if importer.any_extension {
                "*".to_string()
            } else {
                importer.file_extensions.join(" ")
            };
            println!(
                "{:<30} {:<40} {:<30} {}",
                importer.type_name, importer.display_name, importer.default_processor, extensions
            );
        }
    }

    if show_importers && show_processors {
        println!();
    }

    if show_processors {
        println!("Processors ({}):", processors.len());
        println!("{:<30} {:<40} PROPERTIES", "TYPE", "NAME");
        println!("{}", "-".repeat(85));
        for processor in &processors {
            println!(
                "{:<30} {:<40} {}",
                processor.type_name,
                processor.display_name,
                processor.browsable_properties().count()
            );
        }
    }

    Ok(())
}

fn run_info(catalog: &Catalog, args: InfoArgs) -> Result<()> {
    let importer = catalog
        .importers()
        .iter()
        .skip(1)
        .find(|i| i.type_name == args.name || i.display_name == args.name);
    let processor = catalog.processor(&args.name).filter(|p| !p.is_none());
    if importer.is_none() && processor.is_none() {
        return Err(anyhow!("No importer or processor named {:?}", args.name));
    }

    if let Some(importer) = importer {
        println!("Importer: {}", importer.display_name);
        println!("  Type: {}", importer.type_name);
        println!("  Default processor: {}", importer.default_processor);
        if importer.any_extension {
            println!("  Extensions: any");
        } else {
            println!("  Extensions: {}", importer.file_extensions.join(", "));
        }
        if !importer.output_type.is_empty() {
            println!("  Output type: {}", importer.output_type);
        }
    }

    if let Some(processor) = processor {
        println!("Processor: {}", processor.display_name);
        println!("  Type: {}", processor.type_name);
        if !processor.input_type.is_empty() {
            println!("  Input type: {}", processor.input_type);
        }
        println!("  Properties:");
        for property in processor.browsable_properties() {
            println!(
                "    {} ({}) = {}",
                property.name, property.kind, property.default_value
            );
        }
    }

    Ok(())
}
