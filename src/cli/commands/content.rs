//! Content entry editing commands

use crate::cli::utils;
use crate::config::{BuildAction, ContentEntry, MoveDirection};
use crate::ContentPipeline;
use anyhow::{anyhow, Result};
use clap::{ArgMatches, Command};
use tracing::info;

fn category_arg() -> clap::Arg {
    clap::arg!(<CATEGORY> "Content category")
}

pub fn command() -> Command {
    Command::new("content")
        .about("List and edit content entries")
        .arg(utils::manifest_arg().global(true))
        .subcommand(Command::new("list").about("List content entries and their bindings"))
        .subcommand(
            Command::new("add")
                .about("Add a content entry")
                .arg(category_arg())
                .arg(clap::arg!(<PATH> "File or glob pattern, relative to the content root"))
                .arg(clap::arg!(--importer <IMPORTER> "Importer type name"))
                .arg(clap::arg!(--processor <PROCESSOR> "Processor type or display name"))
                .arg(
                    clap::Arg::new("copy")
                        .long("copy")
                        .help("Copy matched files instead of building them")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    clap::Arg::new("recursive")
                        .short('r')
                        .long("recursive")
                        .help("Search subdirectories")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    clap::Arg::new("dependency")
                        .long("dependency")
                        .help("Extra file the entry depends on")
                        .value_name("PATH")
                        .action(clap::ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a content entry")
                .arg(category_arg()),
        )
        .subcommand(
            Command::new("rename")
                .about("Rename a content entry")
                .arg(category_arg())
                .arg(clap::arg!(<NEW_NAME> "New category")),
        )
        .subcommand(
            Command::new("move")
                .about("Move a content entry one position up or down")
                .arg(category_arg())
                .arg(clap::arg!(<DIRECTION> "up or down")),
        )
        .subcommand(
            Command::new("set-path")
                .about("Change the path of a content entry")
                .arg(category_arg())
                .arg(clap::arg!(<PATH> "File or glob pattern")),
        )
        .subcommand(
            Command::new("set-param")
                .about("Set a processor parameter")
                .arg(category_arg())
                .arg(clap::arg!(<KEY> "Property name"))
                .arg(clap::arg!(<VALUE> "Property value")),
        )
        .subcommand(
            Command::new("set-importer")
                .about("Bind a content entry to an importer")
                .arg(category_arg())
                .arg(clap::arg!(<IMPORTER> "Importer type name")),
        )
        .subcommand(
            Command::new("set-processor")
                .about("Bind a content entry to a processor")
                .arg(category_arg())
                .arg(clap::arg!(<PROCESSOR> "Processor type or display name")),
        )
        .subcommand(
            Command::new("set-action")
                .about("Choose whether matched files are built or copied")
                .arg(category_arg())
                .arg(clap::arg!(<ACTION> "build or copy")),
        )
        .subcommand(
            Command::new("set-recursive")
                .about("Toggle searching subdirectories")
                .arg(category_arg())
                .arg(clap::arg!(<ENABLED> "true or false")),
        )
}

pub async fn run(matches: &ArgMatches) -> Result<()> {
    let Some((name, sub_matches)) = matches.subcommand() else {
        let _ = command().print_help();
        return Ok(());
    };

    let mut pipeline = utils::open_pipeline(sub_matches)?;
    if name == "list" {
        list(&pipeline);
        return Ok(());
    }

    let category = utils::required(sub_matches, "CATEGORY")?.as_str();
    match name {
        "add" => {
            let mut entry = ContentEntry::new(category, utils::required(sub_matches, "PATH")?)
                .with_recursive(sub_matches.get_flag("recursive"));
            if let Some(importer) = sub_matches.get_one::<String>("importer") {
                entry = entry.with_importer(importer);
            }
            if let Some(processor) = sub_matches.get_one::<String>("processor") {
                entry = entry.with_processor(processor);
            }
            if sub_matches.get_flag("copy") {
                entry = entry.with_action(BuildAction::Copy);
            }
            if let Some(dependencies) = sub_matches.get_many::<String>("dependency") {
                entry = entry.with_dependencies(dependencies.cloned());
            }

            let item = pipeline.add_content(entry)?;
            println!(
                "Added {} [{} -> {}]",
                item.category(),
                item.importer().type_name,
                item.processor().type_name
            );
        }
        "remove" => {
            pipeline.remove_content(category)?;
            println!("Removed {}", category);
        }
        "rename" => {
            let new_name = utils::required(sub_matches, "NEW_NAME")?;
            pipeline.rename_content(category, new_name)?;
            println!("Renamed {} to {}", category, new_name);
        }
        "move" => {
            let direction: MoveDirection = utils::required(sub_matches, "DIRECTION")?
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            let index = pipeline
                .manifest()
                .content
                .position(category)
                .ok_or_else(|| anyhow!("Unknown content category {:?}", category))?;
            match pipeline.reorder(index, direction)? {
                Some(new_index) => println!("Moved {} to position {}", category, new_index + 1),
                None => println!("{} cannot move further", category),
            }
        }
        "set-path" => {
            let path = utils::required(sub_matches, "PATH")?;
            if pipeline.set_path(category, path)? {
                print_binding(&pipeline, category);
            }
        }
        "set-param" => {
            let key = utils::required(sub_matches, "KEY")?;
            let value = utils::required(sub_matches, "VALUE")?;
            if !pipeline.set_parameter(category, key, value)? {
                return Err(anyhow!(
                    "The processor of {} has no parameter {:?}",
                    category,
                    key
                ));
            }
        }
        "set-importer" => {
            pipeline.set_importer(category, utils::required(sub_matches, "IMPORTER")?)?;
            print_binding(&pipeline, category);
        }
        "set-processor" => {
            pipeline.set_processor(category, utils::required(sub_matches, "PROCESSOR")?)?;
            print_binding(&pipeline, category);
        }
        "set-action" => {
            let action: BuildAction = utils::required(sub_matches, "ACTION")?
                .parse()
                .map_err(|e: String| anyhow!(e))?;
            pipeline.set_action(category, action)?;
        }
        "set-recursive" => {
            let enabled: bool = utils::required(sub_matches, "ENABLED")?
                .parse()
                .map_err(|_| anyhow!("Expected true or false"))?;
            pipeline.set_recursive(category, enabled)?;
        }
        other => return Err(anyhow!("Unknown content command {:?}", other)),
    }

    info!("Updated {}", category);
    Ok(())
}

fn print_binding(pipeline: &ContentPipeline, category: &str) {
    if let Some(item) = pipeline.item(category) {
        println!(
            "{}: {} -> {}",
            category,
            item.importer().display_name,
            item.processor().display_name
        );
    }
}

fn list(pipeline: &ContentPipeline) {
    if pipeline.items().is_empty() {
        println!("No content entries.");
        return;
    }

    println!("{:<20} {:<30} {:<6} {:<30} PROCESSOR", "CATEGORY", "PATH", "ACTION", "IMPORTER");
    println!("{}", "-".repeat(120));
    for item in pipeline.items() {
        println!(
            "{:<20} {:<30} {:<6} {:<30} {}",
            item.category(),
            item.path(),
            item.action().to_string(),
            item.importer().type_name,
            item.processor().type_name
        );
        for (name, value) in item.parameters().iter() {
            println!("{:<20}   {} = {}", "", name, value);
        }
    }
}
