//! Resolution of content items into copy and build sets

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::expand::expand;
use crate::config::{BuildAction, ManifestSettings};
use crate::content::ContentItem;
use crate::engine::FileBinding;
use crate::error::{ExpansionError, PathEscapeError};
use crate::utils::{effective_search_path, ensure_no_escape, normalize_content_path};

/// Concrete files produced by resolving every content item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedContent {
    pub copy_files: Vec<PathBuf>,
    pub build_files: Vec<PathBuf>,

    /// Binding of every build file
    pub bindings: BTreeMap<PathBuf, FileBinding>,

    /// Watched files of every build file that has any
    pub dependencies: BTreeMap<PathBuf, Vec<PathBuf>>,

    /// Entries that contributed no files because expansion failed
    pub errors: Vec<ExpansionError>,
}

/// Expand every item, in order, into copy and build files.
///
/// A `../` in any entry path or dependency aborts the whole pass. A failed
/// expansion is logged and only drops that entry's files. A file matched by
/// several entries keeps the first entry's binding.
pub fn resolve(
    items: &[ContentItem],
    settings: &ManifestSettings,
    base_dir: &Path,
) -> Result<ResolvedContent, PathEscapeError> {
    for item in items {
        ensure_no_escape(&normalize_content_path(item.path()))?;
        for dependency in &item.entry().dependencies {
            ensure_no_escape(&normalize_content_path(dependency))?;
        }
    }

    let mut resolved = ResolvedContent::default();
    let mut seen_copy = HashSet::new();
    let mut seen_build = HashSet::new();

    for item in items {
        let entry = item.entry();
        let search_path = effective_search_path(&settings.root, &normalize_content_path(&entry.path));

        let files = match expand(base_dir, &search_path, entry.recursive) {
            Ok(files) => files,
            Err(e) => {
                warn!("Skipping content {:?}: {}", entry.category, e);
                resolved.errors.push(e);
                continue;
            }
        };
        debug!("Content {:?} matched {} files", entry.category, files.len());

        match entry.action {
            BuildAction::Copy => {
                for file in files {
                    if seen_copy.insert(file.clone()) {
                        resolved.copy_files.push(file);
                    } else {
                        debug!("{:?} is already copied by an earlier entry", file);
                    }
                }
            }
            BuildAction::Build => {
                let dependencies = expand_dependencies(item, settings, base_dir, &mut resolved.errors);
                let binding = FileBinding {
                    importer: entry.importer.clone(),
                    processor: entry.processor.clone(),
                    parameters: entry.processor_params.clone(),
                };

                for file in files {
                    if !seen_build.insert(file.clone()) {
                        debug!("{:?} is already built by an earlier entry", file);
                        continue;
                    }

                    let watched: Vec<PathBuf> = dependencies
                        .iter()
                        .filter(|d| **d != file)
                        .cloned()
                        .collect();
                    if !watched.is_empty() {
                        resolved.dependencies.insert(file.clone(), watched);
                    }
                    resolved.bindings.insert(file.clone(), binding.clone());
                    resolved.build_files.push(file);
                }
            }
        }
    }

    Ok(resolved)
}

fn expand_dependencies(
    item: &ContentItem,
    settings: &ManifestSettings,
    base_dir: &Path,
    errors: &mut Vec<ExpansionError>,
) -> Vec<PathBuf> {
    let entry = item.entry();
    let mut files = Vec::new();

    for pattern in &entry.dependencies {
        let search_path = effective_search_path(&settings.root, &normalize_content_path(pattern));
        match expand(base_dir, &search_path, entry.recursive) {
            Ok(matches) => {
                for file in matches {
                    if !files.contains(&file) {
                        files.push(file);
                    }
                }
            }
            Err(e) => {
                warn!("Skipping dependency of {:?}: {}", entry.category, e);
                errors.push(e);
            }
        }
    }

    files
}
