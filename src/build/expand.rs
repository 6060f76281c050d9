//! File pattern expansion

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::ExpansionError;
use crate::utils::split_search_path;

/// Expand a search path such as `Assets/images/*.png` into matching files.
///
/// Only the file name part is a pattern. Relative directories resolve
/// against `base_dir`. Results are sorted by path.
pub fn expand(
    base_dir: &Path,
    search_path: &str,
    recursive: bool,
) -> Result<Vec<PathBuf>, ExpansionError> {
    let (directory, pattern) = split_search_path(search_path);
    let error = |reason: String| ExpansionError {
        directory: PathBuf::from(&directory),
        pattern: pattern.clone(),
        reason,
    };

    let search_dir = base_dir.join(&directory);
    if !search_dir.is_dir() {
        return Err(error("directory not found".to_string()));
    }

    let matcher = glob::Pattern::new(&pattern).map_err(|e| error(e.to_string()))?;
    let max_depth = if recursive { usize::MAX } else { 1 };

    let mut files = Vec::new();
    for entry in WalkDir::new(&search_dir).min_depth(1).max_depth(max_depth) {
        let entry = entry.map_err(|e| error(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if matcher.matches(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}
