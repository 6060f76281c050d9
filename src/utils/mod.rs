//! Path helpers shared by content items and resolution

use std::path::Path;

use crate::error::PathEscapeError;

/// Prefix that disables root-prefixing of a content path
pub const ROOT_ESCAPE: char = '$';

/// Normalize separators to `/` and strip a single leading slash.
///
/// Build engines reject absolute-looking relative paths, so `/images/a.png`
/// becomes `images/a.png`. Only one slash is removed.
pub fn normalize_content_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    match normalized.strip_prefix('/') {
        Some(stripped) => stripped.to_string(),
        None => normalized,
    }
}

/// Reject any path containing a `../` segment
pub fn ensure_no_escape(path: &str) -> Result<(), PathEscapeError> {
    let normalized = path.replace('\\', "/");
    let escapes = normalized.contains("../") || normalized == ".." || normalized.ends_with("/..");
    if escapes {
        return Err(PathEscapeError {
            path: path.to_string(),
        });
    }
    Ok(())
}

/// Strip a leading `./` from the manifest root
pub fn normalize_root(root: &str) -> String {
    let root = root.replace('\\', "/");
    match root.strip_prefix("./") {
        Some(stripped) => stripped.to_string(),
        None => root,
    }
}

/// Path to search for an entry: `root + path`, or `path` without its `$`
/// when the entry opts out of root-prefixing
pub fn effective_search_path(root: &str, path: &str) -> String {
    if let Some(external) = path.strip_prefix(ROOT_ESCAPE) {
        return external.to_string();
    }

    let root = normalize_root(root);
    if root.is_empty() || root == "." {
        path.to_string()
    } else if root.ends_with('/') {
        format!("{root}{path}")
    } else {
        format!("{root}/{path}")
    }
}

/// Split a search path into `(directory, file pattern)`.
///
/// A path without a separator searches the current directory.
pub fn split_search_path(search_path: &str) -> (String, String) {
    match search_path.rfind('/') {
        Some(0) => ("/".to_string(), search_path[1..].to_string()),
        Some(index) => (
            search_path[..index].to_string(),
            search_path[index + 1..].to_string(),
        ),
        None => (".".to_string(), search_path.to_string()),
    }
}

/// Extension of the last path segment including the leading dot, or an
/// empty string. Works on glob patterns such as `images/*.png`.
pub fn extension_of(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// Render a path with `/` separators
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Format duration as human readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs > 0 {
        format!("{secs}.{millis:03}s")
    } else {
        format!("{millis}ms")
    }
}
