//! Project root detection and `.res` source enumeration.
use std::path::{Component, Path, PathBuf};

use crate::error::{GenError, Result};

pub const PROJECT_MANIFEST: &str = "edgedb.toml";

/// Default output directory, relative to the project root.
pub const GENERATED_DIR: &str = "__generated__";

/// Nearest ancestor of `start` (inclusive) holding an `edgedb.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(PROJECT_MANIFEST).is_file())
        .map(Path::to_path_buf)
}

/// Every `.res` file below `root`, sorted, minus dependency, migration and
/// generated-output directories. Unreadable entries are logged and skipped.
pub fn find_sources(root: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Path::new(&glob::Pattern::escape(&root.to_string_lossy()))
        .join("**")
        .join("*.res");
    let pattern = pattern.to_string_lossy();
    let entries = glob::glob(&pattern).map_err(|e| GenError::io(
        root,
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
    ))?;

    let mut out = entries
        .filter_map(|entry| {
            let entry = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                (path, std::io::Error::from(e))
            });
            keep_entry(root, out_dir, entry)
        })
        .collect::<Vec<_>>();
    out.sort();
    Ok(out)
}

fn keep_entry(
    root: &Path,
    out_dir: &Path,
    entry: std::result::Result<PathBuf, (PathBuf, std::io::Error)>,
) -> Option<PathBuf> {
    let (path, error) = match entry {
        Ok(path) => (path, None),
        Err((path, error)) => (path, Some(error)),
    };
    let relative = path.strip_prefix(root).unwrap_or(&path);
    if is_skipped(relative) || path.starts_with(out_dir) {
        tracing::trace!(path = %path.display(), "skipping");
        return None;
    }
    match error {
        Some(error) => {
            tracing::warn!(path = %path.display(), %error, "unreadable entry, skipping");
            None
        }
        None => Some(path),
    }
}

fn is_skipped(relative: &Path) -> bool {
    let parts = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>();
    parts.contains(&"node_modules")
        || parts.contains(&GENERATED_DIR)
        || parts.windows(2).any(|w| w == ["dbschema", "migrations"])
}
