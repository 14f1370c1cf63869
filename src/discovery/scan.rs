//! Filesystem-scan discovery strategy.

use std::path::Path;

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::core::WebpAsset;

/// Directories never descended into: version control, dependency caches and
/// prior build output.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "coverage",
    ".vite",
    ".next",
    "build",
    "out",
];

/// Lazily walks `root` and yields a descriptor for every `.webp` file
/// (extension matched case-insensitively), in discovery order.
///
/// Directories named in `excluded` are pruned before descent. A missing or
/// unreadable root yields nothing; discovery problems are logged, never
/// fatal (the run simply sees zero assets from this source).
pub fn scan_directory<'a>(
    root: &Path,
    excluded: &'a [&str],
) -> impl Iterator<Item = WebpAsset> + 'a {
    if !root.is_dir() {
        warn!("Scan root not found or not a directory: {}", root.display());
    }

    WalkDir::new(root)
        .into_iter()
        .filter_entry(move |entry| !is_excluded_dir(entry, excluded))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("Skipping unreadable entry during scan: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && has_webp_extension(entry))
        .map(|entry| {
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            WebpAsset::from_scan(entry.into_path(), size)
        })
}

fn is_excluded_dir(entry: &DirEntry, excluded: &[&str]) -> bool {
    // depth 0 is the scan root itself; never prune it
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excluded.contains(&name))
}

fn has_webp_extension(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.to_ascii_lowercase().ends_with(".webp"))
}
