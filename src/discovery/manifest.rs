//! Manifest-resolution discovery strategy.
//!
//! The host build tool hands over a mapping from emitted output file name to
//! an asset record. Resolution of each entry's true on-disk source follows
//! one deterministic precedence (documented on [`resolve_source`]) instead
//! of the several ad hoc heuristics this replaces.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::WebpAsset;

/// One emitted asset as reported by the build tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Declared source reference, when the build tool knows one
    #[serde(default)]
    pub source: Option<String>,
    /// Embedded byte payload for entries the build tool generated itself.
    /// By the time this pipeline runs the build has materialized these under
    /// the output root, so resolution falls back to the emitted location;
    /// the payload still supplies the declared size when none is given.
    #[serde(default)]
    pub bytes: Option<Vec<u8>>,
    /// Declared size in bytes (0 = derive from the embedded payload)
    pub size: u64,
    /// Animation flag, when the build tool already resolved it
    #[serde(default)]
    pub animated: Option<bool>,
}

impl ManifestEntry {
    fn declared_size(&self) -> u64 {
        if self.size > 0 {
            return self.size;
        }
        self.bytes.as_ref().map(|b| b.len() as u64).unwrap_or(0)
    }
}

/// Mapping from emitted file name to its record. A `BTreeMap` keeps
/// iteration (and therefore wave membership) deterministic.
pub type AssetManifest = BTreeMap<String, ManifestEntry>;

/// Resolves every `.webp` manifest entry into an asset descriptor.
///
/// Non-WebP entries are ignored. Descriptors come out in manifest key order.
pub fn resolve_entries(manifest: &AssetManifest, out_dir: &Path) -> Vec<WebpAsset> {
    manifest
        .iter()
        .filter(|(file_name, _)| file_name.to_ascii_lowercase().ends_with(".webp"))
        .map(|(file_name, entry)| {
            let source_path = resolve_source(file_name, entry, out_dir);
            debug!("Manifest entry {} resolved to {}", file_name, source_path.display());
            WebpAsset::from_manifest(
                file_name.clone(),
                source_path,
                entry.declared_size(),
                entry.animated,
            )
        })
        .collect()
}

/// Maps an emitted file name back to its on-disk source path.
///
/// Precedence, first match wins:
/// 1. names under the `assets/` sub-path resolve by base name into
///    `<out_dir>/assets/` — that is where bundlers materialize hashed assets;
/// 2. declared sources starting with a relative marker (`./` or `../`)
///    resolve against the process working directory;
/// 3. any other declared source is used as a literal path;
/// 4. entries with no source at all fall back to their already-emitted
///    location under `out_dir`.
fn resolve_source(file_name: &str, entry: &ManifestEntry, out_dir: &Path) -> PathBuf {
    if let Some(rest) = file_name.strip_prefix("assets/") {
        let base_name = Path::new(rest)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(rest));
        return out_dir.join("assets").join(base_name);
    }

    match &entry.source {
        Some(source) if source.starts_with("./") || source.starts_with("../") => {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(source),
                Err(_) => PathBuf::from(source),
            }
        }
        Some(source) => PathBuf::from(source),
        None => out_dir.join(file_name),
    }
}
