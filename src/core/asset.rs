//! Asset descriptor shared by both discovery strategies.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One candidate WebP file.
///
/// Created once per discovery pass and consumed exactly once by the decision
/// policy; never reused across runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebpAsset {
    /// Path to the source file on disk
    pub source_path: PathBuf,
    /// Logical file name as emitted or discovered
    pub file_name: String,
    /// Declared size in bytes
    pub size: u64,
    /// Output path relative to the final output root
    pub output_path: PathBuf,
    /// Optional working location for encoder output
    #[serde(default)]
    pub temp_path: Option<PathBuf>,
    /// None until animation detection resolves it during processing
    #[serde(default)]
    pub animated: Option<bool>,
}

impl WebpAsset {
    /// Builds a descriptor for a file found by the filesystem scan.
    /// The output path mirrors the file name at the output root.
    pub fn from_scan(source_path: PathBuf, size: u64) -> Self {
        let file_name = source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let output_path = PathBuf::from(&file_name);
        Self {
            source_path,
            file_name,
            size,
            output_path,
            temp_path: None,
            animated: None,
        }
    }

    /// Builds a descriptor for a manifest entry whose source path has
    /// already been resolved. The emitted name doubles as the output path so
    /// the optimized file lands exactly where the build tool put it.
    pub fn from_manifest(
        file_name: impl Into<String>,
        source_path: PathBuf,
        size: u64,
        animated: Option<bool>,
    ) -> Self {
        let file_name = file_name.into();
        let output_path = PathBuf::from(&file_name);
        Self {
            source_path,
            file_name,
            size,
            output_path,
            temp_path: None,
            animated,
        }
    }

    /// Final destination under `out_dir`.
    pub fn destination(&self, out_dir: &Path) -> PathBuf {
        out_dir.join(&self.output_path)
    }
}
