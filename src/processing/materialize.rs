//! Result materialization: encoder output lands at a temporary location and
//! is promoted to the final path only once it is complete, so other build
//! steps can never read a partial file.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::utils::{OptimizerError, OptimizerResult};

/// Removes the temporary file on every exit path, including errors.
struct TempGuard {
    path: PathBuf,
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove temp file {}: {e}", self.path.display());
            }
        }
    }
}

/// Default working location: a `.tmp` sibling of the final destination.
pub fn default_temp_path(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    name.push_str(".tmp");
    final_path.with_file_name(name)
}

/// Writes `encoded` to `temp_path`, then promotes it to `final_path`.
///
/// The temp file is removed on both the success and error paths.
pub async fn commit(encoded: &[u8], temp_path: &Path, final_path: &Path) -> OptimizerResult<()> {
    if let Some(parent) = temp_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let _guard = TempGuard { path: temp_path.to_path_buf() };
    tokio::fs::write(temp_path, encoded).await?;
    promote(temp_path, final_path, encoded.len() as u64).await
}

/// Verifies the completed temp file and copies it to `final_path`.
///
/// A temp file that is missing or shorter than `expected_len` means the
/// encoder output never fully reached disk; promoting it would publish a
/// truncated asset, so that is an error instead.
async fn promote(temp_path: &Path, final_path: &Path, expected_len: u64) -> OptimizerResult<()> {
    match tokio::fs::metadata(temp_path).await {
        Ok(meta) if meta.len() == expected_len => {}
        Ok(meta) => {
            return Err(OptimizerError::materialize(format!(
                "Encoder output at {} is {} bytes, expected {}",
                temp_path.display(),
                meta.len(),
                expected_len
            )));
        }
        Err(_) => {
            return Err(OptimizerError::materialize(format!(
                "Encoder output missing at {}",
                temp_path.display()
            )));
        }
    }

    if let Some(parent) = final_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(temp_path, final_path).await?;
    debug!("Materialized {}", final_path.display());
    Ok(())
}

/// Copies the original, unmodified source bytes to the final destination.
/// Correctness over compression: the build never loses an asset.
///
/// Manifest resolution can map a source to its own emitted location; copying
/// a file onto itself truncates it before the read, so an aliased pair is
/// already in its final state and treated as a completed copy.
pub async fn fallback_copy(source_path: &Path, final_path: &Path) -> OptimizerResult<()> {
    if same_file(source_path, final_path).await {
        debug!("Source already at destination: {}", final_path.display());
        return Ok(());
    }
    if let Some(parent) = final_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::copy(source_path, final_path).await?;
    Ok(())
}

async fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
