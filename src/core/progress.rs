//! Wave progress reporting for the host callback.

use serde::Serialize;

/// Progress snapshot emitted after every wave completes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    /// Assets that have finished, regardless of outcome
    pub completed_files: usize,
    /// Total assets in the batch
    pub total_files: usize,
    /// Progress percentage (0-100)
    pub progress_percentage: usize,
}

impl BatchProgress {
    pub fn new(completed_files: usize, total_files: usize) -> Self {
        let progress_percentage = if total_files > 0 {
            (completed_files * 100) / total_files
        } else {
            0
        };
        Self {
            completed_files,
            total_files,
            progress_percentage,
        }
    }
}
