//! Result types for per-asset optimization and whole-batch reporting.

use serde::Serialize;

use crate::core::WebpAsset;

/// Result of one optimization attempt.
///
/// Produced once per encoded asset and used only for reporting and
/// aggregation, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    /// Path to the original input file
    pub source_path: String,
    /// Path to the materialized output file
    pub output_path: String,
    /// Original file size in bytes
    pub original_size: u64,
    /// Optimized file size in bytes (0 when the encode failed)
    pub optimized_size: u64,
    /// Whether the optimization succeeded
    pub success: bool,
    /// Error message if optimization failed
    pub error: Option<String>,
    /// Bytes saved (negative if the file grew)
    #[serde(rename = "savedBytes")]
    pub saved_bytes: i64,
    /// Savings as a percentage of the original size
    #[serde(rename = "savingsPercent")]
    pub savings_percent: f64,
}

impl OptimizationResult {
    /// Successful encode: derives savings from the two sizes.
    pub fn completed(asset: &WebpAsset, output_path: String, optimized_size: u64) -> Self {
        let original_size = asset.size;
        let saved_bytes = original_size as i64 - optimized_size as i64;
        let savings_percent = if original_size > 0 {
            saved_bytes as f64 / original_size as f64 * 100.0
        } else {
            0.0
        };
        Self {
            source_path: asset.source_path.to_string_lossy().to_string(),
            output_path,
            original_size,
            optimized_size,
            success: true,
            error: None,
            saved_bytes,
            savings_percent,
        }
    }

    /// Failed encode: the original was copied verbatim, nothing was saved.
    pub fn failed(asset: &WebpAsset, output_path: String, error: String) -> Self {
        Self {
            source_path: asset.source_path.to_string_lossy().to_string(),
            output_path,
            original_size: asset.size,
            optimized_size: 0,
            success: false,
            error: Some(error),
            saved_bytes: 0,
            savings_percent: 0.0,
        }
    }
}

/// Aggregate counters for one batch run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    /// Assets handed to the scheduler
    pub total: usize,
    /// Assets that terminated in Done, PassThrough or Fallback
    pub processed: usize,
    /// Assets that were actually re-encoded
    pub optimized: usize,
    /// Assets skipped by the max-size pre-check (no output written)
    pub skipped: usize,
    /// Assets that fell back to a verbatim copy
    pub fallbacks: usize,
    /// Net bytes saved across all successful encodes
    pub saved_bytes: i64,
}

impl BatchSummary {
    pub fn new(total: usize) -> Self {
        Self { total, ..Self::default() }
    }
}
