//! Wave-based batch scheduler.
//!
//! The asset list is split into consecutive waves of the configured
//! concurrency; each wave runs as a set of spawned per-asset tasks and the
//! scheduler joins the whole wave before starting the next. Peak resource
//! usage (open files, codec memory) is therefore bounded by the wave size
//! regardless of batch size.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::{BatchProgress, BatchSummary, WebpAsset};
use crate::processing::pipeline::{AssetOutcome, WebpPipeline};

/// Which decision policy the scheduler drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    Scan,
    Manifest,
}

/// Splits assets into waves and drives concurrent per-asset pipelines.
pub struct BatchScheduler {
    pipeline: Arc<WebpPipeline>,
    wave_size: usize,
}

impl BatchScheduler {
    pub fn new(pipeline: Arc<WebpPipeline>, wave_size: usize) -> Self {
        debug!("Creating batch scheduler with wave size {wave_size}");
        Self { pipeline, wave_size }
    }

    /// Runs the whole batch, emitting a progress signal after every wave.
    ///
    /// Waves execute strictly in sequence; within a wave, completion order
    /// is unspecified. The batch always completes: per-asset failures were
    /// already converted to fallback copies by the pipeline, and a panicked
    /// task is recorded as a fallback without poisoning the rest.
    pub async fn run(
        &self,
        assets: Vec<WebpAsset>,
        mode: DiscoveryMode,
        progress_callback: impl Fn(BatchProgress),
    ) -> BatchSummary {
        let total = assets.len();
        let mut summary = BatchSummary::new(total);
        if total == 0 {
            return summary;
        }

        let waves: Vec<Vec<WebpAsset>> = assets
            .chunks(self.wave_size)
            .map(|wave| wave.to_vec())
            .collect();
        let wave_count = waves.len();
        info!("Processing batch of {total} assets in {wave_count} waves");

        let mut completed = 0;
        for (wave_index, wave) in waves.into_iter().enumerate() {
            debug!("Starting wave {}/{wave_count} ({} assets)", wave_index + 1, wave.len());

            let mut handles = Vec::with_capacity(wave.len());
            for asset in wave {
                let pipeline = Arc::clone(&self.pipeline);
                handles.push(tokio::spawn(async move {
                    match mode {
                        DiscoveryMode::Scan => pipeline.process_scanned(asset).await,
                        DiscoveryMode::Manifest => pipeline.process_manifest_asset(asset).await,
                    }
                }));
            }

            for joined in futures::future::join_all(handles).await {
                completed += 1;
                match joined {
                    Ok(outcome) => record(&mut summary, &outcome),
                    Err(e) => {
                        warn!("Asset task panicked: {e}");
                        summary.processed += 1;
                        summary.fallbacks += 1;
                    }
                }
            }

            progress_callback(BatchProgress::new(completed, total));
        }

        if summary.fallbacks > 0 {
            warn!(
                "Batch completed with {} fallback copies out of {total} assets",
                summary.fallbacks
            );
        } else {
            info!("Batch completed: {}/{total} assets processed", summary.processed);
        }
        summary
    }
}

/// Every terminal state except Skip counts as processed, exactly once.
fn record(summary: &mut BatchSummary, outcome: &AssetOutcome) {
    match outcome {
        AssetOutcome::Done(result) => {
            summary.processed += 1;
            summary.optimized += 1;
            summary.saved_bytes += result.saved_bytes;
        }
        AssetOutcome::PassThrough => {
            summary.processed += 1;
        }
        AssetOutcome::Fallback(_) => {
            summary.processed += 1;
            summary.fallbacks += 1;
        }
        AssetOutcome::Skipped => {
            summary.skipped += 1;
        }
    }
}
