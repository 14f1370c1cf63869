//! WebP asset optimization pipeline for build tools.
//!
//! The host build tool invokes this crate once at its "build finished"
//! point, handing over a resolved output directory and, optionally, a
//! manifest of already-emitted assets. Candidates are discovered, pushed
//! through a per-asset decision policy (pass-through / skip / encode /
//! fallback copy), executed in concurrency-limited waves, and materialized
//! atomically so the output directory never holds a partial file.
//!
//! The pixel work itself lives behind the injected [`WebpCodec`] capability;
//! the crate parses nothing beyond the 12-byte container signature.

// Module declarations in dependency order
pub mod utils;
pub mod core;
pub mod codec;
pub mod discovery;
pub mod processing;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

pub use codec::{
    AnimatedEncodeParams, StaticEncodeParams, WebpCodec, WebpMetadata, is_valid_webp,
};
pub use crate::core::{
    BatchProgress, BatchSummary, OptimizationResult, ResolvedOptions, WebpAsset, WebpOptions,
};
pub use discovery::{AssetManifest, ManifestEntry, EXCLUDED_DIRS};
pub use processing::{ChangeCache, InMemoryChangeCache};
pub use utils::{OptimizerError, OptimizerResult, format_bytes};

use processing::{BatchScheduler, DiscoveryMode, WebpPipeline};

type ProgressCallback = Arc<dyn Fn(BatchProgress) + Send + Sync>;

/// Pipeline entry point for host build tools.
///
/// Construction resolves and validates the configuration; out-of-range
/// option values fail here, before any file I/O. The change cache lives as
/// long as the optimizer instance and is consulted only by manifest runs.
pub struct WebpOptimizer {
    options: ResolvedOptions,
    codec: Arc<dyn WebpCodec>,
    cache: Arc<dyn ChangeCache>,
    progress: Option<ProgressCallback>,
}

impl WebpOptimizer {
    pub fn new(options: WebpOptions, codec: Arc<dyn WebpCodec>) -> OptimizerResult<Self> {
        let options = options.resolve()?;
        Ok(Self {
            options,
            codec,
            cache: Arc::new(InMemoryChangeCache::new()),
            progress: None,
        })
    }

    /// Swaps in an alternate cache backing (the default is in-memory,
    /// per-instance).
    pub fn with_cache(mut self, cache: Arc<dyn ChangeCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Registers a callback invoked after every completed wave.
    pub fn on_progress(
        mut self,
        callback: impl Fn(BatchProgress) + Send + Sync + 'static,
    ) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Filesystem-scan strategy: recursively discovers `.webp` files under
    /// `root` (pruning [`EXCLUDED_DIRS`]) and optimizes them into `out_dir`.
    pub async fn optimize_directory(
        &self,
        root: &Path,
        out_dir: &Path,
    ) -> OptimizerResult<BatchSummary> {
        let assets: Vec<WebpAsset> = discovery::scan_directory(root, EXCLUDED_DIRS).collect();
        if assets.is_empty() {
            info!("No WebP files found under {}", root.display());
        }
        self.run(assets, DiscoveryMode::Scan, out_dir).await
    }

    /// Manifest strategy: resolves the build tool's emitted-asset manifest
    /// and optimizes every WebP entry into `out_dir`.
    pub async fn optimize_manifest(
        &self,
        manifest: &AssetManifest,
        out_dir: &Path,
    ) -> OptimizerResult<BatchSummary> {
        let assets = discovery::resolve_entries(manifest, out_dir);
        if assets.is_empty() {
            info!("No WebP assets in manifest");
        }
        self.run(assets, DiscoveryMode::Manifest, out_dir).await
    }

    async fn run(
        &self,
        assets: Vec<WebpAsset>,
        mode: DiscoveryMode,
        out_dir: &Path,
    ) -> OptimizerResult<BatchSummary> {
        let pipeline = Arc::new(WebpPipeline::new(
            self.options.clone(),
            Arc::clone(&self.codec),
            Arc::clone(&self.cache),
            out_dir.to_path_buf(),
        ));
        let scheduler = BatchScheduler::new(pipeline, self.options.concurrent_images);
        let progress = self.progress.clone();
        let summary = scheduler
            .run(assets, mode, move |snapshot| {
                if let Some(callback) = &progress {
                    callback(snapshot);
                }
            })
            .await;
        info!(
            "Optimization finished: {}/{} processed, {} saved",
            summary.processed,
            summary.total,
            format_bytes(summary.saved_bytes)
        );
        Ok(summary)
    }
}
