//! Per-asset decision policy.
//!
//! One asset moves through validity/size/cache gates and either passes
//! through unchanged, skips, or is re-encoded and materialized. Every
//! failure past the gates falls back to a verbatim copy of the original:
//! nothing in here aborts the batch.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::codec::{
    AnimatedEncodeParams, StaticEncodeParams, WebpCodec, detect_animated, is_valid_webp,
};
use crate::core::{OptimizationResult, ResolvedOptions, WebpAsset};
use crate::processing::cache::{CacheEntry, ChangeCache};
use crate::processing::materialize;
use crate::utils::{OptimizerError, OptimizerResult, format_bytes};

/// Terminal state of one asset.
#[derive(Debug)]
pub enum AssetOutcome {
    /// Re-encoded and materialized
    Done(OptimizationResult),
    /// Copied unchanged (size gate or cache hit)
    PassThrough,
    /// Encoding failed; the original was copied verbatim
    Fallback(OptimizationResult),
    /// Over the max-size ceiling before encoding; no output written
    Skipped,
}

enum CodecCall {
    Static(StaticEncodeParams),
    Animated(AnimatedEncodeParams),
}

/// Drives one asset from discovery to a terminal state.
pub struct WebpPipeline {
    options: ResolvedOptions,
    codec: Arc<dyn WebpCodec>,
    cache: Arc<dyn ChangeCache>,
    out_dir: PathBuf,
}

impl WebpPipeline {
    pub fn new(
        options: ResolvedOptions,
        codec: Arc<dyn WebpCodec>,
        cache: Arc<dyn ChangeCache>,
        out_dir: PathBuf,
    ) -> Self {
        Self { options, codec, cache, out_dir }
    }

    /// Decision policy for filesystem-scan discovery.
    ///
    /// Scan mode validates the container signature itself and honors the
    /// max-size pre-check; nothing vouched for these files before us.
    pub async fn process_scanned(&self, asset: WebpAsset) -> AssetOutcome {
        if self.options.verbose {
            info!("Processing: {} ({})", asset.file_name, format_bytes(asset.size as i64));
        }

        let bytes = match tokio::fs::read(&asset.source_path).await {
            Ok(bytes) => bytes,
            Err(e) => return self.fall_back(&asset, OptimizerError::from(e)).await,
        };

        if !is_valid_webp(&bytes) {
            debug!("Invalid WebP container: {}", asset.file_name);
            return self
                .fall_back(&asset, OptimizerError::codec("not a well-formed WebP container"))
                .await;
        }

        if self.below_pass_through_threshold(&asset) {
            return self.pass_through(&asset, "already small enough").await;
        }

        if self.options.max_file_size > 0 && asset.size > self.options.max_file_size {
            debug!(
                "Skipping {} ({} over the {} ceiling)",
                asset.file_name,
                format_bytes(asset.size as i64),
                format_bytes(self.options.max_file_size as i64)
            );
            return AssetOutcome::Skipped;
        }

        let animated = self.resolve_animated(&asset);
        match self.encode_and_materialize(&asset, bytes, animated).await {
            Ok(result) => AssetOutcome::Done(result),
            Err(e) => self.fall_back(&asset, e).await,
        }
    }

    /// Decision policy for manifest discovery.
    ///
    /// The build tool already validated these assets, so there is no
    /// signature pre-check and no upper-bound pre-check; the change cache
    /// applies only here.
    pub async fn process_manifest_asset(&self, asset: WebpAsset) -> AssetOutcome {
        if self.options.verbose {
            info!("Processing: {} ({})", asset.file_name, format_bytes(asset.size as i64));
        }

        if self.below_pass_through_threshold(&asset) {
            return self.pass_through(&asset, "already small enough").await;
        }

        let current_stat = self.current_cache_entry(&asset);
        if let Some(current) = current_stat {
            if self.cache.get(&asset.source_path) == Some(current) {
                return self.pass_through(&asset, "unchanged since last encode").await;
            }
        }

        let animated = match asset.animated {
            Some(flag) => flag,
            None => self.resolve_animated(&asset),
        };

        let bytes = match tokio::fs::read(&asset.source_path).await {
            Ok(bytes) => bytes,
            Err(e) => return self.fall_back(&asset, OptimizerError::from(e)).await,
        };

        match self.encode_and_materialize(&asset, bytes, animated).await {
            Ok(result) => {
                if let Some(current) = current_stat {
                    self.cache.put(&asset.source_path, current);
                }
                AssetOutcome::Done(result)
            }
            Err(e) => self.fall_back(&asset, e).await,
        }
    }

    // ── Gates ─────────────────────────────────────────────────────────────

    fn below_pass_through_threshold(&self, asset: &WebpAsset) -> bool {
        self.options.skip_if_smaller > 0 && asset.size < self.options.skip_if_smaller
    }

    /// Stat snapshot for the cache comparison. Any stat failure is a miss.
    fn current_cache_entry(&self, asset: &WebpAsset) -> Option<CacheEntry> {
        std::fs::metadata(&asset.source_path)
            .ok()
            .as_ref()
            .and_then(CacheEntry::from_metadata)
    }

    fn resolve_animated(&self, asset: &WebpAsset) -> bool {
        detect_animated(self.codec.as_ref(), &asset.source_path)
    }

    // ── Encode path ───────────────────────────────────────────────────────

    async fn encode_and_materialize(
        &self,
        asset: &WebpAsset,
        bytes: Vec<u8>,
        animated: bool,
    ) -> OptimizerResult<OptimizationResult> {
        let call = if animated && self.options.optimize_animation {
            let meta = self.codec.probe_metadata(&asset.source_path)?;
            CodecCall::Animated(AnimatedEncodeParams::from_metadata(&self.options, &meta))
        } else {
            CodecCall::Static(StaticEncodeParams::from_options(&self.options))
        };

        let encoded = self.invoke_codec(bytes, call).await?;

        let final_path = asset.destination(&self.out_dir);
        let temp_path = asset
            .temp_path
            .clone()
            .unwrap_or_else(|| materialize::default_temp_path(&final_path));
        materialize::commit(&encoded, &temp_path, &final_path).await?;

        let optimized_size = tokio::fs::metadata(&final_path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);

        if self.options.max_file_size > 0 && optimized_size > self.options.max_file_size {
            warn!(
                "{} still over the size ceiling after encoding: {} > {}",
                asset.file_name,
                format_bytes(optimized_size as i64),
                format_bytes(self.options.max_file_size as i64)
            );
        }

        let result = OptimizationResult::completed(
            asset,
            final_path.to_string_lossy().to_string(),
            optimized_size,
        );
        if self.options.verbose {
            info!(
                "Optimized {}: {} -> {} ({:.1}% saved)",
                asset.file_name,
                format_bytes(result.original_size as i64),
                format_bytes(result.optimized_size as i64),
                result.savings_percent
            );
        }
        Ok(result)
    }

    /// Runs the blocking codec on tokio's blocking pool, optionally bounded
    /// by the configured timeout. Expiry is a codec error, so the asset
    /// falls back and the wave moves on.
    async fn invoke_codec(&self, input: Vec<u8>, call: CodecCall) -> OptimizerResult<Vec<u8>> {
        let codec = Arc::clone(&self.codec);
        let handle = tokio::task::spawn_blocking(move || match call {
            CodecCall::Static(params) => codec.encode_static(&input, &params),
            CodecCall::Animated(params) => codec.encode_animated(&input, &params),
        });

        let joined = if self.options.codec_timeout_secs > 0 {
            let limit = Duration::from_secs(self.options.codec_timeout_secs);
            match tokio::time::timeout(limit, handle).await {
                Ok(joined) => joined,
                Err(_) => {
                    return Err(OptimizerError::codec(format!(
                        "Encode timed out after {}s",
                        self.options.codec_timeout_secs
                    )));
                }
            }
        } else {
            handle.await
        };

        joined.map_err(|e| OptimizerError::codec(format!("Encode task panicked: {e}")))?
    }

    // ── Terminal copies ───────────────────────────────────────────────────

    async fn pass_through(&self, asset: &WebpAsset, reason: &str) -> AssetOutcome {
        debug!("Pass-through ({reason}): {}", asset.file_name);
        let final_path = asset.destination(&self.out_dir);
        match materialize::fallback_copy(&asset.source_path, &final_path).await {
            Ok(()) => AssetOutcome::PassThrough,
            Err(e) => {
                warn!("Pass-through copy failed for {}: {e}", asset.file_name);
                AssetOutcome::Fallback(OptimizationResult::failed(
                    asset,
                    final_path.to_string_lossy().to_string(),
                    e.to_string(),
                ))
            }
        }
    }

    async fn fall_back(&self, asset: &WebpAsset, error: OptimizerError) -> AssetOutcome {
        warn!("Falling back to verbatim copy for {}: {error}", asset.file_name);
        let final_path = asset.destination(&self.out_dir);
        if let Err(copy_err) = materialize::fallback_copy(&asset.source_path, &final_path).await {
            warn!("Fallback copy failed for {}: {copy_err}", asset.file_name);
        }
        AssetOutcome::Fallback(OptimizationResult::failed(
            asset,
            final_path.to_string_lossy().to_string(),
            error.to_string(),
        ))
    }
}
