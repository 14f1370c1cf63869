//! Optimizer configuration: caller options, defaults merge, range validation.

use serde::{Deserialize, Serialize};

use crate::utils::{OptimizerError, OptimizerResult};

/// Caller-facing option bag. Every field is optional; unset fields take the
/// documented default during [`WebpOptions::resolve`].
///
/// Field names are camelCase on the wire so a host build tool can pass user
/// configuration through unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebpOptions {
    /// Static encode quality (1-100)
    pub quality: Option<u32>,
    /// Static encode effort (0-6)
    pub effort: Option<u32>,
    /// Animated encode quality (1-100)
    pub animation_quality: Option<u32>,
    /// Animated encode effort (0-6)
    #[serde(rename = "animationCompression")]
    pub animation_effort: Option<u32>,
    /// Enables the animated re-encode path
    pub optimize_animation: Option<bool>,
    /// Skip-too-large / oversize warning threshold in bytes (0 = no limit)
    pub max_file_size: Option<u64>,
    /// Pass-through threshold in bytes (0 = no limit)
    pub skip_if_smaller: Option<u64>,
    /// Resize ceiling in pixels (0 = no resize)
    pub max_width: Option<u32>,
    /// Resize ceiling in pixels (0 = no resize)
    pub max_height: Option<u32>,
    /// Wave size for batch execution (>= 1)
    pub concurrent_images: Option<usize>,
    /// Per-asset diagnostic logging
    pub verbose: Option<bool>,
    /// Encode timeout in seconds (0 = no timeout); expiry falls back to a copy
    pub codec_timeout_secs: Option<u64>,
}

/// Immutable configuration produced once per pipeline invocation.
///
/// Never mutated after construction; every component receives it by
/// reference or copy and never looks up ambient state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedOptions {
    pub quality: u32,
    pub effort: u32,
    pub animation_quality: u32,
    #[serde(rename = "animationCompression")]
    pub animation_effort: u32,
    pub optimize_animation: bool,
    pub max_file_size: u64,
    pub skip_if_smaller: u64,
    pub max_width: u32,
    pub max_height: u32,
    pub concurrent_images: usize,
    pub verbose: bool,
    pub codec_timeout_secs: u64,
}

impl WebpOptions {
    /// Merges caller values over the defaults and validates every field.
    ///
    /// Fails with a descriptive [`OptimizerError::Config`] naming the
    /// offending option, before any file I/O begins.
    pub fn resolve(&self) -> OptimizerResult<ResolvedOptions> {
        let resolved = ResolvedOptions {
            quality: self.quality.unwrap_or(80),
            effort: self.effort.unwrap_or(4),
            animation_quality: self.animation_quality.unwrap_or(80),
            animation_effort: self.animation_effort.unwrap_or(4),
            optimize_animation: self.optimize_animation.unwrap_or(true),
            max_file_size: self.max_file_size.unwrap_or(0),
            skip_if_smaller: self.skip_if_smaller.unwrap_or(0),
            max_width: self.max_width.unwrap_or(0),
            max_height: self.max_height.unwrap_or(0),
            concurrent_images: self.concurrent_images.unwrap_or(5),
            verbose: self.verbose.unwrap_or(false),
            codec_timeout_secs: self.codec_timeout_secs.unwrap_or(0),
        };
        resolved.validate()?;
        Ok(resolved)
    }
}

impl ResolvedOptions {
    fn validate(&self) -> OptimizerResult<()> {
        if self.quality < 1 || self.quality > 100 {
            return Err(OptimizerError::config("quality must be between 1 and 100"));
        }
        if self.effort > 6 {
            return Err(OptimizerError::config("effort must be between 0 and 6"));
        }
        if self.animation_quality < 1 || self.animation_quality > 100 {
            return Err(OptimizerError::config(
                "animationQuality must be between 1 and 100",
            ));
        }
        if self.animation_effort > 6 {
            return Err(OptimizerError::config(
                "animationCompression must be between 0 and 6",
            ));
        }
        if self.concurrent_images < 1 {
            return Err(OptimizerError::config("concurrentImages must be at least 1"));
        }
        Ok(())
    }
}
