//! External codec boundary.
//!
//! The pipeline never touches pixel data itself: all decoding and encoding
//! is delegated to an injected [`WebpCodec`] capability. The only binary
//! contract parsed in-crate is the 12-byte container signature
//! ([`is_valid_webp`]).

mod params;
mod probe;

use std::path::Path;

use crate::utils::OptimizerResult;

pub use params::{AnimatedEncodeParams, StaticEncodeParams, fit_within};
pub use probe::{detect_animated, is_valid_webp};

/// Metadata reported by the codec for one WebP container.
///
/// Fields are optional wherever the container may omit them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebpMetadata {
    /// Frame/page count; greater than one marks the asset animated
    pub pages: Option<u32>,
    /// Loop count (0 = infinite)
    pub loop_count: Option<u32>,
    /// Per-frame display durations in milliseconds
    pub delay_ms: Option<Vec<u32>>,
    /// Canvas width in pixels
    pub width: Option<u32>,
    /// Canvas height in pixels (all pages stacked, for animated containers)
    pub height: Option<u32>,
    /// Height of a single page in pixels
    pub page_height: Option<u32>,
}

/// Injected codec capability.
///
/// Implementations are expected to block: the pipeline runs every encode on
/// tokio's blocking thread pool so the async runtime is never stalled.
/// `Send + Sync` lets one codec handle be shared across a wave of
/// concurrent per-asset tasks.
pub trait WebpCodec: Send + Sync {
    /// Queries container metadata for the file at `path`.
    fn probe_metadata(&self, path: &Path) -> OptimizerResult<WebpMetadata>;

    /// Re-encodes a static image, returning the encoded bytes.
    fn encode_static(&self, input: &[u8], params: &StaticEncodeParams) -> OptimizerResult<Vec<u8>>;

    /// Re-encodes an animated image, returning the encoded bytes.
    fn encode_animated(
        &self,
        input: &[u8],
        params: &AnimatedEncodeParams,
    ) -> OptimizerResult<Vec<u8>>;
}
