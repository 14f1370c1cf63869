//! Encode parameter construction, including the stacked-frame canvas math
//! for animated assets.

use crate::codec::WebpMetadata;
use crate::core::ResolvedOptions;

/// Parameters for a static encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticEncodeParams {
    pub quality: u32,
    pub effort: u32,
    /// Bounding box when a resize ceiling is configured
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
}

impl StaticEncodeParams {
    pub fn from_options(options: &ResolvedOptions) -> Self {
        Self {
            quality: options.quality,
            effort: options.effort,
            max_width: (options.max_width > 0).then_some(options.max_width),
            max_height: (options.max_height > 0).then_some(options.max_height),
        }
    }
}

/// Parameters for an animated encode.
///
/// Loop count and delays are always sourced from the probed metadata, never
/// fabricated; the loop count defaults to 0 (infinite) only when the
/// container carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimatedEncodeParams {
    pub quality: u32,
    pub effort: u32,
    pub loop_count: u32,
    /// Original per-frame delays in milliseconds, carried through unchanged
    pub delay_ms: Option<Vec<u32>>,
    /// Full stacked canvas (width, height x pages) when resizing applies
    pub canvas: Option<(u32, u32)>,
}

impl AnimatedEncodeParams {
    /// Builds animated parameters from the probed metadata.
    ///
    /// When a resize ceiling is configured, the single-frame dimensions are
    /// fitted within it preserving aspect, then the fitted height is
    /// multiplied by the page count: the encoder sees all frames stacked
    /// vertically on one canvas.
    pub fn from_metadata(options: &ResolvedOptions, meta: &WebpMetadata) -> Self {
        let pages = meta.pages.unwrap_or(1).max(1);
        let canvas = if options.max_width > 0 || options.max_height > 0 {
            frame_dimensions(meta, pages).map(|(width, frame_height)| {
                let (fit_w, fit_h) =
                    fit_within(width, frame_height, options.max_width, options.max_height);
                (fit_w, fit_h * pages)
            })
        } else {
            None
        };
        Self {
            quality: options.animation_quality,
            effort: options.animation_effort,
            loop_count: meta.loop_count.unwrap_or(0),
            delay_ms: meta.delay_ms.clone(),
            canvas,
        }
    }
}

/// Single-frame (width, height). The container reports either a per-page
/// height or the full stacked height, in which case dividing by the page
/// count recovers one frame.
fn frame_dimensions(meta: &WebpMetadata, pages: u32) -> Option<(u32, u32)> {
    let width = meta.width?;
    let frame_height = meta
        .page_height
        .or_else(|| meta.height.map(|h| (h / pages).max(1)))?;
    Some((width, frame_height))
}

/// Fits `width` x `height` inside the configured ceiling, preserving aspect.
/// A zero ceiling on either axis means that axis is unconstrained.
/// Dimensions already inside the box are returned unchanged (never upscale).
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let bound_w = if max_width > 0 { max_width } else { width };
    let bound_h = if max_height > 0 { max_height } else { height };
    if width <= bound_w && height <= bound_h {
        return (width, height);
    }
    let scale = f64::min(
        bound_w as f64 / width as f64,
        bound_h as f64 / height as f64,
    );
    let fit_w = ((width as f64 * scale).round() as u32).max(1);
    let fit_h = ((height as f64 * scale).round() as u32).max(1);
    (fit_w, fit_h)
}
