//! Container validity and animation detection.

use std::path::Path;

use tracing::debug;

use crate::codec::WebpCodec;

/// `RIFF` container magic at bytes 0..4.
const RIFF_MAGIC: &[u8; 4] = b"RIFF";
/// `WEBP` format magic at bytes 8..12.
const WEBP_MAGIC: &[u8; 4] = b"WEBP";

/// Returns whether `buffer` is a well-formed WebP container.
///
/// This 12-byte signature check is the only binary-format contract the
/// pipeline parses itself; everything past the header belongs to the codec.
pub fn is_valid_webp(buffer: &[u8]) -> bool {
    buffer.len() >= 12 && &buffer[0..4] == RIFF_MAGIC && &buffer[8..12] == WEBP_MAGIC
}

/// Resolves whether the file at `path` is animated (page count > 1).
///
/// A failed probe means "not animated", never an error: a mis-detection
/// costs one suboptimal encode, not an aborted pipeline.
pub fn detect_animated(codec: &dyn WebpCodec, path: &Path) -> bool {
    match codec.probe_metadata(path) {
        Ok(meta) => meta.pages.is_some_and(|pages| pages > 1),
        Err(e) => {
            debug!("Animation probe failed for {}: {e}; treating as static", path.display());
            false
        }
    }
}
