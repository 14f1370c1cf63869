//! Asset discovery: the two interchangeable locator strategies.

mod manifest;
mod scan;

pub use manifest::{AssetManifest, ManifestEntry, resolve_entries};
pub use scan::{EXCLUDED_DIRS, scan_directory};
