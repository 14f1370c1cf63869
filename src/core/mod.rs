//! Core pipeline types.
//!
//! This module contains the fundamental types used throughout the pipeline:
//! - [`WebpOptions`] / [`ResolvedOptions`]: caller options and the immutable resolved record
//! - [`WebpAsset`]: one candidate file produced by discovery
//! - [`OptimizationResult`]: outcome of one optimization attempt
//! - [`BatchSummary`]: aggregate counters for a run
//! - [`BatchProgress`]: per-wave progress for the host callback

mod asset;
mod config;
mod progress;
mod types;

pub use asset::WebpAsset;
pub use config::{ResolvedOptions, WebpOptions};
pub use progress::BatchProgress;
pub use types::{BatchSummary, OptimizationResult};
