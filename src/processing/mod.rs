//! The asset processing pipeline: change cache, decision policy, wave
//! scheduler and atomic materialization.

mod batch;
mod cache;
pub mod materialize;
mod pipeline;

pub use batch::{BatchScheduler, DiscoveryMode};
pub use cache::{CacheEntry, ChangeCache, InMemoryChangeCache};
pub use pipeline::{AssetOutcome, WebpPipeline};
