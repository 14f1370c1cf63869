pub mod error;
pub mod format;

pub use error::{OptimizerError, OptimizerResult};
pub use format::format_bytes;
