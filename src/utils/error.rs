//! Error types for the WebP optimization pipeline.
//!
//! Provides a single error enum using `thiserror` for ergonomic error handling.

use std::io;
use thiserror::Error;

/// Main error type for the optimizer.
///
/// Only [`OptimizerError::Config`] is ever fatal to a run; every other
/// variant is caught at the per-asset level and converted into a fallback
/// copy of the original bytes.
#[derive(Error, Debug)]
pub enum OptimizerError {
    /// An option value was outside its documented range
    #[error("Configuration error: {0}")]
    Config(String),

    /// File IO error
    #[error("IO error: {0}")]
    Io(String),

    /// The external codec failed to probe or encode
    #[error("Codec error: {0}")]
    Codec(String),

    /// Writing or promoting encoder output failed
    #[error("Materialize error: {0}")]
    Materialize(String),
}

/// Convenience result type for optimizer operations.
pub type OptimizerResult<T> = Result<T, OptimizerError>;

// Helper methods for error creation
impl OptimizerError {
    pub fn config<T: Into<String>>(msg: T) -> Self {
        Self::Config(msg.into())
    }

    pub fn codec<T: Into<String>>(msg: T) -> Self {
        Self::Codec(msg.into())
    }

    pub fn materialize<T: Into<String>>(msg: T) -> Self {
        Self::Materialize(msg.into())
    }
}

// Convert std::io::Error to OptimizerError
impl From<io::Error> for OptimizerError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
