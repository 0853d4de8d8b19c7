//! Error types for the optimum domain types.

use thiserror::Error;

/// Errors raised while building domain values or loading settings.
#[derive(Debug, Error)]
pub enum OptimumError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cask identifier is not of the form `class:name`
    #[error("Invalid cask: {0}")]
    InvalidCask(String),
}
