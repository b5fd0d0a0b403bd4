//! Error types for SatFuse
//!
//! Per-source data defects never surface here: they only exclude the
//! offending source from one metric. These errors cover the cases where the
//! engine cannot run at all.

use thiserror::Error;

/// Result type alias for SatFuse operations
pub type Result<T> = std::result::Result<T, FusionError>;

/// Main error type for fusion operations
#[derive(Error, Debug)]
pub enum FusionError {
    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Required top-level field absent from the request
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// Top-level request has the wrong shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON text could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
