//! Error types for GroveKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using GroveError
pub type Result<T> = std::result::Result<T, GroveError>;

/// Unified error type for GroveKV operations
#[derive(Debug, Error)]
pub enum GroveError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Record decode failed: {0}")]
    Decode(String),

    // -------------------------------------------------------------------------
    // Key Normalization Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {0}")]
    InvalidKey(String),
}
