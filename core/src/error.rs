//! Error types for the portgate-core library.

use thiserror::Error;

use crate::forward::errors::GateError;

/// Result type alias for portgate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur across the library surface.
#[derive(Error, Debug)]
pub enum Error {
    /// Port forward establishment failed.
    #[error("Port forward error: {0}")]
    Gate(#[from] GateError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Named profile does not exist in the store.
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
}
