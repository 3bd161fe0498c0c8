//! Error types for rmstore
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

use crate::backend::RecordId;

/// Result type alias using RmsError
pub type Result<T> = std::result::Result<T, RmsError>;

/// Unified error type for rmstore operations
#[derive(Debug, Error)]
pub enum RmsError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Record Store Errors
    // -------------------------------------------------------------------------
    #[error("Record store is not open")]
    NotOpen,

    #[error("Invalid record id: {0}")]
    InvalidId(RecordId),

    #[error("Record store full: requested {requested} bytes, {available} available")]
    Full { requested: usize, available: usize },

    #[error("Record store in use: {0}")]
    InUse(String),

    #[error("Record store not found: {0}")]
    NotFound(String),

    #[error("Invalid record store name: {0:?}")]
    InvalidName(String),

    // -------------------------------------------------------------------------
    // View Errors
    // -------------------------------------------------------------------------
    #[error("No such element")]
    NoSuchElement,

    #[error("Record view has been destroyed")]
    Destroyed,

    // -------------------------------------------------------------------------
    // Persistence Errors
    // -------------------------------------------------------------------------
    #[error("Store image corruption detected: {0}")]
    Corruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for RmsError {
    fn from(err: bincode::Error) -> Self {
        RmsError::Serialization(err.to_string())
    }
}
