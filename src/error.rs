//! Error types for ETL operations.

use thiserror::Error;

/// Errors that can occur while loading the warehouse.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Failed to parse a source JSON file
    #[error("Failed to parse source file: {0}")]
    ParseError(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Configuration or input error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for ETL operations.
pub type EtlResult<T> = Result<T, EtlError>;
