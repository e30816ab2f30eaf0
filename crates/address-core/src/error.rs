//! Error types for the address scanner

use thiserror::Error;

/// Main error type for all scanner operations
#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Processing error: {0}")]
    Processing(String),
}

impl From<config::ConfigError> for ScannerError {
    fn from(err: config::ConfigError) -> Self {
        ScannerError::Config(err.to_string())
    }
}

/// Result type for scanner operations
pub type Result<T> = std::result::Result<T, ScannerError>;
