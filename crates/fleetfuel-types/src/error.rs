//! Error types for fleetfuel-checker

use thiserror::Error;

use crate::InputSource;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Run cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache is disabled (enable with: config --set-cache true)")]
    Disabled,

    #[error("Cache data corrupted: {0}")]
    Corrupted(String),

    #[error("Cache IO error: {0}")]
    IoError(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// A required canonical column has no matching alias in an input.
    #[error("Missing required column '{column}' in {input} input")]
    MissingColumn { input: InputSource, column: String },

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Excel export error: {0}")]
    Excel(String),

    #[error("Document export error: {0}")]
    Document(String),

    #[error("Access denied for {0}")]
    AccessDenied(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
