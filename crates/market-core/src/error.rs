use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the market analysis crates.
#[derive(Error, Debug)]
pub enum MarketError {
    /// A day file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV layer rejected a record (bad quoting, wrong field count, ...).
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A row was read but one of its fields is missing or unusable.
    #[error("Malformed row {line} in {path}: {reason}")]
    MalformedRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A location string is not one of the store locations.
    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    /// Tagged data contradicts itself (e.g. a negative time in store).
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    /// A customer lacks the entry or exit marker an operation needs.
    #[error("Missing data: {0}")]
    MissingData(String),

    /// The expected data directory does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A report could not be serialised.
    #[error("Failed to serialise JSON: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Convenience alias used throughout the market crates.
pub type Result<T> = std::result::Result<T, MarketError>;
