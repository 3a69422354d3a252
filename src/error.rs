//! Error types for tierscan
//!
//! Two severity tiers:
//! - Setup-tier errors (bad configuration, unwritable output) are fatal and
//!   surface through these types before any scanning starts.
//! - Data-tier errors (stat failures, unreadable directories) never appear
//!   here; they are captured as records by the walker and extractor.
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include context about what to do
//! - Preserve error chains for debugging

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the tierscan application
#[derive(Error, Debug)]
pub enum TierscanError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Output sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Dataset read errors during analysis
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("Invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue size
    #[error("Invalid queue size {size}: must be at least {min}")]
    InvalidQueueSize { size: usize, min: usize },

    /// Invalid batch size
    #[error("Invalid batch size {size}: must be between {min} and {max}")]
    InvalidBatchSize { size: usize, min: usize, max: usize },

    /// Unknown metadata field requested via --fields
    #[error("Unknown field '{name}': available fields are {available}")]
    UnknownField { name: String, available: String },

    /// Invalid exclude pattern
    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },

    /// Recency thresholds must satisfy hot < cold
    #[error("Invalid thresholds: hot_days ({hot_days}) must be less than cold_days ({cold_days})")]
    InvalidThresholds { hot_days: i64, cold_days: i64 },

    /// Invalid reference date
    #[error("Invalid reference date '{value}': expected YYYY-MM-DD")]
    InvalidReferenceDate { value: String },

    /// Root path to scan does not exist or is not a directory
    #[error("Invalid scan root '{path}': {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },

    /// Organizational slot configuration error
    #[error("Invalid organizational slots '{value}': {reason}")]
    InvalidOrgSlots { value: String, reason: String },
}

/// Output sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    /// Failed to create an output file
    #[error("Failed to create output at '{path}': {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// CSV serialization/write error
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error during flush
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writer channel closed unexpectedly
    #[error("Sink channel closed unexpectedly")]
    ChannelClosed,

    /// Writer thread panicked
    #[error("Sink writer thread panicked")]
    WriterPanicked,
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker {id} panicked")]
    Panicked { id: usize },

    /// Worker initialization failed
    #[error("Failed to initialize worker {id}: {reason}")]
    InitFailed { id: usize, reason: String },
}

/// Errors reading a scan dataset back for analysis
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Dataset file missing
    #[error("Dataset not found: '{path}'")]
    NotFound { path: PathBuf },

    /// CSV parse error
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// Header is missing a required column
    #[error("Dataset is missing required column '{column}'")]
    MissingColumn { column: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for TierscanError
pub type Result<T> = std::result::Result<T, TierscanError>;

/// Result type alias for SinkError
pub type SinkResult<T> = std::result::Result<T, SinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let cfg_err = ConfigError::InvalidThresholds {
            hot_days: 180,
            cold_days: 30,
        };
        let err: TierscanError = cfg_err.into();
        assert!(matches!(err, TierscanError::Config(_)));
    }

    #[test]
    fn test_threshold_error_message() {
        let err = ConfigError::InvalidThresholds {
            hot_days: 30,
            cold_days: 30,
        };
        let msg = err.to_string();
        assert!(msg.contains("hot_days (30)"));
        assert!(msg.contains("cold_days (30)"));
    }
}
