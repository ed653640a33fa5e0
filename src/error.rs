//! Error types for the gaze calibration library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filter initialization or processing error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A line of the external gaze stream could not be parsed
    #[error("Malformed gaze sample on line {line}: {message}")]
    SampleParse {
        /// 1-based line number in the input stream
        line: usize,
        /// Parser message
        message: String,
    },

    /// Click addressed to a point the session does not know
    #[error("Unknown calibration point: {0}")]
    UnknownPoint(String),

    /// An accuracy measurement is already running
    #[error("Accuracy measurement already in progress")]
    MeasurementActive,
}

/// Application-specific error type (alias for main Error type)
pub type AppError = Error;

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
