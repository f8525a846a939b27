//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur during data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// Malformed or unrecognized input structure in a single source
    #[error("Format error in {source_name}: {reason}")]
    Format {
        /// File or series the error was found in
        source_name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Data parsing error
    #[error("Data parsing error: {0}")]
    Parse(String),

    /// Missing data
    #[error("Missing data for {entity}: {reason}")]
    MissingData {
        /// Entity that was queried
        entity: String,
        /// Reason for missing data
        reason: String,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DataError {
    /// Shorthand for a [`DataError::Format`].
    pub fn format(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error describes a malformed input rather than an I/O failure.
    pub const fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}
