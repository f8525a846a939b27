//! Regression errors.

use thiserror::Error;

/// Errors raised while building or fitting a regression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegressionError {
    /// Not enough data (or variation) to identify the model.
    #[error("Insufficient data: {reason}")]
    InsufficientData {
        /// What was missing.
        reason: String,
    },

    /// Array shapes disagree.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Input holds NaN or infinite values.
    #[error("Non-finite value in {column} for {entity}")]
    NonFinite {
        /// Column holding the value.
        column: &'static str,
        /// Entity of the offending row.
        entity: String,
    },

    /// A reference distribution could not be constructed.
    #[error("Distribution error: {0}")]
    Distribution(String),
}

impl RegressionError {
    /// Shorthand for [`RegressionError::InsufficientData`].
    pub fn insufficient(reason: impl Into<String>) -> Self {
        Self::InsufficientData {
            reason: reason.into(),
        }
    }

    /// Whether this is an [`RegressionError::InsufficientData`] error.
    pub const fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}

/// Result alias for regression operations.
pub type Result<T> = std::result::Result<T, RegressionError>;
