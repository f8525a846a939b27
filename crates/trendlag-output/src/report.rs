//! Plain-text regression summary report.

use crate::summary::RegressionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required builder field was never set.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),
}

/// Summary of a single pooled regression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionReport {
    /// Attention lag in quarters.
    pub lag: usize,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// The estimate being reported.
    pub result: RegressionResult,
}

impl RegressionReport {
    /// Create a new report.
    pub fn new(lag: usize, result: RegressionResult) -> Self {
        Self {
            lag,
            timestamp: Utc::now(),
            result,
        }
    }

    /// `regression_summary_lag_{lag}.txt`.
    pub fn file_name(&self) -> String {
        format!("regression_summary_lag_{}.txt", self.lag)
    }

    /// The fixed-layout text block.
    pub fn to_text(&self) -> String {
        format!(
            "=== Regression Summary (Lag = {}) ===\n\
             Coefficient for attention_lag : {:.6}\n\
             Standard Error               : {:.6}\n\
             P-value                      : {:.6}\n\
             R-squared                    : {:.4}\n",
            self.lag,
            self.result.coefficient,
            self.result.std_error,
            self.result.p_value,
            self.result.r_squared
        )
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write [`Self::to_text`] to [`Self::file_name`] inside `dir`.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let path = dir.join(self.file_name());
        let mut file = File::create(&path)?;
        file.write_all(self.to_text().as_bytes())?;
        Ok(path)
    }
}

/// Builder for [`RegressionReport`].
#[derive(Debug, Default)]
pub struct ReportBuilder {
    lag: Option<usize>,
    result: Option<RegressionResult>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the lag. Defaults to the result's lag.
    pub const fn lag(mut self, lag: usize) -> Self {
        self.lag = Some(lag);
        self
    }

    /// Set the result.
    pub fn result(mut self, result: RegressionResult) -> Self {
        self.result = Some(result);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<RegressionReport, ReportError> {
        let result = self.result.ok_or(ReportError::MissingField("result"))?;
        Ok(RegressionReport::new(self.lag.unwrap_or(result.lag), result))
    }
}
