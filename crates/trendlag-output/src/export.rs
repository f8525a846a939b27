//! CSV and JSON export of regression summaries.

use crate::summary::{RegressionResult, SummaryTable};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Row status in the flat summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// A regression was estimated.
    Computed,
    /// The group was skipped.
    Skipped,
}

/// One row of `sector_regression_summary.csv`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryRecord {
    /// Group label.
    pub group: String,
    /// Computed or skipped.
    pub status: RecordStatus,
    /// Coefficient on `attention_lag`.
    pub coef: Option<f64>,
    /// Standard error.
    pub std_err: Option<f64>,
    /// Two-sided p-value.
    pub pval: Option<f64>,
    /// R² of the full model.
    pub r2: Option<f64>,
    /// Rows.
    pub n_obs: usize,
    /// Distinct entities.
    pub n_entities: usize,
    /// Skip reason, empty for computed rows.
    pub reason: Option<String>,
}

impl From<&RegressionResult> for SummaryRecord {
    fn from(result: &RegressionResult) -> Self {
        Self {
            group: result.group.clone(),
            status: RecordStatus::Computed,
            coef: Some(result.coefficient),
            std_err: Some(result.std_error),
            pval: Some(result.p_value),
            r2: Some(result.r_squared),
            n_obs: result.n_obs,
            n_entities: result.n_entities,
            reason: None,
        }
    }
}

impl SummaryTable {
    /// Flat rows: computed results in table order, then skips.
    pub fn records(&self) -> Vec<SummaryRecord> {
        let computed = self.results.iter().map(SummaryRecord::from);
        let skipped = self.skipped.iter().map(|s| SummaryRecord {
            group: s.group.clone(),
            status: RecordStatus::Skipped,
            coef: None,
            std_err: None,
            pval: None,
            r2: None,
            n_obs: s.rows,
            n_entities: s.entities,
            reason: Some(s.reason.to_string()),
        });
        computed.chain(skipped).collect()
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string<T: Serialize>(records: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for SummaryTable {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self.records()),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for RegressionResult {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string([SummaryRecord::from(self)]),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
