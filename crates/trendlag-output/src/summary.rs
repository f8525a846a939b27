//! Per-group regression results and the summary table.
//!
//! A [`SummaryTable`] holds computed results and recorded skips side by side.
//! Insertion order carries no meaning; sort explicitly before presenting.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use trendlag_model::FixedEffectsEstimate;

/// Label of the pooled, unpartitioned result.
pub const OVERALL_GROUP: &str = "ALL";

/// Regression statistics for one group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionResult {
    /// Group label, or [`OVERALL_GROUP`].
    pub group: String,

    /// Attention lag in quarters.
    pub lag: usize,

    /// Coefficient on `attention_lag`.
    pub coefficient: f64,

    /// Standard error of the coefficient.
    pub std_error: f64,

    /// Test statistic (z or t).
    pub statistic: f64,

    /// Two-sided p-value.
    pub p_value: f64,

    /// Partial R² of `attention_lag`.
    pub partial_r_squared: f64,

    /// R² of the full fixed-effects model.
    pub r_squared: f64,

    /// Rows in the regression.
    pub n_obs: usize,

    /// Distinct entities.
    pub n_entities: usize,

    /// Distinct periods.
    pub n_periods: usize,
}

impl RegressionResult {
    /// Label an estimate with its group and lag.
    pub fn from_estimate(group: impl Into<String>, lag: usize, estimate: &FixedEffectsEstimate) -> Self {
        Self {
            group: group.into(),
            lag,
            coefficient: estimate.coefficient,
            std_error: estimate.std_error,
            statistic: estimate.statistic,
            p_value: estimate.p_value,
            partial_r_squared: estimate.partial_r_squared,
            r_squared: estimate.r_squared,
            n_obs: estimate.n_obs,
            n_entities: estimate.n_entities,
            n_periods: estimate.n_periods,
        }
    }

    /// Whether the p-value is below `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    /// One-line console rendering, e.g.
    /// `Tech                   | coef: +0.00123 | p: 0.0450 | R²: 0.312`.
    pub fn console_line(&self) -> String {
        format!(
            "{:<22} | coef: {:+.5} | p: {:.4} | R²: {:.3}",
            self.group, self.coefficient, self.p_value, self.r_squared
        )
    }
}

/// Why a group produced no result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer rows than the configured minimum.
    TooFewRows {
        /// Configured minimum.
        min: usize,
    },
    /// Fewer distinct entities than the configured minimum.
    TooFewEntities {
        /// Configured minimum.
        min: usize,
    },
    /// The regression engine rejected the group.
    RegressionFailed {
        /// Engine error message.
        message: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewRows { min } => write!(f, "fewer than {min} rows"),
            Self::TooFewEntities { min } => write!(f, "fewer than {min} entities"),
            Self::RegressionFailed { message } => write!(f, "regression failed: {message}"),
        }
    }
}

/// A group that was not estimated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedGroup {
    /// Group label.
    pub group: String,

    /// Reason for skipping.
    pub reason: SkipReason,

    /// Rows in the group.
    pub rows: usize,

    /// Distinct entities in the group.
    pub entities: usize,
}

impl fmt::Display for SkippedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} rows, {} entities): {}",
            self.group, self.rows, self.entities, self.reason
        )
    }
}

/// Computed results and skips for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SummaryTable {
    /// Attention lag shared by every row.
    pub lag: usize,

    /// Computed results.
    pub results: Vec<RegressionResult>,

    /// Groups that were skipped.
    pub skipped: Vec<SkippedGroup>,
}

impl SummaryTable {
    /// Create an empty table.
    pub const fn new(lag: usize) -> Self {
        Self {
            lag,
            results: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Add a computed result.
    pub fn push_result(&mut self, result: RegressionResult) {
        self.results.push(result);
    }

    /// Record a skipped group.
    pub fn push_skip(&mut self, skipped: SkippedGroup) {
        self.skipped.push(skipped);
    }

    /// Result for `group`, if computed.
    pub fn get(&self, group: &str) -> Option<&RegressionResult> {
        self.results.iter().find(|r| r.group == group)
    }

    /// Skip record for `group`, if any.
    pub fn get_skip(&self, group: &str) -> Option<&SkippedGroup> {
        self.skipped.iter().find(|s| s.group == group)
    }

    /// The pooled [`OVERALL_GROUP`] result.
    pub fn overall(&self) -> Option<&RegressionResult> {
        self.get(OVERALL_GROUP)
    }

    /// Per-group results, excluding [`OVERALL_GROUP`].
    pub fn groups(&self) -> impl Iterator<Item = &RegressionResult> {
        self.results.iter().filter(|r| r.group != OVERALL_GROUP)
    }

    /// Whether nothing was computed or skipped.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty() && self.skipped.is_empty()
    }

    /// Sort results by ascending p-value. NaN sorts last; ties keep group order.
    pub fn sort_by_p_value(&mut self) {
        self.results
            .sort_by(|a, b| nan_last(a.p_value, b.p_value).then_with(|| a.group.cmp(&b.group)));
        self.skipped.sort_by(|a, b| a.group.cmp(&b.group));
    }

    /// Sort results by ascending coefficient. NaN sorts last.
    pub fn sort_by_coefficient(&mut self) {
        self.results.sort_by(|a, b| {
            nan_last(a.coefficient, b.coefficient).then_with(|| a.group.cmp(&b.group))
        });
        self.skipped.sort_by(|a, b| a.group.cmp(&b.group));
    }

    /// Render as an ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nAttention Regression Summary (Lag = {})\n", self.lag));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str(&format!(
            "{:<22} {:>10} {:>10} {:>9} {:>7} {:>8} {:>9}\n",
            "Group", "Coef", "Std Err", "P-value", "R²", "N", "Entities"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for result in &self.results {
            output.push_str(&format!(
                "{:<22} {:>+10.5} {:>10.5} {:>9.4} {:>7.3} {:>8} {:>9}\n",
                result.group,
                result.coefficient,
                result.std_error,
                result.p_value,
                result.r_squared,
                result.n_obs,
                result.n_entities
            ));
        }

        if !self.skipped.is_empty() {
            output.push_str(&"-".repeat(80));
            output.push('\n');
            output.push_str("Skipped:\n");
            for skipped in &self.skipped {
                output.push_str(&format!("  {skipped}\n"));
            }
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# Attention Regression Summary (Lag = {})\n\n",
            self.lag
        ));

        output.push_str("| Group | Coef | Std Err | P-value | R² | N | Entities |\n");
        output.push_str("|-------|------|---------|---------|----|---|----------|\n");
        for result in &self.results {
            output.push_str(&format!(
                "| {} | {:+.5} | {:.5} | {:.4} | {:.3} | {} | {} |\n",
                result.group,
                result.coefficient,
                result.std_error,
                result.p_value,
                result.r_squared,
                result.n_obs,
                result.n_entities
            ));
        }

        if !self.skipped.is_empty() {
            output.push_str("\n## Skipped\n\n");
            for skipped in &self.skipped {
                output.push_str(&format!(
                    "- **{}**: {} ({} rows, {} entities)\n",
                    skipped.group, skipped.reason, skipped.rows, skipped.entities
                ));
            }
        }

        output
    }
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ascii_table())
    }
}

fn nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}
