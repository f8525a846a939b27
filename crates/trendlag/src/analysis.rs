//! End-to-end analyses over attention and price tables.
//!
//! - [`run_general`]: one pooled regression at the configured lag.
//! - [`run_sectors`]: one regression per group, plus the pooled `ALL` row.

use crate::aggregator::GroupAggregator;
use crate::config::{AnalysisConfig, ConfigError};
use crate::groups::GroupAssignment;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trendlag_data::{DataError, WideQuarterlyTable};
use trendlag_output::{
    ExportError, OVERALL_GROUP, RegressionResult, ReportError, SkippedGroup, SummaryTable,
};
use trendlag_panel::{Panel, PanelBuilder};

/// Errors from the analysis runners.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Loading or reshaping failed.
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// Configuration was rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Writing a summary table failed.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Writing a text report failed.
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Size of a built panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelStats {
    /// Rows after the (entity, quarter) inner join.
    pub joined_rows: usize,
    /// Rows with both derived values defined.
    pub regression_rows: usize,
    /// Joined rows without a return or lagged attention.
    pub dropped_rows: usize,
    /// Distinct entities in the regression rows.
    pub entities: usize,
    /// Distinct quarters in the regression rows.
    pub periods: usize,
}

impl From<&Panel> for PanelStats {
    fn from(panel: &Panel) -> Self {
        Self {
            joined_rows: panel.derived().len(),
            regression_rows: panel.rows().len(),
            dropped_rows: panel.dropped(),
            entities: panel.entity_count(),
            periods: panel.period_count(),
        }
    }
}

/// Outcome of [`run_general`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralReport {
    /// Lag used.
    pub lag: usize,
    /// Panel size.
    pub panel: PanelStats,
    /// The pooled estimate, or why it was not computed.
    pub outcome: Result<RegressionResult, SkippedGroup>,
}

impl GeneralReport {
    /// The pooled estimate, if computed.
    pub fn result(&self) -> Option<&RegressionResult> {
        self.outcome.as_ref().ok()
    }

    /// The outcome as a one-row summary table.
    pub fn to_summary_table(&self) -> SummaryTable {
        let mut table = SummaryTable::new(self.lag);
        match &self.outcome {
            Ok(result) => table.push_result(result.clone()),
            Err(skipped) => table.push_skip(skipped.clone()),
        }
        table
    }
}

fn build_panel(
    attention: &WideQuarterlyTable,
    price: &WideQuarterlyTable,
    lag: usize,
) -> Result<Panel, AnalysisError> {
    let panel = PanelBuilder::new(lag).build(attention, price)?;
    tracing::info!(
        lag,
        rows = panel.rows().len(),
        dropped = panel.dropped(),
        entities = panel.entity_count(),
        periods = panel.period_count(),
        "panel ready"
    );
    Ok(panel)
}

/// Pooled fixed-effects regression over every entity.
pub fn run_general(
    attention: &WideQuarterlyTable,
    price: &WideQuarterlyTable,
    config: &AnalysisConfig,
) -> Result<GeneralReport, AnalysisError> {
    let aggregator = GroupAggregator::new(config, GroupAssignment::new())?;
    let lag = config.lag_quarters()?;
    let panel = build_panel(attention, price, lag)?;

    let outcome = aggregator.evaluate(OVERALL_GROUP, panel.rows());
    if let Err(skipped) = &outcome {
        tracing::warn!(reason = %skipped.reason, "pooled regression not estimated");
    }

    Ok(GeneralReport {
        lag,
        panel: PanelStats::from(&panel),
        outcome,
    })
}

/// Per-group regressions, sorted by p-value.
pub fn run_sectors(
    attention: &WideQuarterlyTable,
    price: &WideQuarterlyTable,
    config: &AnalysisConfig,
    assignment: &GroupAssignment,
) -> Result<SummaryTable, AnalysisError> {
    let aggregator = GroupAggregator::new(config, assignment.clone())?;
    let panel = build_panel(attention, price, config.lag_quarters()?)?;

    let mut table = aggregator.run(panel.rows());
    table.sort_by_p_value();
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Months, NaiveDate};
    use trendlag_data::QuarterlySeries;

    fn tables(entities: &[&str], quarters: usize) -> (WideQuarterlyTable, WideQuarterlyTable) {
        let start = NaiveDate::from_ymd_opt(2015, 3, 31).unwrap();
        let mut attention = Vec::new();
        let mut price = Vec::new();
        for (e, entity) in entities.iter().enumerate() {
            let mut level = 100.0;
            let mut a_points = Vec::new();
            let mut p_points = Vec::new();
            for t in 0..quarters {
                let date = start + Months::new(3 * t as u32);
                let a = 50.0 + ((t * 7 + e * 13) % 17) as f64;
                level *= 1.0 + 0.0005 * a + 0.01 * (((t + e) % 5) as f64 - 2.0);
                a_points.push((date, Some(a)));
                p_points.push((date, Some(level)));
            }
            attention.push(QuarterlySeries::from_points(*entity, a_points).unwrap());
            price.push(QuarterlySeries::from_points(*entity, p_points).unwrap());
        }
        (
            WideQuarterlyTable::from_series(&attention).unwrap(),
            WideQuarterlyTable::from_series(&price).unwrap(),
        )
    }

    #[test]
    fn test_run_general() {
        let (attention, price) = tables(&["AAPL", "MSFT", "XOM"], 16);
        let report = run_general(&attention, &price, &AnalysisConfig::general()).unwrap();

        assert_eq!(report.lag, 4);
        assert_eq!(report.panel.joined_rows, 48);
        // First return and four lagged quarters are undefined per entity.
        assert_eq!(report.panel.regression_rows, 3 * 12);
        let result = report.result().unwrap();
        assert_eq!(result.group, OVERALL_GROUP);
        assert_eq!(result.n_obs, 36);
        assert_eq!(report.to_summary_table().results.len(), 1);
    }

    #[test]
    fn test_run_general_single_entity_is_skipped() {
        let (attention, price) = tables(&["AAPL"], 12);
        let report = run_general(&attention, &price, &AnalysisConfig::general()).unwrap();
        assert!(report.result().is_none());
        assert_eq!(report.to_summary_table().skipped.len(), 1);
    }

    #[test]
    fn test_run_sectors() {
        let (attention, price) = tables(&["AAPL", "MSFT", "XOM", "CVX", "CVS"], 20);
        let table = run_sectors(
            &attention,
            &price,
            &AnalysisConfig::sectors(),
            &GroupAssignment::fortune25_sectors(),
        )
        .unwrap();

        assert!(table.get("Tech").is_some());
        assert!(table.get("Petroleum").is_some());
        assert!(table.get(OVERALL_GROUP).is_some());
        assert!(table.get_skip("Pharmacy").is_some());

        let p_values: Vec<f64> = table.results.iter().map(|r| r.p_value).collect();
        assert!(p_values.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_invalid_config_fails_before_work() {
        let (attention, price) = tables(&["AAPL", "MSFT"], 8);
        let config = AnalysisConfig {
            min_entities: 1,
            ..AnalysisConfig::sectors()
        };
        assert!(matches!(
            run_sectors(&attention, &price, &config, &GroupAssignment::new()),
            Err(AnalysisError::Config(ConfigError::TooFewEntities(1)))
        ));
    }
}
