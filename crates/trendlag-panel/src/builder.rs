//! End-to-end panel construction from two wide tables.

use crate::derive::{derive_frame, derived_rows, filter_complete};
use crate::reshape::{VALUE, join_frames, melt_frame};
use crate::rows::{DerivedPanelRow, RegressionRow};
use polars::prelude::*;
use std::collections::BTreeSet;
use trendlag_data::{Result, WideQuarterlyTable};

/// Builds a regression panel with a fixed attention lag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelBuilder {
    lag: usize,
}

impl PanelBuilder {
    /// Create a builder that lags attention by `lag` quarters.
    pub const fn new(lag: usize) -> Self {
        Self { lag }
    }

    /// Configured lag.
    pub const fn lag(&self) -> usize {
        self.lag
    }

    /// Melt, join, derive and filter.
    pub fn build(
        &self,
        attention: &WideQuarterlyTable,
        price: &WideQuarterlyTable,
    ) -> Result<Panel> {
        let joined = join_frames(melt_frame(attention, VALUE)?, melt_frame(price, VALUE)?);
        let frame = derive_frame(joined, self.lag).collect()?;
        let derived = derived_rows(&frame)?;
        let rows = filter_complete(&derived);

        tracing::debug!(
            lag = self.lag,
            attention_entities = attention.entities().len(),
            price_entities = price.entities().len(),
            joined = derived.len(),
            complete = rows.len(),
            "built panel"
        );

        Ok(Panel {
            lag: self.lag,
            derived,
            rows,
        })
    }
}

/// The derived panel and its regression-ready subset.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    lag: usize,
    derived: Vec<DerivedPanelRow>,
    rows: Vec<RegressionRow>,
}

impl Panel {
    /// Assemble a panel from already-derived rows.
    pub fn from_derived(lag: usize, derived: Vec<DerivedPanelRow>) -> Self {
        let rows = filter_complete(&derived);
        Self { lag, derived, rows }
    }

    /// Lag used to build the panel.
    pub const fn lag(&self) -> usize {
        self.lag
    }

    /// Every joined row, before filtering.
    pub fn derived(&self) -> &[DerivedPanelRow] {
        &self.derived
    }

    /// Rows with both derived values defined.
    pub fn rows(&self) -> &[RegressionRow] {
        &self.rows
    }

    /// Joined rows dropped for an undefined return or lag.
    pub fn dropped(&self) -> usize {
        self.derived.len() - self.rows.len()
    }

    /// Distinct entities among the regression rows.
    pub fn entity_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.entity.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Distinct quarters among the regression rows.
    pub fn period_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.period)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Regression rows as a polars frame:
    /// `entity`, `quarter_end`, `attention_lag`, `log_return`.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let entities: Vec<&str> = self.rows.iter().map(|r| r.entity.as_str()).collect();
        let periods: Vec<_> = self.rows.iter().map(|r| r.period).collect();
        let lags: Vec<f64> = self.rows.iter().map(|r| r.attention_lag).collect();
        let returns: Vec<f64> = self.rows.iter().map(|r| r.log_return).collect();

        DataFrame::new(vec![
            Column::new("entity".into(), entities),
            Column::new("quarter_end".into(), periods),
            Column::new("attention_lag".into(), lags),
            Column::new("log_return".into(), returns),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use trendlag_data::QuarterlySeries;

    fn q(i: usize) -> NaiveDate {
        let (m, d) = [(3, 31), (6, 30), (9, 30), (12, 31)][i % 4];
        NaiveDate::from_ymd_opt(2020 + (i / 4) as i32, m, d).unwrap()
    }

    fn table(columns: &[(&str, Vec<f64>)]) -> WideQuarterlyTable {
        let series: Vec<_> = columns
            .iter()
            .map(|(name, values)| {
                QuarterlySeries::from_points(
                    *name,
                    values.iter().enumerate().map(|(i, v)| (q(i), Some(*v))),
                )
                .unwrap()
            })
            .collect();
        WideQuarterlyTable::from_series(&series).unwrap()
    }

    #[test]
    fn test_build_two_entity_scenario() {
        let prices = table(&[
            ("A", vec![10.0, 11.0, 12.0, 13.0, 14.0]),
            ("B", vec![20.0, 19.0, 18.0, 17.0, 16.0]),
        ]);
        let attention = table(&[("A", vec![5.0; 5]), ("B", vec![5.0; 5])]);

        let panel = PanelBuilder::new(1).build(&attention, &prices).unwrap();
        assert_eq!(panel.derived().len(), 10);
        assert_eq!(panel.rows().len(), 8);
        assert_eq!(panel.dropped(), 2);
        assert_eq!(panel.entity_count(), 2);
        assert_eq!(panel.period_count(), 4);
    }

    #[test]
    fn test_entity_only_in_one_table_is_dropped() {
        let prices = table(&[("A", vec![1.0, 2.0, 3.0]), ("C", vec![1.0, 2.0, 3.0])]);
        let attention = table(&[("A", vec![1.0; 3]), ("B", vec![1.0; 3])]);

        let panel = PanelBuilder::new(0).build(&attention, &prices).unwrap();
        assert!(panel.rows().iter().all(|r| r.entity == "A"));
        assert_eq!(panel.rows().len(), 2);
    }

    #[test]
    fn test_to_dataframe_shape() {
        let prices = table(&[("A", vec![1.0, 2.0, 4.0])]);
        let attention = table(&[("A", vec![3.0; 3])]);
        let panel = PanelBuilder::new(0).build(&attention, &prices).unwrap();

        let df = panel.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names_str(),
            vec!["entity", "quarter_end", "attention_lag", "log_return"]
        );
    }
}
