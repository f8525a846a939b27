//! Design matrix for the two-way fixed-effects specification.
//!
//! Column layout:
//!
//! ```text
//! [ Intercept | attention_lag | entity dummies (E-1) | period dummies (P-1) ]
//! ```
//!
//! Levels are sorted and the first level of each factor is dropped.

use crate::error::{RegressionError, Result};
use chrono::NaiveDate;
use ndarray::{Array1, Array2};
use std::collections::BTreeSet;
use trendlag_panel::RegressionRow;

/// Column index of the regressor of interest.
pub const REGRESSOR: usize = 1;

/// Outcome, regressors and cluster ids for one regression.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    x: Array2<f64>,
    y: Array1<f64>,
    columns: Vec<String>,
    entities: Vec<String>,
    periods: Vec<NaiveDate>,
    clusters: Vec<usize>,
}

impl DesignMatrix {
    /// Build the design from regression rows.
    ///
    /// Fails with `NonFinite` on NaN/∞ input and with `InsufficientData`
    /// when fewer than two entities are present.
    pub fn build(rows: &[RegressionRow]) -> Result<Self> {
        for row in rows {
            if !row.log_return.is_finite() {
                return Err(RegressionError::NonFinite {
                    column: "log_return",
                    entity: row.entity.clone(),
                });
            }
            if !row.attention_lag.is_finite() {
                return Err(RegressionError::NonFinite {
                    column: "attention_lag",
                    entity: row.entity.clone(),
                });
            }
        }

        let entities: Vec<String> = rows
            .iter()
            .map(|r| r.entity.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        if entities.len() < 2 {
            return Err(RegressionError::insufficient(format!(
                "need at least 2 entities, got {}",
                entities.len()
            )));
        }

        let periods: Vec<NaiveDate> = rows
            .iter()
            .map(|r| r.period)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut columns = vec!["Intercept".to_string(), "attention_lag".to_string()];
        columns.extend(entities[1..].iter().map(|e| format!("entity[T.{e}]")));
        columns.extend(periods[1..].iter().map(|p| format!("period[T.{p}]")));

        let entity_offset = 2;
        let period_offset = entity_offset + entities.len() - 1;

        let n = rows.len();
        let mut x = Array2::<f64>::zeros((n, columns.len()));
        let mut y = Array1::<f64>::zeros(n);
        let mut clusters = Vec::with_capacity(n);

        for (i, row) in rows.iter().enumerate() {
            y[i] = row.log_return;
            x[[i, 0]] = 1.0;
            x[[i, REGRESSOR]] = row.attention_lag;

            // Both level lists are sorted and contain every row's key.
            let e = entities.partition_point(|level| level.as_str() < row.entity.as_str());
            let p = periods.partition_point(|level| *level < row.period);
            if e > 0 {
                x[[i, entity_offset + e - 1]] = 1.0;
            }
            if p > 0 {
                x[[i, period_offset + p - 1]] = 1.0;
            }
            clusters.push(e);
        }

        Ok(Self {
            x,
            y,
            columns,
            entities,
            periods,
            clusters,
        })
    }

    /// Regressor matrix (n × k).
    pub const fn x(&self) -> &Array2<f64> {
        &self.x
    }

    /// Outcome vector (n).
    pub const fn y(&self) -> &Array1<f64> {
        &self.y
    }

    /// Column names, in matrix order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Sorted entity levels.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Sorted period levels.
    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    /// Entity index of each row, used as the cluster id.
    pub fn clusters(&self) -> &[usize] {
        &self.clusters
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.x.nrows()
    }

    /// Number of regressors.
    pub fn n_params(&self) -> usize {
        self.x.ncols()
    }

    /// Number of distinct clusters.
    pub fn n_clusters(&self) -> usize {
        self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entity: &str, quarter: u32, r: f64, a: f64) -> RegressionRow {
        let (m, d) = [(3, 31), (6, 30), (9, 30), (12, 31)][quarter as usize];
        RegressionRow {
            entity: entity.to_string(),
            period: NaiveDate::from_ymd_opt(2021, m, d).unwrap(),
            log_return: r,
            attention_lag: a,
        }
    }

    #[test]
    fn test_layout_drops_first_levels() {
        let rows = vec![
            row("B", 1, 0.1, 2.0),
            row("A", 0, 0.2, 3.0),
            row("C", 2, 0.3, 4.0),
            row("A", 2, 0.4, 5.0),
        ];
        let design = DesignMatrix::build(&rows).unwrap();

        assert_eq!(design.entities(), &["A", "B", "C"]);
        assert_eq!(design.periods().len(), 3);
        assert_eq!(design.n_params(), 2 + 2 + 2);
        assert_eq!(design.columns()[2], "entity[T.B]");
        assert_eq!(design.columns()[4], "period[T.2021-06-30]");

        // B in Q2: intercept, regressor, entity B, period Q2.
        assert_eq!(
            design.x().row(0).to_vec(),
            vec![1.0, 2.0, 1.0, 0.0, 1.0, 0.0]
        );
        // A in Q1 is the reference on both factors.
        assert_eq!(
            design.x().row(1).to_vec(),
            vec![1.0, 3.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(design.clusters(), &[1, 0, 2, 0]);
        assert_eq!(design.y()[3], 0.4);
    }

    #[test]
    fn test_single_entity_is_insufficient() {
        let rows = vec![row("A", 0, 0.1, 1.0), row("A", 1, 0.2, 2.0)];
        let err = DesignMatrix::build(&rows).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_non_finite_rejected() {
        let rows = vec![row("A", 0, f64::NAN, 1.0), row("B", 1, 0.2, 2.0)];
        assert!(matches!(
            DesignMatrix::build(&rows),
            Err(RegressionError::NonFinite {
                column: "log_return",
                ..
            })
        ));
    }
}
