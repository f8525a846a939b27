//! Per-group regressions over a partitioned panel.

use crate::config::{AnalysisConfig, ConfigError};
use crate::groups::GroupAssignment;
use std::collections::{BTreeMap, BTreeSet};
use trendlag_model::FixedEffectsEstimator;
use trendlag_output::{OVERALL_GROUP, RegressionResult, SkipReason, SkippedGroup, SummaryTable};
use trendlag_panel::RegressionRow;

/// Partitions regression rows by group and fits each partition.
#[derive(Debug, Clone)]
pub struct GroupAggregator {
    lag: usize,
    min_rows: usize,
    min_entities: usize,
    assignment: GroupAssignment,
    estimator: FixedEffectsEstimator,
}

impl GroupAggregator {
    /// Validate `config` and build an aggregator.
    pub fn new(config: &AnalysisConfig, assignment: GroupAssignment) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            lag: config.lag_quarters()?,
            min_rows: config.min_rows,
            min_entities: config.min_entities,
            assignment,
            estimator: FixedEffectsEstimator::new(config.regression.clone()),
        })
    }

    /// Group table in use.
    pub const fn assignment(&self) -> &GroupAssignment {
        &self.assignment
    }

    /// Split rows by group label. Labels come out sorted.
    pub fn partition<'a>(&self, rows: &'a [RegressionRow]) -> BTreeMap<&str, Vec<&'a RegressionRow>> {
        let mut groups: BTreeMap<&str, Vec<&'a RegressionRow>> = BTreeMap::new();
        for row in rows {
            groups
                .entry(self.assignment.label_for(&row.entity))
                .or_default()
                .push(row);
        }
        groups
    }

    /// Fit every group, then the pooled [`OVERALL_GROUP`].
    ///
    /// Groups that fail a gate or the regression become skip records; the
    /// run itself never fails.
    pub fn run(&self, rows: &[RegressionRow]) -> SummaryTable {
        let mut table = SummaryTable::new(self.lag);

        for (label, members) in self.partition(rows) {
            let members: Vec<RegressionRow> = members.into_iter().cloned().collect();
            record(&mut table, self.evaluate(label, &members));
        }
        record(&mut table, self.evaluate(OVERALL_GROUP, rows));

        tracing::debug!(
            computed = table.results.len(),
            skipped = table.skipped.len(),
            "group aggregation finished"
        );
        table
    }

    /// Gate and fit one group.
    pub fn evaluate(
        &self,
        label: &str,
        rows: &[RegressionRow],
    ) -> Result<RegressionResult, SkippedGroup> {
        let entities = rows
            .iter()
            .map(|r| r.entity.as_str())
            .collect::<BTreeSet<_>>()
            .len();
        let skip = |reason: SkipReason| SkippedGroup {
            group: label.to_string(),
            reason,
            rows: rows.len(),
            entities,
        };

        if rows.len() < self.min_rows {
            return Err(skip(SkipReason::TooFewRows { min: self.min_rows }));
        }
        if entities < self.min_entities {
            return Err(skip(SkipReason::TooFewEntities {
                min: self.min_entities,
            }));
        }

        self.estimator
            .fit(rows)
            .map(|estimate| RegressionResult::from_estimate(label, self.lag, &estimate))
            .map_err(|e| {
                skip(SkipReason::RegressionFailed {
                    message: e.to_string(),
                })
            })
    }
}

fn record(table: &mut SummaryTable, outcome: Result<RegressionResult, SkippedGroup>) {
    match outcome {
        Ok(result) => {
            tracing::debug!(group = %result.group, p_value = result.p_value, "group estimated");
            table.push_result(result);
        }
        Err(skipped) => {
            tracing::info!(
                group = %skipped.group,
                rows = skipped.rows,
                entities = skipped.entities,
                reason = %skipped.reason,
                "skipping group"
            );
            table.push_skip(skipped);
        }
    }
}
