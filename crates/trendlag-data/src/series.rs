//! Per-entity quarterly series and the resampling rules that produce them.

use crate::calendar::{is_quarter_end, next_quarter_end, quarter_end};
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single raw observation at an arbitrary sampling frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar day of the observation (timezone-naive).
    pub date: NaiveDate,
    /// Value, `None` when the source cell was missing or unparseable.
    pub value: Option<f64>,
}

impl Observation {
    /// Create a new observation. Non-finite values are stored as missing.
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self {
            date,
            value: value.filter(|v| v.is_finite()),
        }
    }
}

/// How observations inside one quarter collapse to a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResampleRule {
    /// Latest non-missing observation in the quarter (price-like series).
    Last,
    /// Mean of the non-missing observations in the quarter (index-like series).
    Mean,
}

impl ResampleRule {
    fn reduce(self, values: &[Option<f64>]) -> Option<f64> {
        match self {
            Self::Last => values.iter().rev().find_map(|v| *v),
            Self::Mean => {
                let present: Vec<f64> = values.iter().filter_map(|v| *v).collect();
                if present.is_empty() {
                    None
                } else {
                    Some(present.iter().sum::<f64>() / present.len() as f64)
                }
            }
        }
    }
}

/// One entity's values on a quarter-end calendar.
///
/// Dates are strictly increasing canonical quarter-ends. The series is
/// immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuarterlySeries {
    entity: String,
    points: BTreeMap<NaiveDate, Option<f64>>,
}

impl QuarterlySeries {
    /// Build a series from already-quarterly points.
    ///
    /// Fails with [`DataError::Format`] if a date is not a quarter-end or
    /// appears more than once.
    pub fn from_points<I>(entity: impl Into<String>, points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, Option<f64>)>,
    {
        let entity = entity.into();
        let mut map = BTreeMap::new();

        for (date, value) in points {
            if !is_quarter_end(date) {
                return Err(DataError::format(
                    &entity,
                    format!("{} is not a quarter-end", date),
                ));
            }
            if map.insert(date, value.filter(|v| v.is_finite())).is_some() {
                return Err(DataError::format(
                    &entity,
                    format!("duplicate quarter {}", date),
                ));
            }
        }

        Ok(Self {
            entity,
            points: map,
        })
    }

    /// Entity identifier (ticker or search term).
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Value at `quarter`, `None` when absent or missing.
    pub fn get(&self, quarter: NaiveDate) -> Option<f64> {
        self.points.get(&quarter).copied().flatten()
    }

    /// Whether `quarter` is on this series' calendar (even if its value is missing).
    pub fn contains(&self, quarter: NaiveDate) -> bool {
        self.points.contains_key(&quarter)
    }

    /// Iterate `(quarter_end, value)` in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.points.iter().map(|(d, v)| (*d, *v))
    }

    /// Quarter-ends on this series' calendar.
    pub fn quarters(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.keys().copied()
    }

    /// Number of quarters on the calendar.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the series has no quarters.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of quarters with a present value.
    pub fn count_present(&self) -> usize {
        self.points.values().filter(|v| v.is_some()).count()
    }
}

/// Collapse raw observations onto a contiguous quarter-end calendar.
///
/// Observations are ordered by date (ties keep input order, so the later row
/// wins under [`ResampleRule::Last`]). Every quarter between the first and the
/// last observed quarter gets an entry; quarters without usable values are
/// missing.
pub fn resample_quarterly(
    entity: impl Into<String>,
    observations: &[Observation],
    rule: ResampleRule,
) -> QuarterlySeries {
    let mut sorted = observations.to_vec();
    sorted.sort_by_key(|o| o.date);

    let mut buckets: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
    for obs in &sorted {
        buckets
            .entry(quarter_end(obs.date))
            .or_default()
            .push(obs.value.filter(|v| v.is_finite()));
    }

    let mut points = BTreeMap::new();
    if let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) {
        let mut quarter = first;
        while quarter <= last {
            let value = buckets
                .get(&quarter)
                .and_then(|values| rule.reduce(values));
            points.insert(quarter, value);
            match next_quarter_end(quarter) {
                Some(next) => quarter = next,
                None => break,
            }
        }
    }

    QuarterlySeries {
        entity: entity.into(),
        points,
    }
}
