//! Row types of the long-form panel.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One (entity, quarter) cell of a melted wide table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    /// Entity identifier.
    pub entity: String,
    /// Quarter-end.
    pub period: NaiveDate,
    /// Value, `None` when missing in the wide table.
    pub value: Option<f64>,
}

/// Joined attention and price for one (entity, quarter).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    /// Entity identifier.
    pub entity: String,
    /// Quarter-end.
    pub period: NaiveDate,
    /// Attention index.
    pub attention: Option<f64>,
    /// Price or level.
    pub price: Option<f64>,
}

/// A [`PanelRow`] with the analysis variables attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedPanelRow {
    /// Entity identifier.
    pub entity: String,
    /// Quarter-end.
    pub period: NaiveDate,
    /// Attention index.
    pub attention: Option<f64>,
    /// Price or level.
    pub price: Option<f64>,
    /// `ln(price[t]) - ln(price[t-1])` within the entity.
    pub log_return: Option<f64>,
    /// `attention[t - lag]` within the entity.
    pub attention_lag: Option<f64>,
}

impl DerivedPanelRow {
    /// Both derived values, if defined.
    pub fn complete(&self) -> Option<RegressionRow> {
        match (self.log_return, self.attention_lag) {
            (Some(log_return), Some(attention_lag)) => Some(RegressionRow {
                entity: self.entity.clone(),
                period: self.period,
                log_return,
                attention_lag,
            }),
            _ => None,
        }
    }
}

/// A row eligible for regression: both derived values are defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionRow {
    /// Entity identifier (fixed effect and cluster).
    pub entity: String,
    /// Quarter-end (fixed effect).
    pub period: NaiveDate,
    /// Outcome.
    pub log_return: f64,
    /// Regressor of interest.
    pub attention_lag: f64,
}
