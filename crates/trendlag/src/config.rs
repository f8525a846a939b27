//! Analysis configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON run file,
//! then command-line overrides. Validation happens once, on the merged
//! result, before any data is read.

use crate::groups::GroupAssignment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use trendlag_model::FixedEffectsConfig;

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Lag must be zero or positive.
    #[error("Invalid lag {0}: must be >= 0")]
    NegativeLag(i64),

    /// The entity gate must admit a regression with entity effects.
    #[error("Invalid min_entities {0}: must be >= 2")]
    TooFewEntities(usize),

    /// The row gate must be positive.
    #[error("Invalid min_rows {0}: must be >= 1")]
    InvalidMinRows(usize),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parse error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Settings for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Attention lag in quarters
    pub lag: i64,

    /// Minimum rows for a group to be estimated
    pub min_rows: usize,

    /// Minimum distinct entities for a group to be estimated
    pub min_entities: usize,

    /// Regression engine settings
    #[serde(default)]
    pub regression: FixedEffectsConfig,
}

impl AnalysisConfig {
    /// Pooled analysis defaults: lag 4, no row gate beyond one row.
    pub fn general() -> Self {
        Self {
            lag: 4,
            min_rows: 1,
            min_entities: 2,
            regression: FixedEffectsConfig::default(),
        }
    }

    /// Per-sector defaults: lag 0, at least 30 rows and 2 entities.
    pub fn sectors() -> Self {
        Self {
            lag: 0,
            min_rows: 30,
            min_entities: 2,
            regression: FixedEffectsConfig::default(),
        }
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lag < 0 {
            return Err(ConfigError::NegativeLag(self.lag));
        }
        if self.min_entities < 2 {
            return Err(ConfigError::TooFewEntities(self.min_entities));
        }
        if self.min_rows == 0 {
            return Err(ConfigError::InvalidMinRows(self.min_rows));
        }
        Ok(())
    }

    /// Validated lag as a row offset.
    pub fn lag_quarters(&self) -> Result<usize, ConfigError> {
        usize::try_from(self.lag).map_err(|_| ConfigError::NegativeLag(self.lag))
    }

    /// Apply any fields set in `overrides`.
    pub fn with_overrides(mut self, overrides: &AnalysisOverrides) -> Self {
        if let Some(lag) = overrides.lag {
            self.lag = lag;
        }
        if let Some(min_rows) = overrides.min_rows {
            self.min_rows = min_rows;
        }
        if let Some(min_entities) = overrides.min_entities {
            self.min_entities = min_entities;
        }
        if let Some(regression) = &overrides.regression {
            self.regression = regression.clone();
        }
        self
    }
}

/// Partial [`AnalysisConfig`]; unset fields keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisOverrides {
    /// Attention lag in quarters.
    pub lag: Option<i64>,
    /// Minimum rows per group.
    pub min_rows: Option<usize>,
    /// Minimum entities per group.
    pub min_entities: Option<usize>,
    /// Regression engine settings.
    pub regression: Option<FixedEffectsConfig>,
}

impl AnalysisOverrides {
    /// Fields of `other` take precedence over `self`.
    pub fn merge(self, other: Self) -> Self {
        Self {
            lag: other.lag.or(self.lag),
            min_rows: other.min_rows.or(self.min_rows),
            min_entities: other.min_entities.or(self.min_entities),
            regression: other.regression.or(self.regression),
        }
    }
}

/// Contents of a `--config` JSON file.
///
/// ```json
/// {
///   "general": { "lag": 4 },
///   "sectors": { "lag": 0, "min_rows": 30, "min_entities": 2 },
///   "groups": { "AAPL": "Tech", "XOM": "Petroleum" }
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Overrides for the pooled analysis.
    pub general: AnalysisOverrides,

    /// Overrides for the per-sector analysis.
    pub sectors: AnalysisOverrides,

    /// Group table; the Fortune-25 sector table when absent.
    pub groups: Option<GroupAssignment>,
}

impl RunConfig {
    /// Parse a run file.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a run file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validated pooled-analysis configuration.
    pub fn general(&self) -> Result<AnalysisConfig, ConfigError> {
        let config = AnalysisConfig::general().with_overrides(&self.general);
        config.validate()?;
        Ok(config)
    }

    /// Validated per-sector configuration.
    pub fn sectors(&self) -> Result<AnalysisConfig, ConfigError> {
        let config = AnalysisConfig::sectors().with_overrides(&self.sectors);
        config.validate()?;
        Ok(config)
    }

    /// Configured group table, or the Fortune-25 sectors.
    pub fn groups(&self) -> GroupAssignment {
        self.groups
            .clone()
            .unwrap_or_else(GroupAssignment::fortune25_sectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use trendlag_model::CovarianceKind;

    #[test]
    fn test_defaults_are_independent() {
        let general = AnalysisConfig::general();
        let sectors = AnalysisConfig::sectors();
        assert_eq!(general.lag, 4);
        assert_eq!(sectors.lag, 0);
        assert_eq!(sectors.min_rows, 30);
        assert_eq!(sectors.min_entities, 2);
        assert!(general.validate().is_ok());
        assert!(sectors.validate().is_ok());
    }

    #[rstest]
    #[case(-1, 30, 2)]
    #[case(0, 30, 1)]
    #[case(0, 30, 0)]
    #[case(2, 0, 2)]
    fn test_validate_rejects(#[case] lag: i64, #[case] min_rows: usize, #[case] min_entities: usize) {
        let config = AnalysisConfig {
            lag,
            min_rows,
            min_entities,
            regression: FixedEffectsConfig::default(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_lag_error() {
        let config = AnalysisConfig {
            lag: -3,
            ..AnalysisConfig::general()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NegativeLag(-3))));
        assert!(config.lag_quarters().is_err());
    }

    #[test]
    fn test_run_config_partial_file() {
        let run = RunConfig::from_json_str(
            r#"{
                "sectors": { "lag": 1, "regression": { "covariance": "naive" } },
                "groups": { "AAPL": "Tech" }
            }"#,
        )
        .unwrap();

        let sectors = run.sectors().unwrap();
        assert_eq!(sectors.lag, 1);
        assert_eq!(sectors.min_rows, 30);
        assert_eq!(sectors.regression.covariance, CovarianceKind::Naive);

        let general = run.general().unwrap();
        assert_eq!(general.lag, 4);
        assert_eq!(run.groups().len(), 1);
    }

    #[test]
    fn test_run_config_defaults_to_fortune25() {
        let run = RunConfig::default();
        assert_eq!(run.groups().len(), 24);
    }

    #[test]
    fn test_run_config_invalid_values() {
        let run = RunConfig::from_json_str(r#"{ "general": { "lag": -2 } }"#).unwrap();
        assert!(matches!(run.general(), Err(ConfigError::NegativeLag(-2))));

        let run = RunConfig::from_json_str(r#"{ "sectors": { "min_entities": 1 } }"#).unwrap();
        assert!(matches!(run.sectors(), Err(ConfigError::TooFewEntities(1))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            RunConfig::from_json_str(r#"{ "genral": {} }"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_merge_prefers_later() {
        let file = AnalysisOverrides {
            lag: Some(2),
            min_rows: Some(10),
            ..Default::default()
        };
        let cli = AnalysisOverrides {
            lag: Some(5),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.lag, Some(5));
        assert_eq!(merged.min_rows, Some(10));
    }
}
