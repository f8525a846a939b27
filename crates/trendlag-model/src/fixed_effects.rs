//! Two-way fixed-effects estimator for `log_return ~ attention_lag`.

use crate::covariance::{CovarianceEstimator, CovarianceKind, NaiveCovariance};
use crate::design::{DesignMatrix, REGRESSOR};
use crate::error::{RegressionError, Result};
use crate::ols::{DEFAULT_RANK_TOLERANCE, OlsFit};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use trendlag_panel::RegressionRow;

/// Reference distribution for two-sided p-values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceDistribution {
    /// Standard normal (z statistic).
    #[default]
    Normal,
    /// Student t with the covariance estimator's reference degrees of freedom.
    StudentT,
}

impl ReferenceDistribution {
    /// Two-sided p-value of `statistic`.
    pub fn p_value(self, statistic: f64, df: f64) -> Result<f64> {
        let tail = match self {
            Self::Normal => Normal::new(0.0, 1.0)
                .map_err(|e| RegressionError::Distribution(e.to_string()))?
                .sf(statistic.abs()),
            Self::StudentT => StudentsT::new(0.0, 1.0, df)
                .map_err(|e| RegressionError::Distribution(e.to_string()))?
                .sf(statistic.abs()),
        };
        Ok((2.0 * tail).min(1.0))
    }
}

/// Fixed-effects regression configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedEffectsConfig {
    /// Minimum rows required before fitting (default: 3)
    pub min_observations: usize,

    /// Distribution for p-values (default: normal)
    pub reference_distribution: ReferenceDistribution,

    /// Covariance estimator (default: cluster-robust by entity)
    pub covariance: CovarianceKind,

    /// Relative QR pivot tolerance for rank detection (default: 1e-10)
    pub rank_tolerance: f64,
}

impl Default for FixedEffectsConfig {
    fn default() -> Self {
        Self {
            min_observations: 3,
            reference_distribution: ReferenceDistribution::Normal,
            covariance: CovarianceKind::ClusterRobust,
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }
}

/// Statistics for the `attention_lag` coefficient and the fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedEffectsEstimate {
    /// Coefficient on `attention_lag`.
    pub coefficient: f64,
    /// Standard error from the configured covariance estimator.
    pub std_error: f64,
    /// `coefficient / std_error`.
    pub statistic: f64,
    /// Two-sided p-value.
    pub p_value: f64,
    /// Partial R² of `attention_lag`: `t² / (t² + df_resid)` from the naive t.
    pub partial_r_squared: f64,
    /// Centered R² of the full model.
    pub r_squared: f64,
    /// Rows used.
    pub n_obs: usize,
    /// Distinct entities (clusters).
    pub n_entities: usize,
    /// Distinct periods.
    pub n_periods: usize,
    /// Residual degrees of freedom `n - k`.
    pub df_resid: usize,
    /// Degrees of freedom of the reference distribution.
    pub reference_df: f64,
    /// Covariance estimator used.
    pub covariance: CovarianceKind,
    /// Distribution used for the p-value.
    pub reference_distribution: ReferenceDistribution,
}

/// Fits the two-way fixed-effects model.
#[derive(Debug, Clone, Default)]
pub struct FixedEffectsEstimator {
    config: FixedEffectsConfig,
}

impl FixedEffectsEstimator {
    /// Create an estimator with the given configuration.
    pub const fn new(config: FixedEffectsConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    pub const fn config(&self) -> &FixedEffectsConfig {
        &self.config
    }

    /// Fit with the configured covariance estimator.
    pub fn fit(&self, rows: &[RegressionRow]) -> Result<FixedEffectsEstimate> {
        self.fit_with(rows, self.config.covariance.estimator())
    }

    /// Fit with an explicit covariance estimator.
    ///
    /// The reported `covariance` field keeps the configured kind; callers
    /// plugging in their own estimator should rely on the numbers instead.
    pub fn fit_with(
        &self,
        rows: &[RegressionRow],
        estimator: &dyn CovarianceEstimator,
    ) -> Result<FixedEffectsEstimate> {
        if rows.len() < self.config.min_observations {
            return Err(RegressionError::insufficient(format!(
                "need at least {} observations, got {}",
                self.config.min_observations,
                rows.len()
            )));
        }

        let design = DesignMatrix::build(rows)?;
        let fit = OlsFit::fit(design.x(), design.y(), self.config.rank_tolerance)?;

        let covariance = estimator.estimate(&fit, &design)?;
        let std_error = covariance[[REGRESSOR, REGRESSOR]].sqrt();
        if !(std_error.is_finite() && std_error > 0.0) {
            return Err(RegressionError::insufficient(format!(
                "degenerate standard error for attention_lag ({std_error})"
            )));
        }

        let coefficient = fit.coefficients()[REGRESSOR];
        let statistic = coefficient / std_error;
        let reference_df = estimator.reference_df(&fit, &design);
        let p_value = self
            .config
            .reference_distribution
            .p_value(statistic, reference_df)?;

        let naive = NaiveCovariance.estimate(&fit, &design)?;
        let naive_t = coefficient / naive[[REGRESSOR, REGRESSOR]].sqrt();
        let df_resid = fit.df_resid();
        let partial_r_squared = naive_t.powi(2) / (naive_t.powi(2) + df_resid as f64);

        tracing::debug!(
            estimator = estimator.name(),
            n_obs = design.n_obs(),
            n_params = design.n_params(),
            coefficient,
            std_error,
            p_value,
            "fitted fixed-effects regression"
        );

        Ok(FixedEffectsEstimate {
            coefficient,
            std_error,
            statistic,
            p_value,
            partial_r_squared,
            r_squared: fit.r_squared(),
            n_obs: design.n_obs(),
            n_entities: design.entities().len(),
            n_periods: design.periods().len(),
            df_resid,
            reference_df,
            covariance: self.config.covariance,
            reference_distribution: self.config.reference_distribution,
        })
    }
}
