//! Coefficient covariance estimation.
//!
//! The fit and its covariance are separate steps: an [`OlsFit`] is computed
//! once and any [`CovarianceEstimator`] turns it into a covariance matrix and
//! the degrees of freedom for inference.

pub mod cluster;
pub mod naive;

pub use cluster::{ClusterRobustCovariance, cluster_sandwich};
pub use naive::NaiveCovariance;

use crate::design::DesignMatrix;
use crate::error::Result;
use crate::ols::OlsFit;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Trait for coefficient covariance estimators.
pub trait CovarianceEstimator {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Covariance matrix of the coefficients (k × k).
    fn estimate(&self, fit: &OlsFit, design: &DesignMatrix) -> Result<Array2<f64>>;

    /// Degrees of freedom of the Student t reference distribution.
    fn reference_df(&self, fit: &OlsFit, design: &DesignMatrix) -> f64;
}

/// Serializable choice of estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CovarianceKind {
    /// Homoskedastic `s² (X'X)⁻¹`.
    Naive,
    /// Clustered by entity.
    #[default]
    ClusterRobust,
}

impl CovarianceKind {
    /// The estimator this kind selects.
    pub fn estimator(self) -> &'static dyn CovarianceEstimator {
        match self {
            Self::Naive => &NaiveCovariance,
            Self::ClusterRobust => &ClusterRobustCovariance,
        }
    }
}
