//! Classical OLS covariance.

use super::CovarianceEstimator;
use crate::design::DesignMatrix;
use crate::error::Result;
use crate::ols::OlsFit;
use ndarray::Array2;

/// `s² (X'X)⁻¹` with `s² = SSR / (n - k)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveCovariance;

impl CovarianceEstimator for NaiveCovariance {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn estimate(&self, fit: &OlsFit, _design: &DesignMatrix) -> Result<Array2<f64>> {
        Ok(fit.xtx_inv() * fit.sigma_squared())
    }

    fn reference_df(&self, fit: &OlsFit, _design: &DesignMatrix) -> f64 {
        fit.df_resid() as f64
    }
}
