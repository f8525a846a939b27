//! Cluster-robust (sandwich) covariance, clustered by entity.
//!
//! ```text
//! V = c · B (Σ_g s_g s_g') B
//! where:
//! - B   = (X'X)⁻¹
//! - s_g = Σ_{i∈g} x_i û_i      (score of cluster g)
//! - c   = G/(G-1) · (n-1)/(n-k)
//! ```
//!
//! Observations in one cluster may be arbitrarily correlated; clusters are
//! assumed independent.

use super::CovarianceEstimator;
use crate::design::DesignMatrix;
use crate::error::{RegressionError, Result};
use crate::ols::OlsFit;
use ndarray::{Array1, Array2, Axis};
use std::collections::BTreeMap;

/// Entity-clustered sandwich estimator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterRobustCovariance;

impl CovarianceEstimator for ClusterRobustCovariance {
    fn name(&self) -> &'static str {
        "cluster"
    }

    fn estimate(&self, fit: &OlsFit, design: &DesignMatrix) -> Result<Array2<f64>> {
        cluster_sandwich(
            design.x(),
            fit.residuals(),
            design.clusters(),
            fit.xtx_inv(),
        )
    }

    fn reference_df(&self, _fit: &OlsFit, design: &DesignMatrix) -> f64 {
        design.n_clusters().saturating_sub(1) as f64
    }
}

/// Sandwich covariance for arbitrary cluster ids.
///
/// `clusters[i]` is the cluster of row `i`; ids need not be contiguous.
pub fn cluster_sandwich(
    x: &Array2<f64>,
    residuals: &Array1<f64>,
    clusters: &[usize],
    xtx_inv: &Array2<f64>,
) -> Result<Array2<f64>> {
    let (n, k) = x.dim();
    if residuals.len() != n {
        return Err(RegressionError::DimensionMismatch {
            expected: n,
            actual: residuals.len(),
        });
    }
    if clusters.len() != n {
        return Err(RegressionError::DimensionMismatch {
            expected: n,
            actual: clusters.len(),
        });
    }
    if n <= k {
        return Err(RegressionError::insufficient(
            "no residual degrees of freedom for clustering",
        ));
    }

    let mut scores: BTreeMap<usize, Array1<f64>> = BTreeMap::new();
    for (i, row) in x.axis_iter(Axis(0)).enumerate() {
        let score = scores
            .entry(clusters[i])
            .or_insert_with(|| Array1::zeros(k));
        score.scaled_add(residuals[i], &row);
    }

    let g = scores.len();
    if g < 2 {
        return Err(RegressionError::insufficient(format!(
            "need at least 2 clusters, got {g}"
        )));
    }

    let mut meat = Array2::<f64>::zeros((k, k));
    for score in scores.values() {
        let column = score.view().insert_axis(Axis(1));
        meat += &column.dot(&column.t());
    }

    let g = g as f64;
    let correction = g / (g - 1.0) * (n as f64 - 1.0) / (n - k) as f64;

    Ok(xtx_inv.dot(&meat).dot(xtx_inv) * correction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_intercept_only_by_hand() {
        // B = 1/4, scores = [0, 2], meat = 4, c = 2/1 * 3/3.
        let x = array![[1.0], [1.0], [1.0], [1.0]];
        let u = array![1.0, -1.0, 2.0, 0.0];
        let b = array![[0.25]];
        let v = cluster_sandwich(&x, &u, &[0, 0, 1, 1], &b).unwrap();
        assert_relative_eq!(v[[0, 0]], 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_non_contiguous_cluster_ids() {
        let x = array![[1.0], [1.0], [1.0], [1.0]];
        let u = array![1.0, -1.0, 2.0, 0.0];
        let b = array![[0.25]];
        let a = cluster_sandwich(&x, &u, &[0, 0, 1, 1], &b).unwrap();
        let c = cluster_sandwich(&x, &u, &[7, 7, 3, 3], &b).unwrap();
        assert_relative_eq!(a[[0, 0]], c[[0, 0]]);
    }

    #[test]
    fn test_single_cluster_is_insufficient() {
        let x = array![[1.0], [1.0], [1.0]];
        let u = array![1.0, -1.0, 0.0];
        let b = array![[1.0 / 3.0]];
        let err = cluster_sandwich(&x, &u, &[0, 0, 0], &b).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_symmetric() {
        let x = array![[1.0, 0.5], [1.0, -1.0], [1.0, 2.0], [1.0, 0.1], [1.0, 1.1]];
        let u = array![0.2, -0.4, 0.1, 0.3, -0.2];
        let b = x.t().dot(&x);
        // Any symmetric B keeps the sandwich symmetric.
        let v = cluster_sandwich(&x, &u, &[0, 1, 0, 1, 2], &b).unwrap();
        assert_relative_eq!(v[[0, 1]], v[[1, 0]], epsilon = 1e-12);
    }
}
