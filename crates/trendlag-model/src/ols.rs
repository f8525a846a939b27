//! Ordinary least squares via Householder QR.
//!
//! For `X = QR`, the coefficients solve `Rβ = Q'y` and
//! `(X'X)⁻¹ = R⁻¹R⁻ᵀ`. The normal equations are never formed.

use crate::error::{RegressionError, Result};
use ndarray::{Array1, Array2, s};

/// Default relative tolerance on `|R_ii|` below which a column is
/// considered linearly dependent.
pub const DEFAULT_RANK_TOLERANCE: f64 = 1e-10;

/// A fitted OLS model.
#[derive(Debug, Clone)]
pub struct OlsFit {
    coefficients: Array1<f64>,
    residuals: Array1<f64>,
    xtx_inv: Array2<f64>,
    r_squared: f64,
}

impl OlsFit {
    /// Fit `y ~ X`.
    ///
    /// Requires `n > k` and a full-column-rank `X`; otherwise fails with
    /// `InsufficientData`.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, rank_tolerance: f64) -> Result<Self> {
        let (n, k) = x.dim();
        if y.len() != n {
            return Err(RegressionError::DimensionMismatch {
                expected: n,
                actual: y.len(),
            });
        }
        if n <= k {
            return Err(RegressionError::insufficient(format!(
                "{n} observations for {k} parameters leaves no residual degrees of freedom"
            )));
        }

        let (r, qty) = householder_qr(x, y);

        let max_diag = (0..k).map(|j| r[[j, j]].abs()).fold(0.0, f64::max);
        if let Some(j) = (0..k).find(|&j| r[[j, j]].abs() <= rank_tolerance * max_diag) {
            return Err(RegressionError::insufficient(format!(
                "design matrix is rank deficient at column {j}"
            )));
        }

        let coefficients = back_substitute(&r, &qty);
        let r_inv = upper_triangular_inverse(&r);
        let xtx_inv = r_inv.dot(&r_inv.t());

        let residuals = y - &x.dot(&coefficients);
        let ssr = residuals.dot(&residuals);
        let mean = y.sum() / n as f64;
        let sst: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
        let r_squared = if sst > 0.0 { 1.0 - ssr / sst } else { f64::NAN };

        Ok(Self {
            coefficients,
            residuals,
            xtx_inv,
            r_squared,
        })
    }

    /// Estimated coefficients.
    pub const fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// `y - Xβ`.
    pub const fn residuals(&self) -> &Array1<f64> {
        &self.residuals
    }

    /// `(X'X)⁻¹`.
    pub const fn xtx_inv(&self) -> &Array2<f64> {
        &self.xtx_inv
    }

    /// Centered R². NaN when the outcome has no variance.
    pub const fn r_squared(&self) -> f64 {
        self.r_squared
    }

    /// Number of observations.
    pub fn n_obs(&self) -> usize {
        self.residuals.len()
    }

    /// Number of parameters.
    pub fn n_params(&self) -> usize {
        self.coefficients.len()
    }

    /// `n - k`.
    pub fn df_resid(&self) -> usize {
        self.n_obs() - self.n_params()
    }

    /// Sum of squared residuals.
    pub fn ssr(&self) -> f64 {
        self.residuals.dot(&self.residuals)
    }

    /// Residual variance `SSR / (n - k)`.
    pub fn sigma_squared(&self) -> f64 {
        self.ssr() / self.df_resid() as f64
    }
}

/// Reduce `x` to upper-triangular `R` (k × k) and apply the same
/// reflections to `y`, returning the first `k` entries of `Q'y`.
fn householder_qr(x: &Array2<f64>, y: &Array1<f64>) -> (Array2<f64>, Array1<f64>) {
    let (n, k) = x.dim();
    let mut a = x.to_owned();
    let mut b = y.to_owned();

    for j in 0..k {
        let norm = a.slice(s![j.., j]).dot(&a.slice(s![j.., j])).sqrt();
        if norm == 0.0 {
            continue;
        }
        let alpha = if a[[j, j]] > 0.0 { -norm } else { norm };

        let mut v = a.slice(s![j.., j]).to_owned();
        v[0] -= alpha;
        let v_norm2 = v.dot(&v);
        if v_norm2 == 0.0 {
            continue;
        }

        for c in j..k {
            let proj = 2.0 * v.dot(&a.slice(s![j.., c])) / v_norm2;
            for i in j..n {
                a[[i, c]] -= proj * v[i - j];
            }
        }
        let proj = 2.0 * v.dot(&b.slice(s![j..])) / v_norm2;
        for i in j..n {
            b[i] -= proj * v[i - j];
        }
    }

    (a.slice(s![..k, ..]).to_owned(), b.slice(s![..k]).to_owned())
}

/// Solve `R z = b` for upper-triangular `R` with a nonzero diagonal.
fn back_substitute(r: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let k = b.len();
    let mut z = Array1::<f64>::zeros(k);
    for i in (0..k).rev() {
        let tail: f64 = ((i + 1)..k).map(|j| r[[i, j]] * z[j]).sum();
        z[i] = (b[i] - tail) / r[[i, i]];
    }
    z
}

fn upper_triangular_inverse(r: &Array2<f64>) -> Array2<f64> {
    let k = r.nrows();
    let mut inv = Array2::<f64>::zeros((k, k));
    for col in 0..k {
        let mut e = Array1::<f64>::zeros(k);
        e[col] = 1.0;
        inv.column_mut(col).assign(&back_substitute(r, &e));
    }
    inv
}
