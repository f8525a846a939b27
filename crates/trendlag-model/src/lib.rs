#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/trendlag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod covariance;
pub mod design;
pub mod error;
pub mod fixed_effects;
pub mod ols;

pub use covariance::{
    ClusterRobustCovariance, CovarianceEstimator, CovarianceKind, NaiveCovariance,
};
pub use design::DesignMatrix;
pub use error::{RegressionError, Result};
pub use fixed_effects::{
    FixedEffectsConfig, FixedEffectsEstimate, FixedEffectsEstimator, ReferenceDistribution,
};
pub use ols::OlsFit;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
