#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/trendlag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod calendar;
pub mod error;
pub mod loader;
pub mod series;
pub mod table;

pub use error::{DataError, Result};
pub use loader::{
    AttentionCsvOptions, LoadSkip, PriceCsvOptions, SourceKind, StitchOutcome, Stitcher,
    stitch_directory,
};
pub use series::{Observation, QuarterlySeries, ResampleRule, resample_quarterly};
pub use table::WideQuarterlyTable;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
