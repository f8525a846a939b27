#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/trendlag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;
pub mod summary;

pub use export::{ExportError, ExportFormat, Exporter, RecordStatus, SummaryRecord};
pub use report::{RegressionReport, ReportBuilder, ReportError};
pub use summary::{OVERALL_GROUP, RegressionResult, SkipReason, SkippedGroup, SummaryTable};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
