#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/trendlag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregator;
pub mod analysis;
pub mod config;
pub mod groups;

// Re-export main types from sub-crates
pub use trendlag_data as data;
pub use trendlag_model as model;
pub use trendlag_output as output;
pub use trendlag_panel as panel;

pub use aggregator::GroupAggregator;
pub use analysis::{AnalysisError, GeneralReport, PanelStats, run_general, run_sectors};
pub use config::{AnalysisConfig, AnalysisOverrides, ConfigError, RunConfig};
pub use groups::{DEFAULT_GROUP, GroupAssignment};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
