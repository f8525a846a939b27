#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/trendlag/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod builder;
pub mod derive;
pub mod reshape;
pub mod rows;

pub use builder::{Panel, PanelBuilder};
pub use derive::{complete_frame, derive, derive_frame, derived_rows, filter_complete};
pub use reshape::{inner_join, join_frames, melt, melt_frame};
pub use rows::{DerivedPanelRow, LongRow, PanelRow, RegressionRow};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
