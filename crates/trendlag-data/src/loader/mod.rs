//! Raw file loaders.
//!
//! Each loader turns one per-entity CSV file into a [`QuarterlySeries`],
//! named after the file stem. Prices are resampled with
//! [`ResampleRule::Last`], attention indices with [`ResampleRule::Mean`].
//!
//! [`QuarterlySeries`]: crate::series::QuarterlySeries
//! [`ResampleRule::Last`]: crate::series::ResampleRule::Last
//! [`ResampleRule::Mean`]: crate::series::ResampleRule::Mean

pub mod attention;
pub mod price;
pub mod stitch;

pub use attention::{AttentionCsvOptions, load_attention_csv, parse_attention_csv};
pub use price::{PriceCsvOptions, load_price_csv, parse_price_csv};
pub use stitch::{LoadSkip, SourceKind, StitchOutcome, Stitcher, csv_files, stitch_directory};

use crate::error::{DataError, Result};
use std::path::Path;

/// Entity name for a source file: its stem (`AAPL.csv` -> `AAPL`).
pub fn entity_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DataError::format(path.display().to_string(), "no usable file stem"))
}
