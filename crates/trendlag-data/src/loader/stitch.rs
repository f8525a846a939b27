//! Combining a folder of per-entity files into one wide table.
//!
//! A file that fails to load never aborts the stitch: it is recorded as a
//! [`LoadSkip`], logged, and the remaining files are processed.

use super::{AttentionCsvOptions, PriceCsvOptions, entity_name, load_attention_csv, load_price_csv};
use crate::error::{DataError, Result};
use crate::series::QuarterlySeries;
use crate::table::WideQuarterlyTable;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Which loader to apply to each file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// Daily prices, quarterly last close.
    Price(PriceCsvOptions),
    /// Monthly attention index, quarterly mean.
    Attention(AttentionCsvOptions),
}

impl SourceKind {
    /// Short name for logs.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Price(_) => "price",
            Self::Attention(_) => "attention",
        }
    }

    fn load(&self, path: &Path) -> Result<QuarterlySeries> {
        match self {
            Self::Price(options) => load_price_csv(path, options),
            Self::Attention(options) => load_attention_csv(path, options),
        }
    }
}

/// A file that was left out of the stitched table.
#[derive(Debug)]
pub struct LoadSkip {
    /// Entity the file would have contributed (file stem, or the path if none).
    pub entity: String,
    /// Source file.
    pub path: PathBuf,
    /// Why it was skipped.
    pub error: DataError,
}

/// Result of a stitch: the combined table plus every skipped file.
#[derive(Debug)]
pub struct StitchOutcome {
    /// Combined quarterly table.
    pub table: WideQuarterlyTable,
    /// Files that did not contribute.
    pub skipped: Vec<LoadSkip>,
}

/// Incremental stitcher, fed one file at a time.
#[derive(Debug)]
pub struct Stitcher {
    kind: SourceKind,
    series: Vec<QuarterlySeries>,
    entities: HashSet<String>,
    skipped: Vec<LoadSkip>,
}

impl Stitcher {
    /// Create an empty stitcher for `kind` files.
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            series: Vec::new(),
            entities: HashSet::new(),
            skipped: Vec::new(),
        }
    }

    /// Load one file. Returns `true` if it contributed a series.
    pub fn add_file(&mut self, path: &Path) -> bool {
        let entity = entity_name(path).unwrap_or_else(|_| path.display().to_string());

        let loaded = if self.entities.contains(&entity) {
            Err(DataError::format(
                path.display().to_string(),
                format!("entity {} already loaded", entity),
            ))
        } else {
            self.kind.load(path)
        };

        match loaded {
            Ok(series) => {
                self.entities.insert(entity);
                self.series.push(series);
                true
            }
            Err(error) => {
                tracing::warn!(
                    kind = self.kind.label(),
                    entity = %entity,
                    path = %path.display(),
                    error = %error,
                    "skipping file"
                );
                self.skipped.push(LoadSkip {
                    entity,
                    path: path.to_path_buf(),
                    error,
                });
                false
            }
        }
    }

    /// Number of files loaded so far.
    pub fn loaded(&self) -> usize {
        self.series.len()
    }

    /// Files skipped so far.
    pub fn skipped(&self) -> &[LoadSkip] {
        &self.skipped
    }

    /// Combine the loaded series.
    ///
    /// Fails with [`DataError::MissingData`] if no file loaded.
    pub fn finish(self) -> Result<StitchOutcome> {
        if self.series.is_empty() {
            return Err(DataError::MissingData {
                entity: "batch".to_string(),
                reason: format!(
                    "no {} file loaded ({} skipped)",
                    self.kind.label(),
                    self.skipped.len()
                ),
            });
        }

        let table = WideQuarterlyTable::from_series(&self.series)?;
        tracing::info!(
            kind = self.kind.label(),
            entities = table.entities().len(),
            quarters = table.height(),
            skipped = self.skipped.len(),
            "stitched quarterly table"
        );

        Ok(StitchOutcome {
            table,
            skipped: self.skipped,
        })
    }
}

/// `*.csv` files directly under `dir`, sorted by path.
pub fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load every CSV file under `dir` and stitch them into one table.
pub fn stitch_directory(dir: &Path, kind: SourceKind) -> Result<StitchOutcome> {
    let mut stitcher = Stitcher::new(kind);
    for path in csv_files(dir)? {
        stitcher.add_file(&path);
    }
    stitcher.finish()
}
