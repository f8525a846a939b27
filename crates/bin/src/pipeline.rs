//! File-level plumbing for the CLI: stitching folders with progress, and
//! reading the combined tables back.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;
use trendlag::data::loader::csv_files;
use trendlag::data::{DataError, SourceKind, StitchOutcome, Stitcher, WideQuarterlyTable};

/// Stitch every CSV file in `dir`, showing a progress bar.
pub(crate) fn stitch_with_progress(
    dir: &Path,
    kind: SourceKind,
) -> Result<StitchOutcome, DataError> {
    let files = csv_files(dir)?;
    let label = kind.label();

    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut stitcher = Stitcher::new(kind);
    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        pb.set_message(format!("Loading {} file {}", label, name));
        stitcher.add_file(path);
        pb.inc(1);
    }
    pb.finish_and_clear();

    stitcher.finish()
}

/// Print a stitch summary and write the table to `output`.
pub(crate) fn write_stitched(outcome: &StitchOutcome, output: &Path) -> Result<(), DataError> {
    outcome.table.write_csv_file(output)?;

    println!(
        "Stitched {} entities over {} quarters -> {}",
        outcome.table.entities().len(),
        outcome.table.height(),
        output.display()
    );
    if !outcome.skipped.is_empty() {
        println!("Skipped {} file(s):", outcome.skipped.len());
        for skip in &outcome.skipped {
            println!("  {:<20} {}", skip.entity, skip.error);
        }
    }
    Ok(())
}

/// Read the combined attention and price tables.
pub(crate) fn read_tables(
    trends: &Path,
    stocks: &Path,
) -> Result<(WideQuarterlyTable, WideQuarterlyTable), DataError> {
    let attention = WideQuarterlyTable::read_csv_file(trends)?;
    let price = WideQuarterlyTable::read_csv_file(stocks)?;
    tracing::debug!(
        attention_entities = attention.entities().len(),
        price_entities = price.entities().len(),
        "loaded combined tables"
    );
    Ok((attention, price))
}
