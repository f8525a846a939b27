//! Search-attention exports.
//!
//! These files open with free-form preamble lines (category, region, blank
//! lines) before the real header. The header is the first line that contains
//! the marker token, `Month` for monthly exports.

use super::entity_name;
use crate::calendar::{ParsedTimestamp, parse_month, parse_timestamp};
use crate::error::{DataError, Result};
use crate::series::{Observation, QuarterlySeries, ResampleRule, resample_quarterly};
use crate::table::parse_value;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Options for reading an attention export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionCsvOptions {
    /// Token identifying the header line and the date column (default: `Month`)
    pub marker: String,
}

impl Default for AttentionCsvOptions {
    fn default() -> Self {
        Self {
            marker: "Month".to_string(),
        }
    }
}

/// Load an attention export and resample it to quarterly means.
pub fn load_attention_csv(path: &Path, options: &AttentionCsvOptions) -> Result<QuarterlySeries> {
    let entity = entity_name(path)?;
    let content = std::fs::read_to_string(path)?;
    parse_attention_csv(&entity, &content, options)
}

/// Parse an attention export held in memory.
///
/// Fails with [`DataError::Format`] when no line contains the marker, when
/// the header has no marker column, when there is no value column, or when
/// timezone-aware and naive dates are mixed (`YYYY-MM` cells count as
/// naive). Rows whose date cannot be parsed are dropped; unparseable values
/// (`<1`) become missing.
pub fn parse_attention_csv(
    entity: &str,
    content: &str,
    options: &AttentionCsvOptions,
) -> Result<QuarterlySeries> {
    let content = content.trim_start_matches('\u{feff}');
    let marker = options.marker.as_str();

    let header_offset = header_offset(content, marker).ok_or_else(|| {
        DataError::format(entity, format!("no header line containing {:?}", marker))
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content[header_offset..].as_bytes());

    let headers = rdr.headers()?.clone();
    let date_idx = headers
        .iter()
        .position(|h| h == marker)
        .ok_or_else(|| DataError::format(entity, format!("header has no {:?} column", marker)))?;
    let value_idx = (0..headers.len())
        .find(|&i| i != date_idx)
        .ok_or_else(|| DataError::format(entity, "no value column beside the date column"))?;

    let mut observations = Vec::new();
    let mut dropped = 0usize;
    let mut seen_aware = false;
    let mut seen_naive = false;
    for record in rdr.records() {
        let record = record?;
        let raw_date = record.get(date_idx).unwrap_or_default();
        let parsed = parse_month(raw_date)
            .map(ParsedTimestamp::Naive)
            .or_else(|| parse_timestamp(raw_date));
        let Some(parsed) = parsed else {
            dropped += 1;
            continue;
        };

        if parsed.is_aware() {
            seen_aware = true;
        } else {
            seen_naive = true;
        }
        if seen_aware && seen_naive {
            return Err(DataError::format(
                entity,
                "mixed timezone-aware and naive timestamps",
            ));
        }
        let date = parsed.date();
        observations.push(Observation::new(
            date,
            record.get(value_idx).and_then(parse_value),
        ));
    }

    tracing::debug!(
        entity,
        column = &headers[value_idx],
        rows = observations.len(),
        dropped,
        "parsed attention file"
    );

    Ok(resample_quarterly(entity, &observations, ResampleRule::Mean))
}

/// Byte offset of the first line containing `marker`.
fn header_offset(content: &str, marker: &str) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.contains(marker) {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const EXPORT: &str = "\
Category: All categories

Month,Apple: (United States)
2023-01,60
2023-02,63
2023-03,<1
2023-04,70
";

    #[test]
    fn test_preamble_is_skipped() {
        let series =
            parse_attention_csv("Apple", EXPORT, &AttentionCsvOptions::default()).unwrap();
        assert_relative_eq!(series.get(d(2023, 3, 31)).unwrap(), 61.5);
        assert_relative_eq!(series.get(d(2023, 6, 30)).unwrap(), 70.0);
    }

    #[test]
    fn test_mixed_timezones_is_format_error() {
        let text = "Category: All\n\nMonth,Apple\n2023-01-15 00:00:00-05:00,5\n2023-02,6\n";
        let err = parse_attention_csv("Apple", text, &AttentionCsvOptions::default()).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("mixed"));
    }

    #[test]
    fn test_aware_only_timestamps_are_accepted() {
        let text = "Month,Apple\n2023-01-15 00:00:00-05:00,5\n2023-02-15 00:00:00-05:00,7\n";
        let series = parse_attention_csv("Apple", text, &AttentionCsvOptions::default()).unwrap();
        assert_relative_eq!(series.get(d(2023, 3, 31)).unwrap(), 6.0);
    }

    #[test]
    fn test_missing_marker_is_format_error() {
        let text = "Category: All categories\n\nWeek,Apple\n2023-01-01,5\n";
        let err = parse_attention_csv("Apple", text, &AttentionCsvOptions::default()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_marker_only_in_preamble_text() {
        let text = "Monthly export\nDate,Apple\n2023-01,5\n";
        let err = parse_attention_csv("Apple", text, &AttentionCsvOptions::default()).unwrap_err();
        assert!(err.to_string().contains("header has no"));
    }

    #[test]
    fn test_no_value_column() {
        let text = "Month\n2023-01\n";
        let err = parse_attention_csv("Apple", text, &AttentionCsvOptions::default()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_weekly_marker() {
        let text = "Category: All\n\nWeek,Apple\n2023-01-01,4\n2023-01-08,6\n";
        let options = AttentionCsvOptions {
            marker: "Week".to_string(),
        };
        let series = parse_attention_csv("Apple", text, &options).unwrap();
        assert_relative_eq!(series.get(d(2023, 3, 31)).unwrap(), 5.0);
    }

    #[test]
    fn test_bad_dates_dropped() {
        let text = "Month,Apple\n2023-01,10\nsoon,99\n";
        let series = parse_attention_csv("Apple", text, &AttentionCsvOptions::default()).unwrap();
        assert_eq!(series.get(d(2023, 3, 31)), Some(10.0));
        assert_eq!(series.len(), 1);
    }
}
