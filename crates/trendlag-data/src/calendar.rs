//! Calendar helpers: quarter-end arithmetic and timestamp normalization.
//!
//! All periods in the workspace are canonical calendar quarter-ends
//! (Mar 31, Jun 30, Sep 30, Dec 31). Raw timestamps are reduced to a
//! timezone-naive calendar day before they are bucketed.

use crate::error::{DataError, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// A timestamp reduced to a calendar day, remembering whether it carried an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedTimestamp {
    /// No UTC offset in the source text.
    Naive(NaiveDate),
    /// Offset present; the day is the wall-clock day in that offset.
    Aware(NaiveDate),
}

impl ParsedTimestamp {
    /// The calendar day, with any offset dropped.
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Naive(d) | Self::Aware(d) => *d,
        }
    }

    /// Whether the source text carried a UTC offset.
    pub const fn is_aware(&self) -> bool {
        matches!(self, Self::Aware(_))
    }
}

/// Parse a single timestamp cell.
///
/// Offsets are stripped by keeping the local wall-clock date, so
/// `2020-03-31 23:00:00-05:00` lands on March 31st.
pub fn parse_timestamp(raw: &str) -> Option<ParsedTimestamp> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(ParsedTimestamp::Aware(dt.naive_local().date()));
    }
    for fmt in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(ParsedTimestamp::Aware(dt.naive_local().date()));
        }
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ParsedTimestamp::Naive(dt.date()));
        }
    }
    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(ParsedTimestamp::Naive(d));
        }
    }

    None
}

/// Parse a `YYYY-MM` month stamp into the first day of that month.
pub fn parse_month(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d").ok()
}

/// Normalize a column of timestamps to calendar days.
///
/// Fails with [`DataError::Format`] when a cell cannot be parsed or when the
/// column mixes offset-aware and naive timestamps.
pub fn normalize_timestamps<'a, I>(source_name: &str, raw: I) -> Result<Vec<NaiveDate>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut dates = Vec::new();
    let mut seen_aware = false;
    let mut seen_naive = false;

    for (row, cell) in raw.into_iter().enumerate() {
        let parsed = parse_timestamp(cell).ok_or_else(|| {
            DataError::format(
                source_name,
                format!("unparseable timestamp {:?} at data row {}", cell, row + 1),
            )
        })?;

        if parsed.is_aware() {
            seen_aware = true;
        } else {
            seen_naive = true;
        }
        if seen_aware && seen_naive {
            return Err(DataError::format(
                source_name,
                "mixed timezone-aware and naive timestamps",
            ));
        }

        dates.push(parsed.date());
    }

    Ok(dates)
}

/// The last calendar day of the quarter containing `date`.
pub fn quarter_end(date: NaiveDate) -> NaiveDate {
    let (month, day) = match date.month0() / 3 {
        0 => (3, 31),
        1 => (6, 30),
        2 => (9, 30),
        _ => (12, 31),
    };
    // Every representable year ends on Dec 31, so this never falls back.
    NaiveDate::from_ymd_opt(date.year(), month, day).unwrap_or(NaiveDate::MAX)
}

/// Whether `date` is a canonical quarter-end.
pub fn is_quarter_end(date: NaiveDate) -> bool {
    quarter_end(date) == date
}

/// The quarter-end immediately after the quarter containing `date`, or `None`
/// past the last representable quarter.
pub fn next_quarter_end(date: NaiveDate) -> Option<NaiveDate> {
    quarter_end(date).succ_opt().map(quarter_end)
}

/// Pandas-style quarter label, e.g. `2024Q3`.
pub fn quarter_label(date: NaiveDate) -> String {
    format!("{}Q{}", date.year(), date.month0() / 3 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[rstest]
    #[case(d(2024, 1, 1), d(2024, 3, 31))]
    #[case(d(2024, 3, 31), d(2024, 3, 31))]
    #[case(d(2024, 4, 1), d(2024, 6, 30))]
    #[case(d(2024, 8, 15), d(2024, 9, 30))]
    #[case(d(2024, 12, 31), d(2024, 12, 31))]
    #[case(d(2023, 11, 2), d(2023, 12, 31))]
    fn test_quarter_end(#[case] input: NaiveDate, #[case] expected: NaiveDate) {
        assert_eq!(quarter_end(input), expected);
        assert!(is_quarter_end(expected));
    }

    #[test]
    fn test_next_quarter_end_rolls_year() {
        assert_eq!(next_quarter_end(d(2023, 12, 31)), Some(d(2024, 3, 31)));
        assert_eq!(next_quarter_end(d(2024, 2, 10)), Some(d(2024, 6, 30)));
    }

    #[test]
    fn test_last_representable_quarter() {
        assert_eq!(quarter_end(NaiveDate::MAX), NaiveDate::MAX);
        assert!(is_quarter_end(NaiveDate::MAX));
        assert_eq!(next_quarter_end(NaiveDate::MAX), None);
    }

    #[test]
    fn test_quarter_label() {
        assert_eq!(quarter_label(d(2024, 9, 30)), "2024Q3");
        assert_eq!(quarter_label(d(2019, 1, 5)), "2019Q1");
    }

    #[rstest]
    #[case("2024-01-02", ParsedTimestamp::Naive(d(2024, 1, 2)))]
    #[case("2024-01-02 00:00:00", ParsedTimestamp::Naive(d(2024, 1, 2)))]
    #[case("2024-01-02 00:00:00-05:00", ParsedTimestamp::Aware(d(2024, 1, 2)))]
    #[case("2024-03-31T23:30:00-05:00", ParsedTimestamp::Aware(d(2024, 3, 31)))]
    #[case("2024-03-31T23:30:00Z", ParsedTimestamp::Aware(d(2024, 3, 31)))]
    fn test_parse_timestamp(#[case] raw: &str, #[case] expected: ParsedTimestamp) {
        assert_eq!(parse_timestamp(raw), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2021-07"), Some(d(2021, 7, 1)));
        assert_eq!(parse_month("July 2021"), None);
    }

    #[test]
    fn test_normalize_mixed_timezones_fails() {
        let raw = ["2024-01-02 00:00:00-05:00", "2024-01-03"];
        let err = normalize_timestamps("MIX.csv", raw).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("mixed"));
    }

    #[test]
    fn test_normalize_uniform_aware() {
        let raw = ["2024-01-02 00:00:00-05:00", "2024-01-03 00:00:00-05:00"];
        let dates = normalize_timestamps("AAPL.csv", raw).unwrap();
        assert_eq!(dates, vec![d(2024, 1, 2), d(2024, 1, 3)]);
    }

    #[test]
    fn test_normalize_unparseable_fails() {
        let err = normalize_timestamps("X.csv", ["2024-01-02", "yesterday"]).unwrap_err();
        assert!(err.to_string().contains("yesterday"));
    }
}
