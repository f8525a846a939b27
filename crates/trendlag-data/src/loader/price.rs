//! Daily price files (`Date`, ..., `Close`, ...).

use super::entity_name;
use crate::calendar::normalize_timestamps;
use crate::error::{DataError, Result};
use crate::series::{Observation, QuarterlySeries, ResampleRule, resample_quarterly};
use crate::table::parse_value;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Column names used to read a price file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCsvOptions {
    /// Timestamp column (default: `Date`)
    pub date_column: String,
    /// Price column (default: `Close`)
    pub value_column: String,
}

impl Default for PriceCsvOptions {
    fn default() -> Self {
        Self {
            date_column: "Date".to_string(),
            value_column: "Close".to_string(),
        }
    }
}

/// Load a price file and resample it to quarter-end closes.
pub fn load_price_csv(path: &Path, options: &PriceCsvOptions) -> Result<QuarterlySeries> {
    let entity = entity_name(path)?;
    let file = File::open(path)?;
    parse_price_csv(&entity, file, options)
}

/// Parse price rows from `reader` for `entity`.
///
/// Unparseable prices become missing. Unparseable or mixed-offset timestamps
/// fail the whole file with [`DataError::Format`].
pub fn parse_price_csv<R: Read>(
    entity: &str,
    reader: R,
    options: &PriceCsvOptions,
) -> Result<QuarterlySeries> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| DataError::format(entity, format!("missing {:?} column", name)))
    };
    let date_idx = find(&options.date_column)?;
    let value_idx = find(&options.value_column)?;

    let mut raw_dates = Vec::new();
    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record?;
        raw_dates.push(record.get(date_idx).unwrap_or_default().to_string());
        values.push(record.get(value_idx).and_then(parse_value));
    }

    let dates = normalize_timestamps(entity, raw_dates.iter().map(String::as_str))?;
    let observations: Vec<Observation> = dates
        .into_iter()
        .zip(values)
        .map(|(date, value)| Observation::new(date, value))
        .collect();

    tracing::debug!(entity, rows = observations.len(), "parsed price file");

    Ok(resample_quarterly(entity, &observations, ResampleRule::Last))
}
