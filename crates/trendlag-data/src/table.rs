//! Wide quarterly tables: one row per quarter-end, one column per entity.

use crate::calendar::{is_quarter_end, parse_timestamp};
use crate::error::{DataError, Result};
use crate::series::QuarterlySeries;
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Name of the period column in the backing frame.
pub const QUARTER_END: &str = "quarter_end";

/// Header used for the period column in CSV files.
pub const QUARTER_END_HEADER: &str = "Quarter_End";

/// Several entities' quarterly series on a shared quarter-end calendar.
///
/// The calendar is the outer union of every member series' quarters; an
/// entity with no entry for a quarter reads as missing there.
#[derive(Debug, Clone)]
pub struct WideQuarterlyTable {
    quarters: Vec<NaiveDate>,
    entities: Vec<String>,
    frame: DataFrame,
}

impl WideQuarterlyTable {
    /// Combine single-entity series into one table.
    ///
    /// Entity names must be unique.
    pub fn from_series(series: &[QuarterlySeries]) -> Result<Self> {
        let quarters: Vec<NaiveDate> = series
            .iter()
            .flat_map(|s| s.quarters())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut seen = BTreeSet::new();
        let mut columns: Vec<Column> = Vec::with_capacity(series.len() + 1);
        columns.push(Column::new(QUARTER_END.into(), quarters.clone()));

        for s in series {
            if s.entity() == QUARTER_END || !seen.insert(s.entity()) {
                return Err(DataError::format(
                    s.entity(),
                    "duplicate or reserved entity name",
                ));
            }
            let values: Vec<Option<f64>> = quarters.iter().map(|q| s.get(*q)).collect();
            columns.push(Column::new(s.entity().into(), values));
        }

        let frame = DataFrame::new(columns)?;
        let entities = series.iter().map(|s| s.entity().to_string()).collect();

        Ok(Self {
            quarters,
            entities,
            frame,
        })
    }

    /// Shared quarter-end calendar, ascending.
    pub fn quarters(&self) -> &[NaiveDate] {
        &self.quarters
    }

    /// Entity names in column order.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    /// Number of quarters (rows).
    pub fn height(&self) -> usize {
        self.quarters.len()
    }

    /// The backing polars frame (`quarter_end` + one `Float64` column per entity).
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Values for `entity`, aligned with [`Self::quarters`].
    pub fn values(&self, entity: &str) -> Result<Vec<Option<f64>>> {
        if !self.entities.iter().any(|e| e == entity) {
            return Err(DataError::MissingData {
                entity: entity.to_string(),
                reason: "not a column of this table".to_string(),
            });
        }
        let column = self.frame.column(entity)?.f64()?;
        Ok(column.into_iter().collect())
    }

    /// Rebuild the single-entity series for `entity`.
    pub fn series(&self, entity: &str) -> Result<QuarterlySeries> {
        let values = self.values(entity)?;
        QuarterlySeries::from_points(entity, self.quarters.iter().copied().zip(values))
    }

    /// Write as CSV: `Quarter_End` then one column per entity, empty cell for missing.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.entities.len() + 1);
        header.push(QUARTER_END_HEADER.to_string());
        header.extend(self.entities.iter().cloned());
        wtr.write_record(&header)?;

        let columns = self
            .entities
            .iter()
            .map(|e| self.values(e))
            .collect::<Result<Vec<_>>>()?;

        for (row, quarter) in self.quarters.iter().enumerate() {
            let mut record = Vec::with_capacity(columns.len() + 1);
            record.push(quarter.format("%Y-%m-%d").to_string());
            for column in &columns {
                record.push(column[row].map(|v| v.to_string()).unwrap_or_default());
            }
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file.
    pub fn write_csv_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(file)
    }

    /// Read a table written by [`Self::write_csv`] (or any CSV with a leading
    /// `Quarter_End` column).
    ///
    /// Unparseable value cells read as missing. A missing period header, an
    /// unparseable period or a period that is not a quarter-end is a
    /// [`DataError::Format`].
    pub fn read_csv<R: Read>(source_name: &str, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let first = headers.get(0).map(|h| h.trim_start_matches('\u{feff}'));
        if !first.is_some_and(|h| h.eq_ignore_ascii_case(QUARTER_END_HEADER)) {
            return Err(DataError::format(
                source_name,
                format!("first column must be {}", QUARTER_END_HEADER),
            ));
        }
        let entities: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut quarters = Vec::new();
        let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); entities.len()];

        for record in rdr.records() {
            let record = record?;
            let raw = record.get(0).unwrap_or_default();
            let quarter = parse_timestamp(raw)
                .map(|p| p.date())
                .filter(|d| is_quarter_end(*d))
                .ok_or_else(|| {
                    DataError::format(source_name, format!("invalid quarter-end {:?}", raw))
                })?;
            quarters.push(quarter);

            for (i, column) in columns.iter_mut().enumerate() {
                column.push(record.get(i + 1).and_then(parse_value));
            }
        }

        let series = entities
            .iter()
            .zip(columns)
            .map(|(entity, values)| {
                QuarterlySeries::from_points(entity.as_str(), quarters.iter().copied().zip(values))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_series(&series)
    }

    /// Read a table from a CSV file.
    pub fn read_csv_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::read_csv(&path.display().to_string(), file)
    }
}

/// Parse a numeric cell. Anything that is not a finite number is missing.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_table() -> WideQuarterlyTable {
        let a = QuarterlySeries::from_points(
            "AAPL",
            [(d(2024, 3, 31), Some(170.0)), (d(2024, 6, 30), Some(210.0))],
        )
        .unwrap();
        let b = QuarterlySeries::from_points(
            "MSFT",
            [(d(2024, 6, 30), Some(400.0)), (d(2024, 9, 30), None)],
        )
        .unwrap();
        WideQuarterlyTable::from_series(&[a, b]).unwrap()
    }

    #[test]
    fn test_outer_union_calendar() {
        let table = sample_table();
        assert_eq!(
            table.quarters(),
            &[d(2024, 3, 31), d(2024, 6, 30), d(2024, 9, 30)]
        );
        assert_eq!(
            table.values("AAPL").unwrap(),
            vec![Some(170.0), Some(210.0), None]
        );
        assert_eq!(
            table.values("MSFT").unwrap(),
            vec![None, Some(400.0), None]
        );
        assert_eq!(table.frame().width(), 3);
    }

    #[test]
    fn test_unknown_entity() {
        let table = sample_table();
        assert!(matches!(
            table.values("GOOG"),
            Err(DataError::MissingData { .. })
        ));
    }

    #[test]
    fn test_duplicate_entity_rejected() {
        let a = QuarterlySeries::from_points("AAPL", [(d(2024, 3, 31), Some(1.0))]).unwrap();
        assert!(WideQuarterlyTable::from_series(&[a.clone(), a]).is_err());
    }

    #[test]
    fn test_csv_round_trip() {
        let table = sample_table();
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();

        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("Quarter_End,AAPL,MSFT"));
        assert!(text.contains("2024-03-31,170,"));

        let back = WideQuarterlyTable::read_csv("mem", buf.as_slice()).unwrap();
        assert_eq!(back.entities(), table.entities());
        assert_eq!(back.quarters(), table.quarters());
        assert_eq!(back.values("MSFT").unwrap(), table.values("MSFT").unwrap());
    }

    #[test]
    fn test_read_csv_coerces_bad_cells() {
        let text = "Quarter_End,AAPL\n2024-03-31,abc\n2024-06-30 00:00:00,5\n";
        let table = WideQuarterlyTable::read_csv("mem", text.as_bytes()).unwrap();
        assert_eq!(table.values("AAPL").unwrap(), vec![None, Some(5.0)]);
    }

    #[test]
    fn test_read_csv_requires_period_header() {
        let text = "Date,AAPL\n2024-03-31,1\n";
        let err = WideQuarterlyTable::read_csv("mem", text.as_bytes()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_read_csv_rejects_mid_quarter_dates() {
        let text = "Quarter_End,AAPL\n2024-03-15,1\n";
        let err = WideQuarterlyTable::read_csv("mem", text.as_bytes()).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("12.5"), Some(12.5));
        assert_eq!(parse_value(" 7 "), Some(7.0));
        assert_eq!(parse_value("1,234"), None);
        assert_eq!(parse_value("<1"), None);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("NaN"), None);
    }
}
