//! Wide-to-long reshaping and the (entity, period) inner join.
//!
//! Both steps are lazy polars pipelines over the wide tables' frames; the
//! row-based functions collect them into [`LongRow`] / [`PanelRow`] values.

use crate::rows::{LongRow, PanelRow};
use chrono::NaiveDate;
use polars::prelude::*;
use trendlag_data::table::QUARTER_END;
use trendlag_data::{DataError, Result, WideQuarterlyTable};

/// Entity column of every long frame.
pub const ENTITY: &str = "entity";

/// Value column of a melted frame.
pub const VALUE: &str = "value";

/// Attention column of a joined frame.
pub const ATTENTION: &str = "attention";

/// Price column of a joined frame.
pub const PRICE: &str = "price";

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Long frame (`entity`, `quarter_end`, `value_name`) from plain columns.
pub(crate) fn long_frame(
    entities: Vec<&str>,
    periods: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
    value_name: &str,
) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Column::new(ENTITY.into(), entities),
        Column::new(QUARTER_END.into(), periods),
        Column::new(value_name.into(), values),
    ])
}

/// Melt a wide table into (`entity`, `quarter_end`, `value_name`), one row per
/// entity per quarter, missing values included.
pub fn melt_frame(table: &WideQuarterlyTable, value_name: &str) -> Result<LazyFrame> {
    if table.entities().is_empty() {
        return Ok(long_frame(Vec::new(), Vec::new(), Vec::new(), value_name)?.lazy());
    }

    let parts: Vec<LazyFrame> = table
        .entities()
        .iter()
        .map(|entity| {
            table.frame().clone().lazy().select([
                lit(entity.as_str()).alias(ENTITY),
                col(QUARTER_END),
                col(entity.as_str()).cast(DataType::Float64).alias(value_name),
            ])
        })
        .collect();

    Ok(concat(parts, UnionArgs::default())?)
}

/// Inner-join melted attention and price frames on (`entity`, `quarter_end`),
/// sorted by entity then quarter.
///
/// Both inputs carry their value under [`VALUE`]; the output names them
/// [`ATTENTION`] and [`PRICE`].
pub fn join_frames(attention: LazyFrame, price: LazyFrame) -> LazyFrame {
    attention
        .select([col(ENTITY), col(QUARTER_END), col(VALUE).alias(ATTENTION)])
        .join(
            price.select([col(ENTITY), col(QUARTER_END), col(VALUE).alias(PRICE)]),
            [col(ENTITY), col(QUARTER_END)],
            [col(ENTITY), col(QUARTER_END)],
            JoinArgs::new(JoinType::Inner),
        )
        .sort([ENTITY, QUARTER_END], SortMultipleOptions::default())
}

/// One row per entity per quarter, missing values included.
///
/// Rows come out grouped by entity (column order), quarters ascending.
pub fn melt(table: &WideQuarterlyTable) -> Result<Vec<LongRow>> {
    let df = melt_frame(table, VALUE)?.collect()?;
    let entities = string_column(&df, ENTITY)?;
    let periods = date_column(&df, QUARTER_END)?;
    let values = float_column(&df, VALUE)?;

    Ok(entities
        .into_iter()
        .zip(periods)
        .zip(values)
        .map(|((entity, period), value)| LongRow {
            entity,
            period,
            value,
        })
        .collect())
}

/// Inner-join attention and price rows on (entity, period).
///
/// Keys present in only one input are dropped. Output is sorted by entity,
/// then period. Keys are expected to be unique per input, as [`melt`]
/// produces them.
pub fn inner_join(attention: &[LongRow], price: &[LongRow]) -> Result<Vec<PanelRow>> {
    let df = join_frames(rows_frame(attention)?.lazy(), rows_frame(price)?.lazy()).collect()?;

    let entities = string_column(&df, ENTITY)?;
    let periods = date_column(&df, QUARTER_END)?;
    let attention = float_column(&df, ATTENTION)?;
    let price = float_column(&df, PRICE)?;

    Ok(entities
        .into_iter()
        .zip(periods)
        .zip(attention.into_iter().zip(price))
        .map(|((entity, period), (attention, price))| PanelRow {
            entity,
            period,
            attention,
            price,
        })
        .collect())
}

fn rows_frame(rows: &[LongRow]) -> PolarsResult<DataFrame> {
    long_frame(
        rows.iter().map(|r| r.entity.as_str()).collect(),
        rows.iter().map(|r| r.period).collect(),
        rows.iter().map(|r| r.value).collect(),
        VALUE,
    )
}

pub(crate) fn string_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    Ok(df
        .column(name)?
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

pub(crate) fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    Ok(df.column(name)?.f64()?.into_iter().collect())
}

pub(crate) fn date_column(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>> {
    let days = df.column(name)?.cast(&DataType::Int32)?;
    days.i32()?
        .into_iter()
        .map(|d| {
            d.and_then(|d| d.checked_add(UNIX_EPOCH_DAYS_FROM_CE))
                .and_then(NaiveDate::from_num_days_from_ce_opt)
                .ok_or_else(|| DataError::format(name, "missing or out-of-range date"))
        })
        .collect()
}
