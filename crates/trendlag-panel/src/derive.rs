//! Per-entity derivation of log returns and lagged attention.
//!
//! Rows are sorted by (entity, quarter) and both shifts run as window
//! expressions over `entity`, so they are row offsets inside one entity's
//! chronological sequence and never cross entities.

use crate::reshape::{
    ATTENTION, ENTITY, PRICE, date_column, float_column, string_column,
};
use crate::rows::{DerivedPanelRow, PanelRow, RegressionRow};
use polars::prelude::*;
use std::f64::consts::E;
use trendlag_data::Result;
use trendlag_data::table::QUARTER_END;

/// Log return column.
pub const LOG_RETURN: &str = "log_return";

/// Lagged attention column.
pub const ATTENTION_LAG: &str = "attention_lag";

/// `ln(price)`, null unless the price is present and positive.
fn log_price() -> Expr {
    when(col(PRICE).gt(lit(0.0)))
        .then(col(PRICE).log(E))
        .otherwise(lit(NULL).cast(DataType::Float64))
}

/// Add `log_return` and `attention_lag` to a joined frame
/// (`entity`, `quarter_end`, `attention`, `price`).
///
/// `log_return` is null at an entity's first row and wherever either price
/// is missing or non-positive. `attention_lag` is null while fewer than `lag`
/// earlier rows exist.
pub fn derive_frame(joined: LazyFrame, lag: usize) -> LazyFrame {
    let lag = i64::try_from(lag).unwrap_or(i64::MAX);
    joined
        .sort([ENTITY, QUARTER_END], SortMultipleOptions::default())
        .with_columns([
            (log_price() - log_price().shift(lit(1)).over([col(ENTITY)])).alias(LOG_RETURN),
            col(ATTENTION)
                .shift(lit(lag))
                .over([col(ENTITY)])
                .alias(ATTENTION_LAG),
        ])
}

/// Keep rows whose log return and lagged attention are both defined.
pub fn complete_frame(derived: LazyFrame) -> LazyFrame {
    derived.filter(
        col(LOG_RETURN)
            .is_not_null()
            .and(col(ATTENTION_LAG).is_not_null()),
    )
}

/// Collect a derived frame into rows, in frame order.
pub fn derived_rows(df: &DataFrame) -> Result<Vec<DerivedPanelRow>> {
    let entities = string_column(df, ENTITY)?;
    let periods = date_column(df, QUARTER_END)?;
    let attention = float_column(df, ATTENTION)?;
    let price = float_column(df, PRICE)?;
    let log_return = float_column(df, LOG_RETURN)?;
    let attention_lag = float_column(df, ATTENTION_LAG)?;

    Ok(entities
        .into_iter()
        .zip(periods)
        .zip(attention.into_iter().zip(price))
        .zip(log_return.into_iter().zip(attention_lag))
        .map(
            |(((entity, period), (attention, price)), (log_return, attention_lag))| {
                DerivedPanelRow {
                    entity,
                    period,
                    attention,
                    price,
                    log_return,
                    attention_lag,
                }
            },
        )
        .collect())
}

/// Derive `log_return` and `attention_lag` per entity.
///
/// The output is ordered by entity, then period.
pub fn derive(rows: &[PanelRow], lag: usize) -> Result<Vec<DerivedPanelRow>> {
    let joined = DataFrame::new(vec![
        Column::new(
            ENTITY.into(),
            rows.iter().map(|r| r.entity.as_str()).collect::<Vec<_>>(),
        ),
        Column::new(
            QUARTER_END.into(),
            rows.iter().map(|r| r.period).collect::<Vec<_>>(),
        ),
        Column::new(
            ATTENTION.into(),
            rows.iter().map(|r| r.attention).collect::<Vec<_>>(),
        ),
        Column::new(
            PRICE.into(),
            rows.iter().map(|r| r.price).collect::<Vec<_>>(),
        ),
    ])?;

    derived_rows(&derive_frame(joined.lazy(), lag).collect()?)
}

/// Keep only rows whose log return and lagged attention are both defined.
pub fn filter_complete(rows: &[DerivedPanelRow]) -> Vec<RegressionRow> {
    rows.iter().filter_map(DerivedPanelRow::complete).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use rstest::rstest;

    fn quarters(n: usize) -> Vec<NaiveDate> {
        [(3, 31), (6, 30), (9, 30), (12, 31)]
            .iter()
            .cycle()
            .take(n)
            .enumerate()
            .map(|(i, (m, day))| NaiveDate::from_ymd_opt(2020 + (i / 4) as i32, *m, *day).unwrap())
            .collect()
    }

    fn entity_rows(entity: &str, prices: &[Option<f64>], attention: &[Option<f64>]) -> Vec<PanelRow> {
        quarters(prices.len())
            .into_iter()
            .zip(prices.iter().zip(attention))
            .map(|(period, (price, attention))| PanelRow {
                entity: entity.to_string(),
                period,
                attention: *attention,
                price: *price,
            })
            .collect()
    }

    #[test]
    fn test_first_return_is_missing_not_zero() {
        let rows = entity_rows("A", &[Some(10.0), Some(10.0)], &[Some(1.0), Some(1.0)]);
        let derived = derive(&rows, 0).unwrap();
        assert_eq!(derived[0].log_return, None);
        assert_eq!(derived[1].log_return, Some(0.0));
    }

    #[test]
    fn test_log_return_values() {
        let rows = entity_rows("A", &[Some(10.0), Some(11.0)], &[None, None]);
        let derived = derive(&rows, 0).unwrap();
        assert_relative_eq!(derived[1].log_return.unwrap(), (11.0f64 / 10.0).ln());
    }

    #[rstest]
    #[case(Some(0.0), Some(1.0))]
    #[case(Some(-1.0), Some(1.0))]
    #[case(Some(1.0), Some(0.0))]
    #[case(None, Some(1.0))]
    #[case(Some(1.0), None)]
    fn test_log_return_undefined(#[case] previous: Option<f64>, #[case] current: Option<f64>) {
        let rows = entity_rows("A", &[previous, current], &[Some(1.0), Some(1.0)]);
        let derived = derive(&rows, 0).unwrap();
        assert_eq!(derived[1].log_return, None);
    }

    #[test]
    fn test_empty_input() {
        assert!(derive(&[], 2).unwrap().is_empty());
    }

    #[test]
    fn test_complete_frame_drops_undefined_rows() {
        let rows = entity_rows("A", &[Some(1.0), Some(2.0), Some(4.0)], &[Some(1.0), None, Some(3.0)]);
        let joined = DataFrame::new(vec![
            Column::new(ENTITY.into(), vec!["A"; 3]),
            Column::new(QUARTER_END.into(), rows.iter().map(|r| r.period).collect::<Vec<_>>()),
            Column::new(ATTENTION.into(), rows.iter().map(|r| r.attention).collect::<Vec<_>>()),
            Column::new(PRICE.into(), rows.iter().map(|r| r.price).collect::<Vec<_>>()),
        ])
        .unwrap();

        // lag 1: row 1 reads attention[0], row 2 reads the missing attention[1].
        let df = complete_frame(derive_frame(joined.lazy(), 1)).collect().unwrap();
        let kept = derived_rows(&df).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].period, rows[1].period);
        assert_relative_eq!(kept[0].log_return.unwrap(), 2.0f64.ln());
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(4)]
    #[case(7)]
    fn test_lag_reads_unfiltered_history(#[case] lag: usize) {
        let attention: Vec<Option<f64>> = vec![Some(1.0), None, Some(3.0), Some(4.0), Some(5.0), Some(6.0)];
        let prices = vec![Some(1.0); attention.len()];
        let rows = entity_rows("A", &prices, &attention);

        let derived = derive(&rows, lag).unwrap();
        for (t, row) in derived.iter().enumerate() {
            let expected = t.checked_sub(lag).and_then(|s| attention[s]);
            assert_eq!(row.attention_lag, expected, "t={} lag={}", t, lag);
        }
    }

    #[test]
    fn test_shift_does_not_cross_entities() {
        let mut rows = entity_rows("A", &[Some(1.0), Some(2.0)], &[Some(10.0), Some(20.0)]);
        rows.extend(entity_rows("B", &[Some(5.0), Some(6.0)], &[Some(30.0), Some(40.0)]));
        // Interleave to make sure grouping does not depend on input order.
        rows.swap(1, 2);

        let derived = derive(&rows, 1).unwrap();
        let b_first = derived.iter().find(|r| r.entity == "B").unwrap();
        assert_eq!(b_first.log_return, None);
        assert_eq!(b_first.attention_lag, None);
    }

    #[test]
    fn test_missing_price_breaks_two_returns() {
        let rows = entity_rows("A", &[Some(1.0), None, Some(3.0), Some(4.0)], &[Some(1.0); 4]);
        let derived = derive(&rows, 0).unwrap();
        let returns: Vec<_> = derived.iter().map(|r| r.log_return.is_some()).collect();
        assert_eq!(returns, vec![false, false, false, true]);
    }

    #[test]
    fn test_two_entity_scenario() {
        let mut rows = entity_rows(
            "A",
            &[Some(10.0), Some(11.0), Some(12.0), Some(13.0), Some(14.0)],
            &[Some(5.0); 5],
        );
        rows.extend(entity_rows(
            "B",
            &[Some(20.0), Some(19.0), Some(18.0), Some(17.0), Some(16.0)],
            &[Some(5.0); 5],
        ));

        let complete = filter_complete(&derive(&rows, 1).unwrap());
        assert_eq!(complete.len(), 8);
        assert_eq!(complete.iter().filter(|r| r.entity == "A").count(), 4);
        assert_eq!(complete.iter().filter(|r| r.entity == "B").count(), 4);
        assert!(complete.iter().all(|r| r.attention_lag == 5.0));
    }
}
