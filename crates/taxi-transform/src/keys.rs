//! Natural-key extraction and surrogate-key reading.

use polars::prelude::*;
use taxi_common::{column_key_strings, parse_i64};

/// One row's natural-key tuple in canonical text form. Null is a value.
pub type NaturalKey = Vec<Option<String>>;

/// Read the natural-key tuple of every row over `columns`.
///
/// Callers check that the columns exist.
pub(crate) fn natural_key_rows(df: &DataFrame, columns: &[String]) -> PolarsResult<Vec<NaturalKey>> {
    let per_column = columns
        .iter()
        .map(|name| column_key_strings(df.column(name)?))
        .collect::<PolarsResult<Vec<_>>>()?;

    Ok((0..df.height())
        .map(|row| per_column.iter().map(|values| values[row].clone()).collect())
        .collect())
}

/// Read a surrogate-key column as integers, whatever its physical encoding.
pub(crate) fn key_values(column: &Column) -> PolarsResult<Vec<Option<i64>>> {
    Ok(column_key_strings(column)?
        .into_iter()
        .map(|value| value.as_deref().and_then(parse_i64))
        .collect())
}

/// Sequential 1-based surrogate keys.
pub(crate) fn surrogate_keys(name: &str, count: usize) -> Series {
    let keys: Vec<i64> = (1..=count as i64).collect();
    Series::new(name.into(), keys)
}

/// First name in `columns` missing from `df`.
pub(crate) fn first_missing<'a>(df: &DataFrame, columns: &'a [String]) -> Option<&'a String> {
    columns.iter().find(|name| df.column(name).is_err())
}
