//! Polars column and value helpers.
//!
//! The star-schema stages compare values across tables whose columns may have
//! been narrowed independently (an `Int8` in one table, a categorical in
//! another). Everything here reads a column through a canonical form so those
//! comparisons stay stable.

use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;

/// Returns the canonical text form of every value in a column.
///
/// Values are cast through Polars' own `String` conversion, so an integer, its
/// narrowed width and a categorical built from it all yield the same text.
/// Nulls stay `None`.
pub fn column_key_strings(column: &Column) -> PolarsResult<Vec<Option<String>>> {
    let as_text = column.cast(&DataType::String)?;
    let chunked = as_text.str()?;
    Ok(chunked
        .iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Reads a `Datetime` column as epoch milliseconds.
///
/// Returns `None` when the column is not a `Datetime`.
pub fn datetime_millis(column: &Column) -> Option<Vec<Option<i64>>> {
    let DataType::Datetime(unit, _) = column.dtype() else {
        return None;
    };
    let unit = *unit;
    let physical = column.cast(&DataType::Int64).ok()?;
    let values = physical.i64().ok()?;
    Some(
        values
            .iter()
            .map(|value| value.map(|raw| time_unit_to_millis(raw, unit)))
            .collect(),
    )
}

/// Converts a raw physical timestamp in `unit` into milliseconds.
pub fn time_unit_to_millis(raw: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => raw.div_euclid(1_000_000),
        TimeUnit::Microseconds => raw.div_euclid(1_000),
        TimeUnit::Milliseconds => raw,
    }
}

/// Converts epoch milliseconds into a naive (UTC) datetime.
pub fn millis_to_naive(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

fn integral_f64(v: f64) -> Option<i64> {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.0e15 {
        Some(v as i64)
    } else {
        None
    }
}

/// Parses a string as `f64`, returning `None` for invalid or empty strings.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Parses a string as `i64`, returning `None` for invalid or empty strings.
///
/// Integral decimal text such as `"2.0"` is accepted, since that is how a
/// float column renders an integer code.
pub fn parse_i64(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| parse_f64(trimmed).and_then(integral_f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_key_strings_integers() {
        let column = Series::new("code".into(), vec![Some(1i64), None, Some(2)]).into_column();
        let keys = column_key_strings(&column).unwrap();
        assert_eq!(keys, vec![Some("1".to_string()), None, Some("2".to_string())]);
    }

    #[test]
    fn test_column_key_strings_match_across_widths() {
        let wide = Series::new("code".into(), vec![1i64, 7]).into_column();
        let narrow = wide.cast(&DataType::Int8).unwrap();
        assert_eq!(
            column_key_strings(&wide).unwrap(),
            column_key_strings(&narrow).unwrap()
        );
    }

    #[test]
    fn test_datetime_millis_reads_datetime() {
        let column = Series::new("ts".into(), vec![Some(1_000i64), None])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap()
            .into_column();
        assert_eq!(datetime_millis(&column), Some(vec![Some(1_000), None]));
    }

    #[test]
    fn test_datetime_millis_rejects_other_types() {
        let column = Series::new("ts".into(), vec!["2023-01-01"]).into_column();
        assert_eq!(datetime_millis(&column), None);
    }

    #[test]
    fn test_time_unit_to_millis() {
        assert_eq!(time_unit_to_millis(5_000_000, TimeUnit::Nanoseconds), 5);
        assert_eq!(time_unit_to_millis(5_000, TimeUnit::Microseconds), 5);
        assert_eq!(time_unit_to_millis(5, TimeUnit::Milliseconds), 5);
    }

    #[test]
    fn test_millis_to_naive() {
        let dt = millis_to_naive(0).unwrap();
        assert_eq!(dt.to_string(), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_parse_f64() {
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("  3.25  "), Some(3.25));
        assert_eq!(parse_f64("N"), None);
    }

    #[test]
    fn test_parse_i64() {
        assert_eq!(parse_i64("  "), None);
        assert_eq!(parse_i64("42"), Some(42));
        assert_eq!(parse_i64("2.0"), Some(2));
        assert_eq!(parse_i64("2.5"), None);
        assert_eq!(parse_i64("abc"), None);
    }
}
