//! Numeric parsing and width selection.
//!
//! The target type of a column is decided from its values alone, never from
//! its current dtype, so a second pass over narrowed output picks the same
//! type again.

use std::collections::HashSet;

use polars::prelude::*;

/// Largest magnitude at which every integer is exactly representable in `f64`.
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Values of a numeric column, split by whether they are all integral.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum NumericValues {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
}

/// Result of scanning a text column for numbers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TextScan {
    /// Every non-null value is numeric (and there is at least one).
    Numeric(NumericValues),
    /// No value looks numeric.
    NotNumeric,
    /// Some values are numeric, some are not.
    Mixed { numeric: usize, other: usize },
    /// The values need a float type, but this integer has no exact `f64` form.
    Inexact { value: String },
}

/// Parse a numeric-looking string.
///
/// Surrounding whitespace is ignored. Empty strings and non-finite spellings
/// ("nan", "inf") are not numeric.
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Scan a text column. Empty strings are treated as missing.
pub(crate) fn scan_text(values: &StringChunked) -> TextScan {
    let mut ints: Vec<Option<i64>> = Vec::with_capacity(values.len());
    let mut floats: Vec<Option<f64>> = Vec::with_capacity(values.len());
    let mut all_int = true;
    let mut numeric = 0usize;
    let mut other = 0usize;
    let mut inexact: Option<String> = None;

    for value in values.iter() {
        let Some(text) = value.filter(|t| !t.trim().is_empty()) else {
            ints.push(None);
            floats.push(None);
            continue;
        };
        match parse_number(text) {
            Some(number) => {
                numeric += 1;
                let as_int = text.trim().parse::<i64>().ok();
                if as_int.is_none() {
                    all_int = false;
                }
                let exact = as_int.is_some_and(|i| i.unsigned_abs() <= MAX_EXACT_F64_INT as u64);
                if inexact.is_none() && is_integer_text(text) && !exact {
                    inexact = Some(text.trim().to_string());
                }
                ints.push(as_int);
                floats.push(Some(number));
            }
            None => {
                other += 1;
                ints.push(None);
                floats.push(None);
            }
        }
    }

    match (numeric, other) {
        (0, _) => TextScan::NotNumeric,
        (_, 0) if all_int => TextScan::Numeric(NumericValues::Int(ints)),
        (_, 0) => match inexact {
            Some(value) => TextScan::Inexact { value },
            None => TextScan::Numeric(refine_floats(floats)),
        },
        (numeric, other) => TextScan::Mixed { numeric, other },
    }
}

/// Optional sign followed by digits only.
fn is_integer_text(text: &str) -> bool {
    let digits = text.trim().trim_start_matches(['+', '-']);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Read a numeric column's values.
///
/// Returns `None` for non-numeric dtypes.
pub(crate) fn numeric_values(column: &Column) -> PolarsResult<Option<NumericValues>> {
    let dtype = column.dtype();
    if dtype.is_integer() {
        let as_i64 = column.cast(&DataType::Int64)?;
        let values = as_i64.i64()?.iter().collect();
        Ok(Some(NumericValues::Int(values)))
    } else if dtype.is_float() {
        let as_f64 = column.cast(&DataType::Float64)?;
        let values = as_f64.f64()?.iter().collect();
        Ok(Some(refine_floats(values)))
    } else {
        Ok(None)
    }
}

/// Floats that are all integral (and exactly representable) become integers.
fn refine_floats(values: Vec<Option<f64>>) -> NumericValues {
    let integral = values
        .iter()
        .flatten()
        .all(|v| v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT_F64_INT);
    if integral {
        NumericValues::Int(values.iter().map(|v| v.map(|f| f as i64)).collect())
    } else {
        NumericValues::Float(values)
    }
}

impl NumericValues {
    /// Smallest dtype holding every value without loss.
    ///
    /// Returns `None` when there are no non-null values to decide from.
    pub(crate) fn narrowest_dtype(&self) -> Option<DataType> {
        match self {
            NumericValues::Int(values) => {
                let mut present = values.iter().flatten().copied();
                let first = present.next()?;
                let (min, max) = present.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
                Some(integer_width(min, max))
            }
            NumericValues::Float(values) => {
                if values.iter().flatten().next().is_none() {
                    return None;
                }
                let fits_f32 = values.iter().flatten().all(|v| round_trips_f32(*v));
                Some(if fits_f32 {
                    DataType::Float32
                } else {
                    DataType::Float64
                })
            }
        }
    }

    /// Number of distinct non-null values.
    pub(crate) fn distinct_count(&self) -> usize {
        match self {
            NumericValues::Int(values) => values.iter().flatten().collect::<HashSet<_>>().len(),
            NumericValues::Float(values) => values
                .iter()
                .flatten()
                .map(|v| v.to_bits())
                .collect::<HashSet<_>>()
                .len(),
        }
    }

    /// Build a series of the given numeric dtype.
    pub(crate) fn to_series(&self, name: PlSmallStr, dtype: &DataType) -> PolarsResult<Series> {
        let series = match self {
            NumericValues::Int(values) => Series::new(name, values.clone()),
            NumericValues::Float(values) => Series::new(name, values.clone()),
        };
        series.cast(dtype)
    }
}

fn integer_width(min: i64, max: i64) -> DataType {
    let fits = |lo: i64, hi: i64| min >= lo && max <= hi;
    if fits(i64::from(i8::MIN), i64::from(i8::MAX)) {
        DataType::Int8
    } else if fits(i64::from(i16::MIN), i64::from(i16::MAX)) {
        DataType::Int16
    } else if fits(i64::from(i32::MIN), i64::from(i32::MAX)) {
        DataType::Int32
    } else {
        DataType::Int64
    }
}

fn round_trips_f32(value: f64) -> bool {
    if value.is_nan() {
        return true;
    }
    f64::from(value as f32) == value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(values: &[Option<&str>]) -> StringChunked {
        StringChunked::from_iter_options("t".into(), values.iter().copied())
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 12 "), Some(12.0));
        assert_eq!(parse_number("-0.5"), Some(-0.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("inf"), None);
    }

    #[test]
    fn test_scan_integers() {
        let scan = scan_text(&text(&[Some("1"), None, Some(" 2 "), Some("")]));
        assert_eq!(
            scan,
            TextScan::Numeric(NumericValues::Int(vec![Some(1), None, Some(2), None]))
        );
    }

    #[test]
    fn test_scan_integral_decimals_become_int() {
        let scan = scan_text(&text(&[Some("1.0"), Some("2.00")]));
        assert_eq!(
            scan,
            TextScan::Numeric(NumericValues::Int(vec![Some(1), Some(2)]))
        );
    }

    #[test]
    fn test_scan_mixed_and_text() {
        assert_eq!(
            scan_text(&text(&[Some("1"), Some("N"), Some("2")])),
            TextScan::Mixed {
                numeric: 2,
                other: 1
            }
        );
        assert_eq!(
            scan_text(&text(&[Some("N"), Some("Y")])),
            TextScan::NotNumeric
        );
        assert_eq!(scan_text(&text(&[None, None])), TextScan::NotNumeric);
    }

    #[test]
    fn test_scan_large_integers_stay_integers() {
        let scan = scan_text(&text(&[Some("9007199254740993"), Some("1")]));
        assert_eq!(
            scan,
            TextScan::Numeric(NumericValues::Int(vec![Some(9_007_199_254_740_993), Some(1)]))
        );
    }

    #[test]
    fn test_scan_large_integer_with_decimal_is_inexact() {
        assert_eq!(
            scan_text(&text(&[Some("9007199254740993"), Some("1.5")])),
            TextScan::Inexact {
                value: "9007199254740993".to_string()
            }
        );
        assert_eq!(
            scan_text(&text(&[Some("99999999999999999999"), Some("2")])),
            TextScan::Inexact {
                value: "99999999999999999999".to_string()
            }
        );
        // Exactly 2^53 still has an exact float form.
        assert!(matches!(
            scan_text(&text(&[Some("9007199254740992"), Some("1.5")])),
            TextScan::Numeric(NumericValues::Float(_))
        ));
    }

    #[test]
    fn test_integer_widths() {
        let width = |values: Vec<Option<i64>>| NumericValues::Int(values).narrowest_dtype();
        assert_eq!(width(vec![Some(1), Some(-128)]), Some(DataType::Int8));
        assert_eq!(width(vec![Some(128)]), Some(DataType::Int16));
        assert_eq!(width(vec![Some(40_000)]), Some(DataType::Int32));
        assert_eq!(width(vec![Some(3_000_000_000)]), Some(DataType::Int64));
        assert_eq!(width(vec![None]), None);
    }

    #[test]
    fn test_float_widths() {
        let width = |values: Vec<Option<f64>>| NumericValues::Float(values).narrowest_dtype();
        assert_eq!(width(vec![Some(0.5), Some(2.25)]), Some(DataType::Float32));
        assert_eq!(width(vec![Some(0.1)]), Some(DataType::Float64));
        assert_eq!(width(vec![Some(40.765151977539062)]), Some(DataType::Float32));
    }

    #[test]
    fn test_float_column_with_integral_values_narrows_to_int() {
        let column = Series::new("f".into(), &[1.0f64, 2.0, 3.0]).into_column();
        let values = numeric_values(&column).unwrap().unwrap();
        assert_eq!(values.narrowest_dtype(), Some(DataType::Int8));
    }

    #[test]
    fn test_distinct_count_ignores_nulls() {
        let values = NumericValues::Int(vec![Some(1), Some(1), None, Some(2)]);
        assert_eq!(values.distinct_count(), 2);
    }
}
