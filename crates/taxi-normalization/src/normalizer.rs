//! Column type normalization.
//!
//! Every column runs through the same ordered rules:
//!
//! 1. Temporal, boolean and categorical columns are left alone.
//! 2. Text columns holding only numeric-looking values are parsed; text that
//!    mixes numbers with other values is a per-column failure.
//! 3. Numeric values are narrowed to the smallest lossless width.
//! 4. Low-cardinality numeric columns are dictionary-encoded unless listed in
//!    `keep_numeric`.

use polars::prelude::*;
use taxi_model::NormalizeOptions;

use crate::categorical::{encode_categorical, is_categorical};
use crate::error::NormalizationError;
use crate::numeric::{NumericValues, TextScan, numeric_values, scan_text};
use crate::types::{ColumnOutcome, ColumnReport, NormalizationReport};

/// Normalize the column types of `df`.
///
/// Returns a new frame; `df` is not modified. Parse failures are recorded in
/// the report and never abort the pass.
pub fn normalize_types(
    df: &DataFrame,
    options: &NormalizeOptions,
) -> Result<(DataFrame, NormalizationReport), NormalizationError> {
    let threshold = options.categorical_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(NormalizationError::InvalidThreshold(threshold));
    }

    let height = df.height();
    let mut columns: Vec<Column> = Vec::with_capacity(df.width());
    let mut reports: Vec<ColumnReport> = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let (normalized, outcome) = normalize_column(column, height, options)?;
        if let ColumnOutcome::Converted { from, to } = &outcome {
            tracing::debug!(column = %column.name(), %from, %to, "Converted column");
        }
        columns.push(normalized);
        reports.push(ColumnReport {
            column: column.name().to_string(),
            outcome,
        });
    }

    let normalized = DataFrame::new(columns)?;
    let report = NormalizationReport {
        bytes_before: df.estimated_size(),
        bytes_after: normalized.estimated_size(),
        columns: reports,
    };

    tracing::info!(
        columns = report.columns.len(),
        converted = report.converted_count(),
        failed = report.failed().count(),
        bytes_before = report.bytes_before,
        bytes_after = report.bytes_after,
        "Normalized column types"
    );

    Ok((normalized, report))
}

fn normalize_column(
    column: &Column,
    height: usize,
    options: &NormalizeOptions,
) -> Result<(Column, ColumnOutcome), NormalizationError> {
    let dtype = column.dtype();
    let unchanged = || Ok((column.clone(), ColumnOutcome::Unchanged));

    if dtype.is_temporal() || dtype == &DataType::Boolean || is_categorical(dtype) {
        return unchanged();
    }

    let values = if dtype == &DataType::String {
        match scan_text(column.str()?) {
            TextScan::Numeric(values) => values,
            TextScan::NotNumeric => return unchanged(),
            TextScan::Mixed { numeric, other } => {
                tracing::warn!(
                    column = %column.name(),
                    numeric,
                    other,
                    "Column mixes numeric and non-numeric text, keeping it as text"
                );
                let reason = format!(
                    "{other} of {} non-null values are not numeric",
                    numeric + other
                );
                return Ok((column.clone(), ColumnOutcome::Failed { reason }));
            }
            TextScan::Inexact { value } => {
                tracing::warn!(
                    column = %column.name(),
                    value = %value,
                    "Integer exceeds exact float range, keeping the column as text"
                );
                let reason = format!("integer {value} has no exact floating-point form");
                return Ok((column.clone(), ColumnOutcome::Failed { reason }));
            }
        }
    } else {
        match numeric_values(column)? {
            Some(values) => values,
            None => return unchanged(),
        }
    };

    let Some(width) = values.narrowest_dtype() else {
        return unchanged();
    };

    let mut series = values.to_series(column.name().clone(), &width)?;
    if should_encode(column.name().as_str(), &values, height, options) {
        series = encode_categorical(&series)?;
    }

    if series.dtype() == dtype {
        return unchanged();
    }

    let to = series.dtype().clone();
    Ok((
        series.into_column(),
        ColumnOutcome::Converted {
            from: dtype.clone(),
            to,
        },
    ))
}

fn should_encode(
    name: &str,
    values: &NumericValues,
    height: usize,
    options: &NormalizeOptions,
) -> bool {
    if height == 0 || options.keep_numeric.contains(name) {
        return false;
    }
    let ratio = values.distinct_count() as f64 / height as f64;
    ratio < options.categorical_threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(threshold: f64) -> NormalizeOptions {
        NormalizeOptions::new().with_categorical_threshold(threshold)
    }

    fn dtype_of<'a>(df: &'a DataFrame, name: &str) -> &'a DataType {
        df.column(name).unwrap().dtype()
    }

    #[test]
    fn narrows_integers_and_floats() {
        let df = df!(
            "small" => [1i64, 2, 3, 4],
            "wide" => [1i64, 70_000, 3, 4],
            "half" => [0.5f64, 1.25, 2.0, 3.5],
            "tenth" => [0.1f64, 0.2, 0.3, 0.4],
        )
        .unwrap();

        let (out, report) = normalize_types(&df, &options(0.0)).unwrap();
        assert_eq!(dtype_of(&out, "small"), &DataType::Int8);
        assert_eq!(dtype_of(&out, "wide"), &DataType::Int32);
        assert_eq!(dtype_of(&out, "half"), &DataType::Float32);
        assert_eq!(dtype_of(&out, "tenth"), &DataType::Float64);
        assert_eq!(report.outcome("tenth"), Some(&ColumnOutcome::Unchanged));
        assert_eq!(
            report.outcome("small"),
            Some(&ColumnOutcome::Converted {
                from: DataType::Int64,
                to: DataType::Int8
            })
        );
    }

    #[test]
    fn parses_numeric_text() {
        let df = df!("code" => ["1", "2", "", "3"]).unwrap();
        let (out, report) = normalize_types(&df, &options(0.0)).unwrap();

        assert_eq!(dtype_of(&out, "code"), &DataType::Int8);
        let values: Vec<Option<i8>> = out.column("code").unwrap().i8().unwrap().iter().collect();
        assert_eq!(values, vec![Some(1), Some(2), None, Some(3)]);
        assert!(report.outcome("code").unwrap().is_converted());
    }

    #[test]
    fn mixed_text_is_a_recorded_failure() {
        let df = df!("flag" => ["1", "N", "2"], "n" => [1i64, 2, 3]).unwrap();
        let (out, report) = normalize_types(&df, &options(0.0)).unwrap();

        assert_eq!(dtype_of(&out, "flag"), &DataType::String);
        assert!(report.outcome("flag").unwrap().is_failed());
        assert_eq!(dtype_of(&out, "n"), &DataType::Int8);
    }

    #[test]
    fn inexact_float_text_is_kept_as_text() {
        let df = df!("id" => ["9007199254740993", "1.5", "2"]).unwrap();
        let (out, report) = normalize_types(&df, &options(0.0)).unwrap();

        assert_eq!(dtype_of(&out, "id"), &DataType::String);
        assert!(report.outcome("id").unwrap().is_failed());
        let values: Vec<Option<&str>> = out.column("id").unwrap().str().unwrap().iter().collect();
        assert_eq!(values[0], Some("9007199254740993"));
    }

    #[test]
    fn plain_text_is_unchanged() {
        let df = df!("flag" => ["N", "Y", "N"]).unwrap();
        let (out, report) = normalize_types(&df, &options(0.5)).unwrap();
        assert_eq!(dtype_of(&out, "flag"), &DataType::String);
        assert!(report.is_noop());
    }

    #[test]
    fn low_cardinality_becomes_categorical() {
        let codes: Vec<i64> = (0..100).map(|i| i % 2 + 1).collect();
        let df = df!("payment_type" => codes.clone(), "payment_type_key" => codes).unwrap();

        let opts = options(0.05).with_keep_numeric(["payment_type_key"]);
        let (out, _) = normalize_types(&df, &opts).unwrap();
        assert!(is_categorical(dtype_of(&out, "payment_type")));
        assert_eq!(dtype_of(&out, "payment_type_key"), &DataType::Int8);
    }

    #[test]
    fn second_pass_is_a_noop() {
        let codes: Vec<i64> = (0..100).map(|i| i % 3).collect();
        let ids: Vec<i64> = (1..=100).collect();
        let amounts: Vec<f64> = (0..100).map(|i| f64::from(i) * 0.1).collect();
        let df = df!("code" => codes, "id" => ids, "amount" => amounts).unwrap();

        let (first, _) = normalize_types(&df, &options(0.05)).unwrap();
        let (second, report) = normalize_types(&first, &options(0.05)).unwrap();
        assert!(report.is_noop());
        assert_eq!(first.dtypes(), second.dtypes());
    }

    #[test]
    fn rejects_invalid_threshold() {
        let df = df!("a" => [1i64]).unwrap();
        let result = normalize_types(&df, &options(2.0));
        assert!(matches!(result, Err(NormalizationError::InvalidThreshold(_))));
    }

    #[test]
    fn reports_memory_footprint() {
        let values: Vec<i64> = (0..1000).collect();
        let df = df!("a" => values).unwrap();
        let (_, report) = normalize_types(&df, &options(0.0)).unwrap();
        assert!(report.bytes_after < report.bytes_before);
    }
}
