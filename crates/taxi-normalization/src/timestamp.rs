//! Text-to-timestamp conversion.
//!
//! Unparsable values become null instead of failing the column, and the
//! number of such values is reported.

use chrono::NaiveDateTime;
use polars::prelude::*;

use crate::error::NormalizationError;
use crate::types::{ColumnOutcome, TimestampReport};

/// Accepted timestamp layouts, tried in order.
///
/// `%.f` also matches when no fractional part is present.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// The dtype produced for converted columns.
pub fn timestamp_dtype() -> DataType {
    DataType::Datetime(TimeUnit::Milliseconds, None)
}

/// Parse a timestamp in any accepted layout. A trailing `Z` is ignored.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
}

/// Convert the named text columns of `df` to millisecond timestamps.
///
/// Columns already holding timestamps are left unchanged. A missing or
/// non-text column is reported as failed and left as-is.
pub fn convert_timestamps(
    df: &DataFrame,
    columns: &[String],
) -> Result<(DataFrame, Vec<TimestampReport>), NormalizationError> {
    let mut out = df.clone();
    let mut reports = Vec::with_capacity(columns.len());

    for name in columns {
        let Ok(column) = df.column(name) else {
            tracing::warn!(column = %name, "Timestamp column not found");
            reports.push(TimestampReport {
                column: name.clone(),
                outcome: ColumnOutcome::Failed {
                    reason: "column not found".to_string(),
                },
                coerced_to_null: 0,
            });
            continue;
        };

        let report = match column.dtype() {
            DataType::Datetime(_, _) => TimestampReport {
                column: name.clone(),
                outcome: ColumnOutcome::Unchanged,
                coerced_to_null: 0,
            },
            DataType::String => {
                let (series, coerced) = parse_column(column)?;
                let to = series.dtype().clone();
                out.with_column(series)?;
                if coerced > 0 {
                    tracing::warn!(
                        column = %name,
                        coerced,
                        "Unparsable timestamps coerced to null"
                    );
                }
                TimestampReport {
                    column: name.clone(),
                    outcome: ColumnOutcome::Converted {
                        from: DataType::String,
                        to,
                    },
                    coerced_to_null: coerced,
                }
            }
            other => {
                tracing::warn!(column = %name, dtype = %other, "Timestamp column is not text");
                TimestampReport {
                    column: name.clone(),
                    outcome: ColumnOutcome::Failed {
                        reason: format!("expected text, found {other}"),
                    },
                    coerced_to_null: 0,
                }
            }
        };
        reports.push(report);
    }

    Ok((out, reports))
}

fn parse_column(column: &Column) -> Result<(Series, usize), NormalizationError> {
    let mut coerced = 0usize;
    let millis: Vec<Option<i64>> = column
        .str()?
        .iter()
        .map(|value| {
            let value = value.filter(|v| !v.trim().is_empty())?;
            let parsed = parse_timestamp(value).map(|dt| dt.and_utc().timestamp_millis());
            if parsed.is_none() {
                coerced += 1;
            }
            parsed
        })
        .collect();

    let series = Series::new(column.name().clone(), millis).cast(&timestamp_dtype())?;
    Ok((series, coerced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taxi_common::datetime_millis;

    #[test]
    fn parses_every_layout() {
        let expected = NaiveDateTime::parse_from_str("2023-01-01 13:05:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        for text in [
            "2023-01-01 13:05:00",
            "2023-01-01T13:05:00",
            "2023-01-01T13:05:00.000",
            "2023-01-01T13:05:00Z",
            "01/01/2023 01:05:00 PM",
            "01/01/2023 13:05",
            "2023/01/01 13:05:00",
        ] {
            assert_eq!(parse_timestamp(text), Some(expected), "{text}");
        }
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn converts_and_counts_coerced_values() {
        let df = df!(
            "pickup" => [Some("2023-01-01 00:00:00"), Some("garbage"), None, Some("")],
            "fare" => [Some(1.0f64), Some(2.0), Some(3.0), Some(4.0)],
        )
        .unwrap();

        let (out, reports) = convert_timestamps(&df, &["pickup".to_string()]).unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].coerced_to_null, 1);
        assert!(reports[0].outcome.is_converted());

        let pickup = out.column("pickup").unwrap();
        assert_eq!(pickup.dtype(), &timestamp_dtype());
        let millis = datetime_millis(pickup).unwrap();
        assert_eq!(millis, vec![Some(1_672_531_200_000), None, None, None]);

        // Input is untouched.
        assert_eq!(df.column("pickup").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn second_conversion_is_unchanged() {
        let df = df!("t" => ["2023-01-01 00:00:00"]).unwrap();
        let (once, _) = convert_timestamps(&df, &["t".to_string()]).unwrap();
        let (twice, reports) = convert_timestamps(&once, &["t".to_string()]).unwrap();
        assert_eq!(reports[0].outcome, ColumnOutcome::Unchanged);
        assert_eq!(once.dtypes(), twice.dtypes());
    }

    #[test]
    fn missing_and_non_text_columns_fail() {
        let df = df!("n" => [1i64]).unwrap();
        let (_, reports) =
            convert_timestamps(&df, &["missing".to_string(), "n".to_string()]).unwrap();
        assert!(reports.iter().all(|r| r.outcome.is_failed()));
    }
}
