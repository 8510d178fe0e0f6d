//! Outcome and report types for normalization passes.

use std::fmt;

use polars::prelude::DataType;

/// What a normalization pass did to one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOutcome {
    /// Column re-encoded to a narrower or more specific type.
    Converted { from: DataType, to: DataType },
    /// No safe narrowing applied.
    Unchanged,
    /// Conversion was attempted and abandoned; the column is kept as-is.
    Failed { reason: String },
}

impl ColumnOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self, ColumnOutcome::Converted { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ColumnOutcome::Failed { .. })
    }
}

impl fmt::Display for ColumnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnOutcome::Converted { from, to } => write!(f, "{from} -> {to}"),
            ColumnOutcome::Unchanged => f.write_str("unchanged"),
            ColumnOutcome::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Outcome for a named column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnReport {
    pub column: String,
    pub outcome: ColumnOutcome,
}

/// Result of [`normalize_types`](crate::normalize_types).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationReport {
    /// Estimated in-memory size before the pass.
    pub bytes_before: usize,
    /// Estimated in-memory size after the pass.
    pub bytes_after: usize,
    /// One entry per column, in frame order.
    pub columns: Vec<ColumnReport>,
}

impl NormalizationReport {
    pub fn outcome(&self, column: &str) -> Option<&ColumnOutcome> {
        self.columns
            .iter()
            .find(|c| c.column == column)
            .map(|c| &c.outcome)
    }

    pub fn converted_count(&self) -> usize {
        self.columns.iter().filter(|c| c.outcome.is_converted()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ColumnReport> {
        self.columns.iter().filter(|c| c.outcome.is_failed())
    }

    /// True when nothing was converted or failed.
    pub fn is_noop(&self) -> bool {
        self.columns
            .iter()
            .all(|c| c.outcome == ColumnOutcome::Unchanged)
    }

    /// Relative size reduction, `0.0` when the frame was empty.
    pub fn reduction_ratio(&self) -> f64 {
        if self.bytes_before == 0 {
            return 0.0;
        }
        1.0 - self.bytes_after as f64 / self.bytes_before as f64
    }
}

/// Result of converting one column in
/// [`convert_timestamps`](crate::convert_timestamps).
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampReport {
    pub column: String,
    pub outcome: ColumnOutcome,
    /// Non-null input values that could not be parsed and became null.
    pub coerced_to_null: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_display() {
        let converted = ColumnOutcome::Converted {
            from: DataType::Int64,
            to: DataType::Int8,
        };
        assert_eq!(converted.to_string(), "i64 -> i8");
        assert_eq!(ColumnOutcome::Unchanged.to_string(), "unchanged");
    }

    #[test]
    fn report_accessors() {
        let report = NormalizationReport {
            bytes_before: 800,
            bytes_after: 200,
            columns: vec![
                ColumnReport {
                    column: "a".to_string(),
                    outcome: ColumnOutcome::Converted {
                        from: DataType::Int64,
                        to: DataType::Int8,
                    },
                },
                ColumnReport {
                    column: "b".to_string(),
                    outcome: ColumnOutcome::Failed {
                        reason: "mixed".to_string(),
                    },
                },
            ],
        };
        assert_eq!(report.converted_count(), 1);
        assert_eq!(report.failed().count(), 1);
        assert!(!report.is_noop());
        assert!((report.reduction_ratio() - 0.75).abs() < 1e-9);
        assert_eq!(report.outcome("c"), None);
    }
}
