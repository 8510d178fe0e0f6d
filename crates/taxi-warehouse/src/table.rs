//! Table addressing and load results.

use std::fmt;

use chrono::{DateTime, Utc};
use polars::prelude::*;
use taxi_model::WriteMode;

use crate::error::{Result, WarehouseError};

/// A table inside a dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableRef {
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    pub fn new(dataset: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// Parse `dataset.table`, or a bare `table` within `default_dataset`.
    pub fn parse(text: &str, default_dataset: &str) -> Self {
        match text.split_once('.') {
            Some((dataset, table)) => Self::new(dataset, table),
            None => Self::new(default_dataset, text),
        }
    }

    /// Both parts must be usable as a single path component.
    pub fn validate(&self) -> Result<()> {
        validate_name("dataset", &self.dataset)?;
        validate_name("table", &self.table)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dataset, self.table)
    }
}

fn validate_name(kind: &'static str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(WarehouseError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

/// What a single load wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub table: TableRef,
    pub mode: WriteMode,
    /// Rows written by this load.
    pub rows: usize,
    pub columns: usize,
    /// Rows in the table after the load.
    pub total_rows: usize,
}

/// Stored table metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub table: TableRef,
    pub rows: usize,
    /// Column names with their stored types.
    pub columns: Vec<(String, String)>,
    /// Stored size in bytes (on disk, or estimated in memory).
    pub bytes: u64,
    pub modified: Option<DateTime<Utc>>,
    /// SHA-256 of the stored file, when there is one.
    pub sha256: Option<String>,
}

impl TableInfo {
    pub(crate) fn from_frame(table: &TableRef, df: &DataFrame) -> Self {
        Self {
            table: table.clone(),
            rows: df.height(),
            columns: df
                .get_columns()
                .iter()
                .map(|c| (c.name().to_string(), c.dtype().to_string()))
                .collect(),
            bytes: df.estimated_size() as u64,
            modified: None,
            sha256: None,
        }
    }
}

/// Concatenate `incoming` below `existing`.
///
/// Column names must match in order; each incoming column is cast strictly to
/// the stored type, so a narrower encoding of the same values is accepted.
pub(crate) fn append_frames(
    table: &TableRef,
    existing: &DataFrame,
    incoming: &DataFrame,
) -> Result<DataFrame> {
    let stored = existing.get_column_names();
    let given = incoming.get_column_names();
    if stored != given {
        return Err(WarehouseError::SchemaMismatch {
            table: table.clone(),
            detail: format!(
                "expected columns [{}], got [{}]",
                join_names(&stored),
                join_names(&given)
            ),
        });
    }

    let aligned = existing
        .get_columns()
        .iter()
        .zip(incoming.get_columns())
        .map(|(stored, given)| {
            if stored.dtype() == given.dtype() {
                return Ok(given.clone());
            }
            given
                .strict_cast(stored.dtype())
                .map_err(|_| WarehouseError::SchemaMismatch {
                    table: table.clone(),
                    detail: format!(
                        "column {} is {}, stored as {}",
                        given.name(),
                        given.dtype(),
                        stored.dtype()
                    ),
                })
        })
        .collect::<Result<Vec<Column>>>()?;

    let mut combined = existing.clone();
    combined.vstack_mut(&DataFrame::new(aligned)?)?;
    Ok(combined)
}

fn join_names(names: &[&PlSmallStr]) -> String {
    names
        .iter()
        .map(|n| n.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_ref_display_and_parse() {
        let table = TableRef::new("taxi_star", "fact_trips");
        assert_eq!(table.to_string(), "taxi_star.fact_trips");
        assert_eq!(TableRef::parse("taxi_star.fact_trips", "other"), table);
        assert_eq!(TableRef::parse("fact_trips", "taxi_star"), table);
    }

    #[test]
    fn rejects_path_like_names() {
        assert!(TableRef::new("taxi_star", "vendor_dim").validate().is_ok());
        assert!(TableRef::new("..", "vendor_dim").validate().is_err());
        assert!(TableRef::new("taxi_star", "a/b").validate().is_err());
        assert!(TableRef::new("", "t").validate().is_err());
    }

    #[test]
    fn append_widens_narrow_columns() {
        let table = TableRef::new("d", "t");
        let existing = df!("id" => [1i64, 2], "name" => ["a", "b"]).unwrap();
        let incoming = df!("id" => [3i8], "name" => ["c"]).unwrap();

        let combined = append_frames(&table, &existing, &incoming).unwrap();
        assert_eq!(combined.height(), 3);
        assert_eq!(combined.column("id").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn append_rejects_different_columns() {
        let table = TableRef::new("d", "t");
        let existing = df!("id" => [1i64]).unwrap();
        let incoming = df!("key" => [1i64]).unwrap();

        let err = append_frames(&table, &existing, &incoming).unwrap_err();
        assert!(matches!(err, WarehouseError::SchemaMismatch { .. }));
    }

    #[test]
    fn append_rejects_lossy_cast() {
        let table = TableRef::new("d", "t");
        let existing = df!("id" => [1i8]).unwrap();
        let incoming = df!("id" => [1000i64]).unwrap();

        let err = append_frames(&table, &existing, &incoming).unwrap_err();
        assert!(matches!(err, WarehouseError::SchemaMismatch { .. }));
    }
}
