//! Warehouse error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::table::TableRef;

/// Warehouse operation error.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// File I/O error.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temp file could not be moved into place.
    #[error("failed to replace {target_path}: {source}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Dataset or table name that cannot be used as a path component.
    #[error("invalid {kind} name {name:?}")]
    InvalidName { kind: &'static str, name: String },

    /// Target exists and the write mode forbids touching it.
    #[error("table {table} already exists")]
    TableExists { table: TableRef },

    #[error("table {table} not found")]
    TableNotFound { table: TableRef },

    /// Appended frame does not match the stored table.
    #[error("schema mismatch appending to {table}: {detail}")]
    SchemaMismatch { table: TableRef, detail: String },

    #[error("chunk size must be at least 1")]
    InvalidChunkSize,

    /// A chunked append stopped part-way.
    #[error("append to {table} stopped after {rows_loaded} rows: {source}")]
    PartialAppend {
        table: TableRef,
        rows_loaded: usize,
        #[source]
        source: Box<WarehouseError>,
    },

    /// Polars DataFrame or Parquet error.
    #[error("DataFrame error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, WarehouseError>;
