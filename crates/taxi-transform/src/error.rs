//! Error types for dimension and fact construction.

use thiserror::Error;

/// Failure to build one dimension. Other dimensions are unaffected.
#[derive(Debug, Error)]
pub enum DimensionError {
    /// A declared source column is absent from the raw table.
    #[error("dimension {dimension}: source column {column} not found")]
    MissingColumn { dimension: String, column: String },

    /// An instant column does not hold timestamps.
    #[error("dimension {dimension}: column {column} is {dtype}, expected a timestamp")]
    NotTimestamp {
        dimension: String,
        column: String,
        dtype: String,
    },

    /// A pass applied after the build (such as type normalization) failed.
    #[error("dimension {dimension}: {message}")]
    PostProcess { dimension: String, message: String },

    /// Polars DataFrame operation error.
    #[error("DataFrame error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
}

/// Failure to build the fact table. Construction is all-or-nothing.
#[derive(Debug, Error)]
pub enum FactError {
    /// A dimension the schema declares was not built.
    #[error("dimension {name} is missing, cannot resolve its foreign keys")]
    MissingDimension { name: String },

    /// A built dimension lacks a column the fact builder joins on.
    #[error("dimension {dimension} has no column {column}")]
    MissingDimensionColumn { dimension: String, column: String },

    /// A measure, instant or natural-key column is absent from the raw table.
    #[error("raw column {column} not found")]
    MissingColumn { column: String },

    /// An instant column does not hold timestamps.
    #[error("column {column} is {dtype}, expected a timestamp")]
    NotTimestamp { column: String, dtype: String },

    /// Polars DataFrame operation error.
    #[error("DataFrame error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
}
