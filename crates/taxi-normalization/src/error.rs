//! Error types for type normalization.

use thiserror::Error;

/// Errors that abort a normalization pass.
///
/// Per-column parse problems are not errors; they are recorded as
/// [`ColumnOutcome::Failed`](crate::ColumnOutcome::Failed) in the report.
#[derive(Debug, Error)]
pub enum NormalizationError {
    /// Polars DataFrame operation error.
    #[error("DataFrame error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),

    /// Categorical threshold outside `0.0..=1.0`.
    #[error("categorical threshold must be within 0.0..=1.0, got {0}")]
    InvalidThreshold(f64),
}
