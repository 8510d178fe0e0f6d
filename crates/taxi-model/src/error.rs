use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling a [`PipelineConfig`](crate::PipelineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("categorical threshold must be within 0.0..=1.0, got {value}")]
    InvalidThreshold { value: f64 },

    #[error("warehouse dataset name must not be empty")]
    EmptyDataset,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
