//! Run configuration: CLI flags over an optional TOML file over defaults.

use std::path::{Path, PathBuf};

use taxi_model::{ConfigError, PipelineConfig};

/// Values given on the command line. `None` keeps the file or default value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input: Option<PathBuf>,
    pub warehouse_root: Option<PathBuf>,
    pub dataset: Option<String>,
    pub categorical_threshold: Option<f64>,
    /// A flag can only switch this on.
    pub fail_on_dimension_error: bool,
}

/// Assemble and validate the configuration for one run.
pub fn resolve_config(
    file: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<PipelineConfig, ConfigError> {
    let mut config = match file {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(input) = overrides.input {
        config.input = Some(input);
    }
    if let Some(root) = overrides.warehouse_root {
        config.warehouse.root = root;
    }
    if let Some(dataset) = overrides.dataset {
        config.warehouse.dataset = dataset;
    }
    if let Some(threshold) = overrides.categorical_threshold {
        config.normalize.categorical_threshold = threshold;
    }
    config.fail_on_dimension_error |= overrides.fail_on_dimension_error;

    config.validate()?;
    Ok(config)
}
