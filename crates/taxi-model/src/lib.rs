//! Data model for the taxi star-schema pipeline.
//!
//! - **schema**: dimension, time-dimension and fact declarations
//! - **lookup**: static code → label tables
//! - **options**: run configuration and write modes

pub mod error;
pub mod lookup;
pub mod options;
pub mod schema;

pub use error::{ConfigError, Result};
pub use lookup::CodeLookup;
pub use options::{
    DEFAULT_CATEGORICAL_THRESHOLD, NormalizeOptions, PipelineConfig, WarehouseConfig, WriteMode,
};
pub use schema::{
    DROPOFF_DATETIME, DimensionSpec, DurationSpec, FactSpec, InstantColumn, LabelSpec,
    PICKUP_DATETIME, StarSchema, TimeDimensionSpec,
};
