//! Trip extract ingestion.
//!
//! Reads the raw yellow-taxi CSV extract into a Polars `DataFrame` after the
//! usual pre-read checks (existence, size limit, encoding, header row).
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use taxi_ingest::{IngestOptions, check_required_columns, read_trip_extract};
//! use taxi_model::StarSchema;
//!
//! let df = read_trip_extract(Path::new("data/trips.csv"), &IngestOptions::default())?;
//! check_required_columns(&df, &StarSchema::taxi_trips().source_columns())?;
//! ```

mod error;
mod reader;

pub use error::{IngestError, Result};
pub use reader::{
    IngestOptions, MAX_EXTRACT_FILE_SIZE, check_file_size_with_limit,
    check_required_columns, read_trip_extract, validate_dataframe_shape, validate_encoding,
};
