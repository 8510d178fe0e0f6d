//! Type normalization for the taxi star-schema pipeline.
//!
//! - [`normalize_types`]: narrow numeric widths, parse numeric text and
//!   dictionary-encode low-cardinality columns, with a per-column report
//! - [`convert_timestamps`]: parse named text columns into millisecond
//!   timestamps, nulling unparsable values
//!
//! Both take `&DataFrame` and return a new frame.

mod categorical;
mod error;
mod normalizer;
mod numeric;
mod timestamp;
mod types;

pub use categorical::{categorical_dtype, is_categorical};
pub use error::NormalizationError;
pub use normalizer::normalize_types;
pub use timestamp::{TIMESTAMP_FORMATS, convert_timestamps, parse_timestamp, timestamp_dtype};
pub use types::{ColumnOutcome, ColumnReport, NormalizationReport, TimestampReport};
