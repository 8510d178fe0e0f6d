//! Star-schema construction for the taxi pipeline.
//!
//! - [`build_dimensions`]: every declared dimension plus the shared time
//!   dimension, each built or failed independently
//! - [`build_fact_table`]: one fact row per raw row with surrogate foreign
//!   keys, measures and trip duration
//! - [`verify_referential_integrity`]: dangling-reference check over the
//!   finished tables

mod calendar;
mod dimension;
mod error;
mod fact;
mod integrity;
mod keys;

pub use calendar::{CalendarAttributes, build_time_dimension};
pub use dimension::{DimensionSet, build_dimension, build_dimensions};
pub use error::{DimensionError, FactError};
pub use fact::{FactTable, build_fact_table, duration_minutes};
pub use integrity::verify_referential_integrity;
pub use keys::NaturalKey;
