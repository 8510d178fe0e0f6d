//! Star-schema declarations.
//!
//! A [`StarSchema`] names every dimension, the natural-key columns each one is
//! projected from, and the measures the fact table carries. The transform
//! stage is driven entirely by this declaration; [`StarSchema::taxi_trips`]
//! is the layout for the yellow-taxi extract.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::lookup::CodeLookup;

/// A regular dimension projected from one or more raw columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSpec {
    /// Table name (e.g. "vendor_dim").
    pub name: String,
    /// Surrogate-key column, also used as the fact foreign-key column.
    pub key_column: String,
    /// Raw columns forming the natural key, in output order.
    pub natural_key: Vec<String>,
    /// Static code lookup attached to a single-column natural key.
    pub lookup: Option<LabelSpec>,
}

/// Label column attached through a [`CodeLookup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub column: String,
    pub lookup: CodeLookup,
}

impl DimensionSpec {
    pub fn new(
        name: impl Into<String>,
        key_column: impl Into<String>,
        natural_key: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            key_column: key_column.into(),
            natural_key: natural_key.iter().map(|c| (*c).to_string()).collect(),
            lookup: None,
        }
    }

    /// Attach a label column resolved through `lookup`.
    #[must_use]
    pub fn with_lookup(mut self, column: impl Into<String>, lookup: CodeLookup) -> Self {
        self.lookup = Some(LabelSpec {
            column: column.into(),
            lookup,
        });
        self
    }
}

/// One instant-valued raw column feeding the time dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstantColumn {
    /// Raw timestamp column.
    pub source: String,
    /// Fact foreign-key column referencing the time dimension.
    pub fact_key: String,
}

/// The shared calendar dimension, keyed by instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDimensionSpec {
    pub name: String,
    pub key_column: String,
    /// Column holding the instant itself.
    pub instant_column: String,
    /// Every raw instant column, in union order.
    pub sources: Vec<InstantColumn>,
}

/// Derived trip-duration measure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationSpec {
    pub start: String,
    pub end: String,
    pub column: String,
}

/// Fact table layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactSpec {
    pub name: String,
    /// Per-row identifier, 1-based in raw row order.
    pub id_column: String,
    /// Foreign-key columns in output order. Keys not listed follow in
    /// declaration order.
    pub key_order: Vec<String>,
    /// Measures copied forward unchanged, in output order.
    pub measures: Vec<String>,
    pub duration: DurationSpec,
}

/// Full dimensional model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarSchema {
    pub time: TimeDimensionSpec,
    pub dimensions: Vec<DimensionSpec>,
    pub fact: FactSpec,
}

pub const PICKUP_DATETIME: &str = "tpep_pickup_datetime";
pub const DROPOFF_DATETIME: &str = "tpep_dropoff_datetime";

impl StarSchema {
    /// Layout for the yellow-taxi trip extract.
    pub fn taxi_trips() -> Self {
        Self {
            time: TimeDimensionSpec {
                name: "datetime_dim".to_string(),
                key_column: "datetime_key".to_string(),
                instant_column: "datetime".to_string(),
                sources: vec![
                    InstantColumn {
                        source: PICKUP_DATETIME.to_string(),
                        fact_key: "pickup_datetime_key".to_string(),
                    },
                    InstantColumn {
                        source: DROPOFF_DATETIME.to_string(),
                        fact_key: "dropoff_datetime_key".to_string(),
                    },
                ],
            },
            dimensions: vec![
                DimensionSpec::new("vendor_dim", "vendor_key", &["VendorID"])
                    .with_lookup("vendor_name", CodeLookup::vendor()),
                DimensionSpec::new(
                    "pickup_location_dim",
                    "pickup_location_key",
                    &["pickup_longitude", "pickup_latitude"],
                ),
                DimensionSpec::new(
                    "dropoff_location_dim",
                    "dropoff_location_key",
                    &["dropoff_longitude", "dropoff_latitude"],
                ),
                DimensionSpec::new("rate_code_dim", "rate_code_key", &["RatecodeID"])
                    .with_lookup("rate_code_name", CodeLookup::rate_code()),
                DimensionSpec::new("payment_type_dim", "payment_type_key", &["payment_type"])
                    .with_lookup("payment_type_name", CodeLookup::payment_type()),
            ],
            fact: FactSpec {
                name: "fact_trips".to_string(),
                id_column: "trip_id".to_string(),
                key_order: [
                    "vendor_key",
                    "pickup_datetime_key",
                    "dropoff_datetime_key",
                    "pickup_location_key",
                    "dropoff_location_key",
                    "rate_code_key",
                    "payment_type_key",
                ]
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
                measures: [
                    "passenger_count",
                    "trip_distance",
                    "store_and_fwd_flag",
                    "fare_amount",
                    "extra",
                    "mta_tax",
                    "tip_amount",
                    "tolls_amount",
                    "improvement_surcharge",
                    "total_amount",
                ]
                .iter()
                .map(|c| (*c).to_string())
                .collect(),
                duration: DurationSpec {
                    start: PICKUP_DATETIME.to_string(),
                    end: DROPOFF_DATETIME.to_string(),
                    column: "trip_duration_minutes".to_string(),
                },
            },
        }
    }

    /// Timestamp columns that need explicit conversion before anything else.
    pub fn instant_columns(&self) -> Vec<String> {
        self.time.sources.iter().map(|s| s.source.clone()).collect()
    }

    /// Every raw column the schema reads, deduplicated.
    pub fn source_columns(&self) -> BTreeSet<String> {
        let mut columns: BTreeSet<String> = self.instant_columns().into_iter().collect();
        for dimension in &self.dimensions {
            columns.extend(dimension.natural_key.iter().cloned());
        }
        columns.extend(self.fact.measures.iter().cloned());
        columns.insert(self.fact.duration.start.clone());
        columns.insert(self.fact.duration.end.clone());
        columns
    }

    /// Names of every dimension table, time dimension first.
    pub fn dimension_names(&self) -> Vec<String> {
        std::iter::once(self.time.name.clone())
            .chain(self.dimensions.iter().map(|d| d.name.clone()))
            .collect()
    }

    /// Surrogate and foreign-key columns; the normalizer keeps these numeric.
    pub fn key_columns(&self) -> BTreeSet<String> {
        let mut keys = BTreeSet::new();
        keys.insert(self.time.key_column.clone());
        keys.extend(self.time.sources.iter().map(|s| s.fact_key.clone()));
        keys.extend(self.dimensions.iter().map(|d| d.key_column.clone()));
        keys.insert(self.fact.id_column.clone());
        keys
    }
}
