//! Referential checks over a built star schema.

use std::collections::{BTreeMap, HashSet};

use polars::prelude::*;
use taxi_model::StarSchema;

use crate::error::FactError;
use crate::keys::key_values;

/// Count non-null fact foreign keys with no matching dimension row.
///
/// Returns only the key columns that have dangling references; an empty map
/// means the fact table is referentially complete.
pub fn verify_referential_integrity(
    fact: &DataFrame,
    dimensions: &BTreeMap<String, DataFrame>,
    schema: &StarSchema,
) -> Result<BTreeMap<String, usize>, FactError> {
    let mut references: Vec<(&str, &str, &str)> = schema
        .time
        .sources
        .iter()
        .map(|s| (s.fact_key.as_str(), schema.time.name.as_str(), schema.time.key_column.as_str()))
        .collect();
    references.extend(
        schema
            .dimensions
            .iter()
            .map(|d| (d.key_column.as_str(), d.name.as_str(), d.key_column.as_str())),
    );

    let mut dangling = BTreeMap::new();
    for (fact_column, dimension_name, key_column) in references {
        let dimension = dimensions
            .get(dimension_name)
            .ok_or_else(|| FactError::MissingDimension {
                name: dimension_name.to_string(),
            })?;
        let known: HashSet<i64> = key_values(dimension.column(key_column).map_err(|_| {
            FactError::MissingDimensionColumn {
                dimension: dimension_name.to_string(),
                column: key_column.to_string(),
            }
        })?)?
        .into_iter()
        .flatten()
        .collect();

        let column = fact.column(fact_column).map_err(|_| FactError::MissingColumn {
            column: fact_column.to_string(),
        })?;
        let missing = key_values(column)?
            .into_iter()
            .flatten()
            .filter(|key| !known.contains(key))
            .count();
        if missing > 0 {
            dangling.insert(fact_column.to_string(), missing);
        }
    }

    Ok(dangling)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_with_vendor_only() -> StarSchema {
        let mut schema = StarSchema::taxi_trips();
        schema.time.sources.clear();
        schema.dimensions.truncate(1);
        schema
    }

    #[test]
    fn detects_dangling_keys() {
        let schema = schema_with_vendor_only();
        let mut dims = BTreeMap::new();
        dims.insert(
            "vendor_dim".to_string(),
            df!("vendor_key" => [1i64, 2]).unwrap(),
        );
        dims.insert("datetime_dim".to_string(), df!("datetime_key" => [1i64]).unwrap());

        let fact = df!("vendor_key" => [Some(1i64), Some(3), None, Some(3)]).unwrap();
        let dangling = verify_referential_integrity(&fact, &dims, &schema).unwrap();
        assert_eq!(dangling.get("vendor_key"), Some(&2));

        let clean = df!("vendor_key" => [Some(1i64), None]).unwrap();
        assert!(verify_referential_integrity(&clean, &dims, &schema)
            .unwrap()
            .is_empty());
    }
}
