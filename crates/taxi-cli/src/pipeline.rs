//! Pipeline orchestration.
//!
//! Stages run in order, each fully materializing its output:
//!
//! 1. **extract**: read the CSV and check the declared source columns
//! 2. **timestamps**: parse pickup/dropoff text into timestamps
//! 3. **normalize**: narrow the raw table's types
//! 4. **dimensions**: build every dimension, then normalize each one
//! 5. **fact**: build the fact table, normalize it, verify its foreign keys
//! 6. **load**: hand every built table to the warehouse
//!
//! A failed dimension or fact build is recorded and the remaining tables are
//! still loaded, unless `fail_on_dimension_error` asks for an early abort.

use std::collections::BTreeMap;
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use polars::prelude::DataFrame;
use tracing::{error, info, info_span, warn};

use taxi_ingest::{IngestOptions, check_required_columns, read_trip_extract};
use taxi_model::{NormalizeOptions, PipelineConfig, StarSchema, WriteMode};
use taxi_normalization::{NormalizationReport, convert_timestamps, normalize_types};
use taxi_transform::{
    DimensionError, DimensionSet, build_dimensions, build_fact_table, verify_referential_integrity,
};
use taxi_warehouse::{TableRef, Warehouse};

use crate::types::{
    NormalizationSummary, RunResult, StageTiming, TableKind, TableStatus, TableSummary,
};

/// Run `f` inside a stage span and record how long it took.
fn timed<T>(stages: &mut Vec<StageTiming>, stage: &'static str, f: impl FnOnce() -> T) -> T {
    let span = info_span!("stage", stage);
    let start = Instant::now();
    let output = span.in_scope(f);
    let duration = start.elapsed();
    info!(stage, duration_ms = duration.as_millis(), "{stage} complete");
    stages.push(StageTiming { stage, duration });
    output
}

fn summarize(table: &str, report: &NormalizationReport) -> NormalizationSummary {
    NormalizationSummary {
        table: table.to_string(),
        converted: report.converted_count(),
        failed: report.failed().map(|c| c.column.clone()).collect(),
        bytes_before: report.bytes_before,
        bytes_after: report.bytes_after,
    }
}

/// Options for the normalizer: configured ones, with every key column kept numeric.
pub fn normalize_options(config: &PipelineConfig, schema: &StarSchema) -> NormalizeOptions {
    config
        .normalize
        .clone()
        .with_keep_numeric(schema.key_columns())
}

/// Run the whole pipeline from `config.input` into `warehouse`.
///
/// Errors are returned only for failures that leave nothing to load (an
/// unreadable extract, or a dimension failure under
/// `fail_on_dimension_error`). Per-table failures are reported in the result.
pub fn run_pipeline(
    config: &PipelineConfig,
    schema: &StarSchema,
    warehouse: &mut dyn Warehouse,
    dry_run: bool,
) -> Result<RunResult> {
    let input = config
        .input
        .clone()
        .ok_or_else(|| anyhow!("no input extract given"))?;
    let run_span = info_span!(
        "run",
        input = %input.display(),
        dataset = %config.warehouse.dataset
    );
    let _run_guard = run_span.enter();

    let mut stages = Vec::new();
    let mut errors = Vec::new();
    let mut normalization = Vec::new();
    let options = normalize_options(config, schema);

    // =========================================================================
    // Stage 1-3: Extract, parse timestamps, normalize the raw table
    // =========================================================================
    let raw = timed(&mut stages, "extract", || -> Result<DataFrame> {
        let df = read_trip_extract(&input, &IngestOptions::default())
            .with_context(|| format!("read {}", input.display()))?;
        check_required_columns(&df, &schema.source_columns()).context("check extract columns")?;
        Ok(df)
    })?;
    let raw_rows = raw.height();

    let (raw, timestamp_reports) = timed(&mut stages, "timestamps", || {
        convert_timestamps(&raw, &schema.instant_columns())
    })
    .context("parse timestamps")?;
    let coerced_timestamps: BTreeMap<String, usize> = timestamp_reports
        .iter()
        .map(|r| (r.column.clone(), r.coerced_to_null))
        .collect();

    let (raw, raw_report) = timed(&mut stages, "normalize", || normalize_types(&raw, &options))
        .context("normalize extract")?;
    normalization.push(summarize("extract", &raw_report));

    // =========================================================================
    // Stage 4: Dimensions
    // =========================================================================
    let mut dimension_reports = Vec::new();
    let dimensions: DimensionSet = timed(&mut stages, "dimensions", || {
        build_dimensions(&raw, schema).map_built(|name, df| {
            let (df, report) =
                normalize_types(&df, &options).map_err(|err| DimensionError::PostProcess {
                    dimension: name.to_string(),
                    message: err.to_string(),
                })?;
            dimension_reports.push(summarize(name, &report));
            Ok(df)
        })
    });
    normalization.extend(dimension_reports);

    let failures: Vec<String> = dimensions
        .failures()
        .map(|(name, err)| format!("{name}: {err}"))
        .collect();
    if !failures.is_empty() && config.fail_on_dimension_error {
        bail!("dimension build failed: {}", failures.join("; "));
    }
    errors.extend(failures);
    let built = dimensions.built();

    // =========================================================================
    // Stage 5: Fact table
    // =========================================================================
    let mut unresolved = BTreeMap::new();
    let mut dangling = BTreeMap::new();
    let fact = timed(&mut stages, "fact", || build_fact_table(&raw, &built, schema));
    let fact: std::result::Result<DataFrame, String> = match fact {
        Ok(fact) => {
            let total = fact.unresolved_total();
            if total > 0 {
                warn!(fact = %schema.fact.name, unresolved = total, "{total} unresolved references");
            }
            unresolved = fact.unresolved;

            let (data, report) =
                normalize_types(&fact.data, &options).context("normalize fact table")?;
            normalization.push(summarize(&schema.fact.name, &report));

            dangling = verify_referential_integrity(&data, &built, schema)
                .context("verify fact foreign keys")?;
            for (column, count) in &dangling {
                warn!(column = %column, dangling = count, "Foreign keys without a dimension row");
            }
            Ok(data)
        }
        Err(err) => {
            error!(fact = %schema.fact.name, error = %err, "Fact build failed");
            errors.push(format!("{}: {err}", schema.fact.name));
            Err(err.to_string())
        }
    };

    // =========================================================================
    // Stage 6: Load
    // =========================================================================
    let dataset = config.warehouse.dataset.as_str();
    // Every run rebuilds surrogate keys from 1, so stored tables are always replaced.
    let mode = WriteMode::Replace;
    let tables = timed(&mut stages, "load", || {
        let mut tables = Vec::new();
        for name in schema.dimension_names() {
            let target = TableRef::new(dataset, name.as_str());
            tables.push(match dimensions.get(&name) {
                Some(Ok(df)) => load_table(warehouse, df, target, TableKind::Dimension, mode),
                Some(Err(err)) => not_built(target, TableKind::Dimension, err.to_string()),
                None => not_built(target, TableKind::Dimension, "not declared".to_string()),
            });
        }
        let target = TableRef::new(dataset, schema.fact.name.as_str());
        tables.push(match &fact {
            Ok(df) => load_table(warehouse, df, target, TableKind::Fact, mode),
            Err(message) => not_built(target, TableKind::Fact, message.clone()),
        });
        tables
    });
    for summary in &tables {
        if let TableStatus::LoadFailed(message) = &summary.status {
            errors.push(format!("{}: {message}", summary.table));
        }
    }

    let result = RunResult {
        input,
        dataset: dataset.to_string(),
        dry_run,
        raw_rows,
        coerced_timestamps,
        stages,
        normalization,
        tables,
        unresolved,
        dangling,
        errors,
    };
    info!(
        loaded = result.loaded_count(),
        tables = result.tables.len(),
        duration_ms = result.total_duration().as_millis(),
        "run complete"
    );
    Ok(result)
}

fn load_table(
    warehouse: &mut dyn Warehouse,
    df: &DataFrame,
    target: TableRef,
    kind: TableKind,
    mode: WriteMode,
) -> TableSummary {
    let status = match warehouse.load(df, &target, mode) {
        Ok(outcome) => TableStatus::Loaded(outcome),
        Err(err) => {
            warn!(table = %target, error = %err, "Load failed");
            TableStatus::LoadFailed(err.to_string())
        }
    };
    TableSummary {
        table: target,
        kind,
        rows: df.height(),
        columns: df.width(),
        status,
    }
}

fn not_built(target: TableRef, kind: TableKind, reason: String) -> TableSummary {
    TableSummary {
        table: target,
        kind,
        rows: 0,
        columns: 0,
        status: TableStatus::BuildFailed(reason),
    }
}
