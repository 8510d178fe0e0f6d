use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::info;

use taxi_cli::config::{ConfigOverrides, resolve_config};
use taxi_cli::pipeline::run_pipeline;
use taxi_cli::types::RunResult;
use taxi_model::{CodeLookup, StarSchema, WarehouseConfig};
use taxi_warehouse::{MemoryWarehouse, ParquetWarehouse, TableRef, Warehouse};

use crate::cli::{DescribeArgs, RunArgs};
use crate::summary::{apply_table_style, print_table_info};

pub fn run_etl(args: &RunArgs) -> Result<RunResult> {
    let config = resolve_config(
        args.config.as_deref(),
        ConfigOverrides {
            input: args.input.clone(),
            warehouse_root: args.warehouse.clone(),
            dataset: args.dataset.clone(),
            categorical_threshold: args.categorical_threshold,
            fail_on_dimension_error: args.fail_on_dimension_error,
        },
    )
    .context("load configuration")?;
    let schema = StarSchema::taxi_trips();

    if args.dry_run {
        info!("dry run: tables stay in memory");
        let mut warehouse = MemoryWarehouse::new();
        run_pipeline(&config, &schema, &mut warehouse, true)
    } else {
        let mut warehouse = ParquetWarehouse::new(&config.warehouse.root);
        run_pipeline(&config, &schema, &mut warehouse, false)
    }
}

pub fn run_describe(args: &DescribeArgs) -> Result<()> {
    let defaults = WarehouseConfig::default();
    let root = args.warehouse.clone().unwrap_or(defaults.root);
    let dataset = args.dataset.clone().unwrap_or(defaults.dataset);

    let warehouse = ParquetWarehouse::new(root);
    let target = TableRef::parse(&args.table, &dataset);
    let info = warehouse
        .describe(&target)
        .with_context(|| format!("describe {target}"))?;
    print_table_info(&info);
    Ok(())
}

pub fn run_lookups() {
    let mut table = Table::new();
    table.set_header(vec!["Lookup", "Code", "Label"]);
    apply_table_style(&mut table);
    for lookup in CodeLookup::builtin() {
        for (code, label) in lookup.entries() {
            table.add_row(vec![lookup.name.clone(), code.to_string(), label.to_string()]);
        }
    }
    println!("{table}");
}
