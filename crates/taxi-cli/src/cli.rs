//! CLI argument definitions for the taxi ETL.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "taxi-etl",
    version,
    about = "Yellow-taxi star-schema ETL - Load trip extracts into a dimensional warehouse",
    long_about = "Turn a flat yellow-taxi trip extract into a star schema.\n\n\
                  Builds datetime, vendor, location, rate-code and payment-type\n\
                  dimensions plus a trip fact table, and loads them as Parquet tables."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build the star schema from a trip extract and load it.
    Run(RunArgs),

    /// Show metadata of a loaded table.
    Describe(DescribeArgs),

    /// List the built-in code lookups (vendor, rate code, payment type).
    Lookups,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Trip extract CSV (overrides `input` in the config file).
    #[arg(value_name = "CSV")]
    pub input: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Warehouse root directory.
    #[arg(long = "warehouse", value_name = "DIR")]
    pub warehouse: Option<PathBuf>,

    /// Dataset receiving the tables.
    #[arg(long = "dataset", value_name = "NAME")]
    pub dataset: Option<String>,

    /// Distinct/row ratio below which columns become categorical.
    #[arg(long = "categorical-threshold", value_name = "F")]
    pub categorical_threshold: Option<f64>,

    /// Build everything but keep the tables in memory instead of writing them.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Abort before loading if any dimension fails to build.
    ///
    /// By default the dimensions that did build are still loaded and the run
    /// exits non-zero.
    #[arg(long = "fail-on-dimension-error")]
    pub fail_on_dimension_error: bool,
}

#[derive(Parser)]
pub struct DescribeArgs {
    /// Table to describe, as `table` or `dataset.table`.
    #[arg(value_name = "TABLE")]
    pub table: String,

    /// Warehouse root directory.
    #[arg(long = "warehouse", value_name = "DIR")]
    pub warehouse: Option<PathBuf>,

    /// Dataset used when TABLE has no dataset part.
    #[arg(long = "dataset", value_name = "NAME")]
    pub dataset: Option<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
