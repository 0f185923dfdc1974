//! CLI entry point for the survey preparation pipeline.

use anyhow::{Result, anyhow};
use clap::Parser;
use health_prep::{Database, DatabaseConfig, EncodeFilter, EncodedTable, LoadReport};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Health survey table preparation",
    long_about = "Loads the CSV tables of a health survey, detects missing values and encodes \
                  them into model-ready matrices.\n\n\
                  EXAMPLES:\n  \
                  # Load and encode two tables\n  \
                  health-prep --config nhis.json --tables adults,children\n\n  \
                  # Only run the ordinal and date encoders\n  \
                  health-prep --config nhis.json --tables adults --encode ordinal,date\n\n  \
                  # Machine-readable load report\n  \
                  health-prep --config nhis.json --tables adults --json"
)]
struct Args {
    /// Path to the JSON database configuration
    #[arg(short, long)]
    config: PathBuf,

    /// Tables to load (comma-separated)
    #[arg(short, long, value_delimiter = ',', required = true)]
    tables: Vec<String>,

    /// Encoding stages to run: all, or a list of ordinal, one_hot, date
    ///
    /// Overrides the stages named in the configuration file
    #[arg(short, long)]
    encode: Option<EncodeFilter>,

    /// Output directory for encoded tables
    #[arg(short, long, default_value = "./outputs")]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output the load report as JSON to stdout instead of a summary
    ///
    /// Disables all progress logs.
    #[arg(long)]
    json: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !args.config.exists() {
        return Err(anyhow!("Configuration file not found: {}", args.config.display()));
    }

    let mut config = DatabaseConfig::from_json_file(&args.config)?;
    if let Some(filter) = args.encode {
        config.encode = filter;
    }
    info!("Database: {} ({})", config.name, config.acronym);

    let mut db = Database::from_config(config)?;
    let names: Vec<&str> = args.tables.iter().map(String::as_str).collect();

    let report = match db.load(&names) {
        Ok(report) => report,
        Err(e) => {
            error!("Load failed: {}", e);
            return Err(anyhow!("Load failed: {}", e));
        }
    };

    if !args.output.exists() {
        std::fs::create_dir_all(&args.output)?;
        info!("Created output directory: {}", args.output.display());
    }

    for name in &names {
        if let Some(encoded) = db.encoded(name) {
            write_encoded(encoded, &args.output, name)?;
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_summary(&report, &args.output);
    Ok(())
}

/// Write the encoded values, missing-value codes and feature types of a table.
fn write_encoded(encoded: &EncodedTable, output_dir: &Path, name: &str) -> Result<()> {
    let mut values = encoded.values.clone();
    write_csv(&mut values, &output_dir.join(format!("{}_encoded.csv", name)))?;

    let mut missing = encoded.missing_values.clone();
    write_csv(&mut missing, &output_dir.join(format!("{}_missing.csv", name)))?;

    let (columns, labels): (Vec<&str>, Vec<&str>) = encoded
        .feature_types
        .iter()
        .map(|(column, t)| (column, t.as_str()))
        .unzip();
    let mut types = df!("name" => columns, "type" => labels)?;
    write_csv(&mut types, &output_dir.join(format!("{}_types.csv", name)))?;

    info!("{}: outputs written to {}", name, output_dir.display());
    Ok(())
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Print a human-readable summary of the load report.
fn print_summary(report: &LoadReport, output_dir: &Path) {
    println!();
    println!("{}", "=".repeat(80));
    println!("LOAD COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "{:<20} {:<24} {:<14} {:<14}",
        "Table", "Stage", "Raw", "Encoded"
    );
    println!("{}", "-".repeat(72));
    for table in &report.tables {
        let encoded = table
            .encoded_shape
            .map(|(r, c)| format!("{} x {}", r, c))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<20} {:<24} {:<14} {:<14}",
            table.name,
            table.stage.display_name(),
            format!("{} x {}", table.rows, table.columns),
            encoded
        );
    }
    println!();

    for table in &report.tables {
        if !table.dropped_columns.is_empty() {
            println!("{}: dropped {:?}", table.name, table.dropped_columns);
        }
        if !table.skipped_columns.is_empty() {
            println!("{}: heuristic skipped {:?}", table.name, table.skipped_columns);
        }
        for issue in &table.issues {
            println!("  ! {} [{}] {}", table.name, issue.code, issue.message);
        }
    }

    println!();
    println!(
        "{} of {} table(s) encoded into {}",
        report.encoded_count(),
        report.tables.len(),
        output_dir.display()
    );
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
