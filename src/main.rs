//! # salescast
//!
//! Command-line front end: reads a sales table through DuckDB, forecasts the
//! selected products and prints chart bundles as JSON on stdout.

use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use duckdb::Connection;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use salescast::{
    load_csv, normalize, read_sales_table, run_forecasts, seasonal_default_selection, ColumnNames,
    ForecastChart, ForecastParams, Season, SkippedProduct,
};

const CSV_TABLE: &str = "sales";

#[derive(Parser)]
#[command(name = "salescast")]
#[command(about = "Monthly sales forecasts per product", long_about = None)]
struct Cli {
    /// DuckDB database file
    #[arg(long, default_value = ":memory:")]
    database: String,

    /// Table or view holding the sales rows
    #[arg(long, required_unless_present = "csv", conflicts_with = "csv")]
    table: Option<String>,

    /// CSV file to load instead of a table
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Season to restrict the history to (All, Winter, Spring, Summer, Autumn)
    #[arg(long, default_value = "All")]
    season: Season,

    /// Product code to forecast; repeat for several (default: first three products)
    #[arg(long = "product")]
    products: Vec<i64>,

    /// Months to forecast
    #[arg(long, default_value_t = 12, allow_negative_numbers = true)]
    horizon: i64,

    #[arg(long, default_value = "PRODUCT_CODE")]
    code_column: String,

    #[arg(long, default_value = "PRODUCT_DESCRIPTION")]
    description_column: String,

    #[arg(long, default_value = "MONTH")]
    month_column: String,

    #[arg(long, default_value = "QUANTITY")]
    quantity_column: String,
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    chart: &'a ForecastChart,
    skipped: &'a [SkippedProduct],
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "salescast failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let conn = if cli.database == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(&cli.database)?
    };

    let table_name = match (&cli.csv, &cli.table) {
        (Some(path), _) => {
            load_csv(&conn, path, CSV_TABLE)?;
            CSV_TABLE.to_string()
        }
        (None, Some(table)) => table.clone(),
        (None, None) => return Err("either --table or --csv is required".into()),
    };

    let columns = ColumnNames {
        product_code: cli.code_column,
        product_description: cli.description_column,
        month: cli.month_column,
        quantity: cli.quantity_column,
    };

    let raw = read_sales_table(&conn, &table_name, &columns)?;
    let table = normalize(&raw)?;

    let products = if cli.products.is_empty() {
        let selection = seasonal_default_selection(&table, cli.season);
        info!(products = ?selection, "no products selected, using default selection");
        selection
    } else {
        cli.products
    };
    let params = ForecastParams::new(cli.season, products, cli.horizon)?;

    let run = run_forecasts(&table, &params);
    let chart = ForecastChart::new(&run.results);
    if chart.is_empty() {
        eprintln!("No data available for the selected products and season.");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(
        &mut out,
        &Output {
            chart: &chart,
            skipped: &run.skipped,
        },
    )?;
    writeln!(out)?;
    Ok(())
}
