//! Monthly sales forecasting per product.
//!
//! The pipeline reads a raw sales table (see [`read_sales_table`]), cleans it
//! with [`normalize`], restricts it to a [`Season`], aggregates each selected
//! product into a gap-free monthly series and fits a Holt-Winters model to
//! forecast the following months. [`assemble`] turns the results into
//! chart-ready bundles.

pub mod common;
pub mod forecast;
pub mod normalize;
pub mod presentation;
pub mod seasonality;

use duckdb::Connection;

pub use common::cache::NormalizedTableCache;
pub use common::error::{DataFormatError, Error, ForecastError, ParamsError, ReadError, Result};
pub use common::grouping::{aggregate_product, default_selection, product_codes, sample, ProductHistory};
pub use common::params::ColumnNames;
pub use common::raw_table::{RawSalesRow, RawSalesTable};
pub use common::table_reader::{load_csv, read_sales_table};
pub use common::types::{ForecastResult, ProductSeries, SalesRecord, SalesTable};
pub use forecast::models::{forecast_series, select_model, ModelKind, ModelSummary};
pub use forecast::params::{ForecastParams, DEFAULT_HORIZON};
pub use forecast::{
    run_forecasts, seasonal_default_selection, ForecastRun, SkipReason, SkippedProduct,
};
pub use normalize::normalize;
pub use presentation::{assemble, ChartLayout, ChartSeries, ForecastBundle, ForecastChart};
pub use seasonality::{filter_by_season, Season};

/// Read, normalize and forecast a DuckDB table in one call.
///
/// An empty product selection in `params` is filled with the first products
/// that have rows in the requested season.
pub fn forecast_table(
    conn: &Connection,
    table_name: &str,
    columns: &ColumnNames,
    params: &ForecastParams,
) -> Result<ForecastRun> {
    let raw = read_sales_table(conn, table_name, columns)?;
    let table = normalize(&raw)?;

    if params.product_codes.is_empty() {
        let selection = seasonal_default_selection(&table, params.season);
        let params = params.clone().with_product_codes(selection);
        return Ok(run_forecasts(&table, &params));
    }
    Ok(run_forecasts(&table, params))
}
