//! Cleans a raw sales table into the canonical [`SalesTable`].

pub mod month;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::common::error::DataFormatError;
use crate::common::raw_table::RawSalesTable;
use crate::common::types::{first_of_month, SalesRecord, SalesTable};
use month::{corrected_year, derived_year, parse_month_number, EPOCH_YEAR};

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("static pattern compiles"));

/// Normalize a raw table.
///
/// Fails on the first missing required column or malformed product code; no
/// partial table is returned. Rows whose month text does not parse are kept
/// with `month: None`. The source table is never modified.
pub fn normalize(raw: &RawSalesTable) -> Result<SalesTable, DataFormatError> {
    let names = raw.columns().all();
    if let Some(column) = names
        .iter()
        .find(|name| raw.missing_columns().iter().any(|m| m == *name))
    {
        return Err(DataFormatError::MissingColumn {
            column: (*column).to_string(),
        });
    }

    let mut codes = Vec::with_capacity(raw.len());
    for (row_idx, row) in raw.rows().iter().enumerate() {
        let code = row
            .product_code
            .as_deref()
            .ok_or(DataFormatError::MissingProductCode { row: row_idx })?;
        codes.push(parse_product_code(code).ok_or_else(|| {
            DataFormatError::InvalidProductCode {
                row: row_idx,
                value: code.to_string(),
            }
        })?);
    }

    let months: Vec<Option<(u32, &str)>> = raw
        .rows()
        .iter()
        .map(|row| {
            let text = row.month.as_deref()?;
            parse_month_number(text).map(|m| (m, text))
        })
        .collect();

    let min_year = months
        .iter()
        .flatten()
        .map(|(_, text)| derived_year(text))
        .min();
    let correct_years = matches!(min_year, Some(y) if y < EPOCH_YEAR);
    if correct_years {
        warn!(
            min_year = min_year.unwrap_or_default(),
            "implausible years in month column, recomputing from month text"
        );
    }

    let records: Vec<SalesRecord> = raw
        .rows()
        .iter()
        .zip(codes)
        .zip(months)
        .map(|((row, product_code), month)| {
            let month = month.and_then(|(m, text)| {
                let year = if correct_years {
                    corrected_year(text)
                } else {
                    derived_year(text)
                };
                first_of_month(year, m)
            });
            SalesRecord {
                product_code,
                product_description: row
                    .product_description
                    .as_deref()
                    .map(normalize_description)
                    .unwrap_or_default(),
                month,
                quantity: normalize_quantity(row.quantity),
            }
        })
        .collect();

    let invalid_months = records.iter().filter(|r| r.month.is_none()).count();
    if invalid_months > 0 {
        warn!(invalid_months, "rows with unparsable months kept but flagged");
    }
    debug!(rows = records.len(), "normalized sales table");

    Ok(SalesTable::new(records))
}

/// Replace every character outside `[a-zA-Z0-9\s]` with a space and lowercase.
pub fn normalize_description(raw: &str) -> String {
    NON_ALPHANUMERIC.replace_all(raw, " ").to_lowercase()
}

/// Strip hyphens and parse the remainder as an integer: "100-1" is 1001.
pub fn parse_product_code(raw: &str) -> Option<i64> {
    raw.trim().replace('-', "").parse::<i64>().ok()
}

/// Missing, NaN and negative quantities become zero.
pub fn normalize_quantity(quantity: Option<f64>) -> f64 {
    match quantity {
        Some(q) if q > 0.0 => q,
        _ => 0.0,
    }
}
