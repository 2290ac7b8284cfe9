use std::path::Path;

use duckdb::Connection;
use tracing::{debug, warn};

use super::error::ReadError;
use super::params::ColumnNames;
use super::raw_table::{RawSalesRow, RawSalesTable};

/// Read the raw sales columns from a DuckDB table or view.
///
/// Executes a query like:
/// `SELECT CAST("PRODUCT_CODE" AS VARCHAR), ..., TRY_CAST("QUANTITY" AS DOUBLE) FROM "sales"`
///
/// Column names match case-insensitively, as DuckDB identifiers do. A required
/// column the table lacks is selected as NULL and listed in
/// `RawSalesTable::missing_columns`, leaving the decision to the normalizer.
/// Quantities that do not cast to a number come back as missing.
pub fn read_sales_table(
    conn: &Connection,
    table_name: &str,
    columns: &ColumnNames,
) -> Result<RawSalesTable, ReadError> {
    if table_name.is_empty() {
        return Err(ReadError::EmptyTableName);
    }

    let present = table_columns(conn, table_name)?;
    if present.is_empty() {
        return Err(ReadError::MissingTable(table_name.to_string()));
    }

    let mut missing = Vec::new();
    let mut select = Vec::with_capacity(4);
    for (idx, wanted) in columns.all().into_iter().enumerate() {
        let is_quantity = idx == 3;
        match present.iter().find(|c| c.eq_ignore_ascii_case(wanted)) {
            Some(actual) if is_quantity => select.push(format!(
                "TRY_CAST(\"{}\" AS DOUBLE)",
                escape_identifier(actual)
            )),
            Some(actual) => select.push(format!(
                "CAST(\"{}\" AS VARCHAR)",
                escape_identifier(actual)
            )),
            None => {
                warn!(table = table_name, column = wanted, "required column not found");
                missing.push(wanted.to_string());
                select.push(if is_quantity { "NULL::DOUBLE" } else { "NULL::VARCHAR" }.to_string());
            }
        }
    }

    let sql = format!(
        "SELECT {} FROM \"{}\"",
        select.join(", "),
        escape_identifier(table_name)
    );
    debug!(%sql, "reading sales table");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(RawSalesRow {
                product_code: row.get(0)?,
                product_description: row.get(1)?,
                month: row.get(2)?,
                quantity: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    debug!(table = table_name, rows = rows.len(), "read raw sales rows");

    Ok(RawSalesTable::with_missing_columns(
        columns.clone(),
        missing,
        rows,
    ))
}

/// Materialize a CSV file as a DuckDB table using `read_csv_auto`.
pub fn load_csv(conn: &Connection, path: &Path, table_name: &str) -> Result<(), ReadError> {
    if table_name.is_empty() {
        return Err(ReadError::EmptyTableName);
    }
    let sql = format!(
        "CREATE OR REPLACE TABLE \"{}\" AS SELECT * FROM read_csv_auto('{}')",
        escape_identifier(table_name),
        path.to_string_lossy().replace('\'', "''"),
    );
    debug!(%sql, "loading csv");
    conn.execute_batch(&sql)?;
    Ok(())
}

/// Column names of a table or view in the current schema, in declaration order.
/// The name matches case-insensitively. Empty if the table does not exist.
fn table_columns(conn: &Connection, table_name: &str) -> Result<Vec<String>, ReadError> {
    let mut stmt = conn.prepare(
        "SELECT column_name FROM information_schema.columns \
         WHERE lower(table_name) = lower(?) AND table_schema = current_schema() \
         ORDER BY ordinal_position",
    )?;
    let names = stmt
        .query_map(duckdb::params![table_name], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Escape a SQL identifier by doubling any internal double quotes.
fn escape_identifier(name: &str) -> String {
    name.replace('"', "\"\"")
}
