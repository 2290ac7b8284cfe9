use super::params::ColumnNames;

/// One unvalidated sales line as supplied by the ingestion layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSalesRow {
    /// Product code text, possibly hyphenated ("100-1").
    pub product_code: Option<String>,
    pub product_description: Option<String>,
    /// Month text whose first three characters name the month ("Jan-2023").
    pub month: Option<String>,
    pub quantity: Option<f64>,
}

impl RawSalesRow {
    pub fn new(code: &str, description: &str, month: &str, quantity: f64) -> Self {
        Self {
            product_code: Some(code.to_string()),
            product_description: Some(description.to_string()),
            month: Some(month.to_string()),
            quantity: Some(quantity),
        }
    }
}

/// A raw sales table plus a record of which required source columns it lacked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSalesTable {
    columns: ColumnNames,
    missing_columns: Vec<String>,
    rows: Vec<RawSalesRow>,
}

impl RawSalesTable {
    /// A table with every required column present under the default names.
    pub fn from_rows(rows: Vec<RawSalesRow>) -> Self {
        Self {
            columns: ColumnNames::default(),
            missing_columns: Vec::new(),
            rows,
        }
    }

    /// A table read from a source that lacked some of the required columns.
    /// The fields for missing columns are `None` in every row.
    pub fn with_missing_columns(
        columns: ColumnNames,
        missing_columns: Vec<String>,
        rows: Vec<RawSalesRow>,
    ) -> Self {
        Self {
            columns,
            missing_columns,
            rows,
        }
    }

    pub fn columns(&self) -> &ColumnNames {
        &self.columns
    }

    pub fn missing_columns(&self) -> &[String] {
        &self.missing_columns
    }

    pub fn rows(&self) -> &[RawSalesRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
