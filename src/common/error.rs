//! Error types for ingestion, normalization, configuration and forecasting.

use thiserror::Error;

/// Malformed table content. Aborts normalization of the whole table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataFormatError {
    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("row {row}: product code is missing")]
    MissingProductCode { row: usize },

    #[error("row {row}: product code '{value}' is not an integer once hyphens are removed")]
    InvalidProductCode { row: usize, value: String },
}

/// Per-product forecasting failure. Callers skip the product and carry on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Insufficient data: need at least {required} monthly points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("{model} model fit failed: {reason}")]
    ModelFit { model: &'static str, reason: String },
}

/// Invalid caller-supplied parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("horizon must be a positive integer, got {0}")]
    InvalidHorizon(i64),

    #[error("unknown season '{0}'. Valid seasons: All, Winter, Spring, Summer, Autumn")]
    UnknownSeason(String),
}

/// Failure reading the raw table from DuckDB.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("table '{0}' does not exist")]
    MissingTable(String),

    #[error("table name cannot be empty")]
    EmptyTableName,

    #[error(transparent)]
    DuckDb(#[from] duckdb::Error),
}

/// Top-level error for callers driving the whole pipeline.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    DataFormat(#[from] DataFormatError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Params(#[from] ParamsError),

    #[error(transparent)]
    Read(#[from] ReadError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_message() {
        let error = ForecastError::InsufficientData {
            required: 2,
            actual: 1,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient data: need at least 2 monthly points, got 1"
        );
    }

    #[test]
    fn test_invalid_product_code_message() {
        let error = DataFormatError::InvalidProductCode {
            row: 4,
            value: "AB-12".to_string(),
        };
        assert!(error.to_string().contains("'AB-12'"));
        assert!(error.to_string().starts_with("row 4"));
    }

    #[test]
    fn test_top_level_conversion() {
        let error: Error = ParamsError::InvalidHorizon(0).into();
        assert!(matches!(error, Error::Params(ParamsError::InvalidHorizon(0))));
        assert_eq!(error.to_string(), "horizon must be a positive integer, got 0");
    }

    #[test]
    fn test_errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ForecastError>();
        assert_send_sync::<DataFormatError>();
    }
}
