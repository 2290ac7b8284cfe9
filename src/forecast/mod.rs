pub mod models;
pub mod params;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::common::error::ForecastError;
use crate::common::grouping::{aggregate_product, default_selection};
use crate::common::types::{ForecastResult, SalesTable};
use crate::seasonality::{filter_by_season, Season};
use params::ForecastParams;

/// Why a selected product produced no forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// No rows for the product remain after season filtering.
    NoData,
    #[serde(serialize_with = "serialize_error")]
    Failed(ForecastError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedProduct {
    pub product_code: i64,
    pub reason: SkipReason,
}

/// Output of a forecasting run: one result per product that could be forecast,
/// and the rest with the reason they were skipped. Both follow selection order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastRun {
    pub results: Vec<ForecastResult>,
    pub skipped: Vec<SkippedProduct>,
}

/// Filter by season, then aggregate and forecast each selected product.
///
/// Products are independent and run in parallel over a shared read-only
/// table. A product that fails never aborts the others.
pub fn run_forecasts(table: &SalesTable, params: &ForecastParams) -> ForecastRun {
    let filtered = filter_by_season(table, params.season);
    let horizon = params.horizon();

    let outcomes: Vec<(i64, Result<ForecastResult, SkipReason>)> = params
        .product_codes
        .par_iter()
        .map(|&code| (code, forecast_product(&filtered, code, horizon)))
        .collect();

    let mut run = ForecastRun::default();
    for (product_code, outcome) in outcomes {
        match outcome {
            Ok(result) => run.results.push(result),
            Err(reason) => {
                match &reason {
                    SkipReason::NoData => {
                        warn!(product_code, season = %params.season, "no data for product")
                    }
                    SkipReason::Failed(err) => {
                        warn!(product_code, error = %err, "forecast failed, skipping product")
                    }
                }
                run.skipped.push(SkippedProduct {
                    product_code,
                    reason,
                });
            }
        }
    }

    info!(
        season = %params.season,
        horizon,
        forecast = run.results.len(),
        skipped = run.skipped.len(),
        "forecast run complete"
    );
    run
}

/// The default product selection for `season`: the first products that still
/// have rows once the table is restricted to that season.
pub fn seasonal_default_selection(table: &SalesTable, season: Season) -> Vec<i64> {
    default_selection(&filter_by_season(table, season))
}

fn forecast_product(
    table: &SalesTable,
    product_code: i64,
    horizon: usize,
) -> Result<ForecastResult, SkipReason> {
    let history = aggregate_product(table, product_code).ok_or(SkipReason::NoData)?;
    let (forecast, model) =
        models::forecast_series(&history.series, horizon).map_err(SkipReason::Failed)?;

    Ok(ForecastResult {
        product_code,
        product_description: history.product_description,
        history: history.series,
        forecast,
        model,
    })
}

fn serialize_error<S: serde::Serializer>(err: &ForecastError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::{first_of_month, SalesRecord};
    use crate::seasonality::Season;
    use models::ModelKind;

    fn monthly_rows(code: i64, desc: &str, months: usize) -> Vec<SalesRecord> {
        (0..months)
            .map(|i| SalesRecord {
                product_code: code,
                product_description: desc.to_string(),
                month: first_of_month(2020 + (i / 12) as i32, (i % 12) as u32 + 1),
                quantity: 50.0 + (i % 12) as f64 * 4.0 + i as f64,
            })
            .collect()
    }

    fn table() -> SalesTable {
        let mut rows = monthly_rows(1, "long history", 36);
        rows.extend(monthly_rows(2, "short history", 23));
        rows.extend(monthly_rows(3, "one month", 1));
        SalesTable::new(rows)
    }

    #[test]
    fn test_results_follow_selection_order() {
        let params = ForecastParams::new(Season::All, vec![2, 1], 6).unwrap();
        let run = run_forecasts(&table(), &params);

        let codes: Vec<i64> = run.results.iter().map(|r| r.product_code).collect();
        assert_eq!(codes, vec![2, 1]);
        assert!(run.skipped.is_empty());
        assert_eq!(run.results[0].model.kind, ModelKind::AdditiveTrend);
        assert_eq!(
            run.results[1].model.kind,
            ModelKind::AdditiveTrendSeasonal { period: 12 }
        );
        assert!(run.results.iter().all(|r| r.forecast.len() == 6));
    }

    #[test]
    fn test_failures_do_not_abort_run() {
        let params = ForecastParams::new(Season::All, vec![3, 99, 1], 12).unwrap();
        let run = run_forecasts(&table(), &params);

        assert_eq!(run.results.len(), 1);
        assert_eq!(run.results[0].product_code, 1);
        assert_eq!(
            run.skipped,
            vec![
                SkippedProduct {
                    product_code: 3,
                    reason: SkipReason::Failed(ForecastError::InsufficientData {
                        required: 2,
                        actual: 1
                    }),
                },
                SkippedProduct {
                    product_code: 99,
                    reason: SkipReason::NoData,
                },
            ]
        );
    }

    #[test]
    fn test_season_filter_applies_before_aggregation() {
        // Product 3 has only a January row; Summer leaves nothing.
        let params = ForecastParams::new(Season::Summer, vec![3], 12).unwrap();
        let run = run_forecasts(&table(), &params);
        assert!(run.results.is_empty());
        assert_eq!(run.skipped[0].reason, SkipReason::NoData);
    }

    #[test]
    fn test_seasonal_default_selection_skips_out_of_season_products() {
        let july = |code| SalesRecord {
            product_code: code,
            product_description: "summer".to_string(),
            month: first_of_month(2023, 7),
            quantity: 3.0,
        };
        let mut rows = vec![july(1), july(2), july(3)];
        for (year, month) in [(2023, 1), (2023, 2), (2023, 12)] {
            rows.push(SalesRecord {
                product_code: 4,
                product_description: "winter".to_string(),
                month: first_of_month(year, month),
                quantity: 9.0,
            });
        }
        let table = SalesTable::new(rows);

        assert_eq!(seasonal_default_selection(&table, Season::Winter), vec![4]);
        assert_eq!(seasonal_default_selection(&table, Season::All), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_selection_gives_empty_run() {
        let run = run_forecasts(&table(), &ForecastParams::default());
        assert_eq!(run, ForecastRun::default());
    }

    #[test]
    fn test_skip_reason_serializes_message() {
        let skipped = SkippedProduct {
            product_code: 3,
            reason: SkipReason::Failed(ForecastError::InsufficientData {
                required: 2,
                actual: 1,
            }),
        };
        let json = serde_json::to_value(&skipped).unwrap();
        assert_eq!(json["reason"]["reason"], "failed");
        assert_eq!(
            json["reason"]["detail"],
            "Insufficient data: need at least 2 monthly points, got 1"
        );
    }
}
