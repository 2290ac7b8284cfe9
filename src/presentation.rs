//! Chart-ready bundles pairing each product's history with its forecast.

use chrono::NaiveDate;
use serde::Serialize;

use crate::common::types::{add_months, ForecastResult};
use crate::forecast::models::ModelSummary;

pub const CHART_TITLE: &str = "Sales Forecasts for Selected Products";
pub const X_AXIS_TITLE: &str = "Month";
pub const Y_AXIS_TITLE: &str = "Quantity";
pub const LEGEND_TITLE: &str = "Products";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Historical,
    Forecast,
}

/// One named line of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub kind: SeriesKind,
    pub points: Vec<(NaiveDate, f64)>,
}

/// Everything needed to draw one product: its history, its forecast, and the
/// model that produced the forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastBundle {
    pub product_code: i64,
    pub product_description: String,
    pub historical: ChartSeries,
    pub forecast: ChartSeries,
    pub model: ModelSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartLayout {
    pub title: &'static str,
    pub x_axis: &'static str,
    pub y_axis: &'static str,
    pub legend: &'static str,
}

impl Default for ChartLayout {
    fn default() -> Self {
        Self {
            title: CHART_TITLE,
            x_axis: X_AXIS_TITLE,
            y_axis: Y_AXIS_TITLE,
            legend: LEGEND_TITLE,
        }
    }
}

/// A full chart: layout plus one bundle per forecast product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastChart {
    pub layout: ChartLayout,
    pub bundles: Vec<ForecastBundle>,
}

impl ForecastChart {
    pub fn new(results: &[ForecastResult]) -> Self {
        Self {
            layout: ChartLayout::default(),
            bundles: assemble(results),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

/// Build one bundle per result, preserving order.
pub fn assemble(results: &[ForecastResult]) -> Vec<ForecastBundle> {
    results.iter().map(bundle).collect()
}

fn bundle(result: &ForecastResult) -> ForecastBundle {
    let description = &result.product_description;
    let axis = result
        .history
        .last_month()
        .map(|last| forecast_axis(last, result.forecast.len()))
        .unwrap_or_default();

    ForecastBundle {
        product_code: result.product_code,
        product_description: description.clone(),
        historical: ChartSeries {
            name: format!("{description} (Historical)"),
            kind: SeriesKind::Historical,
            points: result.history.points().collect(),
        },
        forecast: ChartSeries {
            name: format!("{description} (Forecast)"),
            kind: SeriesKind::Forecast,
            points: axis.into_iter().zip(result.forecast.iter().copied()).collect(),
        },
        model: result.model.clone(),
    }
}

/// The `horizon` months following `last_month`, starting one month after it.
pub fn forecast_axis(last_month: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    (1..=horizon as u32)
        .map_while(|step| add_months(last_month, step))
        .collect()
}
