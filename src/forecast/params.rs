use serde::Serialize;

use crate::common::error::ParamsError;
use crate::seasonality::Season;

/// Months forecast when the caller does not choose a horizon.
pub const DEFAULT_HORIZON: usize = 12;

/// Validated parameters for a forecasting run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastParams {
    pub season: Season,
    /// Products to forecast, in output order. Empty means no forecasts.
    pub product_codes: Vec<i64>,
    horizon: usize,
}

impl ForecastParams {
    /// Build and validate parameters. The horizon must be at least one month.
    pub fn new(season: Season, product_codes: Vec<i64>, horizon: i64) -> Result<Self, ParamsError> {
        if horizon < 1 {
            return Err(ParamsError::InvalidHorizon(horizon));
        }
        let horizon = usize::try_from(horizon).map_err(|_| ParamsError::InvalidHorizon(horizon))?;

        Ok(Self {
            season,
            product_codes,
            horizon,
        })
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn with_horizon(self, horizon: i64) -> Result<Self, ParamsError> {
        Self::new(self.season, self.product_codes, horizon)
    }

    pub fn with_product_codes(self, product_codes: Vec<i64>) -> Self {
        Self {
            product_codes,
            ..self
        }
    }
}

impl Default for ForecastParams {
    fn default() -> Self {
        Self {
            season: Season::All,
            product_codes: Vec::new(),
            horizon: DEFAULT_HORIZON,
        }
    }
}
