use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt, TerminationReason};
use nalgebra::{DMatrix, DVector, Dyn, Owned};
use serde::Serialize;
use tracing::debug;

use crate::common::error::ForecastError;
use crate::common::types::{ProductSeries, MIN_DATA_POINTS};

/// Length of the yearly seasonal cycle in monthly data.
pub const SEASONAL_PERIOD: usize = 12;

/// Observations needed before seasonal indices are estimated: two full cycles.
pub const SEASONAL_MIN_POINTS: usize = 2 * SEASONAL_PERIOD;

/// Grid of smoothing parameters scanned for the optimizer's starting point.
const ALPHA_GRID: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];
const BETA_GRID: [f64; 3] = [0.01, 0.1, 0.3];
const GAMMA_GRID: [f64; 3] = [0.01, 0.1, 0.3];

/// Smoothing parameters live in `[PARAM_FLOOR, 1 - PARAM_FLOOR]`.
const PARAM_FLOOR: f64 = 1e-4;

/// Optimizer coordinates beyond this magnitude are flat: the parameter sits on its bound.
const THETA_LIMIT: f64 = 20.0;

/// Which Holt-Winters variant to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    /// Level and additive trend (Holt's linear method).
    AdditiveTrend,
    /// Level, additive trend and additive seasonal indices.
    AdditiveTrendSeasonal { period: usize },
}

impl ModelKind {
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::AdditiveTrend => "additive_trend",
            ModelKind::AdditiveTrendSeasonal { .. } => "additive_trend_seasonal",
        }
    }
}

/// Pick the model for a series of `observations` monthly points.
///
/// Fewer than [`SEASONAL_MIN_POINTS`] observations cannot support twelve
/// seasonal indices, so only the trend model is fitted.
pub fn select_model(observations: usize) -> ModelKind {
    if observations < SEASONAL_MIN_POINTS {
        ModelKind::AdditiveTrend
    } else {
        ModelKind::AdditiveTrendSeasonal {
            period: SEASONAL_PERIOD,
        }
    }
}

/// The fitted model's parameters and in-sample fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub kind: ModelKind,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: Option<f64>,
    /// Sum of squared one-step-ahead errors over the history.
    pub sse: f64,
}

/// A Holt-Winters model with its final smoothed state.
#[derive(Debug, Clone)]
pub struct FittedModel {
    summary: ModelSummary,
    level: f64,
    trend: f64,
    /// Seasonal index per phase (`t % period`); empty for the trend model.
    seasonals: Vec<f64>,
    observations: usize,
}

impl FittedModel {
    pub fn summary(&self) -> &ModelSummary {
        &self.summary
    }

    /// Recursive point forecast for the `horizon` steps after the last observation:
    /// `level + h * trend + seasonal[(n - 1 + h) % period]`.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        let period = self.seasonals.len();
        (1..=horizon)
            .map(|h| {
                let seasonal = if period > 0 {
                    self.seasonals[(self.observations - 1 + h) % period]
                } else {
                    0.0
                };
                self.level + h as f64 * self.trend + seasonal
            })
            .collect()
    }
}

/// Fit the model chosen by [`select_model`] and forecast `horizon` months.
///
/// Forecasts are not clamped at zero.
pub fn forecast_series(
    series: &ProductSeries,
    horizon: usize,
) -> Result<(Vec<f64>, ModelSummary), ForecastError> {
    if series.len() < MIN_DATA_POINTS {
        return Err(ForecastError::InsufficientData {
            required: MIN_DATA_POINTS,
            actual: series.len(),
        });
    }

    let kind = select_model(series.len());
    let model = match kind {
        ModelKind::AdditiveTrend => fit_trend(&series.quantities)?,
        ModelKind::AdditiveTrendSeasonal { period } => {
            fit_trend_seasonal(&series.quantities, period)?
        }
    };

    Ok((model.forecast(horizon), model.summary))
}

/// Fit Holt's additive trend model.
pub fn fit_trend(values: &[f64]) -> Result<FittedModel, ForecastError> {
    let kind = ModelKind::AdditiveTrend;
    check_input(values, MIN_DATA_POINTS)?;

    // Back-cast one step so the first one-step prediction equals y[0].
    let trend = values[1] - values[0];
    let init = InitialState {
        level: values[0] - trend,
        trend,
        seasonals: Vec::new(),
    };

    fit_smoothing(values, init, kind)
}

/// Fit the additive trend, additive seasonal Holt-Winters model.
pub fn fit_trend_seasonal(values: &[f64], period: usize) -> Result<FittedModel, ForecastError> {
    let kind = ModelKind::AdditiveTrendSeasonal { period };
    check_input(values, 2 * period)?;

    let first_mean = mean(&values[..period]);
    let second_mean = mean(&values[period..2 * period]);
    let init = InitialState {
        level: first_mean,
        trend: (second_mean - first_mean) / period as f64,
        seasonals: values[..period].iter().map(|y| y - first_mean).collect(),
    };

    fit_smoothing(values, init, kind)
}

fn check_input(values: &[f64], required: usize) -> Result<(), ForecastError> {
    if values.len() < required {
        return Err(ForecastError::InsufficientData {
            required,
            actual: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::ModelFit {
            model: "input",
            reason: "series contains non-finite values".to_string(),
        });
    }
    Ok(())
}

/// Optimize the smoothing parameters with Levenberg-Marquardt, then replay the
/// recursion at the optimum to obtain the final state.
fn fit_smoothing(
    values: &[f64],
    init: InitialState,
    kind: ModelKind,
) -> Result<FittedModel, ForecastError> {
    let start = grid_start(values, &init);
    let start_sse = sse_at(values, &init, &start);

    let problem = SmoothingProblem {
        values,
        init,
        theta: start.clone(),
    };

    let (problem, report) = LevenbergMarquardt::new().minimize(problem);

    // A parameter resting on its bound leaves the optimizer creeping along a
    // flat direction; the point it stops at is still the best it has seen.
    let accepted = report.termination.was_successful()
        || matches!(
            report.termination,
            TerminationReason::NoImprovementPossible(_) | TerminationReason::LostPatience
        );
    if !accepted {
        return Err(ForecastError::ModelFit {
            model: kind.name(),
            reason: format!(
                "optimizer did not converge ({:?} after {} evaluations)",
                report.termination, report.number_of_evaluations
            ),
        });
    }

    let theta = if sse_at(values, &problem.init, &problem.theta) <= start_sse {
        problem.theta.clone()
    } else {
        start
    };
    let params = SmoothingParams::from_theta(&theta);
    let state = smooth(values, &problem.init, params);
    let sse: f64 = state.residuals.iter().map(|r| r * r).sum();

    if !sse.is_finite() || !state.level.is_finite() || !state.trend.is_finite() {
        return Err(ForecastError::ModelFit {
            model: kind.name(),
            reason: "fitted state is not finite".to_string(),
        });
    }

    debug!(
        model = kind.name(),
        alpha = params.alpha,
        beta = params.beta,
        gamma = ?params.gamma,
        sse,
        evaluations = report.number_of_evaluations,
        termination = ?report.termination,
        "fitted exponential smoothing model"
    );

    Ok(FittedModel {
        summary: ModelSummary {
            kind,
            alpha: params.alpha,
            beta: params.beta,
            gamma: params.gamma,
            sse,
        },
        level: state.level,
        trend: state.trend,
        seasonals: state.seasonals,
        observations: values.len(),
    })
}

#[derive(Debug, Clone)]
struct InitialState {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct SmoothingParams {
    alpha: f64,
    beta: f64,
    gamma: Option<f64>,
}

impl SmoothingParams {
    /// Map unconstrained optimizer coordinates into `[PARAM_FLOOR, 1 - PARAM_FLOOR]`.
    fn from_theta(theta: &DVector<f64>) -> Self {
        Self {
            alpha: bounded(theta[0]),
            beta: bounded(theta[1]),
            gamma: theta.get(2).map(|g| bounded(*g)),
        }
    }
}

struct SmoothedState {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    /// One-step-ahead errors, one per observation.
    residuals: Vec<f64>,
}

/// Run the additive Holt-Winters recursion over `values`.
fn smooth(values: &[f64], init: &InitialState, params: SmoothingParams) -> SmoothedState {
    let SmoothingParams { alpha, beta, gamma } = params;
    let gamma = gamma.unwrap_or(0.0);
    let mut level = init.level;
    let mut trend = init.trend;
    let mut seasonals = init.seasonals.clone();
    let period = seasonals.len();
    let mut residuals = Vec::with_capacity(values.len());

    for (t, &y) in values.iter().enumerate() {
        let seasonal = if period > 0 { seasonals[t % period] } else { 0.0 };
        let error = y - (level + trend + seasonal);
        residuals.push(error);

        // Error-correction form: an exact one-step prediction leaves the state untouched.
        let prev_level = level;
        level = level + trend + alpha * error;
        trend += beta * (level - prev_level - trend);
        if period > 0 {
            seasonals[t % period] = seasonal + gamma * (y - level - seasonal);
        }
    }

    SmoothedState {
        level,
        trend,
        seasonals,
        residuals,
    }
}

/// Least-squares problem over the one-step-ahead errors.
///
/// Parameters are unconstrained coordinates for alpha, beta and (seasonal
/// model only) gamma; [`bounded`] maps each into its admissible interval.
struct SmoothingProblem<'a> {
    values: &'a [f64],
    init: InitialState,
    theta: DVector<f64>,
}

impl SmoothingProblem<'_> {
    fn residuals_at(&self, theta: &DVector<f64>) -> Vec<f64> {
        smooth(self.values, &self.init, SmoothingParams::from_theta(theta)).residuals
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for SmoothingProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, p: &DVector<f64>) {
        self.theta.copy_from(p);
    }

    fn params(&self) -> DVector<f64> {
        self.theta.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let residuals = self.residuals_at(&self.theta);
        residuals
            .iter()
            .all(|r| r.is_finite())
            .then(|| DVector::from_vec(residuals))
    }

    /// Central finite differences; the recursion has no convenient closed-form derivative.
    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let rows = self.values.len();
        let cols = self.theta.len();
        let mut jac = DMatrix::<f64>::zeros(rows, cols);

        for j in 0..cols {
            let step = 1e-6 * self.theta[j].abs().max(1.0);
            let mut forward = self.theta.clone();
            let mut backward = self.theta.clone();
            forward[j] += step;
            backward[j] -= step;

            let r_forward = self.residuals_at(&forward);
            let r_backward = self.residuals_at(&backward);
            for i in 0..rows {
                let d = (r_forward[i] - r_backward[i]) / (2.0 * step);
                if !d.is_finite() {
                    return None;
                }
                jac[(i, j)] = d;
            }
        }
        Some(jac)
    }
}

/// Lowest-SSE point of the parameter grid, in optimizer coordinates.
fn grid_start(values: &[f64], init: &InitialState) -> DVector<f64> {
    let gammas: &[f64] = if init.seasonals.is_empty() {
        &[]
    } else {
        &GAMMA_GRID
    };

    let mut candidates = Vec::new();
    for &alpha in &ALPHA_GRID {
        for &beta in &BETA_GRID {
            if gammas.is_empty() {
                candidates.push(vec![unbounded(alpha), unbounded(beta)]);
            }
            for &gamma in gammas {
                candidates.push(vec![unbounded(alpha), unbounded(beta), unbounded(gamma)]);
            }
        }
    }

    let mut best = DVector::from_vec(candidates[0].clone());
    let mut best_sse = f64::INFINITY;
    for coords in candidates {
        let theta = DVector::from_vec(coords);
        let sse = sse_at(values, init, &theta);
        if sse < best_sse {
            best_sse = sse;
            best = theta;
        }
    }
    best
}

fn sse_at(values: &[f64], init: &InitialState, theta: &DVector<f64>) -> f64 {
    let sse: f64 = smooth(values, init, SmoothingParams::from_theta(theta))
        .residuals
        .iter()
        .map(|r| r * r)
        .sum();
    if sse.is_finite() {
        sse
    } else {
        f64::INFINITY
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn bounded(theta: f64) -> f64 {
    PARAM_FLOOR + (1.0 - 2.0 * PARAM_FLOOR) * sigmoid(theta.clamp(-THETA_LIMIT, THETA_LIMIT))
}

/// Inverse of [`bounded`] for `p` inside the bounds.
fn unbounded(p: f64) -> f64 {
    let q = (p - PARAM_FLOOR) / (1.0 - 2.0 * PARAM_FLOOR);
    (q / (1.0 - q)).ln()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
