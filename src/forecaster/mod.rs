pub mod holt_winters;
pub mod optimize;

use serde::Deserialize;
use thiserror::Error;

use holt_winters::FittedModel;

/// Full seasons of history required before a forecast is attempted.
pub const MIN_SEASONS: usize = 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("insufficient history: have {have}, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("seasonal period must be > 0")]
    InvalidPeriod,

    #[error("non-finite observation at index {index}")]
    NonFiniteHistory { index: usize },

    #[error("model fit did not converge to a finite state")]
    NonConvergence,

    #[error("forecast is not finite")]
    NonFiniteForecast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMode {
    /// Refit from scratch on the full history every tick.
    #[default]
    Refit,
    /// Fit once, then advance the fitted state one observation per tick.
    Incremental,
}

/// Stateless forecaster: every call fits the model on the whole history.
#[derive(Debug, Clone)]
pub struct RefitForecaster {
    period: usize,
    horizon: usize,
}

impl RefitForecaster {
    /// `period` is both the seasonal period and the forecast horizon.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            horizon: period,
        }
    }

    pub fn min_history(&self) -> usize {
        MIN_SEASONS * self.period
    }

    pub fn forecast(&self, history: &[f64]) -> Result<f64, ForecastError> {
        let fitted = holt_winters::fit(history, self.period)?;
        finite_forecast(&fitted, self.horizon)
    }
}

/// Online variant: parameters are estimated once and then held fixed.
#[derive(Debug, Clone)]
pub struct IncrementalForecaster {
    period: usize,
    horizon: usize,
    refit_every: usize,
    fitted: Option<FittedModel>,
    consumed: usize,
    since_refit: usize,
}

impl IncrementalForecaster {
    /// `refit_every == 0` disables periodic refits.
    pub fn new(period: usize, refit_every: usize) -> Self {
        Self {
            period,
            horizon: period,
            refit_every,
            fitted: None,
            consumed: 0,
            since_refit: 0,
        }
    }

    pub fn min_history(&self) -> usize {
        MIN_SEASONS * self.period
    }

    pub fn fitted(&self) -> Option<&FittedModel> {
        self.fitted.as_ref()
    }

    pub fn forecast(&mut self, history: &[f64]) -> Result<f64, ForecastError> {
        let refit_due = self.refit_every > 0 && self.since_refit >= self.refit_every;
        let advanced = match self.fitted.as_mut() {
            Some(model) if !refit_due && history.len() >= self.consumed => {
                for &y in &history[self.consumed..] {
                    model.state.observe(y, &model.params);
                }
                model.state.is_finite()
            }
            _ => false,
        };

        if advanced {
            self.since_refit += history.len() - self.consumed;
        } else {
            self.fitted = None;
            let model = holt_winters::fit(history, self.period)?;
            self.fitted = Some(model);
            self.since_refit = 0;
        }
        self.consumed = history.len();

        match self.fitted.as_ref() {
            Some(model) => finite_forecast(model, self.horizon),
            None => Err(ForecastError::NonConvergence),
        }
    }
}

fn finite_forecast(model: &FittedModel, horizon: usize) -> Result<f64, ForecastError> {
    let value = model.forecast(horizon);
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ForecastError::NonFiniteForecast)
    }
}

#[derive(Debug, Clone)]
pub enum Forecaster {
    Refit(RefitForecaster),
    Incremental(IncrementalForecaster),
}

impl Forecaster {
    pub fn new(mode: ForecastMode, period: usize, refit_every: usize) -> Self {
        match mode {
            ForecastMode::Refit => Self::Refit(RefitForecaster::new(period)),
            ForecastMode::Incremental => {
                Self::Incremental(IncrementalForecaster::new(period, refit_every))
            }
        }
    }

    pub fn mode(&self) -> ForecastMode {
        match self {
            Self::Refit(_) => ForecastMode::Refit,
            Self::Incremental(_) => ForecastMode::Incremental,
        }
    }

    /// Point forecast one horizon past the end of `history`, or `None` when
    /// history is too short or the fit fails for this call.
    pub fn step(&mut self, history: &[f64]) -> Option<f64> {
        let min_history = match self {
            Self::Refit(f) => f.min_history(),
            Self::Incremental(f) => f.min_history(),
        };
        if history.len() < min_history {
            return None;
        }
        let result = match self {
            Self::Refit(f) => f.forecast(history),
            Self::Incremental(f) => f.forecast(history),
        };
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(error = %e, len = history.len(), "forecast unavailable");
                None
            }
        }
    }
}
