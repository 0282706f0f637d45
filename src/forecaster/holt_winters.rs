//! Additive damped-trend, additive-seasonal exponential smoothing.
//!
//! Recursions for an observation `y` at time `t` with seasonal period `m`:
//!
//! ```text
//! l_t = alpha * (y - s_{t-m}) + (1 - alpha) * (l_{t-1} + phi * b_{t-1})
//! b_t = beta * (l_t - l_{t-1}) + (1 - beta) * phi * b_{t-1}
//! s_t = gamma * (y - l_{t-1} - phi * b_{t-1}) + (1 - gamma) * s_{t-m}
//! y_hat_{t+h} = l_t + (phi + ... + phi^h) * b_t + s_{t+h-m(k+1)}
//! ```

use super::optimize::{nelder_mead, NelderMeadConfig, ParamBound};
use super::ForecastError;

const ALPHA: ParamBound = ParamBound::new(1e-4, 0.9999);
const UNIT: ParamBound = ParamBound::new(0.0, 1.0);
const PHI: ParamBound = ParamBound::new(0.8, 0.98);

const START_ALPHA: f64 = 0.3;
const START_BETA_RATIO: f64 = 0.1;
const START_GAMMA_RATIO: f64 = 0.1;
const START_PHI: f64 = 0.95;

const SMOOTHING_DIMS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub phi: f64,
}

impl SmoothingParams {
    /// `beta` is bounded by `alpha` and `gamma` by `1 - alpha`.
    fn from_raw(raw: &[f64]) -> Self {
        let alpha = ALPHA.map_sigmoid(raw[0]);
        Self {
            alpha,
            beta: alpha * UNIT.map_sigmoid(raw[1]),
            gamma: (1.0 - alpha) * UNIT.map_sigmoid(raw[2]),
            phi: PHI.map_sigmoid(raw[3]),
        }
    }

    fn start_raw() -> [f64; SMOOTHING_DIMS] {
        [
            ALPHA.inv_sigmoid(START_ALPHA),
            UNIT.inv_sigmoid(START_BETA_RATIO),
            UNIT.inv_sigmoid(START_GAMMA_RATIO),
            PHI.inv_sigmoid(START_PHI),
        ]
    }
}

/// Level, trend and one seasonal slot per phase. `season[t % m]` holds the
/// most recent seasonal estimate for the phase of time `t`.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingState {
    pub level: f64,
    pub trend: f64,
    pub season: Vec<f64>,
    pub observed: usize,
}

impl SmoothingState {
    pub fn period(&self) -> usize {
        self.season.len()
    }

    /// Apply one observation and return its one-step-ahead error.
    pub fn observe(&mut self, y: f64, p: &SmoothingParams) -> f64 {
        let slot = self.observed % self.period();
        let s_old = self.season[slot];
        let damped = self.level + p.phi * self.trend;
        let err = y - (damped + s_old);

        let level = p.alpha * (y - s_old) + (1.0 - p.alpha) * damped;
        self.trend = p.beta * (level - self.level) + (1.0 - p.beta) * p.phi * self.trend;
        self.season[slot] = p.gamma * (y - damped) + (1.0 - p.gamma) * s_old;
        self.level = level;
        self.observed += 1;
        err
    }

    /// Point forecast `steps` ahead of the last observation (`steps >= 1`).
    pub fn forecast(&self, p: &SmoothingParams, steps: usize) -> f64 {
        let steps = steps.max(1);
        let mut damp_sum = 0.0;
        let mut phi_pow = 1.0;
        for _ in 0..steps {
            phi_pow *= p.phi;
            damp_sum += phi_pow;
        }
        let slot = (self.observed + steps - 1) % self.period();
        self.level + damp_sum * self.trend + self.season[slot]
    }

    pub fn is_finite(&self) -> bool {
        self.level.is_finite()
            && self.trend.is_finite()
            && self.season.iter().all(|s| s.is_finite())
    }
}

/// Initial state from the first two full seasons: level is the first
/// season's mean, trend the per-step drift between season means, and the
/// seasonal slots the averaged, zero-centred deviations from those means.
pub fn heuristic_state(history: &[f64], period: usize) -> SmoothingState {
    let m = period;
    let mean_of = |s: &[f64]| s.iter().sum::<f64>() / s.len() as f64;
    let first = mean_of(&history[..m]);
    let second = mean_of(&history[m..2 * m]);

    let mut season: Vec<f64> = (0..m)
        .map(|i| ((history[i] - first) + (history[m + i] - second)) / 2.0)
        .collect();
    let center = mean_of(&season);
    for s in &mut season {
        *s -= center;
    }

    SmoothingState {
        level: first,
        trend: (second - first) / m as f64,
        season,
        observed: 0,
    }
}

fn sum_squared_errors(history: &[f64], mut state: SmoothingState, p: &SmoothingParams) -> f64 {
    let mut sse = 0.0;
    for &y in history {
        let e = state.observe(y, p);
        sse += e * e;
    }
    sse
}

/// Result of fitting: parameters, the state after the whole history, and
/// the in-sample SSE.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub params: SmoothingParams,
    pub initial: SmoothingState,
    pub state: SmoothingState,
    pub sse: f64,
}

impl FittedModel {
    pub fn forecast(&self, steps: usize) -> f64 {
        self.state.forecast(&self.params, steps)
    }
}

/// Spread of the history used to scale the initial-state search.
fn state_scale(history: &[f64]) -> f64 {
    let n = history.len() as f64;
    let mean = history.iter().sum::<f64>() / n;
    let var = history.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / n;
    let sd = var.sqrt();
    if sd > 0.0 && sd.is_finite() {
        sd
    } else {
        1.0
    }
}

/// Fit the model to `history` by minimising in-sample one-step SSE.
///
/// The first pass searches the smoothing parameters from the heuristic
/// initial state; the second jointly refines parameters and initial state.
pub fn fit(history: &[f64], period: usize) -> Result<FittedModel, ForecastError> {
    if period == 0 {
        return Err(ForecastError::InvalidPeriod);
    }
    let need = 2 * period;
    if history.len() < need {
        return Err(ForecastError::InsufficientHistory {
            have: history.len(),
            need,
        });
    }
    if let Some(index) = history.iter().position(|y| !y.is_finite()) {
        return Err(ForecastError::NonFiniteHistory { index });
    }

    let base = heuristic_state(history, period);
    let scale = state_scale(history);

    let smoothing = nelder_mead(
        |raw| sum_squared_errors(history, base.clone(), &SmoothingParams::from_raw(raw)),
        &SmoothingParams::start_raw(),
        &[1.0; SMOOTHING_DIMS],
        NelderMeadConfig {
            max_iter: 400,
            ..NelderMeadConfig::default()
        },
    );

    let with_state = |raw: &[f64]| {
        let mut st = base.clone();
        st.level += scale * raw[SMOOTHING_DIMS];
        st.trend += scale / period as f64 * raw[SMOOTHING_DIMS + 1];
        for (s, z) in st.season.iter_mut().zip(&raw[SMOOTHING_DIMS + 2..]) {
            *s += scale * z;
        }
        st
    };

    let dims = SMOOTHING_DIMS + 2 + period;
    let mut x0 = smoothing.x.clone();
    x0.resize(dims, 0.0);
    let mut steps = vec![0.5; SMOOTHING_DIMS];
    steps.resize(dims, 0.1);
    let joint = nelder_mead(
        |raw| sum_squared_errors(history, with_state(raw), &SmoothingParams::from_raw(raw)),
        &x0,
        &steps,
        NelderMeadConfig {
            max_iter: 100 * dims,
            ..NelderMeadConfig::default()
        },
    );

    let best = if joint.fx <= smoothing.fx {
        joint.x
    } else {
        x0
    };
    let params = SmoothingParams::from_raw(&best);
    let initial = with_state(&best);
    let mut state = initial.clone();
    let mut sse = 0.0;
    for &y in history {
        let e = state.observe(y, &params);
        sse += e * e;
    }
    if !sse.is_finite() || !state.is_finite() {
        return Err(ForecastError::NonConvergence);
    }

    tracing::trace!(
        alpha = params.alpha,
        beta = params.beta,
        gamma = params.gamma,
        phi = params.phi,
        sse,
        iterations = smoothing.iterations + joint.iterations,
        converged = joint.converged,
        "holt-winters fit"
    );

    Ok(FittedModel {
        params,
        initial,
        state,
        sse,
    })
}
