use serde::Deserialize;

use crate::series::ForecastSeries;

/// Horizons (minutes) reported on every tick.
pub const ERROR_HORIZONS_MIN: [usize; 3] = [1, 5, 15];

/// Minutes of mid-price history required before any error is reported.
pub const ERROR_WARMUP_MIN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorAlignment {
    /// Pair the i-th newest forecast with the i-th newest mid price.
    #[default]
    Position,
    /// Pair each forecast with the mid price at the tick it targeted.
    Target,
}

/// Mean absolute forecasting error over trailing windows.
#[derive(Debug, Clone, Copy)]
pub struct ErrorTracker {
    entries_per_minute: usize,
    alignment: ErrorAlignment,
}

impl ErrorTracker {
    pub fn new(entries_per_minute: usize, alignment: ErrorAlignment) -> Self {
        Self {
            entries_per_minute,
            alignment,
        }
    }

    pub fn alignment(&self) -> ErrorAlignment {
        self.alignment
    }

    /// Error over the last `horizon_min` minutes, or `None` while not enough
    /// forecasts or mid prices exist.
    ///
    /// The forecast-count gate compares against `horizon_min` itself, not
    /// the window length, so short forecast histories pass it; the window
    /// length check below then rejects them.
    pub fn compute(
        &self,
        horizon_min: usize,
        forecasts: &ForecastSeries,
        mids: &[f64],
    ) -> Option<f64> {
        if forecasts.len() < horizon_min
            || mids.len() < ERROR_WARMUP_MIN * self.entries_per_minute
        {
            return None;
        }
        let n = self.entries_per_minute * horizon_min;
        match self.alignment {
            ErrorAlignment::Position => positional_mae(&forecasts.values(), mids, n),
            ErrorAlignment::Target => self.target_mae(forecasts, mids, n),
        }
    }

    fn target_mae(&self, forecasts: &ForecastSeries, mids: &[f64], n: usize) -> Option<f64> {
        let lower = mids.len().saturating_sub(n);
        let (sum_abs, count) = forecasts
            .points()
            .filter_map(|p| {
                let target = p.made_at + self.entries_per_minute;
                if target >= lower && target < mids.len() {
                    Some((p.value - mids[target]).abs())
                } else {
                    None
                }
            })
            .fold((0.0, 0usize), |(s, c), e| (s + e, c + 1));
        if count == 0 {
            return None;
        }
        Some(sum_abs / count as f64)
    }
}

/// Mean absolute difference of the last `n` forecasts against the last `n`
/// mids, paired from the end. `None` if the forecast tail is the shorter one.
pub fn positional_mae(forecasts: &[f64], mids: &[f64], n: usize) -> Option<f64> {
    let f_tail = &forecasts[forecasts.len().saturating_sub(n)..];
    let m_tail = &mids[mids.len().saturating_sub(n)..];
    if f_tail.len() < m_tail.len() || m_tail.is_empty() {
        return None;
    }
    let sum_abs = f_tail
        .iter()
        .rev()
        .zip(m_tail.iter().rev())
        .map(|(f, y)| (f - y).abs())
        .sum::<f64>();
    Some(sum_abs / m_tail.len() as f64)
}
