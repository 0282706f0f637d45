use std::collections::VecDeque;

/// A forecast value tagged with the tick index (0-based position in the
/// mid-price series) at which it was produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastPoint {
    pub made_at: usize,
    pub value: f64,
}

/// Bounded FIFO of forecasts; the oldest entry is evicted once `cap` is exceeded.
#[derive(Debug, Clone)]
pub struct ForecastSeries {
    cap: usize,
    points: VecDeque<ForecastPoint>,
}

impl ForecastSeries {
    pub fn with_cap(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            points: VecDeque::with_capacity(cap.max(1) + 1),
        }
    }

    pub fn push(&mut self, point: ForecastPoint) {
        self.points.push_back(point);
        while self.points.len() > self.cap {
            let _ = self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn latest(&self) -> Option<f64> {
        self.points.back().map(|p| p.value)
    }

    pub fn points(&self) -> std::collections::vec_deque::Iter<'_, ForecastPoint> {
        self.points.iter()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// Series owned by the sampler. Mid and spread grow by exactly one entry per tick.
#[derive(Debug, Clone)]
pub struct MetricsState {
    pub mid_prices: Vec<f64>,
    pub spreads: Vec<f64>,
    pub forecasts: ForecastSeries,
}

impl MetricsState {
    pub fn new(entries_per_minute: usize) -> Self {
        Self {
            mid_prices: Vec::new(),
            spreads: Vec::new(),
            forecasts: ForecastSeries::with_cap(entries_per_minute * 15),
        }
    }

    pub fn push_sample(&mut self, mid: f64, spread: f64) {
        self.mid_prices.push(mid);
        self.spreads.push(spread);
    }

    pub fn tick_count(&self) -> usize {
        self.mid_prices.len()
    }
}

/// Mean of the last `window` values, or of all values when fewer exist.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    let start = values.len().saturating_sub(window);
    let tail = &values[start..];
    if tail.is_empty() {
        return None;
    }
    Some(tail.iter().sum::<f64>() / tail.len() as f64)
}

pub fn running_max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}
