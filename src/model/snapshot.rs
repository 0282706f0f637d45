use serde::Serialize;

use crate::error_tracker::ERROR_HORIZONS_MIN;

/// Everything derived on one sampling tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// 1-based tick counter (equals the mid-price series length).
    pub tick: usize,
    pub timestamp_ms: i64,
    pub bid: f64,
    pub ask: f64,
    pub bid_qty: f64,
    pub ask_qty: f64,
    pub max_spread: f64,
    pub avg_mid_1m: f64,
    pub avg_mid_5m: f64,
    pub avg_mid_15m: f64,
    pub latest_forecast: Option<f64>,
    pub err_1m: Option<f64>,
    pub err_5m: Option<f64>,
    pub err_15m: Option<f64>,
}

impl MetricsSnapshot {
    /// Error figures keyed by their horizon in minutes.
    pub fn errors(&self) -> [(usize, Option<f64>); 3] {
        let [short, mid, long] = ERROR_HORIZONS_MIN;
        [(short, self.err_1m), (mid, self.err_5m), (long, self.err_15m)]
    }
}
