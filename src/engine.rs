use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::error_tracker::{ErrorAlignment, ErrorTracker, ERROR_HORIZONS_MIN};
use crate::forecaster::{ForecastMode, Forecaster};
use crate::model::snapshot::MetricsSnapshot;
use crate::series::{running_max, trailing_mean, ForecastPoint, MetricsState};
use crate::ticker_store::TickerStore;

/// Samples per minute. Also the seasonal period and forecast horizon.
pub const ENTRIES_PER_MINUTE: usize = 12;

/// Nominal sampling period: one minute split into [`ENTRIES_PER_MINUTE`] ticks.
pub const TICK_PERIOD: Duration = Duration::from_secs(60 / ENTRIES_PER_MINUTE as u64);

/// Rolling-average windows in minutes.
pub const AVG_WINDOWS_MIN: [usize; 3] = [1, 5, 15];

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub entries_per_minute: usize,
    pub tick_period: Duration,
    pub forecast_mode: ForecastMode,
    pub refit_every: usize,
    pub error_alignment: ErrorAlignment,
    pub wait_for_first_quote: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            entries_per_minute: ENTRIES_PER_MINUTE,
            tick_period: TICK_PERIOD,
            forecast_mode: ForecastMode::Refit,
            refit_every: 0,
            error_alignment: ErrorAlignment::Position,
            wait_for_first_quote: true,
        }
    }
}

pub struct MetricsEngine {
    cfg: EngineConfig,
    store: Arc<TickerStore>,
    state: MetricsState,
    forecaster: Forecaster,
    errors: ErrorTracker,
}

impl MetricsEngine {
    pub fn new(store: Arc<TickerStore>, cfg: EngineConfig) -> Self {
        let epm = cfg.entries_per_minute.max(1);
        let cfg = EngineConfig {
            entries_per_minute: epm,
            ..cfg
        };
        Self {
            cfg,
            store,
            state: MetricsState::new(epm),
            forecaster: Forecaster::new(cfg.forecast_mode, epm, cfg.refit_every),
            errors: ErrorTracker::new(epm, cfg.error_alignment),
        }
    }

    pub fn state(&self) -> &MetricsState {
        &self.state
    }

    /// One sampling step: read the latest quote, extend the series, refresh
    /// the forecast and the error figures.
    pub fn tick(&mut self) -> Result<MetricsSnapshot> {
        let epm = self.cfg.entries_per_minute;
        let quote = self.store.snapshot()?;
        self.state.push_sample(quote.mid_price(), quote.spread());

        let mids = &self.state.mid_prices;
        let [avg_1m, avg_5m, avg_15m] =
            AVG_WINDOWS_MIN.map(|w| trailing_mean(mids, epm * w).unwrap_or_default());
        let max_spread = running_max(&self.state.spreads).unwrap_or_default();

        if let Some(value) = self.forecaster.step(mids) {
            let made_at = mids.len() - 1;
            self.state.forecasts.push(ForecastPoint { made_at, value });
        }

        let [err_1m, err_5m, err_15m] = ERROR_HORIZONS_MIN
            .map(|h| self.errors.compute(h, &self.state.forecasts, &self.state.mid_prices));

        Ok(MetricsSnapshot {
            tick: self.state.tick_count(),
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            bid: quote.bid,
            ask: quote.ask,
            bid_qty: quote.bid_qty,
            ask_qty: quote.ask_qty,
            max_spread,
            avg_mid_1m: avg_1m,
            avg_mid_5m: avg_5m,
            avg_mid_15m: avg_15m,
            latest_forecast: self.state.forecasts.latest(),
            err_1m,
            err_5m,
            err_15m,
        })
    }

    /// Tick every `tick_period` until `shutdown` flips or the snapshot
    /// receiver goes away. A slow tick delays the next one; ticks never overlap.
    ///
    /// Each tick runs on the blocking pool so a long refit never occupies a
    /// runtime worker.
    pub async fn run(
        self,
        snapshot_tx: mpsc::Sender<MetricsSnapshot>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let mut engine = self;
        let mut ticker = tokio::time::interval(engine.cfg.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first interval tick completes immediately
        ticker.tick().await;

        tracing::info!(
            entries_per_minute = engine.cfg.entries_per_minute,
            tick_ms = engine.cfg.tick_period.as_millis() as u64,
            mode = ?engine.forecaster.mode(),
            alignment = ?engine.errors.alignment(),
            "metrics engine started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("metrics engine shutting down");
                        break;
                    }
                    continue;
                }
            }

            if engine.cfg.wait_for_first_quote && engine.store.update_count()? == 0 {
                tracing::debug!("no quote received yet, skipping tick");
                continue;
            }

            let (returned, result) = tokio::task::spawn_blocking(move || {
                let result = engine.tick();
                (engine, result)
            })
            .await
            .context("metrics tick panicked")?;
            engine = returned;
            let snapshot = result?;
            tracing::debug!(
                tick = snapshot.tick,
                forecast = ?snapshot.latest_forecast,
                "tick complete"
            );
            if snapshot_tx.send(snapshot).await.is_err() {
                tracing::info!("snapshot receiver closed, metrics engine exiting");
                break;
            }
        }
        Ok(())
    }
}
