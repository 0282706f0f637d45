use ticker_forecast::forecaster::holt_winters;
use ticker_forecast::forecaster::{
    ForecastError, ForecastMode, Forecaster, IncrementalForecaster, RefitForecaster,
};

const EPM: usize = 12;

fn wavy_prices(n: usize) -> Vec<f64> {
    (0..n)
        .map(|t| {
            let phase = 2.0 * std::f64::consts::PI * (t % EPM) as f64 / EPM as f64;
            30_000.0 + 0.4 * t as f64 + 3.0 * phase.sin() + if t % 5 == 0 { 0.7 } else { -0.2 }
        })
        .collect()
}

#[test]
fn absent_below_two_seasons_present_at_two() {
    let mut f = Forecaster::new(ForecastMode::Refit, EPM, 0);
    let prices = wavy_prices(24);
    assert_eq!(f.step(&prices[..23]), None);
    let v = f.step(&prices).expect("forecast at 24 points");
    assert!(v.is_finite());
}

#[test]
fn constant_series_forecasts_the_constant() {
    let f = RefitForecaster::new(EPM);
    for n in [24, 30, 40] {
        let v = f.forecast(&vec![101.0; n]).unwrap();
        assert!((v - 101.0).abs() < 1e-6, "n={} forecast={}", n, v);
    }
}

#[test]
fn refit_is_deterministic_for_same_history() {
    let prices = wavy_prices(48);
    let f = RefitForecaster::new(EPM);
    let a = f.forecast(&prices).unwrap();
    let b = f.forecast(&prices).unwrap();
    assert_eq!(a.to_bits(), b.to_bits());
}

#[test]
fn forecast_stays_near_recent_prices() {
    let prices = wavy_prices(72);
    let v = RefitForecaster::new(EPM).forecast(&prices).unwrap();
    let last = *prices.last().unwrap();
    assert!((v - last).abs() < 20.0, "forecast {} vs last {}", v, last);
}

#[test]
fn non_finite_history_degrades_to_absent() {
    let mut prices = wavy_prices(30);
    prices[10] = f64::INFINITY;
    let f = RefitForecaster::new(EPM);
    assert_eq!(
        f.forecast(&prices),
        Err(ForecastError::NonFiniteHistory { index: 10 })
    );
    let mut wrapped = Forecaster::new(ForecastMode::Refit, EPM, 0);
    assert_eq!(wrapped.step(&prices), None);
}

#[test]
fn incremental_first_forecast_matches_refit() {
    let prices = wavy_prices(24);
    let refit = RefitForecaster::new(EPM).forecast(&prices).unwrap();
    let mut inc = IncrementalForecaster::new(EPM, 0);
    let first = inc.forecast(&prices).unwrap();
    assert_eq!(refit.to_bits(), first.to_bits());
}

#[test]
fn incremental_keeps_params_and_advances_state() {
    let prices = wavy_prices(40);
    let mut inc = IncrementalForecaster::new(EPM, 0);
    inc.forecast(&prices[..24]).unwrap();
    let params = inc.fitted().unwrap().params;

    for n in 25..=40 {
        let v = inc.forecast(&prices[..n]).unwrap();
        assert!(v.is_finite());
        let fitted = inc.fitted().unwrap();
        assert_eq!(fitted.params, params);
        assert_eq!(fitted.state.observed, n);
    }
}

#[test]
fn incremental_state_equals_replaying_fitted_params() {
    let prices = wavy_prices(36);
    let mut inc = IncrementalForecaster::new(EPM, 0);
    inc.forecast(&prices[..24]).unwrap();
    let v = inc.forecast(&prices).unwrap();

    let fitted = inc.fitted().unwrap();
    let mut replay = fitted.initial.clone();
    for &y in &prices {
        replay.observe(y, &fitted.params);
    }
    let expected = replay.forecast(&fitted.params, EPM);
    assert!((v - expected).abs() < 1e-9);
}

#[test]
fn incremental_refits_on_schedule() {
    let prices = wavy_prices(60);
    let mut inc = IncrementalForecaster::new(EPM, 3);
    inc.forecast(&prices[..24]).unwrap();
    for n in 25..=27 {
        inc.forecast(&prices[..n]).unwrap();
    }
    // three ticks advanced; the next call refits on the full history
    inc.forecast(&prices[..28]).unwrap();
    let refit = holt_winters::fit(&prices[..28], EPM).unwrap();
    assert_eq!(inc.fitted().unwrap().params, refit.params);
}

#[test]
fn incremental_refits_when_history_shrinks() {
    let prices = wavy_prices(40);
    let mut inc = IncrementalForecaster::new(EPM, 0);
    inc.forecast(&prices).unwrap();
    let v = inc.forecast(&prices[..30]).unwrap();
    let fresh = RefitForecaster::new(EPM).forecast(&prices[..30]).unwrap();
    assert_eq!(v.to_bits(), fresh.to_bits());
}

#[test]
fn incremental_refits_after_state_turns_non_finite() {
    let prices = wavy_prices(30);
    let mut inc = IncrementalForecaster::new(EPM, 0);
    inc.forecast(&prices[..24]).unwrap();
    assert!(inc.fitted().is_some());

    // a NaN observation poisons the online state; the refit then rejects it
    let mut poisoned = prices[..25].to_vec();
    poisoned[24] = f64::NAN;
    assert_eq!(
        inc.forecast(&poisoned),
        Err(ForecastError::NonFiniteHistory { index: 24 })
    );
    assert!(inc.fitted().is_none());

    // clean history afterwards is fitted from scratch
    let v = inc.forecast(&prices[..26]).unwrap();
    let fresh = RefitForecaster::new(EPM).forecast(&prices[..26]).unwrap();
    assert_eq!(v.to_bits(), fresh.to_bits());
    assert_eq!(inc.fitted().unwrap().state.observed, 26);

    let mut wrapped = Forecaster::new(ForecastMode::Incremental, EPM, 0);
    assert!(wrapped.step(&prices[..24]).is_some());
    assert_eq!(wrapped.step(&poisoned), None);
    assert!(wrapped.step(&prices[..26]).is_some());
}

#[test]
fn mode_is_reported() {
    assert_eq!(
        Forecaster::new(ForecastMode::Incremental, EPM, 0).mode(),
        ForecastMode::Incremental
    );
    assert_eq!(
        Forecaster::new(ForecastMode::Refit, EPM, 0).mode(),
        ForecastMode::Refit
    );
}
