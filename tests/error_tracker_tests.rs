use ticker_forecast::error_tracker::{positional_mae, ErrorAlignment, ErrorTracker};
use ticker_forecast::series::{ForecastPoint, ForecastSeries};

fn series_from(points: &[(usize, f64)], cap: usize) -> ForecastSeries {
    let mut s = ForecastSeries::with_cap(cap);
    for &(made_at, value) in points {
        s.push(ForecastPoint { made_at, value });
    }
    s
}

#[test]
fn absent_until_mid_history_reaches_three_minutes() {
    let tracker = ErrorTracker::new(12, ErrorAlignment::Position);
    let forecasts = series_from(&[(0, 1.0); 20], 180);
    let mids = vec![1.0; 35];
    assert_eq!(tracker.compute(1, &forecasts, &mids), None);

    let mids = vec![1.0; 36];
    assert!(tracker.compute(1, &forecasts, &mids).is_some());
}

#[test]
fn absent_when_fewer_forecasts_than_horizon_minutes() {
    let tracker = ErrorTracker::new(12, ErrorAlignment::Position);
    let forecasts = series_from(&[(0, 1.0); 4], 180);
    let mids = vec![1.0; 100];
    assert_eq!(tracker.compute(5, &forecasts, &mids), None);
}

/// 17 forecasts clear the h=5 gate but a 60-entry window cannot be filled.
#[test]
fn absent_when_forecast_window_is_shorter() {
    let tracker = ErrorTracker::new(12, ErrorAlignment::Position);
    let forecasts = series_from(&[(0, 101.0); 17], 180);
    let mids = vec![101.0; 40];
    assert_eq!(tracker.compute(5, &forecasts, &mids), None);
    assert_eq!(tracker.compute(1, &forecasts, &mids), Some(0.0));
}

#[test]
fn positional_pairs_from_the_end() {
    let forecasts = [1.0, 2.0, 3.0, 4.0];
    let mids = [0.0, 0.0, 0.0, 0.0, 10.0, 20.0];
    let e = positional_mae(&forecasts, &mids, 2).unwrap();
    assert!((e - 11.5).abs() < f64::EPSILON);
    assert_eq!(positional_mae(&forecasts, &mids, 6), None);
}

#[test]
fn position_alignment_through_tracker() {
    let tracker = ErrorTracker::new(2, ErrorAlignment::Position);
    let forecasts = series_from(&[(3, 1.0), (4, 2.0), (5, 3.0), (6, 4.0)], 30);
    let mids = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0, 20.0];
    let e = tracker.compute(1, &forecasts, &mids).unwrap();
    assert!((e - 11.5).abs() < f64::EPSILON);
}

/// With two entries per minute a forecast made at tick t targets tick t + 2.
#[test]
fn target_alignment_matches_forecast_to_its_tick() {
    let tracker = ErrorTracker::new(2, ErrorAlignment::Target);
    let mids: Vec<f64> = (0..8).map(|i| i as f64).collect();
    let forecasts = series_from(
        &[(3, 100.0), (4, 6.5), (5, 6.0), (6, 100.0), (7, 100.0)],
        30,
    );
    // window is ticks 6..=7; only forecasts made at 4 and 5 land there
    let e = tracker.compute(1, &forecasts, &mids).unwrap();
    assert!((e - 0.75).abs() < f64::EPSILON);
}

#[test]
fn target_alignment_absent_without_matured_forecasts() {
    let tracker = ErrorTracker::new(2, ErrorAlignment::Target);
    let mids: Vec<f64> = (0..8).map(|i| i as f64).collect();
    let forecasts = series_from(&[(6, 1.0), (7, 1.0)], 30);
    assert_eq!(tracker.compute(1, &forecasts, &mids), None);
}

#[test]
fn target_alignment_uses_same_gate() {
    let tracker = ErrorTracker::new(2, ErrorAlignment::Target);
    let mids: Vec<f64> = (0..5).map(|i| i as f64).collect();
    let forecasts = series_from(&[(1, 3.0)], 30);
    assert_eq!(tracker.compute(1, &forecasts, &mids), None);
    assert_eq!(tracker.alignment(), ErrorAlignment::Target);
}
