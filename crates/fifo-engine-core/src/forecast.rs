use crate::error::Error;
use crate::storage::models::EntityFilter;
use crate::storage::Store;
use chrono::{Duration, Local};
use std::collections::BTreeMap;
use tracing::debug;

/// History window consulted for trend estimation, in days.
const HISTORY_WINDOW_DAYS: u32 = 14;

/// Maximum width of the moving-average window, in days.
const MOVING_AVG_DAYS: usize = 7;

/// Next-day usage prediction derived from aggregated daily history.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastData {
    pub current_mb: f64,
    pub predicted_mb: f64,
    /// Net drift in MB per day over the history window.
    pub growth_rate: f64,
    pub days_available: usize,
}

/// Predict tomorrow's total usage: a short moving average suppresses daily
/// noise, a tip-to-tail slope captures net drift. With fewer than two days
/// of history the prediction falls back to the current total.
pub fn compute_forecast(store: &Store, current_total_mb: f64) -> Result<ForecastData, Error> {
    let history = store.get_history(HISTORY_WINDOW_DAYS, &EntityFilter::any())?;

    // Sum all entities per date; BTreeMap keeps dates in ascending order.
    let mut daily_totals: BTreeMap<String, f64> = BTreeMap::new();
    for rec in &history {
        *daily_totals.entry(rec.measurement_date.clone()).or_insert(0.0) += rec.size_mb;
    }

    let days_available = daily_totals.len();
    if days_available <= 1 {
        return Ok(ForecastData {
            current_mb: current_total_mb,
            predicted_mb: current_total_mb,
            growth_rate: 0.0,
            days_available,
        });
    }

    let totals: Vec<f64> = daily_totals.values().copied().collect();

    let window = MOVING_AVG_DAYS.min(days_available);
    let moving_avg: f64 = totals[days_available - window..].iter().sum::<f64>() / window as f64;

    let growth_rate = (totals[days_available - 1] - totals[0]) / days_available as f64;
    let predicted_mb = (moving_avg + growth_rate).max(0.0);

    debug!(
        "Forecast from {} days: moving_avg={:.2} MB, growth={:.2} MB/day, predicted={:.2} MB",
        days_available, moving_avg, growth_rate, predicted_mb,
    );

    Ok(ForecastData {
        current_mb: current_total_mb,
        predicted_mb,
        growth_rate,
        days_available,
    })
}

/// Persist a forecast targeting tomorrow's local date.
pub fn store_forecast(store: &Store, data: &ForecastData) -> Result<(), Error> {
    let tomorrow = (Local::now() + Duration::days(1)).format("%Y-%m-%d").to_string();
    store.insert_forecast(&tomorrow, data.predicted_mb)?;
    Ok(())
}
