//! Per-session weather slice.
//!
//! Each refresh takes a ticket; only the holder of the latest ticket may write its result,
//! so a slow response for a previously accepted site cannot overwrite the current one.

use super::client::WeatherProvider;
use super::types::WeatherReport;

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

pub const WEATHER_FAILED_NOTICE: &str = "Failed to fetch weather data.";

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct WeatherSnapshot {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub loading: bool,
    pub report: Option<WeatherReport>,
    pub notice: Option<String>,
}

#[derive(Default)]
struct WeatherSlice {
    snapshot: WeatherSnapshot,
    ticket: u64,
}

#[derive(Default)]
pub struct WeatherState {
    slice: Mutex<WeatherSlice>,
}

impl WeatherState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, WeatherSlice> {
        self.slice.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> WeatherSnapshot {
        self.lock().snapshot.clone()
    }

    /// Conditions for the most recently requested site; `None` while that fetch is pending.
    pub fn report(&self) -> Option<WeatherReport> {
        self.lock().snapshot.report.clone()
    }

    /// Fetches conditions for `(lat, lon)` and stores them if still current.
    ///
    /// Returns the stored report, or `None` on failure or when superseded.
    pub async fn refresh(
        &self,
        provider: &dyn WeatherProvider,
        lat: f64,
        lon: f64,
    ) -> Option<WeatherReport> {
        let ticket = {
            let mut slice = self.lock();
            slice.ticket += 1;
            slice.snapshot.lat = Some(lat);
            slice.snapshot.lon = Some(lon);
            slice.snapshot.loading = true;
            slice.snapshot.report = None;
            slice.snapshot.notice = None;
            slice.ticket
        };

        let result = provider.current(lat, lon).await;

        let mut slice = self.lock();
        if slice.ticket != ticket {
            tracing::debug!("Discarding weather for superseded site ({}, {})", lat, lon);
            return None;
        }
        slice.snapshot.loading = false;

        match result {
            Ok(report) => {
                tracing::info!(
                    "Weather at ({}, {}): {} {:.1}°C",
                    lat,
                    lon,
                    report.condition,
                    report.temperature_c
                );
                slice.snapshot.report = Some(report.clone());
                slice.snapshot.notice = None;
                Some(report)
            }
            Err(err) => {
                tracing::warn!("Weather fetch failed for ({}, {}): {}", lat, lon, err);
                slice.snapshot.report = None;
                slice.snapshot.notice = Some(WEATHER_FAILED_NOTICE.to_string());
                None
            }
        }
    }
}
