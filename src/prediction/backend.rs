//! Remote prediction backend.
//!
//! POSTs the site and its weather to `{base}/predict` and expects daily totals plus
//! hourly series for the current and the optimal panel configuration.

use super::optimizer::{Optimizer, PredictionFuture};
use super::types::{EnergyProfile, PredictionReport, SiteParameters, Strategy};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct BackendRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub panel_count: u32,
    pub tilt: f64,
    pub azimuth: f64,
    pub surface_area: f64,
    pub irradiance: f64,
    pub weather: Option<BackendWeather>,
}

#[derive(Debug, Serialize)]
pub struct BackendWeather {
    pub temperature: f64,
    pub condition: String,
    pub wind_speed: f64,
    pub wind_direction: Option<f64>,
    pub humidity: f64,
    pub pressure: f64,
    pub cloud_cover: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct BackendResponse {
    pub current: BackendProfile,
    pub optimal: BackendOptimal,
}

#[derive(Debug, Deserialize)]
pub struct BackendProfile {
    pub daily_total: f64,
    #[serde(default)]
    pub hourly: Vec<f64>,
}

#[derive(Debug, Deserialize)]
pub struct BackendOptimal {
    pub tilt: f64,
    pub azimuth: f64,
    pub daily_total: f64,
    #[serde(default)]
    pub hourly: Vec<f64>,
}

impl From<&SiteParameters> for BackendRequest {
    fn from(site: &SiteParameters) -> Self {
        BackendRequest {
            latitude: site.lat,
            longitude: site.lon,
            panel_count: site.panel.panel_count,
            tilt: site.panel.tilt_deg,
            azimuth: site.panel.azimuth_deg,
            surface_area: site.panel.surface_area_m2,
            irradiance: site.panel.irradiance_wm2,
            weather: site.weather.as_ref().map(|w| BackendWeather {
                temperature: w.temperature_c,
                condition: w.condition.clone(),
                wind_speed: w.wind_speed_ms,
                wind_direction: w.wind_direction_deg,
                humidity: w.humidity_pct,
                pressure: w.pressure_hpa,
                cloud_cover: w.cloud_cover_pct,
            }),
        }
    }
}

impl From<BackendResponse> for PredictionReport {
    fn from(raw: BackendResponse) -> Self {
        PredictionReport {
            strategy: Strategy::Backend,
            optimal_tilt_deg: raw.optimal.tilt,
            optimal_azimuth_deg: raw.optimal.azimuth,
            reasoning: None,
            current: Some(EnergyProfile::from_hourly(
                raw.current.daily_total,
                &raw.current.hourly,
            )),
            optimal: Some(EnergyProfile::from_hourly(
                raw.optimal.daily_total,
                &raw.optimal.hourly,
            )),
            monthly: Vec::new(),
        }
    }
}

pub struct BackendOptimizer {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl BackendOptimizer {
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    async fn predict(&self, site: &SiteParameters) -> Result<PredictionReport> {
        let url = format!("{}/predict", self.base_url);
        let response = self
            .http_client
            .post(url)
            .json(&BackendRequest::from(site))
            .timeout(self.timeout)
            .send()
            .await
            .context("Prediction backend unreachable")?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Prediction backend responded with {}",
                response.status()
            ));
        }

        let body = response.text().await?;
        parse_backend_response(&body)
    }
}

impl Optimizer for BackendOptimizer {
    fn strategy(&self) -> Strategy {
        Strategy::Backend
    }

    fn recommend<'a>(&'a self, site: &'a SiteParameters) -> PredictionFuture<'a> {
        Box::pin(self.predict(site))
    }
}

pub fn parse_backend_response(body: &str) -> Result<PredictionReport> {
    let raw: BackendResponse =
        serde_json::from_str(body).context("Malformed prediction backend response")?;
    Ok(raw.into())
}
