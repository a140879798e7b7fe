//! Prediction Data Types
//!
//! Site parameters going out to an optimizer and the report coming back. The report is a
//! superset of what the three strategies can produce; fields a strategy cannot fill stay empty.

use crate::weather::types::{condition_or_default, WeatherReport};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Generative,
    Simulated,
    Backend,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Generative => "generative",
            Strategy::Simulated => "simulated",
            Strategy::Backend => "backend",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "generative" | "llm" | "gemini" => Ok(Strategy::Generative),
            "simulated" | "simulation" | "random" => Ok(Strategy::Simulated),
            "backend" | "remote" => Ok(Strategy::Backend),
            other => Err(anyhow::anyhow!("Unknown optimizer strategy: {}", other)),
        }
    }
}

/// Panel geometry as entered on the site form. Missing fields take the form defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PanelInput {
    pub panel_count: u32,
    pub tilt_deg: f64,
    pub azimuth_deg: f64,
    pub surface_area_m2: f64,
    pub irradiance_wm2: f64,
}

impl Default for PanelInput {
    fn default() -> Self {
        Self {
            panel_count: 1,
            tilt_deg: 30.0,
            azimuth_deg: 180.0,
            surface_area_m2: 0.0,
            irradiance_wm2: 0.0,
        }
    }
}

/// Everything an optimizer gets to see about a site.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SiteParameters {
    pub lat: f64,
    pub lon: f64,
    pub panel: PanelInput,
    pub weather: Option<WeatherReport>,
}

impl SiteParameters {
    pub fn weather_condition(&self) -> String {
        condition_or_default(self.weather.as_ref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub label: String,
    pub value: f64,
}

/// Daily total plus an hourly breakdown for one panel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyProfile {
    pub daily_total_kwh: f64,
    pub hourly: Vec<SeriesPoint>,
}

impl EnergyProfile {
    /// Labels a bare hourly series `00:00`, `01:00`, ...
    pub fn from_hourly(daily_total_kwh: f64, hourly: &[f64]) -> Self {
        Self {
            daily_total_kwh,
            hourly: hourly
                .iter()
                .enumerate()
                .map(|(hour, value)| SeriesPoint {
                    label: format!("{:02}:00", hour),
                    value: *value,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictionReport {
    pub strategy: Strategy,
    pub optimal_tilt_deg: f64,
    pub optimal_azimuth_deg: f64,
    pub reasoning: Option<String>,
    pub current: Option<EnergyProfile>,
    pub optimal: Option<EnergyProfile>,
    pub monthly: Vec<SeriesPoint>,
}

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
