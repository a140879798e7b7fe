use serde::{Deserialize, Serialize};

/// Used when no weather is known for the site.
pub const DEFAULT_CONDITION: &str = "clear skies";

/// Current conditions at a site, flattened from the upstream payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherReport {
    pub place_name: String,
    pub country: String,
    pub temperature_c: f64,
    pub condition: String,
    pub wind_speed_ms: f64,
    pub wind_direction_deg: Option<f64>,
    pub humidity_pct: f64,
    pub pressure_hpa: f64,
    pub cloud_cover_pct: Option<f64>,
}

/// Returns the report's condition, or `clear skies` when there is no usable report.
pub fn condition_or_default(report: Option<&WeatherReport>) -> String {
    report
        .map(|r| r.condition.trim())
        .filter(|condition| !condition.is_empty())
        .unwrap_or(DEFAULT_CONDITION)
        .to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("weather service responded with status {0}")]
    Status(u16),
    #[error("malformed weather response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            WeatherError::Parse(err.to_string())
        } else {
            WeatherError::Transport(err.to_string())
        }
    }
}

/// Raw OpenWeatherMap `/data/2.5/weather` payload (only the fields we read).
#[derive(Debug, Deserialize)]
pub struct OpenWeatherResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sys: Option<OpenWeatherSys>,
    #[serde(default)]
    pub weather: Vec<OpenWeatherCondition>,
    pub main: OpenWeatherMain,
    #[serde(default)]
    pub wind: Option<OpenWeatherWind>,
    #[serde(default)]
    pub clouds: Option<OpenWeatherClouds>,
}

#[derive(Debug, Deserialize)]
pub struct OpenWeatherSys {
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenWeatherCondition {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct OpenWeatherMain {
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Deserialize)]
pub struct OpenWeatherWind {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub deg: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct OpenWeatherClouds {
    pub all: f64,
}

impl From<OpenWeatherResponse> for WeatherReport {
    fn from(raw: OpenWeatherResponse) -> Self {
        let condition = raw
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .unwrap_or_default();

        WeatherReport {
            place_name: raw.name,
            country: raw.sys.and_then(|s| s.country).unwrap_or_default(),
            temperature_c: raw.main.temp,
            condition,
            wind_speed_ms: raw.wind.as_ref().map(|w| w.speed).unwrap_or(0.0),
            wind_direction_deg: raw.wind.and_then(|w| w.deg),
            humidity_pct: raw.main.humidity,
            pressure_hpa: raw.main.pressure,
            cloud_cover_pct: raw.clouds.map(|c| c.all),
        }
    }
}
