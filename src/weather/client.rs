//! Weather Client
//!
//! Fetches current conditions for a coordinate pair from an OpenWeatherMap-compatible API.

use super::types::{OpenWeatherResponse, WeatherError, WeatherReport};

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

pub type WeatherFuture<'a> =
    Pin<Box<dyn Future<Output = Result<WeatherReport, WeatherError>> + Send + 'a>>;

pub trait WeatherProvider: Send + Sync + 'static {
    fn current(&self, lat: f64, lon: f64) -> WeatherFuture<'_>;
}

pub const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org";

pub struct WeatherClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl WeatherClient {
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
        }
    }

    pub fn current_url(&self, lat: f64, lon: f64) -> String {
        format!(
            "{}/data/2.5/weather?lat={}&lon={}&units=metric&appid={}",
            self.base_url,
            lat,
            lon,
            urlencoding::encode(&self.api_key)
        )
    }

    async fn fetch(&self, lat: f64, lon: f64) -> Result<WeatherReport, WeatherError> {
        let response = self
            .http_client
            .get(self.current_url(lat, lon))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WeatherError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_weather_response(&body)
    }
}

impl WeatherProvider for WeatherClient {
    fn current(&self, lat: f64, lon: f64) -> WeatherFuture<'_> {
        Box::pin(self.fetch(lat, lon))
    }
}

pub fn parse_weather_response(body: &str) -> Result<WeatherReport, WeatherError> {
    let raw: OpenWeatherResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))?;
    Ok(raw.into())
}
