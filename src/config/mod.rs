//! Service Configuration
//!
//! Settings come from environment variables, then command-line flags override them.
//!
//! | Variable                  | Flag           | Default                                  |
//! |---------------------------|----------------|------------------------------------------|
//! | `SOLAR_BIND`              | `--bind`       | `127.0.0.1:8080`                         |
//! | `LOG_LEVEL`               | `--log-level`  | `info`                                   |
//! | `OPTIMIZER`               | `--optimizer`  | `simulated`                              |
//! | `NOMINATIM_COUNTRY_CODES` | `--country`    | none                                     |
//! | `NOMINATIM_URL`           |                | `https://nominatim.openstreetmap.org`    |
//! | `NOMINATIM_EMAIL`         |                | none                                     |
//! | `NOMINATIM_LIMIT`         |                | `10`                                     |
//! | `GEOCODER_LOCALE`         |                | `en`                                     |
//! | `WEATHER_URL`             |                | `https://api.openweathermap.org`         |
//! | `WEATHER_API_KEY`         |                | none                                     |
//! | `GEMINI_URL`              |                | `https://generativelanguage.googleapis.com` |
//! | `GEMINI_MODEL`            |                | `gemini-2.5-flash-preview-05-20`         |
//! | `GEMINI_API_KEY`          |                | none (generative optimizer disabled)     |
//! | `PREDICTION_URL`          |                | none (backend optimizer disabled)        |
//! | `SIMULATED_LATENCY_MS`    |                | `1200`                                   |
//! | `DEBOUNCE_MS`             |                | `300`                                    |
//! | `HTTP_TIMEOUT_MS`         |                | `10000`                                  |
//! | `SESSION_IDLE_SECS`       |                | `1800`                                   |
//!
//! Unrecognized arguments are collected in `ignored_args` rather than logged here,
//! since this runs before the tracing subscriber is installed.

use crate::geocoding::client::{NominatimClient, NominatimOptions};
use crate::geocoding::query::{QueryConfig, DEFAULT_SETTLE_WINDOW, MIN_QUERY_CHARS};
use crate::prediction::backend::BackendOptimizer;
use crate::prediction::generative::{GenerativeOptimizer, DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_URL};
use crate::prediction::optimizer::OptimizerRegistry;
use crate::prediction::simulated::{SimulatedOptimizer, DEFAULT_SIMULATED_LATENCY};
use crate::prediction::types::Strategy;
use crate::session::registry::SiteServices;
use crate::weather::client::{WeatherClient, DEFAULT_WEATHER_URL};

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub log_level: tracing::Level,
    pub default_strategy: Strategy,
    pub http_timeout: Duration,
    pub settle_window: Duration,
    pub nominatim: NominatimOptions,
    pub weather_url: String,
    pub weather_api_key: Option<String>,
    pub gemini_url: String,
    pub gemini_model: String,
    pub gemini_api_key: Option<String>,
    pub prediction_url: Option<String>,
    pub simulated_latency: Duration,
    pub session_idle_timeout: Duration,
    pub ignored_args: Vec<String>,
}

impl Settings {
    /// Reads the process environment and command line.
    pub fn load() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::from_sources(&args, |key| std::env::var(key).ok())
    }

    /// Builds settings from `args` (without the program name) layered over `env`.
    pub fn from_sources<F>(args: &[String], env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let http_timeout = Duration::from_millis(parse_or(var("HTTP_TIMEOUT_MS"), 10_000)?);

        let mut settings = Settings {
            bind_addr: var("SOLAR_BIND")
                .unwrap_or_else(|| DEFAULT_BIND.to_string())
                .parse()
                .context("Invalid SOLAR_BIND")?,
            log_level: parse_or(var("LOG_LEVEL"), tracing::Level::INFO)?,
            default_strategy: parse_or(var("OPTIMIZER"), Strategy::Simulated)?,
            http_timeout,
            settle_window: Duration::from_millis(parse_or(
                var("DEBOUNCE_MS"),
                DEFAULT_SETTLE_WINDOW.as_millis() as u64,
            )?),
            nominatim: NominatimOptions {
                base_url: var("NOMINATIM_URL")
                    .unwrap_or_else(|| NominatimOptions::default().base_url),
                limit: parse_or(var("NOMINATIM_LIMIT"), NominatimOptions::default().limit)?,
                locale: var("GEOCODER_LOCALE")
                    .unwrap_or_else(|| NominatimOptions::default().locale),
                country_codes: var("NOMINATIM_COUNTRY_CODES"),
                email: var("NOMINATIM_EMAIL"),
                timeout: http_timeout,
            },
            weather_url: var("WEATHER_URL").unwrap_or_else(|| DEFAULT_WEATHER_URL.to_string()),
            weather_api_key: var("WEATHER_API_KEY"),
            gemini_url: var("GEMINI_URL").unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string()),
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_api_key: var("GEMINI_API_KEY"),
            prediction_url: var("PREDICTION_URL"),
            simulated_latency: Duration::from_millis(parse_or(
                var("SIMULATED_LATENCY_MS"),
                DEFAULT_SIMULATED_LATENCY.as_millis() as u64,
            )?),
            session_idle_timeout: Duration::from_secs(parse_or(
                var("SESSION_IDLE_SECS"),
                DEFAULT_SESSION_IDLE.as_secs(),
            )?),
            ignored_args: Vec::new(),
        };

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args.get(i + 1).cloned();

            match flag {
                "--bind" => {
                    settings.bind_addr = required(flag, value)?
                        .parse()
                        .context("Invalid --bind address")?;
                    i += 2;
                }
                "--optimizer" => {
                    settings.default_strategy = required(flag, value)?.parse()?;
                    i += 2;
                }
                "--country" => {
                    settings.nominatim.country_codes = Some(required(flag, value)?);
                    i += 2;
                }
                "--log-level" => {
                    settings.log_level = required(flag, value)?
                        .parse()
                        .map_err(|_| anyhow::anyhow!("Invalid --log-level"))?;
                    i += 2;
                }
                other => {
                    settings.ignored_args.push(other.to_string());
                    i += 1;
                }
            }
        }

        Ok(settings)
    }

    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            settle_window: self.settle_window,
            min_chars: MIN_QUERY_CHARS,
        }
    }

    /// Wires the upstream clients and optimizers described by these settings.
    ///
    /// Fails if the default optimizer is one whose credentials/URL are missing.
    pub fn build_services(&self, http_client: reqwest::Client) -> Result<SiteServices> {
        let lookup = Arc::new(NominatimClient::new(
            http_client.clone(),
            self.nominatim.clone(),
        ));

        if self.weather_api_key.is_none() {
            tracing::warn!("WEATHER_API_KEY not set; weather lookups will be rejected upstream");
        }
        let weather = Arc::new(WeatherClient::new(
            http_client.clone(),
            self.weather_url.clone(),
            self.weather_api_key.clone().unwrap_or_default(),
            self.http_timeout,
        ));

        let optimizers = OptimizerRegistry::new(self.default_strategy);
        optimizers.register(Arc::new(SimulatedOptimizer::new(self.simulated_latency)));

        if let Some(api_key) = &self.gemini_api_key {
            optimizers.register(Arc::new(GenerativeOptimizer::new(
                http_client.clone(),
                self.gemini_url.clone(),
                self.gemini_model.clone(),
                api_key.clone(),
                self.http_timeout,
            )));
        }

        if let Some(url) = &self.prediction_url {
            optimizers.register(Arc::new(BackendOptimizer::new(
                http_client.clone(),
                url.clone(),
                self.http_timeout,
            )));
        }

        if !optimizers.has_strategy(self.default_strategy) {
            return Err(anyhow::anyhow!(
                "Default optimizer '{}' is not configured (missing API key or URL)",
                self.default_strategy
            ));
        }

        Ok(SiteServices {
            lookup,
            weather,
            optimizers,
            query_config: self.query_config(),
        })
    }
}

fn required(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| anyhow::anyhow!("{} requires a value", flag))
}

fn parse_or<T>(raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value '{}': {}", raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests;
