//! Generative-language optimizer.
//!
//! Asks a Gemini-style `generateContent` endpoint for the optimal panel angles. The model
//! is told to answer with bare JSON but often wraps it in a markdown code fence, so the
//! text is stripped of fences before parsing.

use super::optimizer::{Optimizer, PredictionFuture};
use super::types::{round2, PredictionReport, SiteParameters, Strategy};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-preview-05-20";

const SYSTEM_PROMPT: &str = "You are an expert solar energy consultant.\n\
Respond ONLY with a single valid JSON object\n\
with keys \"optimalTilt\" (number), \"optimalAzimuth\" (number), and \"reasoning\" (string).\n\
No extra text or formatting.";

/// The structured answer the model is asked for.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerativeAdvice {
    pub optimal_tilt: f64,
    pub optimal_azimuth: f64,
    #[serde(default)]
    pub reasoning: String,
}

pub struct GenerativeOptimizer {
    http_client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

impl GenerativeOptimizer {
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url,
            self.model,
            urlencoding::encode(&self.api_key)
        )
    }

    async fn advise(&self, site: &SiteParameters) -> Result<PredictionReport> {
        let response = self
            .http_client
            .post(self.endpoint())
            .json(&build_request(site))
            .timeout(self.timeout)
            .send()
            .await
            .context("Generative API request failed")?;

        let status = response.status();
        let body = response.text().await?;
        tracing::debug!("Raw generative response ({}): {}", status, body);

        if !status.is_success() {
            return Err(anyhow::anyhow!("Generative API responded with {}", status));
        }

        let advice = parse_generative_response(&body)?;

        Ok(PredictionReport {
            strategy: Strategy::Generative,
            optimal_tilt_deg: round2(advice.optimal_tilt),
            optimal_azimuth_deg: round2(advice.optimal_azimuth),
            reasoning: Some(advice.reasoning),
            current: None,
            optimal: None,
            monthly: Vec::new(),
        })
    }
}

impl Optimizer for GenerativeOptimizer {
    fn strategy(&self) -> Strategy {
        Strategy::Generative
    }

    fn recommend<'a>(&'a self, site: &'a SiteParameters) -> PredictionFuture<'a> {
        Box::pin(self.advise(site))
    }
}

pub fn user_query(site: &SiteParameters) -> String {
    format!(
        "Based on a latitude of {} and longitude of {}, with current weather conditions of '{}', \
         what are the optimal solar panel tilt and azimuth angles?",
        site.lat,
        site.lon,
        site.weather_condition()
    )
}

pub fn build_request(site: &SiteParameters) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": user_query(site) }] }],
        "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
    })
}

/// Removes markdown code-fence markup: the first opening `json` fence (any case) along
/// with the whitespace after it, then every remaining triple backtick.
pub fn strip_code_fences(text: &str) -> String {
    static OPENING_FENCE: OnceLock<Regex> = OnceLock::new();
    let opening = OPENING_FENCE
        .get_or_init(|| Regex::new(r"(?i)```json\s*").expect("opening fence pattern is valid"));

    opening.replacen(text, 1, "").replace("```", "").trim().to_string()
}

/// Extracts the model text from a `generateContent` body and parses it as advice.
pub fn parse_generative_response(body: &str) -> Result<GenerativeAdvice> {
    let json: serde_json::Value =
        serde_json::from_str(body).context("Generative response is not JSON")?;

    let raw_text = json
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let cleaned = strip_code_fences(raw_text);
    tracing::debug!("Cleaned generative text: {}", cleaned);

    serde_json::from_str(&cleaned).context("Generative answer is not the expected JSON object")
}
