//! Geocoder Client
//!
//! Defines the `SuggestionLookup` seam used by query streams, and its production
//! implementation against a Nominatim-compatible `/search` endpoint.

use super::types::{LookupError, LookupRequest, NominatimPlace, Suggestion};

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future returned by a lookup. Dropping it aborts the underlying request.
pub type LookupFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<Suggestion>, LookupError>> + Send + 'a>>;

/// Anything that can turn query text into suggestions.
pub trait SuggestionLookup: Send + Sync + 'static {
    fn search<'a>(&'a self, request: &'a LookupRequest) -> LookupFuture<'a>;
}

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_RESULT_LIMIT: usize = 10;
pub const DEFAULT_LOCALE: &str = "en";

/// Fixed query parameters sent with every search.
#[derive(Debug, Clone)]
pub struct NominatimOptions {
    pub base_url: String,
    pub limit: usize,
    pub locale: String,
    /// Comma-separated ISO country codes, e.g. `in`.
    pub country_codes: Option<String>,
    /// Contact address requested by the Nominatim usage policy.
    pub email: Option<String>,
    pub timeout: Duration,
}

impl Default for NominatimOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.to_string(),
            limit: DEFAULT_RESULT_LIMIT,
            locale: DEFAULT_LOCALE.to_string(),
            country_codes: None,
            email: None,
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct NominatimClient {
    http_client: reqwest::Client,
    options: NominatimOptions,
}

impl NominatimClient {
    pub fn new(http_client: reqwest::Client, options: NominatimOptions) -> Self {
        Self {
            http_client,
            options,
        }
    }

    /// Builds the full search URL for `text`.
    pub fn search_url(&self, text: &str) -> String {
        let mut url = format!(
            "{}/search?format=json&addressdetails=1&limit={}&accept-language={}",
            self.options.base_url.trim_end_matches('/'),
            self.options.limit,
            urlencoding::encode(&self.options.locale)
        );

        if let Some(codes) = self.options.country_codes.as_deref() {
            url.push_str(&format!("&countrycodes={}", urlencoding::encode(codes)));
        }
        if let Some(email) = self.options.email.as_deref() {
            url.push_str(&format!("&email={}", urlencoding::encode(email)));
        }

        url.push_str(&format!("&q={}", urlencoding::encode(text)));
        url
    }

    async fn fetch(&self, request: &LookupRequest) -> Result<Vec<Suggestion>, LookupError> {
        let url = self.search_url(&request.text);
        tracing::debug!("Geocoder lookup: {}", url);

        let response = self
            .http_client
            .get(url)
            .timeout(self.options.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        parse_search_response(&body)
    }
}

impl SuggestionLookup for NominatimClient {
    fn search<'a>(&'a self, request: &'a LookupRequest) -> LookupFuture<'a> {
        Box::pin(self.fetch(request))
    }
}

/// Parses a Nominatim JSON array into suggestions. A `null` body counts as no results.
pub fn parse_search_response(body: &str) -> Result<Vec<Suggestion>, LookupError> {
    let places: Option<Vec<NominatimPlace>> =
        serde_json::from_str(body).map_err(|e| LookupError::Parse(e.to_string()))?;

    places
        .unwrap_or_default()
        .into_iter()
        .map(NominatimPlace::into_suggestion)
        .collect()
}
