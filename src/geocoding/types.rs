//! Location Search Data Types
//!
//! Suggestions as shown to the user, the raw geocoder records they are projected from,
//! and the read-only snapshot a front end polls.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Address attributes attached to a suggestion (e.g. `city`, `state`, `postcode`).
/// Only used for display.
pub type AddressAttributes = BTreeMap<String, String>;

/// Keys tried in order when a short locality line is needed for a suggestion.
const LOCALITY_KEYS: [&str; 5] = ["city", "town", "village", "county", "state"];

/// A single geocoding candidate offered to the user for selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Suggestion {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub address: AddressAttributes,
    /// Place type reported by the geocoder ("city", "village", ...). Empty when absent.
    #[serde(default)]
    pub kind: String,
}

impl Suggestion {
    /// The most specific settlement name available in the address, or an empty string.
    pub fn locality(&self) -> &str {
        LOCALITY_KEYS
            .iter()
            .find_map(|key| self.address.get(*key))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// The location the user picked from the suggestion list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AcceptedLocation {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    pub address: AddressAttributes,
}

impl From<Suggestion> for AcceptedLocation {
    fn from(suggestion: Suggestion) -> Self {
        Self {
            label: suggestion.label,
            lat: suggestion.lat,
            lon: suggestion.lon,
            address: suggestion.address,
        }
    }
}

/// One lookup issued by a query stream.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupRequest {
    /// Trimmed query text (not yet URL-encoded).
    pub text: String,
}

/// Why a lookup produced no suggestions.
///
/// `Canceled` is an expected outcome of superseding a request and is never surfaced.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("lookup canceled")]
    Canceled,
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("geocoder responded with status {0}")]
    Status(u16),
    #[error("malformed geocoder response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Parse(err.to_string())
        } else {
            LookupError::Transport(err.to_string())
        }
    }
}

/// Lifecycle phase of a query stream.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueryPhase {
    /// Text below threshold, or nothing pending.
    Idle,
    /// Settle timer running, no request issued yet.
    Pending,
    /// Request issued, awaiting response or cancellation.
    InFlight,
    /// Result set populated from a response.
    Settled,
    /// Torn down. No further mutation.
    Closed,
}

/// Read-only copy of a query stream's state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuerySnapshot {
    pub text: String,
    pub phase: QueryPhase,
    pub suggestions: Vec<Suggestion>,
    pub accepted: Option<AcceptedLocation>,
    pub focused: bool,
    /// Transient user-facing message from the last failed lookup.
    pub notice: Option<String>,
    /// Bumped on every mutation.
    pub revision: u64,
}

/// A raw search record as returned by a Nominatim-compatible geocoder.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub address: Option<AddressAttributes>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl NominatimPlace {
    /// Projects the record into a `Suggestion`, parsing the numeric coordinate strings.
    pub fn into_suggestion(self) -> Result<Suggestion, LookupError> {
        let lat = parse_coordinate(&self.lat, "lat")?;
        let lon = parse_coordinate(&self.lon, "lon")?;

        Ok(Suggestion {
            label: self.display_name,
            lat,
            lon,
            address: self.address.unwrap_or_default(),
            kind: self.kind.unwrap_or_default(),
        })
    }
}

fn parse_coordinate(raw: &str, field: &str) -> Result<f64, LookupError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| LookupError::Parse(format!("invalid {} value '{}'", field, raw)))
}
