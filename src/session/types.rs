use crate::prediction::types::{PanelInput, Strategy};

use serde::{Deserialize, Serialize};

/// Unique identifier for a form session, handed to the front end on creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Body of `PUT /api/sessions/:id/location`: the raw field value after a keystroke.
#[derive(Debug, Deserialize)]
pub struct SetTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(flatten)]
    pub panel: PanelInput,
    #[serde(default)]
    pub strategy: Option<Strategy>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherParams {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub sessions: usize,
    pub optimizers: Vec<Strategy>,
}
