use super::registry::{Session, SessionRegistry};
use super::types::{
    CreateSessionResponse, ErrorResponse, HealthResponse, PredictRequest, SelectRequest,
    SessionId, SetTextRequest, WeatherParams,
};
use crate::geocoding::types::{AcceptedLocation, QuerySnapshot};
use crate::prediction::state::{PredictionSnapshot, NO_LOCATION_NOTICE};
use crate::prediction::types::SiteParameters;
use crate::weather::state::{WeatherSnapshot, WEATHER_FAILED_NOTICE};
use crate::weather::types::WeatherReport;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::{Extension, Json};
use std::sync::Arc;

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn find_session(registry: &SessionRegistry, id: String) -> Result<Arc<Session>, ApiError> {
    registry
        .get(&SessionId(id.clone()))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown session: {}", id)))
}

pub async fn handle_health(
    Extension(registry): Extension<Arc<SessionRegistry>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        sessions: registry.len(),
        optimizers: registry.services().optimizers.strategies(),
    })
}

pub async fn handle_create_session(
    Extension(registry): Extension<Arc<SessionRegistry>>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session = registry.create();
    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id.0.clone(),
        }),
    )
}

pub async fn handle_close_session(
    Path(id): Path<String>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
) -> Result<StatusCode, ApiError> {
    if registry.close(&SessionId(id.clone())) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, format!("Unknown session: {}", id)))
    }
}

pub async fn handle_get_location(
    Path(id): Path<String>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
) -> Result<Json<QuerySnapshot>, ApiError> {
    let session = find_session(&registry, id)?;
    Ok(Json(session.location.snapshot()))
}

/// Pushes the current field value. The response reflects the state right after the
/// change; suggestions arrive on later polls once the lookup settles.
pub async fn handle_set_location_text(
    Path(id): Path<String>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
    Json(req): Json<SetTextRequest>,
) -> Result<Json<QuerySnapshot>, ApiError> {
    let session = find_session(&registry, id)?;
    session.location.set_text(req.text);
    Ok(Json(session.location.snapshot()))
}

/// Accepts a suggestion and starts fetching weather for it in the background.
pub async fn handle_select_location(
    Path(id): Path<String>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<AcceptedLocation>, ApiError> {
    let session = find_session(&registry, id)?;

    let accepted = session.location.select(req.index).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("No suggestion at index {}", req.index),
        )
    })?;

    let provider = registry.services().weather.clone();
    let (lat, lon) = (accepted.lat, accepted.lon);
    tokio::spawn(async move {
        session.weather.refresh(provider.as_ref(), lat, lon).await;
    });

    Ok(Json(accepted))
}

pub async fn handle_get_weather(
    Path(id): Path<String>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
) -> Result<Json<WeatherSnapshot>, ApiError> {
    let session = find_session(&registry, id)?;
    Ok(Json(session.weather.snapshot()))
}

pub async fn handle_predict(
    Path(id): Path<String>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
    Json(req): Json<PredictRequest>,
) -> Result<Json<PredictionSnapshot>, ApiError> {
    let session = find_session(&registry, id)?;
    let optimizers = registry.services().optimizers.clone();

    let Some(accepted) = session.location.accepted() else {
        session.prediction.reject_missing_location();
        return Err(api_error(StatusCode::BAD_REQUEST, NO_LOCATION_NOTICE));
    };

    if let Some(strategy) = req.strategy {
        if !optimizers.has_strategy(strategy) {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("Optimizer not configured: {}", strategy),
            ));
        }
    }

    let site = SiteParameters {
        lat: accepted.lat,
        lon: accepted.lon,
        panel: req.panel,
        weather: session.weather.report(),
    };

    let snapshot = session
        .prediction
        .run(&optimizers, req.strategy, &site)
        .await;

    match (&snapshot.report, &snapshot.notice) {
        (None, Some(notice)) => Err(api_error(StatusCode::BAD_GATEWAY, notice.clone())),
        _ => Ok(Json(snapshot)),
    }
}

/// Stateless weather proxy for arbitrary coordinates.
pub async fn handle_weather_lookup(
    Query(params): Query<WeatherParams>,
    Extension(registry): Extension<Arc<SessionRegistry>>,
) -> Result<Json<WeatherReport>, ApiError> {
    registry
        .services()
        .weather
        .current(params.lat, params.lon)
        .await
        .map(Json)
        .map_err(|err| {
            tracing::warn!(
                "Weather lookup failed for ({}, {}): {}",
                params.lat,
                params.lon,
                err
            );
            api_error(StatusCode::BAD_GATEWAY, WEATHER_FAILED_NOTICE)
        })
}
