//! Session Module Tests
//!
//! Exercises the registry and the HTTP handlers end to end against in-memory upstreams.
//!
//! ## Test Scopes
//! - **Registry**: Create, lookup and teardown of sessions.
//! - **Handlers**: The keystroke -> suggestion -> selection -> weather -> prediction flow,
//!   plus 404/400/502 paths.

#[cfg(test)]
mod tests {
    use crate::geocoding::client::{LookupFuture, SuggestionLookup};
    use crate::geocoding::query::QueryConfig;
    use crate::geocoding::types::{AddressAttributes, LookupRequest, QueryPhase, Suggestion};
    use crate::prediction::optimizer::OptimizerRegistry;
    use crate::prediction::simulated::SimulatedOptimizer;
    use crate::prediction::state::NO_LOCATION_NOTICE;
    use crate::prediction::types::{PanelInput, Strategy};
    use crate::session::handlers::*;
    use crate::session::registry::{SessionRegistry, SiteServices};
    use crate::session::types::{PredictRequest, SelectRequest, SessionId, SetTextRequest, WeatherParams};
    use crate::weather::client::{WeatherFuture, WeatherProvider};
    use crate::weather::types::{WeatherError, WeatherReport};
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::{Extension, Json};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    /// Returns one suggestion per query, located at (10.5, 76.2).
    struct StaticLookup;

    impl SuggestionLookup for StaticLookup {
        fn search<'a>(&'a self, request: &'a LookupRequest) -> LookupFuture<'a> {
            Box::pin(async move {
                sleep(Duration::from_millis(20)).await;
                Ok(vec![Suggestion {
                    label: format!("{}, Kerala, India", request.text),
                    lat: 10.5,
                    lon: 76.2,
                    address: AddressAttributes::new(),
                    kind: "town".to_string(),
                }])
            })
        }
    }

    /// Sunny everywhere north of the equator, broken south of it.
    struct StaticWeather;

    impl WeatherProvider for StaticWeather {
        fn current(&self, lat: f64, _lon: f64) -> WeatherFuture<'_> {
            Box::pin(async move {
                if lat < 0.0 {
                    return Err(WeatherError::Status(500));
                }
                Ok(WeatherReport {
                    place_name: "Thrissur".to_string(),
                    country: "IN".to_string(),
                    temperature_c: 29.0,
                    condition: "clear sky".to_string(),
                    wind_speed_ms: 1.5,
                    wind_direction_deg: None,
                    humidity_pct: 70.0,
                    pressure_hpa: 1009.0,
                    cloud_cover_pct: Some(0.0),
                })
            })
        }
    }

    fn registry() -> Arc<SessionRegistry> {
        let optimizers = OptimizerRegistry::new(Strategy::Simulated);
        optimizers.register(Arc::new(SimulatedOptimizer::new(Duration::from_millis(100))));

        SessionRegistry::new(SiteServices {
            lookup: Arc::new(StaticLookup),
            weather: Arc::new(StaticWeather),
            optimizers,
            query_config: QueryConfig::default(),
        })
    }

    async fn open_session(registry: &Arc<SessionRegistry>) -> String {
        let (status, Json(created)) = handle_create_session(Extension(registry.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        created.session_id
    }

    async fn type_and_select(registry: &Arc<SessionRegistry>, id: &str, text: &str) {
        handle_set_location_text(
            Path(id.to_string()),
            Extension(registry.clone()),
            Json(SetTextRequest {
                text: text.to_string(),
            }),
        )
        .await
        .unwrap();
        sleep(Duration::from_secs(1)).await;

        handle_select_location(
            Path(id.to_string()),
            Extension(registry.clone()),
            Json(SelectRequest { index: 0 }),
        )
        .await
        .unwrap();
        sleep(Duration::from_millis(10)).await;
    }

    // ============================================================
    // REGISTRY TESTS
    // ============================================================

    #[tokio::test]
    async fn test_registry_create_get_close() {
        let registry = registry();

        let session = registry.create();
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&session.id).is_some());

        assert!(registry.close(&session.id));
        assert!(registry.is_empty());
        assert!(registry.get(&session.id).is_none());
        assert!(!registry.close(&session.id), "Second close finds nothing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_tears_down_query_stream() {
        let registry = registry();
        let session = registry.create();
        session.location.set_text("Thrissur");
        sleep(Duration::from_millis(301)).await;
        assert_eq!(session.location.snapshot().phase, QueryPhase::InFlight);

        registry.close(&session.id);
        sleep(Duration::from_secs(1)).await;

        let snapshot = session.location.snapshot();
        assert_eq!(snapshot.phase, QueryPhase::Closed);
        assert!(snapshot.suggestions.is_empty(), "Late response never lands");
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_are_reaped() {
        // ARRANGE: two sessions, one keeps being used
        let registry = registry();
        let abandoned = registry.create();
        let active = registry.create();
        abandoned.location.set_text("Thrissur");

        // ACT
        for _ in 0..3 {
            sleep(Duration::from_secs(4 * 60)).await;
            assert!(registry.get(&active.id).is_some());
        }
        let reaped = registry.reap_idle(Duration::from_secs(10 * 60));

        // ASSERT
        assert_eq!(reaped, 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(&abandoned.id).is_none());
        assert!(registry.get(&active.id).is_some());
        assert_eq!(abandoned.location.snapshot().phase, QueryPhase::Closed);
        assert_ne!(active.location.snapshot().phase, QueryPhase::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reap_keeps_recent_sessions() {
        let registry = registry();
        registry.create();

        sleep(Duration::from_secs(60)).await;

        assert_eq!(registry.reap_idle(Duration::from_secs(10 * 60)), 0);
        assert_eq!(registry.len(), 1);
    }

    // ============================================================
    // HANDLER TESTS
    // ============================================================

    #[tokio::test(start_paused = true)]
    async fn test_full_flow_through_handlers() {
        let registry = registry();
        let id = open_session(&registry).await;

        // ACT 1: keystroke, then poll after settling
        let Json(pending) = handle_set_location_text(
            Path(id.clone()),
            Extension(registry.clone()),
            Json(SetTextRequest {
                text: "Thrissur".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(pending.phase, QueryPhase::Pending);

        sleep(Duration::from_secs(1)).await;
        let Json(settled) = handle_get_location(Path(id.clone()), Extension(registry.clone()))
            .await
            .unwrap();
        assert_eq!(settled.phase, QueryPhase::Settled);
        assert_eq!(settled.suggestions.len(), 1);

        // ACT 2: select
        let Json(accepted) = handle_select_location(
            Path(id.clone()),
            Extension(registry.clone()),
            Json(SelectRequest { index: 0 }),
        )
        .await
        .unwrap();
        assert_eq!((accepted.lat, accepted.lon), (10.5, 76.2));

        // ASSERT: weather was fetched in the background
        sleep(Duration::from_millis(10)).await;
        let Json(weather) = handle_get_weather(Path(id.clone()), Extension(registry.clone()))
            .await
            .unwrap();
        assert_eq!(weather.lat, Some(10.5));
        assert_eq!(weather.report.unwrap().condition, "clear sky");

        // ACT 3: predict with the default strategy
        let Json(prediction) = handle_predict(
            Path(id.clone()),
            Extension(registry.clone()),
            Json(PredictRequest {
                panel: PanelInput::default(),
                strategy: None,
            }),
        )
        .await
        .unwrap();

        let report = prediction.report.unwrap();
        assert_eq!(report.strategy, Strategy::Simulated);
        assert_eq!(report.monthly.len(), 12);
        assert!(!prediction.loading);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let registry = registry();

        let err = handle_get_location(Path("missing".to_string()), Extension(registry.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = handle_close_session(Path("missing".to_string()), Extension(registry.clone()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_close_session_handler() {
        let registry = registry();
        let id = open_session(&registry).await;

        let status = handle_close_session(Path(id.clone()), Extension(registry.clone()))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_without_suggestions_is_404() {
        let registry = registry();
        let id = open_session(&registry).await;

        let err = handle_select_location(
            Path(id),
            Extension(registry.clone()),
            Json(SelectRequest { index: 0 }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_predict_without_location_is_rejected() {
        let registry = registry();
        let id = open_session(&registry).await;

        let err = handle_predict(
            Path(id.clone()),
            Extension(registry.clone()),
            Json(PredictRequest {
                panel: PanelInput::default(),
                strategy: None,
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1.error, NO_LOCATION_NOTICE);
        let session = registry.get(&SessionId(id)).unwrap();
        assert_eq!(
            session.prediction.snapshot().notice.as_deref(),
            Some(NO_LOCATION_NOTICE)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_predict_with_unconfigured_strategy_is_rejected() {
        let registry = registry();
        let id = open_session(&registry).await;
        type_and_select(&registry, &id, "Kochi").await;

        let err = handle_predict(
            Path(id),
            Extension(registry.clone()),
            Json(PredictRequest {
                panel: PanelInput::default(),
                strategy: Some(Strategy::Generative),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert!(err.1.error.contains("generative"));
    }

    #[test]
    fn test_predict_request_defaults() {
        let req: PredictRequest = serde_json::from_str(r#"{"panel_count": 4}"#).unwrap();

        assert_eq!(req.panel.panel_count, 4);
        assert_eq!(req.panel.tilt_deg, 30.0);
        assert_eq!(req.panel.azimuth_deg, 180.0);
        assert!(req.strategy.is_none());

        let req: PredictRequest = serde_json::from_str(r#"{"strategy": "backend"}"#).unwrap();
        assert_eq!(req.strategy, Some(Strategy::Backend));
        assert_eq!(req.panel, PanelInput::default());
    }

    #[tokio::test]
    async fn test_weather_lookup_handler() {
        let registry = registry();

        let Json(report) = handle_weather_lookup(
            Query(WeatherParams {
                lat: 10.5,
                lon: 76.2,
            }),
            Extension(registry.clone()),
        )
        .await
        .unwrap();
        assert_eq!(report.place_name, "Thrissur");

        let err = handle_weather_lookup(
            Query(WeatherParams {
                lat: -1.0,
                lon: 0.0,
            }),
            Extension(registry.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_health_reports_sessions() {
        let registry = registry();
        open_session(&registry).await;

        let Json(health) = handle_health(Extension(registry.clone())).await;

        assert_eq!(health.status, "ok");
        assert_eq!(health.sessions, 1);
        assert_eq!(health.optimizers, vec![Strategy::Simulated]);
    }
}
