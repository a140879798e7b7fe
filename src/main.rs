use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use solar_site::config::Settings;
use solar_site::session::handlers::{
    handle_close_session, handle_create_session, handle_get_location, handle_get_weather,
    handle_health, handle_predict, handle_select_location, handle_set_location_text,
    handle_weather_lookup,
};
use solar_site::session::registry::SessionRegistry;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    tracing_subscriber::fmt()
        .with_max_level(settings.log_level)
        .init();

    for arg in &settings.ignored_args {
        tracing::warn!("Ignoring unknown argument: {}", arg);
    }

    tracing::info!("Default optimizer: {}", settings.default_strategy);
    if let Some(codes) = &settings.nominatim.country_codes {
        tracing::info!("Location search restricted to: {}", codes);
    }

    // 1. Upstream clients (one shared connection pool):
    let http_client = reqwest::Client::builder()
        .user_agent(concat!("solar-site/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let services = settings.build_services(http_client)?;
    tracing::info!(
        "Optimizers available: {:?}",
        services.optimizers.strategies()
    );

    // 2. Session registry:
    let registry = SessionRegistry::new(services);

    // 3. HTTP Router:
    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/sessions", post(handle_create_session))
        .route(
            "/api/sessions/:id",
            axum::routing::delete(handle_close_session),
        )
        .route(
            "/api/sessions/:id/location",
            get(handle_get_location).put(handle_set_location_text),
        )
        .route(
            "/api/sessions/:id/location/select",
            post(handle_select_location),
        )
        .route("/api/sessions/:id/weather", get(handle_get_weather))
        .route("/api/sessions/:id/predict", post(handle_predict))
        .route("/api/weather", get(handle_weather_lookup))
        .layer(Extension(registry.clone()));

    // 4. Spawn idle-session reaper and stats reporter:
    let stats_registry = registry.clone();
    let session_idle_timeout = settings.session_idle_timeout;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));

        loop {
            interval.tick().await;
            let expired = stats_registry.reap_idle(session_idle_timeout);
            tracing::info!(
                "Open sessions: {} (expired {})",
                stats_registry.len(),
                expired
            );
        }
    });

    // 5. Start HTTP server:
    tracing::info!("HTTP server listening on {}", settings.bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
