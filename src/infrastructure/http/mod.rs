pub mod request_id;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::controllers::{audio::AudioController, health};
use crate::infrastructure::config::Config;

pub use request_id::{request_id_middleware, RequestId, X_REQUEST_ID};

/// Build the application router with every route and layer
pub fn create_router(
    config: &Config,
    audio_controller: Arc<AudioController>,
    health_controller: Arc<health::HealthController>,
) -> Router {
    // Narration API
    let api_routes = Router::new()
        .route("/api/generate-audio", post(AudioController::generate_audio))
        .route("/api/voices", get(AudioController::list_voices))
        .route("/api/estimate", post(AudioController::estimate))
        .with_state(audio_controller)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    // Health routes (no state besides the readiness probe)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::HealthController::ready))
        .with_state(health_controller);

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .nest_service("/audio", ServeDir::new(&config.output_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware)),
        )
}

/// Serve `router` until Ctrl-C is received
pub async fn start_http_server(
    config: &Config,
    router: Router,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        // Without a signal handler the server runs until killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
