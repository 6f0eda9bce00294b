//! RainFlux prediction server
//!
//! Serves the rain prediction form backed by the trained model.

use std::sync::Arc;

use rainflux::{config::Config, create_app, logging, services::PredictionService, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    logging::init(&config.logging)?;

    tracing::info!("Starting RainFlux prediction server");
    tracing::info!("Environment: {}", config.environment);

    // Missing artifacts stop the server here
    let prediction = PredictionService::load(
        config.artifacts.model_path(),
        &config.artifacts.processed_dir,
    )
    .map_err(|e| {
        tracing::error!("Failed to load prediction artifacts: {}", e);
        e
    })?;

    // Create application state
    let state = AppState {
        prediction: Arc::new(prediction),
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
