//! RainFlux - next-day rain prediction
//!
//! Offline pipeline (weather CSV to encoded splits to a boosted-tree model)
//! and the web form that serves the trained model.

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod ml;
pub mod models;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult, PipelineError, Stage};

use services::PredictionService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub prediction: Arc<PredictionService>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::page_routes())
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
