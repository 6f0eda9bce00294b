//! Route definitions for RainFlux

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/predict", post(handlers::predict))
}

/// Browser-facing form routes
pub fn page_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::show_form).post(handlers::submit_form))
}
