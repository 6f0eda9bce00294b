//! HTTP handlers for RainFlux

pub mod health;
pub mod page;
pub mod predict;

pub use health::health_check;
pub use predict::{predict, show_form, submit_form, PredictionResponse};
