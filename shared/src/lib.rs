//! Shared types and models for RainFlux
//!
//! This crate contains the pure domain layer shared by the offline pipeline
//! and the prediction server: the feature schema, label encoders, evaluation
//! metrics and the prediction display rules. Nothing here touches the
//! filesystem or the network.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
