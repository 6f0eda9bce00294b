//! Domain models for RainFlux

mod encoder;
mod feature;
mod metrics;
mod prediction;

pub use encoder::*;
pub use feature::*;
pub use metrics::*;
pub use prediction::*;
