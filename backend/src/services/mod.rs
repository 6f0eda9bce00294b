//! Services of the RainFlux pipeline and prediction server

pub mod artifacts;
pub mod prediction;
pub mod processing;
pub mod reporting;
pub mod training;

pub use artifacts::ArtifactStore;
pub use prediction::PredictionService;
pub use processing::{DataProcessingService, ProcessedSplits, ProcessingReport};
pub use reporting::ReportingService;
pub use training::ModelTrainingService;
