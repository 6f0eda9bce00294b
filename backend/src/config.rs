//! Configuration management for RainFlux
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with RAINFLUX_ prefix

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Artifact locations
    pub artifacts: ArtifactConfig,

    /// Offline pipeline settings
    pub pipeline: PipelineConfig,

    /// Log output settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ArtifactConfig {
    /// Raw weather CSV
    pub raw_data: PathBuf,

    /// Encoders and train/test splits
    pub processed_dir: PathBuf,

    /// Trained model, metrics and charts
    pub models_dir: PathBuf,
}

impl ArtifactConfig {
    pub fn model_path(&self) -> PathBuf {
        self.models_dir.join(shared::artifact_names::MODEL)
    }
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct PipelineConfig {
    /// Fraction of rows held out for evaluation
    #[validate(range(min = 0.01, max = 0.99))]
    pub test_size: f64,

    /// Seed for the stratified split
    pub seed: u64,

    /// Write confusion matrix and ROC images
    pub render_charts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            render_charts: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Directory holding the daily log files
    pub dir: PathBuf,

    /// Default filter when RUST_LOG is unset
    pub filter: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("RAINFLUX_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("artifacts.raw_data", "artifacts/raw/data.csv")?
            .set_default("artifacts.processed_dir", "artifacts/processed")?
            .set_default("artifacts.models_dir", "artifacts/models")?
            .set_default("pipeline.test_size", 0.2)?
            .set_default("pipeline.seed", 42)?
            .set_default("pipeline.render_charts", true)?
            .set_default("logging.dir", "logs")?
            .set_default("logging.filter", "rainflux=info,tower_http=info")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (RAINFLUX_ prefix)
            .add_source(
                Environment::with_prefix("RAINFLUX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config
            .pipeline
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid pipeline settings: {}", e)))?;

        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".to_string(),
        }
    }
}
