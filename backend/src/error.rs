//! Error handling for RainFlux
//!
//! Offline runs fail with a [`PipelineError`] naming the stage that broke.
//! The web layer works with [`AppError`], which renders a JSON error body.

use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::ValidationError;
use thiserror::Error;

/// Offline pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LoadData,
    Preprocess,
    LabelEncode,
    SplitData,
    LoadSplits,
    TrainModel,
    EvaluateModel,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::LoadData => "load data",
            Stage::Preprocess => "preprocess data",
            Stage::LabelEncode => "label encode data",
            Stage::SplitData => "split data",
            Stage::LoadSplits => "load train/test splits",
            Stage::TrainModel => "train model",
            Stage::EvaluateModel => "evaluate model",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure of one offline pipeline stage
#[derive(Debug, Error)]
#[error("Failed to {stage}: {message}")]
pub struct PipelineError {
    pub stage: Stage,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl PipelineError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying error, keeping it as the source
    pub fn wrap<E>(stage: Stage, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        let source = source.into();
        Self {
            stage,
            message: source.to_string(),
            source: Some(source),
        }
    }
}

/// Tag errors of a fallible step with the stage they belong to
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T, E> StageContext<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    fn stage(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|e| PipelineError::wrap(stage, e))
    }
}

/// Result type alias for pipeline stages
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Artifact errors
    #[error("Required artifact missing: {}", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("Corrupt artifact {}: {message}", path.display())]
    ArtifactCorrupt { path: PathBuf, message: String },

    // Input errors
    #[error("{0}")]
    Validation(#[from] ValidationError),

    // Model errors
    #[error("Model error: {0}")]
    Model(String),

    // Offline pipeline errors
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<crate::ml::ModelError> for AppError {
    fn from(e: crate::ml::ModelError) -> Self {
        AppError::Model(e.to_string())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::ArtifactMissing { .. } => (StatusCode::SERVICE_UNAVAILABLE, "ARTIFACT_MISSING"),
            AppError::ArtifactCorrupt { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "ARTIFACT_CORRUPT")
            }
            AppError::Validation(ValidationError::UnseenCategory { .. }) => {
                (StatusCode::BAD_REQUEST, "UNSEEN_CATEGORY")
            }
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Model(_) => (StatusCode::INTERNAL_SERVER_ERROR, "MODEL_ERROR"),
            AppError::Pipeline(_) => (StatusCode::INTERNAL_SERVER_ERROR, "PIPELINE_ERROR"),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            AppError::Serialization(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "SERIALIZATION_ERROR")
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    /// Whether the caller caused the error
    pub fn is_input_error(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let field = match &self {
            AppError::Validation(e) => e.field().map(str::to_string),
            _ => None,
        };
        let message = match &self {
            // Keep filesystem details out of 5xx bodies
            AppError::Io(_) | AppError::Serialization(_) | AppError::ArtifactCorrupt { .. } => {
                "An internal server error occurred".to_string()
            }
            other => other.to_string(),
        };

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Rejected request: {}", self);
        }

        let detail = ErrorDetail {
            code: code.to_string(),
            message,
            field,
        };

        (status, Json(ErrorResponse { error: detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
