//! Numerical building blocks of the pipeline: tables, splitting and the
//! boosted-tree classifier

pub mod gbdt;
pub mod split;
pub mod table;

use ndarray::ArrayView2;
use thiserror::Error;

pub use gbdt::{BoosterParams, GradientBoostedClassifier};
pub use split::{stratified_split, SplitError, SplitIndices};
pub use table::{Column, ColumnData, Frame, RawTable};

/// Probability threshold for the positive class
pub const DECISION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("{rows} feature rows but {labels} labels")]
    LabelCount { rows: usize, labels: usize },

    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("labels must be 0 or 1, found {0}")]
    NonBinaryLabel(u8),

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("xgboost: {0}")]
    Backend(String),
}

/// Binary classifier over fixed-width feature rows
pub trait Classifier: Send + Sync {
    /// Width of the rows the model accepts
    fn n_features(&self) -> usize;

    /// Probability of class 1 for each row
    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>, ModelError>;

    /// Class label (0/1) for each row
    fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<u8>, ModelError> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > DECISION_THRESHOLD))
            .collect())
    }

    /// Accuracy on labelled rows
    fn score(&self, x: ArrayView2<f64>, y: &[u8]) -> Result<f64, ModelError> {
        if x.nrows() != y.len() {
            return Err(ModelError::LabelCount {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        let predicted = self.predict(x)?;
        Ok(shared::accuracy(y, &predicted))
    }

    fn check_width(&self, width: usize) -> Result<(), ModelError> {
        if width != self.n_features() {
            return Err(ModelError::FeatureCount {
                expected: self.n_features(),
                actual: width,
            });
        }
        Ok(())
    }
}
