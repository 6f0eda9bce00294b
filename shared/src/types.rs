//! Common types used across the platform

use serde::{Deserialize, Serialize};

/// File names of persisted pipeline artifacts
pub mod artifact_names {
    /// Training features
    pub const X_TRAIN: &str = "X_train.json";
    /// Held-out features
    pub const X_TEST: &str = "X_test.json";
    /// Training labels
    pub const Y_TRAIN: &str = "y_train.json";
    /// Held-out labels
    pub const Y_TEST: &str = "y_test.json";
    /// Booster in the XGBoost model format
    pub const MODEL: &str = "model.bin";
    pub const MODEL_META: &str = "model_meta.json";
    pub const METRICS: &str = "metrics.csv";
    pub const CONFUSION_MATRIX: &str = "confusion_matrix.png";
    pub const ROC_CURVE: &str = "roc_curve.png";

    /// Encoder blob for a categorical column
    pub fn encoder(column: &str) -> String {
        format!("{}_encoder.json", column)
    }
}

/// Binary class label as stored in the label splits
pub type ClassLabel = u8;

/// Train/test row counts of a processing run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SplitSummary {
    pub train_rows: usize,
    pub test_rows: usize,
}

impl SplitSummary {
    pub fn total(&self) -> usize {
        self.train_rows + self.test_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoder_file_name() {
        assert_eq!(artifact_names::encoder("Location"), "Location_encoder.json");
    }
}
