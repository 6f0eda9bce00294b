//! Persisted artifact models for RainFlux
//!
//! Re-exports models from the shared crate and adds backend-specific models

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use shared::models::*;

use shared::ClassLabel;

use crate::ml::BoosterParams;

/// Feature matrix of one split partition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureMatrix {
    /// Column names, in model order
    pub feature_names: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }
}

/// Encoded target labels of one split partition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelVector {
    pub column: String,
    pub labels: Vec<ClassLabel>,
}

impl LabelVector {
    /// Count of rows per class, indexed by class code
    pub fn class_counts(&self) -> Vec<usize> {
        let n_classes = self.labels.iter().max().map_or(0, |&m| m as usize + 1);
        let mut counts = vec![0; n_classes];
        for &l in &self.labels {
            counts[l as usize] += 1;
        }
        counts
    }
}

/// Descriptive record stored next to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub run_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub algorithm: String,
    pub params: BoosterParams,
    pub feature_names: Vec<String>,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Area under the ROC curve on the test split, when defined
    pub roc_auc: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_counts() {
        let y = LabelVector {
            column: "RainTomorrow".into(),
            labels: vec![0, 1, 0, 0],
        };
        assert_eq!(y.class_counts(), vec![3, 1]);
    }
}
