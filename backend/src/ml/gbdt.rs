//! Gradient-boosted tree classifier backed by XGBoost
//!
//! Only the objective, the number of boosting rounds and the seed are set
//! here. Tree parameters (depth, learning rate, regularisation, split
//! method) are left at the library defaults.

use std::{path::Path, sync::Mutex};

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use xgboost::{parameters, Booster, DMatrix};

use super::{Classifier, ModelError};

/// Training settings passed to the booster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoosterParams {
    /// Number of boosting rounds (one tree per round)
    pub boost_rounds: u32,
    pub seed: u64,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            boost_rounds: 100,
            seed: 42,
        }
    }
}

impl From<xgboost::XGBError> for ModelError {
    fn from(e: xgboost::XGBError) -> Self {
        ModelError::Backend(e.to_string())
    }
}

/// Owned booster handle
struct BoosterHandle(Booster);

// SAFETY: the handle is owned by this value alone and XGBoost boosters have
// no thread affinity. All access goes through the Mutex in
// `GradientBoostedClassifier`, so calls into the library never overlap.
unsafe impl Send for BoosterHandle {}

/// Binary logistic booster over fixed-width feature rows
pub struct GradientBoostedClassifier {
    booster: Mutex<BoosterHandle>,
    feature_names: Vec<String>,
}

impl std::fmt::Debug for GradientBoostedClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradientBoostedClassifier")
            .field("feature_names", &self.feature_names)
            .finish()
    }
}

/// Row-major copy of the matrix in the f32 layout XGBoost expects
fn to_dmatrix(x: ArrayView2<f64>) -> Result<DMatrix, ModelError> {
    let data: Vec<f32> = x.rows().into_iter().flatten().map(|&v| v as f32).collect();
    Ok(DMatrix::from_dense(&data, x.nrows())?)
}

impl GradientBoostedClassifier {
    /// Fit on a feature matrix and 0/1 labels
    pub fn fit(
        x: &Array2<f64>,
        y: &[u8],
        feature_names: Vec<String>,
        params: &BoosterParams,
    ) -> Result<Self, ModelError> {
        let (n_rows, n_features) = x.dim();
        if n_rows == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if y.len() != n_rows {
            return Err(ModelError::LabelCount {
                rows: n_rows,
                labels: y.len(),
            });
        }
        if feature_names.len() != n_features {
            return Err(ModelError::FeatureCount {
                expected: feature_names.len(),
                actual: n_features,
            });
        }
        if let Some(&label) = y.iter().find(|&&l| l > 1) {
            return Err(ModelError::NonBinaryLabel(label));
        }

        let mut dtrain = to_dmatrix(x.view())?;
        let labels: Vec<f32> = y.iter().map(|&l| f32::from(l)).collect();
        dtrain.set_labels(&labels)?;

        let learning_params = parameters::learning::LearningTaskParametersBuilder::default()
            .objective(parameters::learning::Objective::BinaryLogistic)
            .seed(params.seed)
            .build()
            .map_err(ModelError::InvalidParams)?;
        let booster_params = parameters::BoosterParametersBuilder::default()
            .learning_params(learning_params)
            .verbose(false)
            .build()
            .map_err(ModelError::InvalidParams)?;
        let training_params = parameters::TrainingParametersBuilder::default()
            .dtrain(&dtrain)
            .boost_rounds(params.boost_rounds)
            .booster_params(booster_params)
            .build()
            .map_err(ModelError::InvalidParams)?;

        let booster = Booster::train(&training_params)?;
        Ok(Self::from_booster(booster, feature_names))
    }

    fn from_booster(booster: Booster, feature_names: Vec<String>) -> Self {
        Self {
            booster: Mutex::new(BoosterHandle(booster)),
            feature_names,
        }
    }

    /// Load a booster written by [`save`](Self::save)
    ///
    /// The model file carries no column names, so the caller supplies the
    /// feature order the model was trained with.
    pub fn load(path: &Path, feature_names: Vec<String>) -> Result<Self, ModelError> {
        let booster = Booster::load(path)?;
        Ok(Self::from_booster(booster, feature_names))
    }

    /// Write the booster in the XGBoost model format
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let handle = self.lock()?;
        handle.0.save(path)?;
        Ok(())
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BoosterHandle>, ModelError> {
        self.booster
            .lock()
            .map_err(|_| ModelError::Backend("booster lock poisoned".into()))
    }
}

impl Classifier for GradientBoostedClassifier {
    fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>, ModelError> {
        self.check_width(x.ncols())?;
        if x.nrows() == 0 {
            return Ok(Vec::new());
        }
        let dmatrix = to_dmatrix(x)?;
        let handle = self.lock()?;
        let proba = handle.0.predict(&dmatrix)?;
        Ok(proba.into_iter().map(f64::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Twenty rows; the first feature alone separates the classes
    fn separable() -> (Array2<f64>, Vec<u8>) {
        let x = Array2::from_shape_fn((20, 2), |(i, j)| {
            if j == 0 {
                i as f64
            } else {
                ((i * 7) % 5) as f64
            }
        });
        let y = (0..20).map(|i| u8::from(i >= 10)).collect();
        (x, y)
    }

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{}", i)).collect()
    }

    #[test]
    fn test_default_rounds_and_seed() {
        let p = BoosterParams::default();
        assert_eq!(p.boost_rounds, 100);
        assert_eq!(p.seed, 42);
    }

    #[test]
    fn test_fits_separable_data() {
        let (x, y) = separable();
        let model =
            GradientBoostedClassifier::fit(&x, &y, names(2), &BoosterParams::default()).unwrap();
        assert_eq!(model.predict(x.view()).unwrap(), y);
        assert_eq!(model.score(x.view(), &y).unwrap(), 1.0);
    }

    #[test]
    fn test_probabilities_are_bounded() {
        let (x, y) = separable();
        let model =
            GradientBoostedClassifier::fit(&x, &y, names(2), &BoosterParams::default()).unwrap();
        for p in model.predict_proba(x.view()).unwrap() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_deterministic_fit() {
        let (x, y) = separable();
        let a = GradientBoostedClassifier::fit(&x, &y, names(2), &BoosterParams::default()).unwrap();
        let b = GradientBoostedClassifier::fit(&x, &y, names(2), &BoosterParams::default()).unwrap();
        let pa: Vec<u64> = a.predict_proba(x.view()).unwrap().iter().map(|p| p.to_bits()).collect();
        let pb: Vec<u64> = b.predict_proba(x.view()).unwrap().iter().map(|p| p.to_bits()).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let (x, y) = separable();
        let model =
            GradientBoostedClassifier::fit(&x, &y, names(2), &BoosterParams::default()).unwrap();
        let wide = Array2::<f64>::zeros((1, 3));
        assert!(matches!(
            model.predict_proba(wide.view()),
            Err(ModelError::FeatureCount {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_rejects_non_binary_labels() {
        let (x, mut y) = separable();
        y[2] = 2;
        assert!(matches!(
            GradientBoostedClassifier::fit(&x, &y, names(2), &BoosterParams::default()),
            Err(ModelError::NonBinaryLabel(2))
        ));
    }

    #[test]
    fn test_rejects_empty_training_set() {
        let x = Array2::<f64>::zeros((0, 2));
        assert!(matches!(
            GradientBoostedClassifier::fit(&x, &[], names(2), &BoosterParams::default()),
            Err(ModelError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_saved_model_predicts_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");
        let (x, y) = separable();
        let model =
            GradientBoostedClassifier::fit(&x, &y, names(2), &BoosterParams::default()).unwrap();
        model.save(&path).unwrap();

        let back = GradientBoostedClassifier::load(&path, names(2)).unwrap();
        assert_eq!(back.n_features(), 2);
        assert_eq!(
            model.predict_proba(x.view()).unwrap(),
            back.predict_proba(x.view()).unwrap()
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = GradientBoostedClassifier::load(&dir.path().join("absent.bin"), names(2));
        assert!(matches!(err, Err(ModelError::Backend(_))));
    }
}
