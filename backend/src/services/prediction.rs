//! Prediction service: turns submitted form values into a rain forecast
//!
//! The service is built once at startup from the trained model and the
//! persisted label encoders, then shared read-only between requests.

use std::{collections::HashMap, path::Path};

use ndarray::Array2;
use shared::{
    artifact_names, is_categorical, parse_numeric, require_value, FeatureVector, LabelEncoder,
    RainPrediction, ValidationError, CATEGORICAL_FEATURES, FEATURES, FEATURE_COUNT,
};

use crate::{
    error::{AppError, AppResult},
    ml::{Classifier, GradientBoostedClassifier},
    models::ModelMetadata,
    services::artifacts::ArtifactStore,
};

pub struct PredictionService {
    model: Box<dyn Classifier>,
    encoders: HashMap<String, LabelEncoder>,
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("n_features", &self.model.n_features())
            .field("encoders", &self.encoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PredictionService {
    /// Load the model file and one encoder per categorical feature.
    ///
    /// The feature order comes from the metadata written next to the model.
    /// Any missing artifact is an error; nothing is retried or defaulted.
    pub fn load(model_path: impl AsRef<Path>, encoder_dir: impl AsRef<Path>) -> AppResult<Self> {
        let model_path = model_path.as_ref();
        let model_store = ArtifactStore::open(model_path.parent().unwrap_or(Path::new(".")));
        let model_name = model_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(artifact_names::MODEL);
        let model_file = model_store.require(model_name)?;
        let metadata: ModelMetadata = model_store.load_json(artifact_names::MODEL_META)?;

        if metadata.feature_names != FEATURES.as_slice() {
            return Err(AppError::Model(format!(
                "model features {:?} do not match the expected input order",
                metadata.feature_names
            )));
        }
        let model = GradientBoostedClassifier::load(&model_file, metadata.feature_names)?;
        tracing::info!(
            "Model loaded from {} (run {})",
            model_path.display(),
            metadata.run_id
        );

        let encoder_store = ArtifactStore::open(encoder_dir.as_ref());
        let mut encoders = HashMap::with_capacity(CATEGORICAL_FEATURES.len());
        for name in CATEGORICAL_FEATURES {
            let encoder: LabelEncoder = encoder_store.load_json(&artifact_names::encoder(name))?;
            tracing::debug!("Encoder for '{}' has {} classes", name, encoder.len());
            encoders.insert(name.to_string(), encoder);
        }
        tracing::info!("Loaded {} label encoders", encoders.len());

        Self::new(Box::new(model), encoders)
    }

    /// Assemble a service from an in-memory model and encoders
    pub fn new(
        model: Box<dyn Classifier>,
        encoders: HashMap<String, LabelEncoder>,
    ) -> AppResult<Self> {
        if model.n_features() != FEATURE_COUNT {
            return Err(AppError::Model(format!(
                "model expects {} features, the form provides {}",
                model.n_features(),
                FEATURE_COUNT
            )));
        }
        if let Some(missing) = CATEGORICAL_FEATURES
            .iter()
            .find(|name| !encoders.contains_key(**name))
        {
            return Err(AppError::Model(format!("no encoder for '{}'", missing)));
        }
        Ok(Self { model, encoders })
    }

    pub fn encoders(&self) -> &HashMap<String, LabelEncoder> {
        &self.encoders
    }

    /// Known labels of a categorical feature, in code order
    pub fn categories(&self, feature: &str) -> Option<&[String]> {
        self.encoders.get(feature).map(LabelEncoder::classes)
    }

    /// Convert form values to a model row, in feature order
    pub fn build_features(
        &self,
        form: &HashMap<String, String>,
    ) -> Result<FeatureVector, ValidationError> {
        let mut values = Vec::with_capacity(FEATURE_COUNT);
        for name in FEATURES {
            let raw = form.get(name).map(String::as_str);
            let value = if is_categorical(name) {
                let label = require_value(name, raw)?;
                let encoder = self
                    .encoders
                    .get(name)
                    .ok_or_else(|| ValidationError::UnseenCategory {
                        field: name.to_string(),
                        value: label.to_string(),
                    })?;
                encoder.encode(label)? as f64
            } else {
                parse_numeric(name, raw)?
            };
            values.push(value);
        }

        FeatureVector::new(values)
    }

    /// Predict rain tomorrow for one submitted form
    pub fn predict(&self, form: &HashMap<String, String>) -> AppResult<RainPrediction> {
        let features = self.build_features(form)?;
        let row = Array2::from_shape_vec((1, FEATURE_COUNT), features.into_inner())
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let class = self.model.predict(row.view())?;
        let proba = self.model.predict_proba(row.view())?;

        let (class, probability) = match (class.first(), proba.first()) {
            (Some(&c), Some(&p)) => (c, p),
            _ => return Err(AppError::Model("model returned no prediction".into())),
        };

        let prediction = RainPrediction::new(class, probability)
            .ok_or_else(|| AppError::Model(format!("unexpected class {}", class)))?;
        tracing::info!(
            "Prediction: {} ({}, {} confidence)",
            prediction.label,
            prediction.probability_display(),
            prediction.confidence.as_str()
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::ModelError;
    use ndarray::ArrayView2;
    use shared::{ConfidenceTier, RainLabel};

    /// Probability is the Rainfall column divided by 100
    struct RainfallModel;

    impl Classifier for RainfallModel {
        fn n_features(&self) -> usize {
            FEATURE_COUNT
        }

        fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Vec<f64>, ModelError> {
            self.check_width(x.ncols())?;
            Ok(x.rows().into_iter().map(|r| r[3] / 100.0).collect())
        }
    }

    fn service() -> PredictionService {
        let encoders = CATEGORICAL_FEATURES
            .iter()
            .map(|&name| {
                let classes: &[&str] = match name {
                    "Location" => &["Albury", "Sydney"],
                    "RainToday" => &["No", "Yes"],
                    _ => &["E", "N", "S", "W"],
                };
                (name.to_string(), LabelEncoder::fit(name, classes))
            })
            .collect();
        PredictionService::new(Box::new(RainfallModel), encoders).unwrap()
    }

    fn form(rainfall: &str) -> HashMap<String, String> {
        FEATURES
            .iter()
            .map(|&name| {
                let value = match name {
                    "Location" => "Sydney",
                    "RainToday" => "Yes",
                    "WindGustDir" | "WindDir9am" | "WindDir3pm" => "W",
                    "Rainfall" => rainfall,
                    _ => "1",
                };
                (name.to_string(), value.to_string())
            })
            .collect()
    }

    #[test]
    fn test_build_features_encodes_in_order() {
        let features = service().build_features(&form("12.5")).unwrap();
        assert_eq!(features.values().len(), FEATURE_COUNT);
        assert_eq!(features.get("Location"), Some(1.0));
        assert_eq!(features.get("WindGustDir"), Some(3.0));
        assert_eq!(features.get("Rainfall"), Some(12.5));
    }

    #[test]
    fn test_predict_high_confidence() {
        let prediction = service().predict(&form("87.3")).unwrap();
        assert_eq!(prediction.label, RainLabel::Yes);
        assert_eq!(prediction.probability_display(), "87.3%");
        assert_eq!(prediction.confidence, ConfidenceTier::High);
    }

    #[test]
    fn test_blank_numeric_names_field() {
        let mut values = form("10");
        values.insert("Humidity3pm".into(), "  ".into());
        let err = service().build_features(&values).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "Humidity3pm".into()
            }
        );
    }

    #[test]
    fn test_unseen_location() {
        let mut values = form("10");
        values.insert("Location".into(), "Atlantis".into());
        let err = service().build_features(&values).unwrap_err();
        assert!(matches!(err, ValidationError::UnseenCategory { ref field, .. } if field == "Location"));
    }

    #[test]
    fn test_missing_encoder_rejected() {
        let err = PredictionService::new(Box::new(RainfallModel), HashMap::new()).unwrap_err();
        assert!(matches!(err, AppError::Model(_)));
    }

    #[test]
    fn test_load_requires_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let err = PredictionService::load(dir.path().join(artifact_names::MODEL), dir.path()).unwrap_err();
        assert!(matches!(err, AppError::ArtifactMissing { .. }));
    }
}
