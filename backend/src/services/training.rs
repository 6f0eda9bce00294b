//! Model training service: fit the boosted classifier and evaluate it

use std::path::PathBuf;

use chrono::Utc;
use shared::{
    artifact_names, roc_curve, weighted_scores, ConfusionMatrix, MetricsRecord, RocCurve,
};
use uuid::Uuid;

use crate::{
    config::PipelineConfig,
    error::{AppResult, PipelineResult, Stage, StageContext},
    ml::{BoosterParams, Classifier, GradientBoostedClassifier},
    models::{FeatureMatrix, LabelVector, ModelMetadata},
    services::{artifacts::ArtifactStore, processing::ProcessedSplits, reporting::ReportingService},
};

pub const ALGORITHM: &str = "xgboost_binary_logistic";

/// Trains on the persisted splits and writes model and evaluation artifacts
#[derive(Debug, Clone)]
pub struct ModelTrainingService {
    splits: ArtifactStore,
    store: ArtifactStore,
    params: BoosterParams,
    render_charts: bool,
}

impl ModelTrainingService {
    /// Create the service; the model directory is created if missing
    pub fn new(
        processed_path: impl Into<PathBuf>,
        model_path: impl Into<PathBuf>,
        settings: &PipelineConfig,
    ) -> PipelineResult<Self> {
        let store = ArtifactStore::create(model_path).stage(Stage::TrainModel)?;
        tracing::info!("Model Training initialized");
        Ok(Self {
            splits: ArtifactStore::open(processed_path),
            store,
            params: BoosterParams {
                seed: settings.seed,
                ..BoosterParams::default()
            },
            render_charts: settings.render_charts,
        })
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Read the four split artifacts written by the processing stage
    pub fn load_data(&self) -> PipelineResult<ProcessedSplits> {
        let result = self.read_splits().stage(Stage::LoadSplits);

        match &result {
            Ok(splits) => {
                let summary = splits.summary();
                tracing::info!(
                    "Data loaded successfully: {} train rows, {} test rows",
                    summary.train_rows,
                    summary.test_rows
                );
            }
            Err(e) => tracing::error!("Error while loading data: {}", e),
        }
        result
    }

    fn read_splits(&self) -> AppResult<ProcessedSplits> {
        Ok(ProcessedSplits {
            x_train: self.splits.load_json::<FeatureMatrix>(artifact_names::X_TRAIN)?,
            x_test: self.splits.load_json::<FeatureMatrix>(artifact_names::X_TEST)?,
            y_train: self.splits.load_json::<LabelVector>(artifact_names::Y_TRAIN)?,
            y_test: self.splits.load_json::<LabelVector>(artifact_names::Y_TEST)?,
        })
    }

    /// Fit the classifier on the training split and persist it
    pub fn train_model(&self, splits: &ProcessedSplits) -> PipelineResult<GradientBoostedClassifier> {
        let result = self.fit_and_save(splits);
        match &result {
            Ok(_) => tracing::info!(
                "Model trained successfully ({} boosting rounds)",
                self.params.boost_rounds
            ),
            Err(e) => tracing::error!("Error while training model: {}", e),
        }
        result
    }

    fn fit_and_save(&self, splits: &ProcessedSplits) -> PipelineResult<GradientBoostedClassifier> {
        let model = GradientBoostedClassifier::fit(
            &splits.x_train.values,
            &splits.y_train.labels,
            splits.x_train.feature_names.clone(),
            &self.params,
        )
        .stage(Stage::TrainModel)?;

        self.store
            .save_with(artifact_names::MODEL, |tmp| model.save(tmp))
            .stage(Stage::TrainModel)?;

        let summary = splits.summary();
        let proba = model
            .predict_proba(splits.x_test.values.view())
            .stage(Stage::TrainModel)?;
        let metadata = ModelMetadata {
            run_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            algorithm: ALGORITHM.to_string(),
            params: self.params.clone(),
            feature_names: model.feature_names().to_vec(),
            train_rows: summary.train_rows,
            test_rows: summary.test_rows,
            roc_auc: roc_curve(&splits.y_test.labels, &proba).auc(),
        };
        self.store
            .save_json(artifact_names::MODEL_META, &metadata)
            .stage(Stage::TrainModel)?;

        Ok(model)
    }

    /// Score the model on both splits, then write metrics and charts
    pub fn eval_model(
        &self,
        model: &dyn Classifier,
        splits: &ProcessedSplits,
    ) -> PipelineResult<MetricsRecord> {
        let result = self.evaluate(model, splits);
        match &result {
            Ok(metrics) => tracing::info!(
                "Model evaluation: accuracy={:.4} precision={:.4} recall={:.4} f1={:.4} train_score={:.4}",
                metrics.accuracy,
                metrics.precision,
                metrics.recall,
                metrics.f1_score,
                metrics.train_score
            ),
            Err(e) => tracing::error!("Error while evaluating model: {}", e),
        }
        result
    }

    fn evaluate(&self, model: &dyn Classifier, splits: &ProcessedSplits) -> PipelineResult<MetricsRecord> {
        let train_score = model
            .score(splits.x_train.values.view(), &splits.y_train.labels)
            .stage(Stage::EvaluateModel)?;

        let y_true = &splits.y_test.labels;
        let y_pred = model
            .predict(splits.x_test.values.view())
            .stage(Stage::EvaluateModel)?;
        let proba = model
            .predict_proba(splits.x_test.values.view())
            .stage(Stage::EvaluateModel)?;

        let scores = weighted_scores(y_true, &y_pred);
        let metrics = MetricsRecord {
            accuracy: shared::accuracy(y_true, &y_pred),
            precision: scores.precision,
            recall: scores.recall,
            f1_score: scores.f1_score,
            train_score,
        };

        ReportingService::write_csv(&self.store.path(artifact_names::METRICS), &[metrics])
            .stage(Stage::EvaluateModel)?;

        let cm = ConfusionMatrix::from_labels(y_true, &y_pred);
        let roc = roc_curve(y_true, &proba);
        let auc = roc.auc();
        tracing::info!("Confusion matrix: {:?}", cm.counts);
        match auc {
            Some(a) => tracing::info!("ROC AUC: {:.4}", a),
            None => tracing::warn!("ROC AUC undefined: test split holds a single class"),
        }

        if self.render_charts {
            self.draw_charts(&cm, &roc, auc);
        } else {
            tracing::info!("Chart rendering disabled; skipping confusion matrix and ROC curve");
        }

        Ok(metrics)
    }

    /// Charts are diagnostics only: a rendering failure (no fonts on a
    /// headless host, for instance) is logged and the run carries on
    fn draw_charts(&self, cm: &ConfusionMatrix, roc: &RocCurve, auc: Option<f64>) {
        let cm_path = self.store.path(artifact_names::CONFUSION_MATRIX);
        match ReportingService::plot_confusion_matrix(cm, &cm_path) {
            Ok(()) => tracing::info!("Confusion matrix saved to {}", cm_path.display()),
            Err(e) => tracing::warn!("Skipped confusion matrix chart: {}", e),
        }

        let roc_path = self.store.path(artifact_names::ROC_CURVE);
        match ReportingService::plot_roc_curve(roc, auc, &roc_path) {
            Ok(()) => tracing::info!("ROC curve saved to {}", roc_path.display()),
            Err(e) => tracing::warn!("Skipped ROC curve chart: {}", e),
        }
    }

    /// Execute the full training pipeline
    pub fn run(&self) -> PipelineResult<MetricsRecord> {
        let splits = self.load_data()?;
        let model = self.train_model(&splits)?;
        let metrics = self.eval_model(&model, &splits)?;
        tracing::info!("Model training pipeline completed");
        Ok(metrics)
    }
}
