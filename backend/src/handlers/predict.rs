//! HTTP handlers for rain prediction

use std::collections::HashMap;

use axum::{
    extract::{rejection::FormRejection, State},
    response::Html,
    Form, Json,
};
use serde::Serialize;
use shared::{ConfidenceTier, RainLabel, RainPrediction};

use crate::error::AppResult;
use crate::handlers::page::{self, Outcome};
use crate::AppState;

/// JSON body returned by the prediction API
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: RainLabel,
    pub probability: f64,
    pub probability_display: String,
    pub confidence: ConfidenceTier,
    pub css_class: &'static str,
}

impl From<RainPrediction> for PredictionResponse {
    fn from(p: RainPrediction) -> Self {
        Self {
            prediction: p.label,
            probability: p.probability,
            probability_display: p.probability_display(),
            confidence: p.confidence,
            css_class: p.confidence.css_class(),
        }
    }
}

/// Empty prediction form
pub async fn show_form(State(state): State<AppState>) -> Html<String> {
    Html(page::render(&state.prediction, &HashMap::new(), None))
}

/// Form submission; input errors, including an unreadable body, are shown
/// on the page rather than failing the request
pub async fn submit_form(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Html<String> {
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::warn!("Rejected form submission: {}", rejection.body_text());
            let outcome = Outcome::Error(format!(
                "Invalid form submission: {}",
                rejection.body_text()
            ));
            return Html(page::render(&state.prediction, &HashMap::new(), Some(&outcome)));
        }
    };

    let outcome = match state.prediction.predict(&form) {
        Ok(prediction) => Outcome::Prediction(prediction),
        Err(e) => {
            tracing::warn!("Prediction failed: {}", e);
            Outcome::Error(e.to_string())
        }
    };
    Html(page::render(&state.prediction, &form, Some(&outcome)))
}

/// JSON prediction endpoint
pub async fn predict(
    State(state): State<AppState>,
    Json(input): Json<HashMap<String, String>>,
) -> AppResult<Json<PredictionResponse>> {
    let prediction = state.prediction.predict(&input)?;
    Ok(Json(prediction.into()))
}
