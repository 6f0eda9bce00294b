//! Feature schema shared by training and serving

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::validation::{validate_feature_count, ValidationError};

/// Number of model input features
pub const FEATURE_COUNT: usize = 24;

/// Ordered feature list expected by the model.
///
/// Training writes its matrices in exactly this order and the prediction
/// server assembles form values in exactly this order.
pub const FEATURES: [&str; FEATURE_COUNT] = [
    "Location",
    "MinTemp",
    "MaxTemp",
    "Rainfall",
    "Evaporation",
    "Sunshine",
    "WindGustDir",
    "WindGustSpeed",
    "WindDir9am",
    "WindDir3pm",
    "WindSpeed9am",
    "WindSpeed3pm",
    "Humidity9am",
    "Humidity3pm",
    "Pressure9am",
    "Pressure3pm",
    "Cloud9am",
    "Cloud3pm",
    "Temp9am",
    "Temp3pm",
    "RainToday",
    "Year",
    "Month",
    "Day",
];

/// Categorical input features, each backed by a persisted label encoder
pub const CATEGORICAL_FEATURES: [&str; 5] =
    ["Location", "WindGustDir", "WindDir9am", "WindDir3pm", "RainToday"];

/// Prediction target column
pub const TARGET: &str = "RainTomorrow";

/// Raw date column, expanded into `Year`, `Month` and `Day`
pub const DATE_COLUMN: &str = "Date";

/// Columns derived from the date, appended after the raw columns
pub const DATE_PARTS: [&str; 3] = ["Year", "Month", "Day"];

/// Accepted spellings of the observation date; slashed dates with the year
/// last are month first
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse an observation date in any accepted format
pub fn parse_observation_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

/// Year, month and day of a date, in `DATE_PARTS` order
pub fn date_parts(date: NaiveDate) -> [f64; 3] {
    [
        f64::from(date.year()),
        f64::from(date.month()),
        f64::from(date.day()),
    ]
}

/// Every column that gets a label encoder during processing (target included)
pub fn encoded_columns() -> impl Iterator<Item = &'static str> {
    CATEGORICAL_FEATURES.iter().copied().chain(std::iter::once(TARGET))
}

/// Whether a feature is categorical
pub fn is_categorical(name: &str) -> bool {
    CATEGORICAL_FEATURES.contains(&name)
}

/// Position of a feature in the model input vector
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURES.iter().position(|f| *f == name)
}

/// Kind of input widget a feature needs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    Categorical,
    Numeric,
}

/// Descriptor of one model input
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeatureSpec {
    pub name: &'static str,
    pub kind: FeatureKind,
}

/// Feature descriptors in model order
pub fn feature_specs() -> Vec<FeatureSpec> {
    FEATURES
        .iter()
        .map(|&name| FeatureSpec {
            name,
            kind: if is_categorical(name) {
                FeatureKind::Categorical
            } else {
                FeatureKind::Numeric
            },
        })
        .collect()
}

/// A single model input row in `FEATURES` order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Wrap values that are already in model order
    pub fn new(values: Vec<f64>) -> Result<Self, ValidationError> {
        validate_feature_count(values.len())?;
        Ok(Self(values))
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.0[i])
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}
