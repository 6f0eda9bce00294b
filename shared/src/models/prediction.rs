//! Prediction display models

use serde::{Deserialize, Serialize};

/// Predicted next-day rain label
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RainLabel {
    No,
    Yes,
}

impl RainLabel {
    /// Map a model class (0/1) to its label
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(RainLabel::No),
            1 => Some(RainLabel::Yes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RainLabel::No => "NO",
            RainLabel::Yes => "YES",
        }
    }
}

impl std::fmt::Display for RainLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence band derived from the positive-class probability
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

/// Lower bound (inclusive) of the high tier
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Lower bound (inclusive) of the medium tier
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.6;

impl ConfidenceTier {
    /// Classify a probability of rain. NaN falls through to `Low`.
    pub fn from_probability(probability: f64) -> Self {
        if probability >= HIGH_CONFIDENCE_THRESHOLD {
            ConfidenceTier::High
        } else if probability >= MEDIUM_CONFIDENCE_THRESHOLD {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }

    /// CSS class used by the prediction page
    pub fn css_class(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high-confidence",
            ConfidenceTier::Medium => "medium-confidence",
            ConfidenceTier::Low => "low-confidence",
        }
    }
}

/// Format a probability as a percentage with one decimal place
pub fn format_probability(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// Outcome of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RainPrediction {
    pub label: RainLabel,
    /// Probability of rain tomorrow (class 1)
    pub probability: f64,
    pub confidence: ConfidenceTier,
}

impl RainPrediction {
    pub fn new(class: u8, probability: f64) -> Option<Self> {
        Some(Self {
            label: RainLabel::from_class(class)?,
            probability,
            confidence: ConfidenceTier::from_probability(probability),
        })
    }

    pub fn probability_display(&self) -> String {
        format_probability(self.probability)
    }
}
