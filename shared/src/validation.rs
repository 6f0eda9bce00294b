//! Validation utilities for prediction inputs

use thiserror::Error;

use crate::models::FEATURE_COUNT;

/// Field-level input errors raised while building a feature vector
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing value for {field}")]
    MissingField { field: String },

    #[error("Invalid input for {field}: {value}")]
    InvalidNumber { field: String, value: String },

    #[error("Unseen label for {field}: {value}")]
    UnseenCategory { field: String, value: String },

    #[error("Expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },
}

impl ValidationError {
    /// Name of the offending field, when there is one
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::InvalidNumber { field, .. }
            | ValidationError::UnseenCategory { field, .. } => Some(field),
            ValidationError::FeatureCount { .. } => None,
        }
    }
}

/// Require a non-blank value, returning it trimmed
pub fn require_value<'a>(field: &str, raw: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match raw.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField {
            field: field.to_string(),
        }),
    }
}

/// Parse a numeric form value
pub fn parse_numeric(field: &str, raw: Option<&str>) -> Result<f64, ValidationError> {
    let value = require_value(field, raw)?;
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// Check that a row has one value per model feature
pub fn validate_feature_count(actual: usize) -> Result<(), ValidationError> {
    if actual != FEATURE_COUNT {
        return Err(ValidationError::FeatureCount {
            expected: FEATURE_COUNT,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_valid() {
        assert_eq!(parse_numeric("MinTemp", Some(" 13.4 ")).unwrap(), 13.4);
        assert_eq!(parse_numeric("Year", Some("2008")).unwrap(), 2008.0);
        assert_eq!(parse_numeric("MinTemp", Some("-2.5")).unwrap(), -2.5);
    }

    #[test]
    fn test_parse_numeric_blank() {
        let err = parse_numeric("Rainfall", Some("   ")).unwrap_err();
        assert_eq!(err.field(), Some("Rainfall"));
        assert!(matches!(err, ValidationError::MissingField { .. }));
    }

    #[test]
    fn test_parse_numeric_absent() {
        let err = parse_numeric("Rainfall", None).unwrap_err();
        assert_eq!(err.to_string(), "Missing value for Rainfall");
    }

    #[test]
    fn test_parse_numeric_garbage() {
        let err = parse_numeric("Sunshine", Some("sunny")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid input for Sunshine: sunny");
    }

    #[test]
    fn test_parse_numeric_rejects_non_finite() {
        assert!(parse_numeric("Sunshine", Some("NaN")).is_err());
        assert!(parse_numeric("Sunshine", Some("inf")).is_err());
    }

    #[test]
    fn test_feature_count() {
        assert!(validate_feature_count(24).is_ok());
        assert_eq!(
            validate_feature_count(3),
            Err(ValidationError::FeatureCount {
                expected: 24,
                actual: 3
            })
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any finite number survives formatting, padding and parsing
            #[test]
            fn prop_finite_numbers_parse(v in -1.0e6f64..1.0e6) {
                let raw = format!("  {}  ", v);
                prop_assert_eq!(parse_numeric("MinTemp", Some(&raw)).unwrap(), v);
            }

            /// Whitespace-only input is always reported as missing
            #[test]
            fn prop_blank_is_missing(blank in "[ \t]{0,6}") {
                let err = require_value("Cloud9am", Some(&blank)).unwrap_err();
                prop_assert_eq!(err, ValidationError::MissingField { field: "Cloud9am".into() });
            }
        }
    }
}
