//! Label encoding for categorical columns

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::validation::ValidationError;

/// Maps category labels to integer codes.
///
/// Codes are the position of each label in the lexicographically sorted set
/// of labels observed at fit time, so fitting the same values always yields
/// the same mapping. An encoder is never changed after fitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    column: String,
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit an encoder on the observed values of a column
    pub fn fit<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();

        Self {
            column: column.into(),
            classes: classes.into_iter().collect(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Known labels in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.code_of(value).is_some()
    }

    fn code_of(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }

    /// Encode a label, rejecting anything not seen at fit time
    pub fn encode(&self, value: &str) -> Result<usize, ValidationError> {
        self.code_of(value)
            .ok_or_else(|| ValidationError::UnseenCategory {
                field: self.column.clone(),
                value: value.to_string(),
            })
    }

    /// Inverse of [`LabelEncoder::encode`]
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    /// Label to code pairs, for logging
    pub fn mapping(&self) -> Vec<(&str, usize)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(code, label)| (label.as_str(), code))
            .collect()
    }
}
