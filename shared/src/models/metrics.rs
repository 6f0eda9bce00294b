//! Evaluation metrics for binary rain classification

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Single-row evaluation record written after every training run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricsRecord {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub train_score: f64,
}

/// Support-weighted precision, recall and F1
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeightedScores {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Fraction of predictions equal to the true label
pub fn accuracy(y_true: &[u8], y_pred: &[u8]) -> f64 {
    debug_assert_eq!(y_true.len(), y_pred.len());
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    correct as f64 / y_true.len() as f64
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Per-class scores averaged with weights equal to each class's true support.
///
/// Labels are the union of true and predicted labels. A class with a zero
/// denominator scores 0 for that metric.
pub fn weighted_scores(y_true: &[u8], y_pred: &[u8]) -> WeightedScores {
    debug_assert_eq!(y_true.len(), y_pred.len());
    let labels: BTreeSet<u8> = y_true.iter().chain(y_pred).copied().collect();
    let total = y_true.len();

    let mut scores = WeightedScores {
        precision: 0.0,
        recall: 0.0,
        f1_score: 0.0,
    };
    if total == 0 {
        return scores;
    }

    for label in labels {
        let mut tp = 0;
        let mut predicted = 0;
        let mut support = 0;
        for (&t, &p) in y_true.iter().zip(y_pred) {
            if p == label {
                predicted += 1;
            }
            if t == label {
                support += 1;
                if p == label {
                    tp += 1;
                }
            }
        }

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        let weight = support as f64 / total as f64;
        scores.precision += weight * precision;
        scores.recall += weight * recall;
        scores.f1_score += weight * f1;
    }

    scores
}

/// Counts of (true, predicted) label pairs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfusionMatrix {
    /// Sorted labels; row index = true label, column index = predicted label
    pub labels: Vec<u8>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Self {
        let labels: Vec<u8> = y_true
            .iter()
            .chain(y_pred)
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut counts = vec![vec![0; labels.len()]; labels.len()];

        for (t, p) in y_true.iter().zip(y_pred) {
            // both are present in `labels` by construction
            if let (Ok(row), Ok(col)) = (labels.binary_search(t), labels.binary_search(p)) {
                counts[row][col] += 1;
            }
        }

        Self { labels, counts }
    }

    pub fn get(&self, actual: u8, predicted: u8) -> usize {
        match (
            self.labels.binary_search(&actual),
            self.labels.binary_search(&predicted),
        ) {
            (Ok(row), Ok(col)) => self.counts[row][col],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Largest single cell, used to scale chart colours
    pub fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Receiver operating characteristic curve
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Decision thresholds; the first point uses +inf
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Area under the curve by the trapezoidal rule.
    ///
    /// `None` when only one class is present in the true labels.
    pub fn auc(&self) -> Option<f64> {
        let degenerate = self.fpr.last().map_or(true, |&f| f == 0.0)
            || self.tpr.last().map_or(true, |&t| t == 0.0);
        if degenerate {
            return None;
        }
        Some(auc(&self.fpr, &self.tpr))
    }
}

/// ROC curve of positive-class scores against binary labels (1 = positive).
///
/// One point per distinct score, visited from highest to lowest, preceded by
/// the origin. Rates are NaN-free: a missing class gives a zero rate.
pub fn roc_curve(y_true: &[u8], scores: &[f64]) -> RocCurve {
    debug_assert_eq!(y_true.len(), scores.len());
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let positives = y_true.iter().filter(|&&y| y == 1).count();
    let negatives = y_true.len() - positives;

    let mut fpr = vec![0.0];
    let mut tpr = vec![0.0];
    let mut thresholds = vec![f64::INFINITY];

    let (mut tp, mut fp) = (0usize, 0usize);
    for (pos, &i) in order.iter().enumerate() {
        if y_true[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let last_of_score = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_score {
            fpr.push(ratio(fp, negatives));
            tpr.push(ratio(tp, positives));
            thresholds.push(scores[i]);
        }
    }

    RocCurve {
        fpr,
        tpr,
        thresholds,
    }
}

/// Trapezoidal area under a curve whose x values are non-decreasing
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_accuracy() {
        assert!(close(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75));
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_weighted_scores_known_values() {
        // class 0: tp=2, predicted=3, support=3 -> p=2/3, r=2/3
        // class 1: tp=0, predicted=1, support=1 -> p=0, r=0
        let y_true = [0, 0, 0, 1];
        let y_pred = [0, 0, 1, 0];
        let s = weighted_scores(&y_true, &y_pred);
        assert!(close(s.precision, 0.75 * 2.0 / 3.0));
        assert!(close(s.recall, 0.75 * 2.0 / 3.0));
        assert!(close(s.f1_score, 0.75 * 2.0 / 3.0));
    }

    #[test]
    fn test_weighted_recall_equals_accuracy() {
        let y_true = [0, 1, 1, 0, 1, 0, 0];
        let y_pred = [0, 1, 0, 0, 1, 1, 0];
        let s = weighted_scores(&y_true, &y_pred);
        assert!(close(s.recall, accuracy(&y_true, &y_pred)));
    }

    #[test]
    fn test_perfect_prediction() {
        let y = [0, 1, 0, 1];
        let s = weighted_scores(&y, &y);
        assert_eq!(s.precision, 1.0);
        assert_eq!(s.recall, 1.0);
        assert_eq!(s.f1_score, 1.0);
    }

    #[test]
    fn test_confusion_matrix_layout() {
        let cm = ConfusionMatrix::from_labels(&[0, 0, 1, 1, 1], &[0, 1, 1, 1, 0]);
        assert_eq!(cm.labels, vec![0, 1]);
        assert_eq!(cm.counts, vec![vec![1, 1], vec![1, 2]]);
        assert_eq!(cm.get(1, 1), 2);
        assert_eq!(cm.total(), 5);
        assert_eq!(cm.max_count(), 2);
    }

    #[test]
    fn test_roc_perfect_separation() {
        let roc = roc_curve(&[0, 0, 1, 1], &[0.1, 0.2, 0.8, 0.9]);
        assert_eq!(roc.fpr.first(), Some(&0.0));
        assert_eq!(roc.fpr.last(), Some(&1.0));
        assert_eq!(roc.tpr.last(), Some(&1.0));
        assert!(close(roc.auc().unwrap(), 1.0));
    }

    #[test]
    fn test_roc_textbook_example() {
        let roc = roc_curve(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]);
        assert!(close(roc.auc().unwrap(), 0.75));
    }

    #[test]
    fn test_roc_tied_scores_collapse() {
        let roc = roc_curve(&[0, 1, 0, 1], &[0.5, 0.5, 0.5, 0.5]);
        assert_eq!(roc.fpr, vec![0.0, 1.0]);
        assert!(close(roc.auc().unwrap(), 0.5));
    }

    #[test]
    fn test_roc_single_class_has_no_auc() {
        let roc = roc_curve(&[1, 1, 1], &[0.2, 0.5, 0.9]);
        assert_eq!(roc.auc(), None);
    }
}
