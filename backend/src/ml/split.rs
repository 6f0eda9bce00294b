//! Stratified train/test splitting

use std::collections::BTreeMap;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SplitError {
    #[error("test size must be in (0, 1), got {0}")]
    InvalidTestSize(f64),

    #[error("{rows} rows cannot be split into non-empty train and test sets")]
    TooFewRows { rows: usize },

    #[error("class {class} has only {count} row(s); stratification needs at least 2")]
    ClassTooSmall { class: u8, count: usize },

    #[error("{side} set of {size} rows cannot hold all {classes} classes")]
    TooFewForClasses {
        side: &'static str,
        size: usize,
        classes: usize,
    },
}

/// Row indices of the two partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Share `total` across classes in proportion to their counts.
///
/// Floors first, then hands the remainder to the largest fractional parts;
/// ties go to the earlier class.
fn allocate(total: usize, counts: &[usize], n: usize) -> Vec<usize> {
    let exact: Vec<f64> = counts
        .iter()
        .map(|&c| total as f64 * c as f64 / n as f64)
        .collect();
    let mut alloc: Vec<usize> = exact
        .iter()
        .zip(counts)
        .map(|(e, &c)| (e.floor() as usize).min(c))
        .collect();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| {
        let fa = exact[a] - exact[a].floor();
        let fb = exact[b] - exact[b].floor();
        fb.total_cmp(&fa)
    });

    let mut remaining = total.saturating_sub(alloc.iter().sum());
    while remaining > 0 {
        let mut progressed = false;
        for &k in &order {
            if remaining == 0 {
                break;
            }
            if alloc[k] < counts[k] {
                alloc[k] += 1;
                remaining -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
    alloc
}

/// Split row indices so each class keeps its share in both partitions.
///
/// The test partition holds `ceil(test_size * n)` rows. The same labels, test
/// size and seed always give the same indices.
pub fn stratified_split(
    labels: &[u8],
    test_size: f64,
    seed: u64,
) -> Result<SplitIndices, SplitError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SplitError::InvalidTestSize(test_size));
    }

    let n = labels.len();
    let n_test = (test_size * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(SplitError::TooFewRows { rows: n });
    }

    let mut by_class: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
    for (i, &label) in labels.iter().enumerate() {
        by_class.entry(label).or_default().push(i);
    }

    if let Some((&class, rows)) = by_class.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(SplitError::ClassTooSmall {
            class,
            count: rows.len(),
        });
    }
    let n_classes = by_class.len();
    for (side, size) in [("train", n_train), ("test", n_test)] {
        if size < n_classes {
            return Err(SplitError::TooFewForClasses {
                side,
                size,
                classes: n_classes,
            });
        }
    }

    let counts: Vec<usize> = by_class.values().map(Vec::len).collect();
    let test_alloc = allocate(n_test, &counts, n);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (mut rows, take) in by_class.into_values().zip(test_alloc) {
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..take]);
        train.extend_from_slice(&rows[take..]);
    }
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    Ok(SplitIndices { train, test })
}
