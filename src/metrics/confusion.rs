//! Confusion-derived scores over already-discretized outputs.
//!
//! An entry counts as positive when it is non-zero. Counts compare predicted
//! and actual entries by exact equality; no thresholding happens here.
//!
//! When a ratio's denominator is zero there was nothing to get wrong, so
//! precision, recall, sensitivity and specificity report 1.0. F1 reports 0.0
//! when precision and recall are both zero.

fn is_positive(v: f64) -> bool {
    v != 0.0
}

/// Predicted equals actual and the entry is positive.
pub fn true_positives(predicted: &[f64], actual: &[f64]) -> usize {
    predicted.iter().zip(actual)
        .filter(|(p, a)| p == a && is_positive(**a))
        .count()
}

/// Predicted equals actual and the entry is zero.
pub fn true_negatives(predicted: &[f64], actual: &[f64]) -> usize {
    predicted.iter().zip(actual)
        .filter(|(p, a)| p == a && !is_positive(**a))
        .count()
}

/// Predicted differs from actual and the prediction is positive.
pub fn false_positives(predicted: &[f64], actual: &[f64]) -> usize {
    predicted.iter().zip(actual)
        .filter(|(p, a)| p != a && is_positive(**p))
        .count()
}

/// Predicted differs from actual and the prediction is zero.
pub fn false_negatives(predicted: &[f64], actual: &[f64]) -> usize {
    predicted.iter().zip(actual)
        .filter(|(p, a)| p != a && !is_positive(**p))
        .count()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        numerator as f64 / denominator as f64
    }
}

pub fn precision(predicted: &[f64], actual: &[f64]) -> f64 {
    let tp = true_positives(predicted, actual);
    ratio(tp, tp + false_positives(predicted, actual))
}

pub fn recall(predicted: &[f64], actual: &[f64]) -> f64 {
    let tp = true_positives(predicted, actual);
    ratio(tp, tp + false_negatives(predicted, actual))
}

pub fn sensitivity(predicted: &[f64], actual: &[f64]) -> f64 {
    recall(predicted, actual)
}

pub fn specificity(predicted: &[f64], actual: &[f64]) -> f64 {
    let tn = true_negatives(predicted, actual);
    ratio(tn, tn + false_positives(predicted, actual))
}

pub fn f1_score(predicted: &[f64], actual: &[f64]) -> f64 {
    let p = precision(predicted, actual);
    let r = recall(predicted, actual);
    if p + r == 0.0 {
        return 0.0;
    }
    2.0 * p * r / (p + r)
}

/// Fraction of positions where prediction and truth agree exactly.
pub fn jaccard_index(predicted: &[f64], actual: &[f64]) -> f64 {
    if predicted.is_empty() {
        return 0.0;
    }
    let same = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    same as f64 / predicted.len() as f64
}
