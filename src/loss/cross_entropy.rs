use crate::error::{NnError, Result};

/// Cross-entropy in the form `Σ p·ln(t) + (1 - p)·ln(1 - t)`.
///
/// The logarithms are taken of the truth values, so every truth value must lie
/// strictly inside (0, 1). Values outside are reported, not clamped.
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    pub fn loss(predicted: &[f64], truth: &[f64]) -> Result<f64> {
        check_truth(truth)?;
        Ok(predicted.iter().zip(truth.iter())
            .map(|(p, t)| p * t.ln() + (1.0 - p) * (1.0 - t).ln())
            .sum())
    }

    /// ∂L/∂p_i = ln(t_i) - ln(1 - t_i)
    pub fn derivative(predicted: &[f64], truth: &[f64]) -> Result<Vec<f64>> {
        check_truth(truth)?;
        Ok(truth.iter().take(predicted.len())
            .map(|t| t.ln() - (1.0 - t).ln())
            .collect())
    }
}

fn check_truth(truth: &[f64]) -> Result<()> {
    match truth.iter().find(|t| !(**t > 0.0 && **t < 1.0)) {
        Some(t) => Err(NnError::NumericDomain(format!(
            "cross-entropy truth values must lie in (0, 1), got {t}"
        ))),
        None => Ok(()),
    }
}
