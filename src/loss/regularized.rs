/// Summed squared error plus `lambda · Σ t²`.
pub struct RidgeLoss;

impl RidgeLoss {
    pub fn loss(predicted: &[f64], truth: &[f64], lambda: f64) -> f64 {
        predicted.iter().zip(truth)
            .map(|(p, t)| (p - t).powi(2) + lambda * t.powi(2))
            .sum()
    }

    /// The penalty does not depend on the prediction.
    pub fn derivative(predicted: &[f64], truth: &[f64]) -> Vec<f64> {
        squared_error_derivative(predicted, truth)
    }
}

/// Summed squared error plus `lambda · Σ |t|`.
pub struct LassoLoss;

impl LassoLoss {
    pub fn loss(predicted: &[f64], truth: &[f64], lambda: f64) -> f64 {
        predicted.iter().zip(truth)
            .map(|(p, t)| (p - t).powi(2) + lambda * t.abs())
            .sum()
    }

    pub fn derivative(predicted: &[f64], truth: &[f64]) -> Vec<f64> {
        squared_error_derivative(predicted, truth)
    }
}

fn squared_error_derivative(predicted: &[f64], truth: &[f64]) -> Vec<f64> {
    predicted.iter().zip(truth).map(|(p, t)| 2.0 * (p - t)).collect()
}
