pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²). Zero for empty vectors.
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        if predicted.is_empty() {
            return 0.0;
        }
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>() / n
    }

    /// Per-output gradient: 2 · (predicted - expected) / n
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| 2.0 * (a - b) / n)
            .collect()
    }
}

pub struct RmseLoss;

impl RmseLoss {
    /// Scalar RMSE: sqrt(MSE)
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        MseLoss::loss(predicted, expected).sqrt()
    }

    /// Chain rule through the square root; zero at a perfect fit.
    pub fn derivative(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        let rmse = RmseLoss::loss(predicted, expected);
        if rmse == 0.0 {
            return vec![0.0; predicted.len()];
        }
        MseLoss::derivative(predicted, expected).into_iter()
            .map(|g| g / (2.0 * rmse))
            .collect()
    }
}
