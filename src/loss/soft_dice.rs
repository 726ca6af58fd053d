/// Soft dice loss: `1 - (2·Σ(v·t) - Σv + 1) / (Σ(v + t) - Σv + 1)`.
///
/// `Σv` is subtracted once from both numerator and denominator.
pub struct SoftDiceLoss;

impl SoftDiceLoss {
    pub fn loss(values: &[f64], truth: &[f64]) -> f64 {
        let sum_v: f64 = values.iter().sum();
        let overlap: f64 = values.iter().zip(truth).map(|(v, t)| v * t).sum();
        let total: f64 = values.iter().zip(truth).map(|(v, t)| v + t).sum();
        1.0 - (2.0 * overlap - sum_v + 1.0) / (total - sum_v + 1.0)
    }

    /// The denominator reduces to `Σt + 1`, so ∂L/∂v_i = -(2·t_i - 1) / (Σt + 1).
    pub fn derivative(values: &[f64], truth: &[f64]) -> Vec<f64> {
        let denominator: f64 = truth.iter().take(values.len()).sum::<f64>() + 1.0;
        truth.iter().take(values.len())
            .map(|t| -(2.0 * t - 1.0) / denominator)
            .collect()
    }
}
