use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::loss::cross_entropy::CrossEntropyLoss;
use crate::loss::mse::{MseLoss, RmseLoss};
use crate::loss::regularized::{LassoLoss, RidgeLoss};
use crate::loss::soft_dice::SoftDiceLoss;

/// Selects which loss function the training loop scores predictions with.
///
/// - `Mse` / `Rmse`    : mean squared error and its square root.
/// - `CrossEntropy`    : `Σ p·ln(t) + (1-p)·ln(1-t)`; truth must lie in (0, 1).
/// - `SoftDice`        : soft dice loss.
/// - `Ridge` / `Lasso` : summed squared error plus an L2 / L1 penalty on the
///   truth vector scaled by `lambda`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Mse,
    Rmse,
    CrossEntropy,
    SoftDice,
    Ridge { lambda: f64 },
    Lasso { lambda: f64 },
}

impl LossType {
    pub fn name(&self) -> &'static str {
        match self {
            LossType::Mse => "mse",
            LossType::Rmse => "rmse",
            LossType::CrossEntropy => "cross_entropy",
            LossType::SoftDice => "soft_dice",
            LossType::Ridge { .. } => "ridge",
            LossType::Lasso { .. } => "lasso",
        }
    }

    /// Scalar loss for one example. Fails on a length mismatch, a domain error
    /// or a non-finite result.
    pub fn compute(&self, predicted: &[f64], expected: &[f64]) -> Result<f64> {
        check_lengths(self.name(), predicted, expected)?;
        let value = match self {
            LossType::Mse => MseLoss::loss(predicted, expected),
            LossType::Rmse => RmseLoss::loss(predicted, expected),
            LossType::CrossEntropy => CrossEntropyLoss::loss(predicted, expected)?,
            LossType::SoftDice => SoftDiceLoss::loss(predicted, expected),
            LossType::Ridge { lambda } => RidgeLoss::loss(predicted, expected, *lambda),
            LossType::Lasso { lambda } => LassoLoss::loss(predicted, expected, *lambda),
        };
        if !value.is_finite() {
            return Err(NnError::NonFinite(format!("{} loss", self.name())));
        }
        Ok(value)
    }

    /// ∂L/∂predicted for one example.
    pub fn gradient(&self, predicted: &[f64], expected: &[f64]) -> Result<Vec<f64>> {
        check_lengths(self.name(), predicted, expected)?;
        let grad = match self {
            LossType::Mse => MseLoss::derivative(predicted, expected),
            LossType::Rmse => RmseLoss::derivative(predicted, expected),
            LossType::CrossEntropy => CrossEntropyLoss::derivative(predicted, expected)?,
            LossType::SoftDice => SoftDiceLoss::derivative(predicted, expected),
            LossType::Ridge { .. } => RidgeLoss::derivative(predicted, expected),
            LossType::Lasso { .. } => LassoLoss::derivative(predicted, expected),
        };
        if grad.iter().any(|g| !g.is_finite()) {
            return Err(NnError::NonFinite(format!("{} gradient", self.name())));
        }
        Ok(grad)
    }
}

fn check_lengths(context: &str, predicted: &[f64], expected: &[f64]) -> Result<()> {
    if predicted.len() != expected.len() {
        return Err(NnError::shape(context, expected.len(), predicted.len()));
    }
    Ok(())
}
