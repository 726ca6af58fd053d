//! Pure scoring functions over equal-length prediction/truth vectors.

pub mod cross_entropy;
pub mod loss_type;
pub mod mse;
pub mod regularized;
pub mod soft_dice;

use crate::error::Result;

pub use cross_entropy::CrossEntropyLoss;
pub use loss_type::LossType;
pub use mse::{MseLoss, RmseLoss};
pub use regularized::{LassoLoss, RidgeLoss};
pub use soft_dice::SoftDiceLoss;

pub fn mse(predicted: &[f64], truth: &[f64]) -> f64 {
    MseLoss::loss(predicted, truth)
}

pub fn rmse(predicted: &[f64], truth: &[f64]) -> f64 {
    RmseLoss::loss(predicted, truth)
}

pub fn cross_entropy(predicted: &[f64], truth: &[f64]) -> Result<f64> {
    CrossEntropyLoss::loss(predicted, truth)
}

pub fn soft_dice_loss(values: &[f64], truth: &[f64]) -> f64 {
    SoftDiceLoss::loss(values, truth)
}

pub fn ridge_regression(predicted: &[f64], truth: &[f64], lambda: f64) -> f64 {
    RidgeLoss::loss(predicted, truth, lambda)
}

pub fn lasso_regression(predicted: &[f64], truth: &[f64], lambda: f64) -> f64 {
    LassoLoss::loss(predicted, truth, lambda)
}
