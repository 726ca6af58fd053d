pub mod sgd;

use crate::error::Result;
use crate::layers::Layer;
use crate::loss::loss_type::LossType;

pub use sgd::Sgd;

/// Everything an optimizer needs to update a model after one example.
///
/// The layers still hold the inputs and outputs of the forward pass that
/// produced `prediction`.
pub struct GradientStep<'a> {
    pub layers: &'a mut [Layer],
    pub prediction: &'a [f64],
    pub target: &'a [f64],
    pub loss: LossType,
    pub learning_rate: f64,
}

/// Applies accumulated gradients to a model's parameters, once per example.
/// Computing those gradients is the optimizer's job.
pub trait Optimizer: Send {
    /// Initial learning rate; the model owns the live value after compilation.
    fn learning_rate(&self) -> f64;

    fn apply_gradients(&mut self, step: GradientStep<'_>) -> Result<()>;
}
