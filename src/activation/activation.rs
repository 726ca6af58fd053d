use serde::{Serialize, Deserialize};
use std::f64::consts::E;

/// Default negative-side scale for `Elu`.
pub const ELU_ALPHA: f64 = 0.7;
/// Default gate sharpness for `Swish`.
pub const SWISH_BETA: f64 = 0.8;

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + E.powf(-x))
}

pub fn sigmoid_prime(x: f64) -> f64 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

/// Rectified linear unit.
pub fn relu(x: f64) -> f64 {
    if x < 0.0 { 0.0 } else { x }
}

pub fn elu(x: f64, alpha: f64) -> f64 {
    if x > 0.0 { x } else { alpha * (E.powf(x) - 1.0) }
}

pub fn swish(x: f64, beta: f64) -> f64 {
    x * sigmoid(beta * x)
}

/// Vector softmax, stabilized by subtracting the maximum before exponentiating.
///
/// An empty input yields an empty output.
pub fn softmax(values: &[f64]) -> Vec<f64> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Element-wise activation applied by a `Dense` layer after its affine transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Identity,
    Sigmoid,
    Tanh,
    ReLU,
    Elu { alpha: f64 },
    Swish { beta: f64 },
}

impl ActivationFunction {
    pub fn elu() -> ActivationFunction {
        ActivationFunction::Elu { alpha: ELU_ALPHA }
    }

    pub fn swish() -> ActivationFunction {
        ActivationFunction::Swish { beta: SWISH_BETA }
    }

    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => x,
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::Tanh => tanh(x),
            ActivationFunction::ReLU => relu(x),
            ActivationFunction::Elu { alpha } => elu(x, *alpha),
            ActivationFunction::Swish { beta } => swish(x, *beta),
        }
    }

    /// Derivative with respect to the pre-activation value `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Sigmoid => sigmoid_prime(x),
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Elu { alpha } => {
                if x > 0.0 { 1.0 } else { alpha * E.powf(x) }
            }
            ActivationFunction::Swish { beta } => {
                let sig = sigmoid(beta * x);
                sig + beta * x * sig * (1.0 - sig)
            }
        }
    }
}
