//! Layer variants and the closed `Layer` type the model dispatches over.
//!
//! Every variant stores its own input and output vectors. The model threads a
//! layer's output into the next layer's input with `set_input`, then calls
//! `compute`.

pub mod batch_norm;
pub mod dense;
pub mod dropout;
pub mod flatten;
pub mod init;
pub mod input;
pub mod softmax;

use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::math::matrix::Matrix;

pub use batch_norm::BatchNorm;
pub use dense::Dense;
pub use dropout::Dropout;
pub use flatten::Flatten;
pub use init::{Biases, Initializer, Weights};
pub use input::Input;
pub use softmax::Softmax;

/// Parameter gradients of a single layer for one example.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub weights: Matrix,
    pub biases: Vec<f64>,
}

/// Result of a backward step: parameter gradients (for parametric layers)
/// and ∂L/∂input for the previous layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Backward {
    pub gradients: Option<Gradients>,
    pub upstream: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Dense(Dense),
    Input(Input),
    BatchNorm(BatchNorm),
    Dropout(Dropout),
    Softmax(Softmax),
    Flatten(Flatten),
}

impl Layer {
    pub fn kind(&self) -> &'static str {
        match self {
            Layer::Dense(_) => "Dense",
            Layer::Input(_) => "Input",
            Layer::BatchNorm(_) => "BatchNorm",
            Layer::Dropout(_) => "Dropout",
            Layer::Softmax(_) => "Softmax",
            Layer::Flatten(_) => "Flatten",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Layer::Dense(l) => l.name(),
            Layer::Input(l) => l.name(),
            Layer::BatchNorm(l) => l.name(),
            Layer::Dropout(l) => l.name(),
            Layer::Softmax(l) => l.name(),
            Layer::Flatten(l) => l.name(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Layer {
        self.set_name(name.into());
        self
    }

    pub fn set_name(&mut self, name: String) {
        match self {
            Layer::Dense(l) => l.set_name(name),
            Layer::Input(l) => l.set_name(name),
            Layer::BatchNorm(l) => l.set_name(name),
            Layer::Dropout(l) => l.set_name(name),
            Layer::Softmax(l) => l.set_name(name),
            Layer::Flatten(l) => l.set_name(name),
        }
    }

    /// Only `Dense` and `Input` carry parameters; the rest are never trainable.
    pub fn is_trainable(&self) -> bool {
        match self {
            Layer::Dense(l) => l.is_trainable(),
            Layer::Input(l) => l.is_trainable(),
            _ => false,
        }
    }

    pub fn set_trainable(&mut self, trainable: bool) {
        match self {
            Layer::Dense(l) => l.set_trainable(trainable),
            Layer::Input(l) => l.set_trainable(trainable),
            _ => {}
        }
    }

    pub fn input_len(&self) -> usize {
        match self {
            Layer::Dense(l) => l.input_len(),
            Layer::Input(l) => l.len(),
            Layer::BatchNorm(l) => l.len(),
            Layer::Dropout(l) => l.len(),
            Layer::Softmax(l) => l.input_len(),
            Layer::Flatten(l) => l.len(),
        }
    }

    pub fn output_len(&self) -> usize {
        match self {
            Layer::Dense(l) => l.units(),
            Layer::Input(l) => l.len(),
            Layer::BatchNorm(l) => l.len(),
            Layer::Dropout(l) => l.len(),
            Layer::Softmax(l) => l.classes(),
            Layer::Flatten(l) => l.len(),
        }
    }

    pub fn input(&self) -> &[f64] {
        match self {
            Layer::Dense(l) => l.input(),
            Layer::Input(l) => l.input(),
            Layer::BatchNorm(l) => l.input(),
            Layer::Dropout(l) => l.input(),
            Layer::Softmax(l) => l.input(),
            Layer::Flatten(l) => l.input(),
        }
    }

    pub fn set_input(&mut self, input: Vec<f64>) -> Result<()> {
        match self {
            Layer::Dense(l) => l.set_input(input),
            Layer::Input(l) => l.set_input(input),
            Layer::BatchNorm(l) => l.set_input(input),
            Layer::Dropout(l) => l.set_input(input),
            Layer::Softmax(l) => l.set_input(input),
            Layer::Flatten(l) => l.set_input(input),
        }
    }

    /// Produces the output vector from the stored input and parameters.
    pub fn compute(&mut self) -> Result<&[f64]> {
        match self {
            Layer::Dense(l) => l.compute(),
            Layer::Input(l) => l.compute(),
            Layer::BatchNorm(l) => l.compute(),
            Layer::Dropout(l) => l.compute(),
            Layer::Softmax(l) => l.compute(),
            Layer::Flatten(l) => l.compute(),
        }
    }

    pub fn output(&self) -> &[f64] {
        match self {
            Layer::Dense(l) => l.output(),
            Layer::Input(l) => l.output(),
            Layer::BatchNorm(l) => l.output(),
            Layer::Dropout(l) => l.output(),
            Layer::Softmax(l) => l.output(),
            Layer::Flatten(l) => l.output(),
        }
    }

    /// `None` for variants without parameters.
    pub fn weights(&self) -> Option<&Matrix> {
        match self {
            Layer::Dense(l) => Some(&l.weights().kernels),
            Layer::Input(l) => Some(&l.weights().kernels),
            _ => None,
        }
    }

    pub fn biases(&self) -> Option<&[f64]> {
        match self {
            Layer::Dense(l) => Some(&l.biases().values),
            Layer::Input(l) => Some(&l.biases().values),
            _ => None,
        }
    }

    /// Scalar count across weights and biases; zero when frozen or non-parametric.
    pub fn trainable_parameter_count(&self) -> usize {
        match self {
            Layer::Dense(l) if l.is_trainable() => l.parameter_count(),
            Layer::Input(l) if l.is_trainable() => l.parameter_count(),
            _ => 0,
        }
    }

    pub fn backward(&self, delta: &[f64]) -> Result<Backward> {
        match self {
            Layer::Dense(l) => l.backward(delta),
            Layer::Input(l) => l.backward(delta),
            Layer::BatchNorm(l) => l.backward(delta),
            Layer::Dropout(l) => l.backward(delta),
            Layer::Softmax(l) => l.backward(delta),
            Layer::Flatten(l) => l.backward(delta),
        }
    }

    pub fn apply_gradients(&mut self, grads: &Gradients, lr: f64) -> Result<()> {
        match self {
            Layer::Dense(l) => l.apply_gradients(grads, lr),
            Layer::Input(l) => l.apply_gradients(grads, lr),
            _ => Ok(()),
        }
    }

    /// Checks the invariants a constructor would have enforced. Deserialized
    /// layers bypass the constructors, so `Model::add_layer` runs this first.
    pub fn validate(&self) -> Result<()> {
        match self {
            Layer::Dense(l) => l.validate(),
            Layer::Input(l) => l.validate(),
            Layer::BatchNorm(l) => l.validate(),
            Layer::Dropout(l) => l.validate(),
            Layer::Softmax(l) => l.validate(),
            Layer::Flatten(l) => l.validate(),
        }
    }
}

impl From<Dense> for Layer {
    fn from(l: Dense) -> Layer {
        Layer::Dense(l)
    }
}

impl From<Input> for Layer {
    fn from(l: Input) -> Layer {
        Layer::Input(l)
    }
}

impl From<BatchNorm> for Layer {
    fn from(l: BatchNorm) -> Layer {
        Layer::BatchNorm(l)
    }
}

impl From<Dropout> for Layer {
    fn from(l: Dropout) -> Layer {
        Layer::Dropout(l)
    }
}

impl From<Softmax> for Layer {
    fn from(l: Softmax) -> Layer {
        Layer::Softmax(l)
    }
}

impl From<Flatten> for Layer {
    fn from(l: Flatten) -> Layer {
        Layer::Flatten(l)
    }
}

pub(crate) fn check_input(context: &str, expected: usize, input: &[f64]) -> Result<()> {
    if input.len() != expected {
        return Err(NnError::shape(context, expected, input.len()));
    }
    Ok(())
}

/// `m` must be `[rows, cols]` with every stored row of length `cols`.
pub(crate) fn check_matrix(context: &str, m: &Matrix, rows: usize, cols: usize) -> Result<()> {
    if m.rows != rows || m.cols != cols {
        return Err(NnError::shape(context, rows * cols, m.rows * m.cols));
    }
    if m.data.len() != rows || m.data.iter().any(|row| row.len() != cols) {
        let stored = m.data.iter().map(Vec::len).sum();
        return Err(NnError::shape(context, rows * cols, stored));
    }
    Ok(())
}
