use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::init::{Biases, Initializer, Weights};
use crate::layers::{check_input, check_matrix, Backward, Gradients};
use crate::math::matrix::Matrix;

/// Per-feature affine projection of the raw input: `out[i] = w[i][0] * x[i] + b[i]`.
///
/// Weights have shape `[len, 1]`. The default kernel is all ones, so a freshly
/// built input layer passes features through unchanged. The transform is fixed
/// unless `set_trainable(true)` hands it to the optimizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Input {
    name: String,
    trainable: bool,
    input: Vec<f64>,
    output: Vec<f64>,
    weights: Weights,
    biases: Biases,
}

impl Input {
    pub fn new(len: usize) -> Result<Input> {
        if len == 0 {
            return Err(NnError::InvalidConfig("input layer needs at least one feature".into()));
        }
        Ok(Input {
            name: "input".to_string(),
            trainable: false,
            input: vec![0.0; len],
            output: vec![0.0; len],
            weights: Weights { kernels: Matrix::zeros(len, 1).map(|_| 1.0), init: Initializer::Ones },
            biases: Biases { values: vec![0.0; len], init: Initializer::Zeros },
        })
    }

    pub fn with_initializers<R: Rng + ?Sized>(
        len: usize,
        kernel_init: Initializer,
        bias_init: Initializer,
        rng: &mut R,
    ) -> Result<Input> {
        if len == 0 {
            return Err(NnError::InvalidConfig("input layer needs at least one feature".into()));
        }
        Ok(Input {
            name: "input".to_string(),
            trainable: false,
            input: vec![0.0; len],
            output: vec![0.0; len],
            weights: Weights::new(len, 1, kernel_init, rng)?,
            biases: Biases::new(len, bias_init, rng)?,
        })
    }

    /// Builds the layer around an initial feature vector.
    pub fn from_values(values: Vec<f64>) -> Result<Input> {
        let mut layer = Input::new(values.len())?;
        layer.input = values;
        Ok(layer)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Input {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    pub fn set_trainable(&mut self, trainable: bool) {
        self.trainable = trainable;
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn input(&self) -> &[f64] {
        &self.input
    }

    pub fn set_input(&mut self, input: Vec<f64>) -> Result<()> {
        check_input(&self.name, self.len(), &input)?;
        self.input = input;
        Ok(())
    }

    pub fn compute(&mut self) -> Result<&[f64]> {
        self.output = self.input.iter().enumerate()
            .map(|(i, x)| self.weights.kernels.data[i][0] * x + self.biases.values[i])
            .collect();
        Ok(&self.output)
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn biases(&self) -> &Biases {
        &self.biases
    }

    /// Replaces the `[len, 1]` kernel.
    pub fn set_weights(&mut self, kernels: Matrix) -> Result<()> {
        if kernels.rows != self.len() || kernels.cols != 1 {
            return Err(NnError::shape(
                format!("{} weights", self.name),
                self.len(),
                kernels.element_count(),
            ));
        }
        self.weights.kernels = kernels;
        Ok(())
    }

    pub fn set_biases(&mut self, values: Vec<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(NnError::shape(format!("{} biases", self.name), self.len(), values.len()));
        }
        self.biases.values = values;
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(NnError::InvalidConfig(format!(
                "input layer {:?} needs at least one feature", self.name
            )));
        }
        let len = self.len();
        check_matrix(&format!("{} weights", self.name), &self.weights.kernels, len, 1)?;
        check_input(&format!("{} biases", self.name), len, &self.biases.values)
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.kernels.element_count() + self.biases.values.len()
    }

    pub fn backward(&self, delta: &[f64]) -> Result<Backward> {
        check_input(&format!("{} delta", self.name), self.len(), delta)?;
        let mut weights_grad = self.weights.kernels.map(|_| 0.0);
        let mut upstream = Vec::with_capacity(delta.len());
        for (i, d) in delta.iter().enumerate() {
            weights_grad.data[i][0] = d * self.input[i];
            upstream.push(d * self.weights.kernels.data[i][0]);
        }
        Ok(Backward {
            gradients: Some(Gradients { weights: weights_grad, biases: delta.to_vec() }),
            upstream,
        })
    }

    pub fn apply_gradients(&mut self, grads: &Gradients, lr: f64) -> Result<()> {
        if !self.trainable {
            return Ok(());
        }
        if grads.weights.rows != self.len() || grads.biases.len() != self.len() {
            return Err(NnError::shape(
                format!("{} gradients", self.name),
                self.len(),
                grads.biases.len(),
            ));
        }
        for (i, row) in self.weights.kernels.data.iter_mut().enumerate() {
            row[0] -= lr * grads.weights.data[i][0];
            self.biases.values[i] -= lr * grads.biases[i];
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_override_scales_features() {
        let mut layer = Input::new(2).unwrap();
        layer.set_weights(Matrix::from_data(vec![vec![2.0], vec![-1.0]])).unwrap();
        layer.set_biases(vec![0.5, 0.0]).unwrap();
        assert!(layer.set_biases(vec![0.0]).is_err());
        layer.set_input(vec![1.0, 3.0]).unwrap();
        assert_eq!(layer.compute().unwrap(), &[2.5, -3.0]);
    }

    #[test]
    fn default_projection_is_identity() {
        let mut layer = Input::from_values(vec![1.5, -2.0, 0.0]).unwrap();
        assert_eq!(layer.compute().unwrap(), &[1.5, -2.0, 0.0]);
        assert_eq!(layer.weights().kernels.rows, 3);
        assert_eq!(layer.weights().kernels.cols, 1);
        assert_eq!(layer.parameter_count(), 6);
    }

    #[test]
    fn frozen_until_marked_trainable() {
        let mut layer = Input::new(2).unwrap();
        assert!(!layer.is_trainable());
        let grads = Gradients {
            weights: Matrix::from_data(vec![vec![1.0], vec![1.0]]),
            biases: vec![1.0, 1.0],
        };
        layer.apply_gradients(&grads, 0.5).unwrap();
        assert_eq!(layer.biases().values, vec![0.0, 0.0]);

        layer.set_trainable(true);
        layer.apply_gradients(&grads, 0.5).unwrap();
        assert_eq!(layer.biases().values, vec![-0.5, -0.5]);
        assert_eq!(layer.weights().kernels.data, vec![vec![0.5], vec![0.5]]);
    }

    #[test]
    fn zero_features_is_a_configuration_error() {
        assert!(matches!(Input::new(0), Err(NnError::InvalidConfig(_))));
    }
}
