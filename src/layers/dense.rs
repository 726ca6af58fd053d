use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::layers::init::{Biases, Initializer, Weights};
use crate::layers::{check_input, check_matrix, Backward, Gradients};
use crate::math::matrix::Matrix;

/// Fully connected layer: `activation(W · x + b)`.
///
/// `W` has shape `[units, input_len]`, `b` has length `units`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    name: String,
    trainable: bool,
    units: usize,
    input: Vec<f64>,
    pre_activation: Vec<f64>,  // z = Wx + b, needed for the activation derivative
    output: Vec<f64>,
    weights: Weights,
    biases: Biases,
    activation: ActivationFunction,
}

impl Dense {
    /// He-uniform weights and zero biases.
    pub fn new<R: Rng + ?Sized>(
        units: usize,
        input_len: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> Result<Dense> {
        Dense::with_initializers(
            units,
            input_len,
            activation,
            Initializer::he_uniform(),
            Initializer::Zeros,
            rng,
        )
    }

    pub fn with_initializers<R: Rng + ?Sized>(
        units: usize,
        input_len: usize,
        activation: ActivationFunction,
        kernel_init: Initializer,
        bias_init: Initializer,
        rng: &mut R,
    ) -> Result<Dense> {
        if units == 0 || input_len == 0 {
            return Err(NnError::InvalidConfig(format!(
                "dense layer needs units > 0 and input_len > 0, got {units} and {input_len}"
            )));
        }
        let weights = Weights::new(units, input_len, kernel_init, rng)?;
        let biases = Biases::new(units, bias_init, rng)?;

        Ok(Dense {
            name: "dense".to_string(),
            trainable: true,
            units,
            input: vec![0.0; input_len],
            pre_activation: vec![0.0; units],
            output: vec![0.0; units],
            weights,
            biases,
            activation,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Dense {
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

    pub fn units(&self) -> usize {
        self.units
    }

    pub fn input_len(&self) -> usize {
        self.weights.kernels.cols
    }

    pub fn activation(&self) -> &ActivationFunction {
        &self.activation
    }

    pub fn input(&self) -> &[f64] {
        &self.input
    }

    pub fn set_input(&mut self, input: Vec<f64>) -> Result<()> {
        check_input(&self.name, self.input_len(), &input)?;
        self.input = input;
        Ok(())
    }

    pub fn compute(&mut self) -> Result<&[f64]> {
        let z = self.weights.kernels.apply(&self.input)
            .ok_or_else(|| NnError::shape(&self.name, self.input_len(), self.input.len()))?;
        let z: Vec<f64> = z.iter().zip(&self.biases.values).map(|(a, b)| a + b).collect();
        self.output = z.iter().map(|&x| self.activation.function(x)).collect();
        self.pre_activation = z;
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

    /// Replaces the weight matrix; the shape must stay `[units, input_len]`.
    pub fn set_weights(&mut self, kernels: Matrix) -> Result<()> {
        let current = &self.weights.kernels;
        if kernels.rows != current.rows || kernels.cols != current.cols {
            return Err(NnError::shape(
                format!("{} weights", self.name),
                current.element_count(),
                kernels.element_count(),
            ));
        }
        self.weights.kernels = kernels;
        Ok(())
    }

    pub fn set_biases(&mut self, values: Vec<f64>) -> Result<()> {
        if values.len() != self.units {
            return Err(NnError::shape(format!("{} biases", self.name), self.units, values.len()));
        }
        self.biases.values = values;
        Ok(())
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let cols = self.weights.kernels.cols;
        if self.units == 0 || cols == 0 {
            return Err(NnError::InvalidConfig(format!(
                "dense layer {:?} needs units > 0 and input_len > 0", self.name
            )));
        }
        check_matrix(&format!("{} weights", self.name), &self.weights.kernels, self.units, cols)?;
        check_input(&format!("{} biases", self.name), self.units, &self.biases.values)?;
        check_input(&format!("{} stored input", self.name), cols, &self.input)
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.kernels.element_count() + self.biases.values.len()
    }

    /// Gradients for the most recent `compute`. `delta` is ∂L/∂output.
    pub fn backward(&self, delta: &[f64]) -> Result<Backward> {
        check_input(&format!("{} delta", self.name), self.units, delta)?;

        // δ = error ⊙ σ'(z)
        let layer_delta: Vec<f64> = delta.iter().zip(&self.pre_activation)
            .map(|(d, &z)| d * self.activation.derivative(z))
            .collect();

        // ∂L/∂W[u][j] = δ[u] · x[j]
        let column = Matrix::from_data(layer_delta.iter().map(|&d| vec![d]).collect());
        let row = Matrix::from_data(vec![self.input.clone()]);
        let weights_grad = column * row;

        let upstream = self.weights.kernels.transpose().apply(&layer_delta)
            .ok_or_else(|| NnError::shape(&self.name, self.units, layer_delta.len()))?;

        Ok(Backward {
            gradients: Some(Gradients { weights: weights_grad, biases: layer_delta }),
            upstream,
        })
    }

    /// Applies pre-computed gradients scaled by lr.
    pub fn apply_gradients(&mut self, grads: &Gradients, lr: f64) -> Result<()> {
        if !self.trainable {
            return Ok(());
        }
        let step = grads.weights.map(|x| x * lr);
        if step.rows != self.weights.kernels.rows || step.cols != self.weights.kernels.cols {
            return Err(NnError::shape(
                format!("{} weight gradients", self.name),
                self.weights.kernels.element_count(),
                step.element_count(),
            ));
        }
        self.weights.kernels = self.weights.kernels.clone() - step;
        for (b, g) in self.biases.values.iter_mut().zip(&grads.biases) {
            *b -= g * lr;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed(activation: ActivationFunction) -> Dense {
        let mut layer = Dense::new(2, 3, activation, &mut StdRng::seed_from_u64(1)).unwrap();
        layer.set_weights(Matrix::from_data(vec![
            vec![1.0, 0.0, -1.0],
            vec![0.5, 0.5, 0.5],
        ])).unwrap();
        layer.set_biases(vec![0.1, -0.1]).unwrap();
        layer
    }

    #[test]
    fn compute_is_affine_then_activation() {
        let mut layer = fixed(ActivationFunction::ReLU);
        layer.set_input(vec![1.0, 2.0, 3.0]).unwrap();
        let out = layer.compute().unwrap().to_vec();
        // [1 - 3 + 0.1, 3 - 0.1] -> relu
        assert_eq!(out, vec![0.0, 2.9]);
    }

    #[test]
    fn biases_start_at_zero() {
        let layer = Dense::new(4, 2, ActivationFunction::Identity, &mut StdRng::seed_from_u64(5)).unwrap();
        assert!(layer.biases().values.iter().all(|&b| b == 0.0));
        assert_eq!(layer.parameter_count(), 12);
    }

    #[test]
    fn wrong_weight_shape_is_rejected() {
        let mut layer = fixed(ActivationFunction::Identity);
        let err = layer.set_weights(Matrix::zeros(3, 2)).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch { .. }));
        assert!(layer.set_input(vec![1.0]).is_err());
    }

    #[test]
    fn backward_matches_finite_differences() {
        let mut layer = fixed(ActivationFunction::Tanh);
        let x = vec![0.3, -0.7, 0.2];
        layer.set_input(x.clone()).unwrap();
        layer.compute().unwrap();
        // L = sum(output)
        let back = layer.backward(&[1.0, 1.0]).unwrap();
        let grads = back.gradients.unwrap();

        let h = 1e-6;
        let loss_at = |w: Matrix| {
            let mut probe = layer.clone();
            probe.set_weights(w).unwrap();
            let total: f64 = probe.compute().unwrap().iter().sum();
            total
        };
        let mut plus = layer.weights().kernels.clone();
        plus.data[1][2] += h;
        let mut minus = layer.weights().kernels.clone();
        minus.data[1][2] -= h;
        let numeric = (loss_at(plus) - loss_at(minus)) / (2.0 * h);
        assert!((numeric - grads.weights.data[1][2]).abs() < 1e-6);
        assert_eq!(back.upstream.len(), 3);
    }
}
