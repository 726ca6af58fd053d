use crate::error::Result;
use crate::optim::{GradientStep, Optimizer};

/// Plain stochastic gradient descent.
pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    fn apply_gradients(&mut self, step: GradientStep<'_>) -> Result<()> {
        // Initial delta: ∂L/∂output of the last layer.
        let mut delta = step.loss.gradient(step.prediction, step.target)?;

        // Ordering: compute gradients → take the upstream delta → apply step.
        for layer in step.layers.iter_mut().rev() {
            let back = layer.backward(&delta)?;
            if let Some(grads) = back.gradients {
                layer.apply_gradients(&grads, step.learning_rate)?;
            }
            delta = back.upstream;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::layers::{Dense, Layer};
    use crate::loss::loss_type::LossType;
    use crate::math::matrix::Matrix;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn one_step_moves_weight_against_the_gradient() {
        let mut dense = Dense::new(1, 1, ActivationFunction::Identity, &mut StdRng::seed_from_u64(0)).unwrap();
        dense.set_weights(Matrix::from_data(vec![vec![0.5]])).unwrap();
        let mut layers = vec![Layer::from(dense)];
        layers[0].set_input(vec![2.0]).unwrap();
        let prediction = layers[0].compute().unwrap().to_vec();
        assert_eq!(prediction, vec![1.0]);

        let mut sgd = Sgd::new(0.1);
        sgd.apply_gradients(GradientStep {
            layers: &mut layers,
            prediction: &prediction,
            target: &[3.0],
            loss: LossType::Mse,
            learning_rate: 0.1,
        }).unwrap();

        // dL/dp = 2(1 - 3) = -4; dL/dw = -8; dL/db = -4
        let w = layers[0].weights().unwrap().data[0][0];
        let b = layers[0].biases().unwrap()[0];
        assert!((w - 1.3).abs() < 1e-12);
        assert!((b - 0.4).abs() < 1e-12);
    }
}
