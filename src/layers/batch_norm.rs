use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::{check_input, Backward};

pub const DEFAULT_EPSILON: f64 = 1e-3;

/// Standardizes its input with the vector's own mean and population variance,
/// then rescales: `alpha * (x - mean) / sqrt(variance + epsilon) + beta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchNorm {
    name: String,
    input: Vec<f64>,
    output: Vec<f64>,
    beta: f64,
    epsilon: f64,
    alpha: f64,
}

impl BatchNorm {
    /// `alpha = 1`, `beta = 0`, `epsilon = 1e-3`.
    pub fn new(len: usize) -> Result<BatchNorm> {
        BatchNorm::with_params(len, 0.0, DEFAULT_EPSILON, 1.0)
    }

    pub fn with_params(len: usize, beta: f64, epsilon: f64, alpha: f64) -> Result<BatchNorm> {
        if len == 0 {
            return Err(NnError::InvalidConfig("batch norm needs at least one input".into()));
        }
        if !(epsilon > 0.0 && epsilon.is_finite()) {
            return Err(NnError::InvalidConfig(format!(
                "batch norm epsilon must be positive, got {epsilon}"
            )));
        }
        if !beta.is_finite() || !alpha.is_finite() {
            return Err(NnError::InvalidConfig("batch norm alpha and beta must be finite".into()));
        }
        Ok(BatchNorm {
            name: "batch_norm".to_string(),
            input: vec![0.0; len],
            output: vec![0.0; len],
            beta,
            epsilon,
            alpha,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> BatchNorm {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
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
        let (mean, std) = self.statistics();
        self.output = self.input.iter()
            .map(|x| self.alpha * (x - mean) / std + self.beta)
            .collect();
        Ok(&self.output)
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(NnError::InvalidConfig(format!("batch norm {:?} has no inputs", self.name)));
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(NnError::InvalidConfig(format!(
                "batch norm epsilon must be positive, got {}", self.epsilon
            )));
        }
        if !self.beta.is_finite() || !self.alpha.is_finite() {
            return Err(NnError::InvalidConfig("batch norm alpha and beta must be finite".into()));
        }
        Ok(())
    }

    /// Mean and `sqrt(variance + epsilon)` of the stored input.
    fn statistics(&self) -> (f64, f64) {
        let m = mean(&self.input);
        let var = variance(&self.input);
        (m, (var + self.epsilon).sqrt())
    }

    pub fn backward(&self, delta: &[f64]) -> Result<Backward> {
        check_input(&format!("{} delta", self.name), self.len(), delta)?;
        let (m, std) = self.statistics();
        let normalized: Vec<f64> = self.input.iter().map(|x| (x - m) / std).collect();
        let mean_delta = mean(delta);
        let mean_delta_norm = delta.iter().zip(&normalized).map(|(d, n)| d * n).sum::<f64>()
            / delta.len() as f64;
        let upstream = delta.iter().zip(&normalized)
            .map(|(d, n)| self.alpha / std * (d - mean_delta - n * mean_delta_norm))
            .collect();
        Ok(Backward { gradients: None, upstream })
    }
}

/// Zero for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divisor = count). Zero for an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}
