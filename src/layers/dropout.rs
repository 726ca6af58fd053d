use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::{check_input, Backward};

/// Deterministic dropout: zeroes `floor(rate * len)` positions chosen by index
/// divisibility, so the same positions are dropped on every call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dropout {
    name: String,
    rate: f64,
    input: Vec<f64>,
    output: Vec<f64>,
    dropped: Vec<usize>,
}

impl Dropout {
    pub fn new(len: usize, rate: f64) -> Result<Dropout> {
        if len == 0 {
            return Err(NnError::InvalidConfig("dropout needs at least one input".into()));
        }
        if !(0.0..1.0).contains(&rate) {
            return Err(NnError::InvalidConfig(format!(
                "dropout rate must be in [0, 1), got {rate}"
            )));
        }
        Ok(Dropout {
            name: "dropout".to_string(),
            rate,
            input: vec![0.0; len],
            output: vec![0.0; len],
            dropped: dropped_indices(len, rate),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Dropout {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }

    /// Positions zeroed by `compute`, ascending.
    pub fn dropped(&self) -> &[usize] {
        &self.dropped
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
        self.output = self.input.clone();
        for &i in &self.dropped {
            self.output[i] = 0.0;
        }
        Ok(&self.output)
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(NnError::InvalidConfig(format!("dropout {:?} has no inputs", self.name)));
        }
        if !(0.0..1.0).contains(&self.rate) {
            return Err(NnError::InvalidConfig(format!(
                "dropout rate must be in [0, 1), got {}", self.rate
            )));
        }
        if let Some(&i) = self.dropped.iter().find(|&&i| i >= self.len()) {
            return Err(NnError::InvalidConfig(format!(
                "dropout {:?} drops index {i} of a {}-wide input", self.name, self.len()
            )));
        }
        Ok(())
    }

    pub fn backward(&self, delta: &[f64]) -> Result<Backward> {
        check_input(&format!("{} delta", self.name), self.len(), delta)?;
        let mut upstream = delta.to_vec();
        for &i in &self.dropped {
            upstream[i] = 0.0;
        }
        Ok(Backward { gradients: None, upstream })
    }
}

/// Every `len / k`-th index starting at 0, where `k = floor(rate * len)`.
fn dropped_indices(len: usize, rate: f64) -> Vec<usize> {
    let count = (rate * len as f64).floor() as usize;
    if count == 0 {
        return Vec::new();
    }
    let step = len / count;
    (0..len).step_by(step).take(count).collect()
}
