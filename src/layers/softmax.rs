use serde::{Serialize, Deserialize};

use crate::activation::activation::softmax;
use crate::error::{NnError, Result};
use crate::layers::{check_input, Backward};

/// Stabilized softmax over the whole input, truncated to the first `classes`
/// probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Softmax {
    name: String,
    classes: usize,
    input: Vec<f64>,
    probabilities: Vec<f64>,
    output: Vec<f64>,
}

impl Softmax {
    pub fn new(input_len: usize, classes: usize) -> Result<Softmax> {
        if classes == 0 || classes > input_len {
            return Err(NnError::InvalidConfig(format!(
                "softmax classes must be in 1..={input_len}, got {classes}"
            )));
        }
        Ok(Softmax {
            name: "softmax".to_string(),
            classes,
            input: vec![0.0; input_len],
            probabilities: vec![0.0; input_len],
            output: vec![0.0; classes],
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Softmax {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn classes(&self) -> usize {
        self.classes
    }

    pub fn input_len(&self) -> usize {
        self.input.len()
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
        self.probabilities = softmax(&self.input);
        self.output = self.probabilities[..self.classes].to_vec();
        Ok(&self.output)
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let input_len = self.input_len();
        if self.classes == 0 || self.classes > input_len {
            return Err(NnError::InvalidConfig(format!(
                "softmax classes must be in 1..={input_len}, got {}", self.classes
            )));
        }
        check_input(&format!("{} probabilities", self.name), input_len, &self.probabilities)
    }

    /// Jacobian-vector product of the truncated softmax.
    pub fn backward(&self, delta: &[f64]) -> Result<Backward> {
        check_input(&format!("{} delta", self.name), self.classes, delta)?;
        let s = &self.probabilities;
        let weighted: f64 = delta.iter().zip(s).map(|(d, p)| d * p).sum();
        let upstream = s.iter().enumerate()
            .map(|(j, &sj)| {
                let own = delta.get(j).copied().unwrap_or(0.0);
                sj * (own - weighted)
            })
            .collect();
        Ok(Backward { gradients: None, upstream })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_to_class_count() {
        let mut layer = Softmax::new(4, 2).unwrap();
        layer.set_input(vec![0.0, 0.0, 0.0, 0.0]).unwrap();
        assert_eq!(layer.compute().unwrap(), &[0.25, 0.25]);
    }

    #[test]
    fn too_many_classes_is_rejected() {
        assert!(Softmax::new(3, 4).is_err());
        assert!(Softmax::new(3, 0).is_err());
    }
}
