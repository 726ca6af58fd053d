use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};
use crate::layers::{check_input, Backward};
use crate::math::matrix::Matrix;

/// Exposes the row-major linearization of a matrix as a vector. Values fed to
/// it later are passed through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flatten {
    name: String,
    shape: (usize, usize),
    input: Vec<f64>,
    output: Vec<f64>,
}

impl Flatten {
    pub fn new(source: &Matrix) -> Flatten {
        let values = source.to_array();
        Flatten {
            name: "flatten".to_string(),
            shape: (source.rows, source.cols),
            input: values.clone(),
            output: values,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Flatten {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// `(rows, cols)` of the wrapped structure.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.shape.0 * self.shape.1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
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
        self.output.clone_from(&self.input);
        Ok(&self.output)
    }

    pub fn output(&self) -> &[f64] {
        &self.output
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(NnError::InvalidConfig(format!("flatten {:?} wraps an empty shape", self.name)));
        }
        check_input(&format!("{} stored input", self.name), self.len(), &self.input)
    }

    pub fn backward(&self, delta: &[f64]) -> Result<Backward> {
        check_input(&format!("{} delta", self.name), self.len(), delta)?;
        Ok(Backward { gradients: None, upstream: delta.to_vec() })
    }
}
