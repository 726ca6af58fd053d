//! In-memory training data and the source contract the training loop reads from.

pub mod csv;

use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::error::{NnError, Result};

/// An ordered collection of input vectors with aligned targets.
pub trait DataSource {
    fn len(&self) -> usize;

    /// `(input, target)` for example `index`, `index < len()`.
    fn sample(&self, index: usize) -> (&[f64], &[f64]);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index ranges of consecutive fixed-size batches; the last may be shorter.
    fn batches(&self, batch_size: usize) -> Vec<std::ops::Range<usize>> {
        let size = batch_size.max(1);
        (0..self.len())
            .step_by(size)
            .map(|start| start..(start + size).min(self.len()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    inputs: Vec<Vec<f64>>,
    targets: Vec<Vec<f64>>,
}

impl Dataset {
    /// Fails unless inputs and targets align and every row of each has the same width.
    pub fn new(inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) -> Result<Dataset> {
        if inputs.len() != targets.len() {
            return Err(NnError::shape("dataset targets", inputs.len(), targets.len()));
        }
        check_rows("dataset inputs", &inputs)?;
        check_rows("dataset targets", &targets)?;
        Ok(Dataset { inputs, targets })
    }

    pub fn inputs(&self) -> &[Vec<f64>] {
        &self.inputs
    }

    pub fn targets(&self) -> &[Vec<f64>] {
        &self.targets
    }

    /// Reads `{ "inputs": [[...]], "targets": [[...]] }`.
    pub fn from_json(path: impl AsRef<Path>) -> Result<Dataset> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|e| NnError::io(path, e))?;
        let raw: Dataset = serde_json::from_reader(std::io::BufReader::new(file))?;
        Dataset::new(raw.inputs, raw.targets)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = fs::File::create(path).map_err(|e| NnError::io(path, e))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    /// Reads a CSV file whose last `target_columns` columns are the target.
    pub fn from_csv(path: impl AsRef<Path>, target_columns: usize) -> Result<Dataset> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| NnError::io(path, e))?;
        let (inputs, targets) = csv::parse_csv(&text, target_columns)?;
        Dataset::new(inputs, targets)
    }
}

impl DataSource for Dataset {
    fn len(&self) -> usize {
        self.inputs.len()
    }

    fn sample(&self, index: usize) -> (&[f64], &[f64]) {
        (&self.inputs[index], &self.targets[index])
    }
}

fn check_rows(context: &str, rows: &[Vec<f64>]) -> Result<()> {
    if let Some(first) = rows.first() {
        if let Some(bad) = rows.iter().find(|r| r.len() != first.len()) {
            return Err(NnError::shape(context, first.len(), bad.len()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misaligned_targets_are_rejected() {
        let err = Dataset::new(vec![vec![1.0], vec![2.0]], vec![vec![1.0]]).unwrap_err();
        assert!(matches!(err, NnError::ShapeMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn batches_cover_every_example_once() {
        let data = Dataset::new(vec![vec![0.0]; 5], vec![vec![0.0]; 5]).unwrap();
        assert_eq!(data.batches(2), vec![0..2, 2..4, 4..5]);
    }
}
