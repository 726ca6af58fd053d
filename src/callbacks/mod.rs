//! Observers of the training loop.
//!
//! A callback never touches the model directly. After every epoch it receives
//! a read-only `EpochContext` and returns a `Control` describing what it wants
//! changed; the model applies the controls in registration order.

pub mod checkpoint;
pub mod csv_logger;
pub mod early_stopping;
pub mod history;
pub mod reduce_lr;
pub mod scheduler;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{NnError, Result};
use crate::layers::Layer;

pub use checkpoint::ModelCheckpoint;
pub use csv_logger::CsvLogger;
pub use early_stopping::{EarlyStopper, Mode, PlateauWindow};
pub use history::History;
pub use reduce_lr::ReduceLearningRateOnPlateau;
pub use scheduler::LearningRateScheduler;

/// Per-series values recorded once per epoch, keyed by metric name
/// (`"loss"` holds the running mean loss).
pub type MetricHistory = BTreeMap<String, Vec<f64>>;

/// Read-only view of the model handed to callbacks after each epoch.
pub struct EpochContext<'a> {
    /// 1-based epoch number.
    pub epoch: usize,
    pub learning_rate: f64,
    pub epoch_metrics: &'a BTreeMap<String, f64>,
    pub history: &'a MetricHistory,
    pub layers: &'a [Layer],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LearningRateUpdate {
    Scale(f64),
    Set(f64),
}

impl LearningRateUpdate {
    pub fn apply(self, lr: f64) -> f64 {
        match self {
            LearningRateUpdate::Scale(factor) => lr * factor,
            LearningRateUpdate::Set(value) => value,
        }
    }
}

/// State change proposed by a callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Control {
    pub stop: bool,
    pub learning_rate: Option<LearningRateUpdate>,
}

impl Control {
    pub fn proceed() -> Control {
        Control::default()
    }

    pub fn stop() -> Control {
        Control { stop: true, learning_rate: None }
    }

    pub fn set_learning_rate(lr: f64) -> Control {
        Control { stop: false, learning_rate: Some(LearningRateUpdate::Set(lr)) }
    }

    pub fn scale_learning_rate(factor: f64) -> Control {
        Control { stop: false, learning_rate: Some(LearningRateUpdate::Scale(factor)) }
    }
}

/// Implementors must be `Send` so a model can be trained off the calling thread.
pub trait Callback: Send {
    fn name(&self) -> &str;

    fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> Result<Control>;
}

/// Reads a file written by a callback back as one string per line.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| NnError::io(path, e))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// `[v v v]` with six decimals, the textual form used for persisted weights.
pub(crate) fn format_values(values: &[f64]) -> String {
    let rendered: Vec<String> = values.iter().map(|v| format!("{v:.6}")).collect();
    format!("[{}]", rendered.join(" "))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn context<'a>(
        epoch: usize,
        learning_rate: f64,
        epoch_metrics: &'a BTreeMap<String, f64>,
        history: &'a MetricHistory,
    ) -> EpochContext<'a> {
        EpochContext { epoch, learning_rate, epoch_metrics, history, layers: &[] }
    }

    pub fn history_of(name: &str, values: &[f64]) -> MetricHistory {
        let mut h = MetricHistory::new();
        h.insert(name.to_string(), values.to_vec());
        h
    }
}
