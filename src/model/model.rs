use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};

use crate::callbacks::{Callback, MetricHistory};
use crate::data::{DataSource, Dataset};
use crate::error::{NnError, Result};
use crate::layers::Layer;
use crate::loss::loss_type::LossType;
use crate::metrics::Metric;
use crate::optim::Optimizer;
use crate::train::loop_fn::{train_loop, LOSS_KEY};
use crate::train::train_config::TrainConfig;

/// An ordered stack of layers plus its training configuration.
///
/// Insertion order is forward-pass order. A model is built uncompiled,
/// compiled once with an optimizer, a loss and metrics, then trained any
/// number of times; each `train` call resumes from the current parameters and
/// keeps appending to the loss history until `reset_history` is called.
pub struct Model {
    pub(crate) name: String,
    pub(crate) layers: Vec<Layer>,
    pub(crate) optimizer: Option<Box<dyn Optimizer>>,
    pub(crate) loss: Option<LossType>,
    pub(crate) metrics: Vec<Box<dyn Metric>>,
    pub(crate) callbacks: Vec<Box<dyn Callback>>,
    pub(crate) learning_rate: f64,
    pub(crate) training: bool,
    pub(crate) loss_history: Vec<f64>,
    pub(crate) metric_history: MetricHistory,
    pub(crate) training_log: Vec<String>,
    pub(crate) training_duration: Duration,
    pub(crate) callback_errors: Vec<NnError>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Model {
        Model {
            name: name.into(),
            layers: Vec::new(),
            optimizer: None,
            loss: None,
            metrics: Vec::new(),
            callbacks: Vec::new(),
            learning_rate: 0.0,
            training: false,
            loss_history: Vec::new(),
            metric_history: MetricHistory::new(),
            training_log: Vec::new(),
            training_duration: Duration::ZERO,
            callback_errors: Vec::new(),
        }
    }

    /// Builds a model from an initial layer sequence, checking each boundary.
    pub fn sequential(layers: Vec<Layer>, name: impl Into<String>) -> Result<Model> {
        let mut model = Model::new(name);
        for layer in layers {
            model.add_layer(layer)?;
        }
        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a layer. Its input length must equal the previous layer's output
    /// length. A name already in use gets a numeric suffix.
    pub fn add_layer(&mut self, layer: impl Into<Layer>) -> Result<&mut Model> {
        let mut layer = layer.into();
        layer.validate()?;
        if let Some(last) = self.layers.last() {
            if last.output_len() != layer.input_len() {
                return Err(NnError::shape(
                    format!("input of layer {:?}", layer.name()),
                    last.output_len(),
                    layer.input_len(),
                ));
            }
        }
        let unique = self.unique_name(layer.name());
        if unique != layer.name() {
            layer.set_name(unique);
        }
        debug!(kind = layer.kind(), name = layer.name(), "layer added");
        self.layers.push(layer);
        Ok(self)
    }

    fn unique_name(&self, base: &str) -> String {
        let taken = |n: &str| self.layers.iter().any(|l| l.name() == n);
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|k| format!("{base}_{k}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer_by_index(&self, index: usize) -> Result<&Layer> {
        let len = self.layers.len();
        self.layers.get(index).ok_or(NnError::LayerIndexOutOfRange { index, len })
    }

    pub fn layer_by_index_mut(&mut self, index: usize) -> Result<&mut Layer> {
        let len = self.layers.len();
        self.layers.get_mut(index).ok_or(NnError::LayerIndexOutOfRange { index, len })
    }

    /// Looks a layer up by name. An unknown name falls back to the first layer;
    /// `None` only when the model has no layers.
    pub fn layer_by_name(&self, name: &str) -> Option<&Layer> {
        let index = self.index_by_name(name)?;
        self.layers.get(index)
    }

    pub fn layer_by_name_mut(&mut self, name: &str) -> Option<&mut Layer> {
        let index = self.index_by_name(name)?;
        self.layers.get_mut(index)
    }

    fn index_by_name(&self, name: &str) -> Option<usize> {
        if self.layers.is_empty() {
            return None;
        }
        match self.layers.iter().position(|l| l.name() == name) {
            Some(i) => Some(i),
            None => {
                warn!(name, "no layer with this name; falling back to the first layer");
                Some(0)
            }
        }
    }

    /// Binds the training configuration. Calling it again rebinds everything
    /// and resets the learning rate to the new optimizer's.
    pub fn compile(
        &mut self,
        optimizer: impl Optimizer + 'static,
        loss: LossType,
        metrics: Vec<Box<dyn Metric>>,
    ) -> &mut Model {
        self.learning_rate = optimizer.learning_rate();
        self.optimizer = Some(Box::new(optimizer));
        self.loss = Some(loss);
        self.metrics = metrics;
        if self.metrics.iter().any(|m| m.name() == LOSS_KEY) {
            warn!("a metric named {LOSS_KEY:?} is shadowed by the running mean loss");
        }
        debug!(loss = loss.name(), metrics = self.metrics.len(), lr = self.learning_rate, "model compiled");
        self
    }

    pub fn is_compiled(&self) -> bool {
        self.optimizer.is_some() && self.loss.is_some()
    }

    pub fn loss(&self) -> Option<LossType> {
        self.loss
    }

    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    pub fn add_callback(&mut self, callback: impl Callback + 'static) -> &mut Model {
        self.callbacks.push(Box::new(callback));
        self
    }

    /// Forward pass: every layer computes exactly once, in order, and its own
    /// stored output becomes the next layer's input.
    pub fn predict(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        if self.layers.is_empty() {
            return Err(NnError::EmptyModel);
        }
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            layer.set_input(current)?;
            current = layer.compute()?.to_vec();
        }
        Ok(current)
    }

    /// Trains on aligned `inputs`/`targets` for exactly `epochs` epochs
    /// (fewer if a callback stops training). Returns the last epoch's metric
    /// values keyed by name, plus `"loss"`.
    pub fn train(
        &mut self,
        inputs: &[Vec<f64>],
        targets: &[Vec<f64>],
        epochs: usize,
    ) -> Result<BTreeMap<String, f64>> {
        let data = Dataset::new(inputs.to_vec(), targets.to_vec())?;
        self.fit(&data, &TrainConfig::new(epochs))
    }

    pub fn fit<D: DataSource + ?Sized>(
        &mut self,
        data: &D,
        config: &TrainConfig,
    ) -> Result<BTreeMap<String, f64>> {
        train_loop(self, data, config)
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, lr: f64) {
        self.learning_rate = lr;
    }

    /// `false` once a callback has stopped the current or last run.
    pub fn is_training(&self) -> bool {
        self.training
    }

    pub fn stop_training(&mut self) {
        self.training = false;
    }

    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    pub fn metric_history(&self) -> &MetricHistory {
        &self.metric_history
    }

    pub fn training_log(&self) -> &[String] {
        &self.training_log
    }

    pub fn training_duration(&self) -> Duration {
        self.training_duration
    }

    pub fn reset_history(&mut self) {
        self.loss_history.clear();
        self.metric_history.clear();
        self.training_log.clear();
    }

    /// Errors raised by callbacks during training; draining them clears the list.
    pub fn take_callback_errors(&mut self) -> Vec<NnError> {
        std::mem::take(&mut self.callback_errors)
    }

    /// Per-layer trainable parameter counts and their total. Each line is also logged.
    pub fn summary(&self) -> Summary {
        let rows: Vec<SummaryRow> = self.layers.iter()
            .map(|l| SummaryRow {
                name: l.name().to_string(),
                kind: l.kind(),
                trainable_parameters: l.trainable_parameter_count(),
            })
            .collect();
        let total = rows.iter().map(|r| r.trainable_parameters).sum();
        let summary = Summary { rows, total };
        for line in summary.to_string().lines() {
            info!("{line}");
        }
        summary
    }

    /// Serializes the model name and layers to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = fs::File::create(path).map_err(|e| NnError::io(path, e))?;
        let saved = SavedModelRef { name: &self.name, layers: &self.layers };
        serde_json::to_writer_pretty(BufWriter::new(file), &saved)?;
        Ok(())
    }

    /// Loads a model written by `save_json`. The result is uncompiled.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Model> {
        let path = path.as_ref();
        let file = fs::File::open(path).map_err(|e| NnError::io(path, e))?;
        let saved: SavedModel = serde_json::from_reader(BufReader::new(file))?;
        Model::sequential(saved.layers, saved.name)
    }
}

#[derive(Serialize)]
struct SavedModelRef<'a> {
    name: &'a str,
    layers: &'a [Layer],
}

#[derive(Deserialize)]
struct SavedModel {
    name: String,
    layers: Vec<Layer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub name: String,
    pub kind: &'static str,
    pub trainable_parameters: usize,
}

/// Output of `Model::summary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub rows: Vec<SummaryRow>,
    pub total: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(f, "name: {} ({})\t\ttrainable parameters: {}", row.name, row.kind, row.trainable_parameters)?;
        }
        write!(f, "Trainable parameters: {}", self.total)
    }
}
