use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{NnError, Result};
use crate::layers::{BatchNorm, Dense, Dropout, Flatten, Initializer, Input, Layer, Softmax};
use crate::layers::batch_norm::DEFAULT_EPSILON;
use crate::loss::loss_type::LossType;
use crate::math::matrix::Matrix;
use crate::metrics::{Metric, StandardMetric};
use crate::model::model::Model;
use crate::optim::Sgd;

/// Describes one layer in a model specification.
///
/// Widths are not repeated per layer: each layer's input length is the
/// previous layer's output length, starting from `ModelSpec::input_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Input {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        trainable: bool,
    },
    Dense {
        #[serde(default)]
        name: Option<String>,
        units: usize,
        activation: ActivationFunction,
        #[serde(default = "Initializer::he_uniform")]
        kernel_initializer: Initializer,
        #[serde(default = "zeros")]
        bias_initializer: Initializer,
        #[serde(default = "default_true")]
        trainable: bool,
    },
    BatchNorm {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        beta: f64,
        #[serde(default = "default_epsilon")]
        epsilon: f64,
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    Dropout {
        #[serde(default)]
        name: Option<String>,
        rate: f64,
    },
    Softmax {
        #[serde(default)]
        name: Option<String>,
        classes: usize,
    },
    /// `rows * cols` must equal the incoming width.
    Flatten {
        #[serde(default)]
        name: Option<String>,
        rows: usize,
        cols: usize,
    },
}

fn default_true() -> bool { true }
fn zeros() -> Initializer { Initializer::Zeros }
fn default_epsilon() -> f64 { DEFAULT_EPSILON }
fn default_alpha() -> f64 { 1.0 }
fn default_learning_rate() -> f64 { 0.01 }

impl LayerSpec {
    fn name(&self) -> Option<&str> {
        match self {
            LayerSpec::Input { name, .. }
            | LayerSpec::Dense { name, .. }
            | LayerSpec::BatchNorm { name, .. }
            | LayerSpec::Dropout { name, .. }
            | LayerSpec::Softmax { name, .. }
            | LayerSpec::Flatten { name, .. } => name.as_deref(),
        }
    }

    /// Instantiates the layer for an incoming width of `input_len`.
    pub fn build(&self, input_len: usize, rng: &mut StdRng) -> Result<Layer> {
        let mut layer: Layer = match self {
            LayerSpec::Input { trainable, .. } => {
                let mut l = Input::new(input_len)?;
                l.set_trainable(*trainable);
                l.into()
            }
            LayerSpec::Dense { units, activation, kernel_initializer, bias_initializer, trainable, .. } => {
                let mut l = Dense::with_initializers(
                    *units,
                    input_len,
                    activation.clone(),
                    kernel_initializer.clone(),
                    bias_initializer.clone(),
                    rng,
                )?;
                l.set_trainable(*trainable);
                l.into()
            }
            LayerSpec::BatchNorm { beta, epsilon, alpha, .. } => {
                BatchNorm::with_params(input_len, *beta, *epsilon, *alpha)?.into()
            }
            LayerSpec::Dropout { rate, .. } => Dropout::new(input_len, *rate)?.into(),
            LayerSpec::Softmax { classes, .. } => Softmax::new(input_len, *classes)?.into(),
            LayerSpec::Flatten { rows, cols, .. } => {
                if rows * cols != input_len {
                    return Err(NnError::shape("flatten shape", input_len, rows * cols));
                }
                Flatten::new(&Matrix::zeros(*rows, *cols)).into()
            }
        };
        if let Some(name) = self.name() {
            layer.set_name(name.to_string());
        }
        Ok(layer)
    }
}

/// A fully serializable description of a model: architecture, the seed its
/// parameters are drawn from, and the training configuration to pair it with.
///
/// Building the same spec twice gives identical initial parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    /// Width of the feature vectors fed to the first layer.
    pub input_size: usize,
    #[serde(default)]
    pub seed: u64,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    pub loss: LossType,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    #[serde(default)]
    pub metrics: Vec<StandardMetric>,
}

impl ModelSpec {
    /// An uncompiled model with freshly initialized parameters.
    pub fn build(&self) -> Result<Model> {
        if self.layers.is_empty() {
            return Err(NnError::EmptyModel);
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut model = Model::new(self.name.clone());
        let mut width = self.input_size;
        for spec in &self.layers {
            let layer = spec.build(width, &mut rng)?;
            width = layer.output_len();
            model.add_layer(layer)?;
        }
        Ok(model)
    }

    /// `build`, then compile with plain SGD, the spec's loss and its metrics.
    pub fn build_compiled(&self) -> Result<Model> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(NnError::InvalidConfig(format!(
                "learning rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        let mut model = self.build()?;
        let metrics: Vec<Box<dyn Metric>> = self.metrics.iter()
            .map(|m| Box::new(*m) as Box<dyn Metric>)
            .collect();
        model.compile(Sgd::new(self.learning_rate), self.loss, metrics);
        Ok(model)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|e| NnError::io(path, e))?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<ModelSpec> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| NnError::io(path, e))?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEC: &str = r#"{
        "name": "iris",
        "input_size": 4,
        "seed": 7,
        "layers": [
            { "type": "input" },
            { "type": "dense", "units": 8, "activation": "ReLU" },
            { "type": "batch_norm" },
            { "type": "dropout", "rate": 0.25 },
            { "type": "dense", "name": "logits", "units": 3, "activation": "Identity" },
            { "type": "softmax", "classes": 3 }
        ],
        "loss": "mse",
        "learning_rate": 0.05,
        "metrics": ["mse", "f1_score"]
    }"#;

    #[test]
    fn builds_layers_with_chained_widths() {
        let spec: ModelSpec = serde_json::from_str(SPEC).unwrap();
        let model = spec.build().unwrap();
        let widths: Vec<(usize, usize)> = model.layers().iter()
            .map(|l| (l.input_len(), l.output_len()))
            .collect();
        assert_eq!(widths, vec![(4, 4), (4, 8), (8, 8), (8, 8), (8, 3), (3, 3)]);
        assert_eq!(model.layer_by_index(4).unwrap().name(), "logits");
        assert!(!model.is_compiled());
    }

    #[test]
    fn same_seed_same_parameters() {
        let spec: ModelSpec = serde_json::from_str(SPEC).unwrap();
        let a = spec.build().unwrap();
        let b = spec.build().unwrap();
        assert_eq!(a.layers()[1].weights(), b.layers()[1].weights());
    }

    #[test]
    fn compiled_model_carries_learning_rate_and_metrics() {
        let spec: ModelSpec = serde_json::from_str(SPEC).unwrap();
        let model = spec.build_compiled().unwrap();
        assert_eq!(model.learning_rate(), 0.05);
        assert_eq!(model.metric_names(), vec!["mse", "f1_score"]);
    }

    #[test]
    fn flatten_shape_must_match_width() {
        let spec = ModelSpec {
            name: "bad".into(),
            input_size: 5,
            seed: 0,
            layers: vec![LayerSpec::Flatten { name: None, rows: 2, cols: 2 }],
            loss: LossType::Mse,
            learning_rate: 0.1,
            metrics: vec![],
        };
        assert!(matches!(spec.build(), Err(NnError::ShapeMismatch { .. })));
    }
}
