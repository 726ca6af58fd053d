use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::callbacks::{format_values, Callback, Control, EpochContext};
use crate::error::{NnError, Result};
use crate::layers::Layer;

/// Overwrites `path` after every epoch with one `[w w ...]` line per layer
/// (empty brackets for layers without weights) and, unless `save_weights_only`,
/// a final line holding the monitored metric.
pub struct ModelCheckpoint {
    path: PathBuf,
    monitor: Option<String>,
    save_weights_only: bool,
}

impl ModelCheckpoint {
    pub fn new(path: impl Into<PathBuf>, monitor: Option<String>, save_weights_only: bool) -> ModelCheckpoint {
        ModelCheckpoint { path: path.into(), monitor, save_weights_only }
    }

    pub fn weights_only(path: impl Into<PathBuf>) -> ModelCheckpoint {
        ModelCheckpoint::new(path, None, true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the checkpoint file for `layers` and an optional score.
    pub fn save(&self, layers: &[Layer], score: Option<f64>) -> Result<()> {
        let io_err = |e| NnError::io(&self.path, e);
        let mut out = BufWriter::new(File::create(&self.path).map_err(io_err)?);
        for layer in layers {
            let values = layer.weights().map(|w| w.to_array()).unwrap_or_default();
            writeln!(out, "{}", format_values(&values)).map_err(io_err)?;
        }
        if !self.save_weights_only {
            if let Some(score) = score {
                writeln!(out, "{score:.6}").map_err(io_err)?;
            }
        }
        out.flush().map_err(io_err)
    }
}

impl Callback for ModelCheckpoint {
    fn name(&self) -> &str {
        "model_checkpoint"
    }

    fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> Result<Control> {
        let score = match &self.monitor {
            Some(name) => Some(*ctx.epoch_metrics.get(name).ok_or_else(|| {
                NnError::InvalidConfig(format!("checkpoint monitors unknown metric {name:?}"))
            })?),
            None => None,
        };
        self.save(ctx.layers, score)?;
        debug!(epoch = ctx.epoch, path = %self.path.display(), "checkpoint written");
        Ok(Control::proceed())
    }
}
