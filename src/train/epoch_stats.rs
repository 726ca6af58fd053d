use std::collections::BTreeMap;

use serde::{Serialize, Deserialize};

/// Per-epoch training statistics emitted by the training loop.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the loop sends
/// one `EpochStats` value at the end of every completed epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Running mean of the model's accumulated loss history.
    pub mean_loss: f64,
    /// Metric values of this epoch, keyed by metric name.
    pub metrics: BTreeMap<String, f64>,
    /// Learning rate after callbacks ran.
    pub learning_rate: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
