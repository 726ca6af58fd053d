use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};
use crate::train::epoch_stats::EpochStats;

/// Configuration for a `Model::fit` run.
///
/// # Fields
/// - `epochs`      : total number of full passes over the training data
/// - `shuffle_seed`: when set, example order is reshuffled every epoch with a
///                    generator seeded from this value; otherwise examples are
///                    visited in source order
/// - `progress_tx` : optional channel sender; one `EpochStats` is sent per
///                    completed epoch.  If the receiver is dropped the loop
///                    terminates early (clean shutdown).
/// - `stop_flag`   : optional atomic flag; when set to `true` from another
///                    thread the loop terminates after the current epoch.
pub struct TrainConfig {
    pub epochs: usize,
    pub shuffle_seed: Option<u64>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig`: no shuffling, no progress channel and no stop flag.
    pub fn new(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            shuffle_seed: None,
            progress_tx: None,
            stop_flag: None,
        }
    }

    pub fn with_shuffle(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }
}
