use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::callbacks::{Control, EpochContext};
use crate::data::DataSource;
use crate::error::{NnError, Result};
use crate::loss::LossType;
use crate::model::Model;
use crate::optim::GradientStep;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

/// Key under which the running mean loss is recorded.
pub const LOSS_KEY: &str = "loss";

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `model` for up to `config.epochs` epochs (numbered from 1) and
/// returns the last completed epoch's metric values, including `"loss"`.
///
/// Per example: forward pass, loss, one optimizer step. Per epoch: running
/// mean loss, every metric on the last prediction/target pair, callbacks.
///
/// # Early termination
/// The loop stops before the next epoch when:
/// - a callback asked to stop (the model's training flag is cleared),
/// - `config.stop_flag` is set, **or**
/// - the `progress_tx` receiver has been dropped.
pub fn train_loop<D: DataSource + ?Sized>(
    model: &mut Model,
    data: &D,
    config: &TrainConfig,
) -> Result<BTreeMap<String, f64>> {
    if model.layers.is_empty() {
        return Err(NnError::EmptyModel);
    }
    let loss = model.loss.ok_or(NnError::NotCompiled)?;
    if model.optimizer.is_none() {
        return Err(NnError::NotCompiled);
    }
    if data.is_empty() {
        return Err(NnError::InvalidConfig("training data must not be empty".into()));
    }

    let started = Instant::now();
    model.training = true;
    let outcome = run_epochs(model, data, config, loss);
    model.training_duration = started.elapsed();
    if outcome.is_err() {
        model.training = false;
    }
    info!("Training duration: {:?}", model.training_duration);
    outcome
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn run_epochs<D: DataSource + ?Sized>(
    model: &mut Model,
    data: &D,
    config: &TrainConfig,
    loss: LossType,
) -> Result<BTreeMap<String, f64>> {
    let mut shuffler = config.shuffle_seed.map(StdRng::seed_from_u64);
    let mut order: Vec<usize> = (0..data.len()).collect();
    let mut last_metrics = BTreeMap::new();

    for epoch in 1..=config.epochs {
        if !model.training || stop_requested(&config.stop_flag) {
            break;
        }

        let t_start = Instant::now();
        if let Some(rng) = shuffler.as_mut() {
            order.shuffle(rng);
        }

        // ── One full pass over the training data ───────────────────────────
        let mut last_pair: Option<(Vec<f64>, usize)> = None;
        for &idx in &order {
            let (input, target) = data.sample(idx);
            let prediction = model.predict(input)?;
            model.loss_history.push(loss.compute(&prediction, target)?);

            let optimizer = model.optimizer.as_mut().ok_or(NnError::NotCompiled)?;
            optimizer.apply_gradients(GradientStep {
                layers: &mut model.layers,
                prediction: &prediction,
                target,
                loss,
                learning_rate: model.learning_rate,
            })?;
            last_pair = Some((prediction, idx));
        }

        let mean_loss = mean(&model.loss_history);
        if !mean_loss.is_finite() {
            return Err(NnError::NonFinite(format!("mean loss at epoch {epoch}")));
        }

        // ── Metrics on the latest prediction/target pair ───────────────────
        let mut epoch_metrics = BTreeMap::new();
        if let Some((prediction, idx)) = &last_pair {
            let (_, target) = data.sample(*idx);
            for metric in &model.metrics {
                epoch_metrics.insert(metric.name().to_string(), metric.measure(prediction, target));
            }
        }
        // The reserved key always holds the running mean loss.
        epoch_metrics.insert(LOSS_KEY.to_string(), mean_loss);
        for (name, value) in &epoch_metrics {
            model.metric_history.entry(name.clone()).or_default().push(*value);
        }

        info!("Epoch: {epoch}\t\tLoss:{mean_loss:.4}");
        model.training_log.push(format!("epoch {epoch}: loss {mean_loss:.6}"));

        run_callbacks(model, epoch, &epoch_metrics);

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            mean_loss,
            metrics: epoch_metrics.clone(),
            learning_rate: model.learning_rate,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        last_metrics = epoch_metrics;

        if let Some(ref tx) = config.progress_tx {
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                debug!(epoch, "progress receiver dropped; stopping");
                break;
            }
        }
    }

    Ok(last_metrics)
}

/// Runs every callback against the same snapshot, then applies their
/// controls in registration order.
fn run_callbacks(model: &mut Model, epoch: usize, epoch_metrics: &BTreeMap<String, f64>) {
    let ctx = EpochContext {
        epoch,
        learning_rate: model.learning_rate,
        epoch_metrics,
        history: &model.metric_history,
        layers: &model.layers,
    };

    let mut controls: Vec<Control> = Vec::with_capacity(model.callbacks.len());
    for callback in model.callbacks.iter_mut() {
        match callback.on_epoch_end(&ctx) {
            Ok(control) => controls.push(control),
            Err(err) => {
                warn!(callback = callback.name(), error = %err, "callback failed");
                model.callback_errors.push(err);
            }
        }
    }

    for control in controls {
        if control.stop {
            model.training = false;
        }
        if let Some(update) = control.learning_rate {
            model.learning_rate = update.apply(model.learning_rate);
        }
    }
}

fn stop_requested(flag: &Option<Arc<AtomicBool>>) -> bool {
    flag.as_ref().is_some_and(|f| f.load(Ordering::Relaxed))
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
