// End-to-end training runs: convergence, callbacks steering the loop, and
// cooperative cancellation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ferrite_nn_engine::callbacks::{LearningRateScheduler, ModelCheckpoint};
use ferrite_nn_engine::loss::mse;
use ferrite_nn_engine::train::LOSS_KEY;
use ferrite_nn_engine::{
    ActivationFunction, Dataset, Dense, EarlyStopper, FnMetric, LossType, Metric, Mode, Model,
    NnError, ReduceLearningRateOnPlateau, Sgd, StandardMetric, TrainConfig,
};

fn linear_model(lr: f64, metrics: Vec<Box<dyn Metric>>) -> Model {
    let mut rng = StdRng::seed_from_u64(3);
    let mut model = Model::new("linear");
    model
        .add_layer(Dense::new(1, 1, ActivationFunction::Identity, &mut rng).unwrap())
        .unwrap();
    model.compile(Sgd::new(lr), LossType::Mse, metrics);
    model
}

fn identity_data() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    (vec![vec![1.0], vec![2.0]], vec![vec![1.0], vec![2.0]])
}

/// A metric whose value drops by one every time it is measured.
fn countdown() -> Box<dyn Metric> {
    let calls = Arc::new(AtomicUsize::new(0));
    Box::new(FnMetric::new("countdown", move |_: &[f64], _: &[f64]| {
        100.0 - calls.fetch_add(1, Ordering::Relaxed) as f64
    }))
}

#[test]
fn single_dense_unit_learns_the_identity() {
    let mut model = linear_model(0.05, vec![Box::new(StandardMetric::Mse)]);
    let (inputs, targets) = identity_data();
    let metrics = model.train(&inputs, &targets, 1000).unwrap();

    let held_out = model.predict(&[3.0]).unwrap();
    assert!(mse(&held_out, &[3.0]) < 1e-3, "prediction {held_out:?}");
    assert!(metrics.contains_key("mse"));
    assert!(metrics.contains_key(LOSS_KEY));
    assert_eq!(model.loss_history().len(), 2000);
    assert!(model.is_training());
}

#[test]
fn history_accumulates_across_train_calls_until_reset() {
    let mut model = linear_model(0.05, vec![]);
    let (inputs, targets) = identity_data();
    model.train(&inputs, &targets, 3).unwrap();
    model.train(&inputs, &targets, 2).unwrap();
    assert_eq!(model.loss_history().len(), 10);
    assert_eq!(model.metric_history()[LOSS_KEY].len(), 5);
    assert_eq!(model.training_log().len(), 5);

    model.reset_history();
    assert!(model.loss_history().is_empty());
    assert!(model.metric_history().is_empty());
}

#[test]
fn epoch_loss_is_the_running_mean() {
    let mut model = linear_model(0.05, vec![]);
    let (inputs, targets) = identity_data();
    let metrics = model.train(&inputs, &targets, 4).unwrap();
    let history = model.loss_history();
    let mean = history.iter().sum::<f64>() / history.len() as f64;
    assert_relative_eq!(metrics[LOSS_KEY], mean, max_relative = 1e-12);
}

#[test]
fn early_stopper_ends_training_within_the_window() {
    let mut model = linear_model(0.01, vec![countdown()]);
    model.add_callback(EarlyStopper::new("countdown", 2, 4, -0.5, Mode::Min).unwrap());

    let (inputs, targets) = identity_data();
    let metrics = model.train(&inputs, &targets, 50).unwrap();

    assert!(!model.is_training());
    assert_eq!(model.metric_history()["countdown"].len(), 4);
    assert_eq!(metrics["countdown"], 97.0);

    // A later run starts training again.
    model.train(&inputs, &targets, 1).unwrap();
    assert_eq!(model.metric_history()["countdown"].len(), 5);
}

#[test]
fn reduce_lr_recovers_from_a_floor_breach() {
    let mut model = linear_model(0.01, vec![countdown()]);
    let minimum_lr = 1e-3;
    model.add_callback(
        ReduceLearningRateOnPlateau::new("countdown", 1, 2, 0.0, Mode::Min, 0.1, minimum_lr).unwrap(),
    );

    let (tx, rx) = mpsc::channel();
    let data = Dataset::new(identity_data().0, identity_data().1).unwrap();
    model.fit(&data, &TrainConfig::new(6).with_progress(tx)).unwrap();

    let rates: Vec<f64> = rx.iter().map(|s| s.learning_rate).collect();
    assert_eq!(rates.len(), 6);
    assert_relative_eq!(rates[0], 0.01);
    assert_relative_eq!(rates[1], 1e-3, max_relative = 1e-9);
    // 1e-4 would breach the floor, so the rate jumps to 100x the floor.
    assert_relative_eq!(rates[2], minimum_lr * 100.0, max_relative = 1e-9);
    // Once recovered, later reductions never go below the recovered rate.
    for lr in &rates[2..] {
        assert_relative_eq!(*lr, minimum_lr * 100.0, max_relative = 1e-9);
    }
}

#[test]
fn scheduler_updates_are_applied_in_registration_order() {
    let mut model = linear_model(0.1, vec![]);
    model
        .add_callback(LearningRateScheduler::new(|lr| lr / 2.0))
        .add_callback(LearningRateScheduler::new(|lr| lr + 1.0));
    let (inputs, targets) = identity_data();
    model.train(&inputs, &targets, 1).unwrap();
    // Both callbacks saw 0.1 and proposed absolute rates; the later one wins.
    assert_relative_eq!(model.learning_rate(), 1.1);
}

#[test]
fn failing_callback_does_not_abort_training() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = linear_model(0.05, vec![]);
    model.add_callback(ModelCheckpoint::new(dir.path().join("ckpt.txt"), Some("missing".into()), false));

    let (inputs, targets) = identity_data();
    model.train(&inputs, &targets, 3).unwrap();

    let errors = model.take_callback_errors();
    assert_eq!(errors.len(), 3);
    assert!(matches!(errors[0], NnError::InvalidConfig(_)));
    assert!(model.take_callback_errors().is_empty());
}

#[test]
fn failed_run_clears_the_training_flag_and_records_duration() {
    let mut model = linear_model(0.05, vec![]);
    // Two-wide targets against a one-unit model fail inside the first epoch.
    let err = model.train(&[vec![1.0]], &[vec![1.0, 2.0]], 5).unwrap_err();
    assert!(matches!(err, NnError::ShapeMismatch { .. }));
    assert!(!model.is_training());
    assert!(model.training_duration() > Duration::ZERO);
}

#[test]
fn user_metric_cannot_shadow_the_running_loss() {
    let impostor: Box<dyn Metric> = Box::new(FnMetric::new(LOSS_KEY, |_: &[f64], _: &[f64]| 42.0));
    let mut model = linear_model(0.05, vec![impostor]);
    let (inputs, targets) = identity_data();
    let metrics = model.train(&inputs, &targets, 2).unwrap();

    let history = model.loss_history();
    let mean = history.iter().sum::<f64>() / history.len() as f64;
    assert_relative_eq!(metrics[LOSS_KEY], mean, max_relative = 1e-12);
    assert!(model.metric_history()[LOSS_KEY].iter().all(|v| *v != 42.0));
}

#[test]
fn preset_stop_flag_runs_no_epochs() {
    let mut model = linear_model(0.05, vec![]);
    let data = Dataset::new(identity_data().0, identity_data().1).unwrap();
    let flag = Arc::new(AtomicBool::new(true));
    let metrics = model.fit(&data, &TrainConfig::new(10).with_stop_flag(flag)).unwrap();
    assert!(metrics.is_empty());
    assert!(model.loss_history().is_empty());
}

#[test]
fn dropped_progress_receiver_stops_after_one_epoch() {
    let mut model = linear_model(0.05, vec![]);
    let data = Dataset::new(identity_data().0, identity_data().1).unwrap();
    let (tx, rx) = mpsc::channel();
    drop(rx);
    model.fit(&data, &TrainConfig::new(10).with_progress(tx)).unwrap();
    assert_eq!(model.metric_history()[LOSS_KEY].len(), 1);
}

#[test]
fn shuffled_training_is_reproducible() {
    let data = Dataset::new(
        vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]],
        vec![vec![2.0], vec![4.0], vec![6.0], vec![8.0]],
    )
    .unwrap();
    let run = || {
        let mut model = linear_model(0.01, vec![]);
        model.fit(&data, &TrainConfig::new(5).with_shuffle(9)).unwrap();
        model.predict(&[5.0]).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn untrained_model_reports_configuration_errors() {
    let mut empty = Model::new("empty");
    assert!(matches!(empty.predict(&[1.0]), Err(NnError::EmptyModel)));

    let mut rng = StdRng::seed_from_u64(0);
    let mut uncompiled = Model::new("uncompiled");
    uncompiled
        .add_layer(Dense::new(1, 1, ActivationFunction::Identity, &mut rng).unwrap())
        .unwrap();
    let (inputs, targets) = identity_data();
    assert!(matches!(uncompiled.train(&inputs, &targets, 1), Err(NnError::NotCompiled)));
}
