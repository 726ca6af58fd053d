/// Noisy quadratic regression with learning-rate scheduling and file callbacks.
///
/// Architecture: 1 → Input → 16 (Tanh) → BatchNorm → 1 (Identity)
/// Loss:         RMSE
/// Callbacks:    ReduceLearningRateOnPlateau on "loss", History, CsvLogger,
///               ModelCheckpoint
///
/// Run with:
///   cargo run --example regression
///
/// Writes history.txt, training.csv and checkpoint.txt to the system temp dir.
use std::env;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ferrite_nn_engine::callbacks::{read_records, CsvLogger, History, ModelCheckpoint};
use ferrite_nn_engine::{
    ActivationFunction, Dataset, Dense, Input, LossType, Metric, Mode, Model,
    ReduceLearningRateOnPlateau, Sgd, StandardMetric, TrainConfig,
};

fn main() -> ferrite_nn_engine::Result<()> {
    let mut rng = StdRng::seed_from_u64(2024);

    let inputs: Vec<Vec<f64>> = (0..64).map(|_| vec![rng.gen_range(-1.0..1.0)]).collect();
    let targets: Vec<Vec<f64>> = inputs.iter()
        .map(|x| vec![x[0] * x[0] + rng.gen_range(-0.05..0.05)])
        .collect();
    let data = Dataset::new(inputs, targets)?;

    let mut model = Model::new("quadratic");
    model
        .add_layer(Input::new(1)?)?
        .add_layer(Dense::new(16, 1, ActivationFunction::Tanh, &mut rng)?)?
        .add_layer(Dense::new(1, 16, ActivationFunction::Identity, &mut rng)?)?;

    let metrics: Vec<Box<dyn Metric>> = vec![Box::new(StandardMetric::Mse)];
    model.compile(Sgd::new(0.05), LossType::Rmse, metrics);

    let dir = env::temp_dir();
    let history_path = dir.join("history.txt");
    model
        .add_callback(ReduceLearningRateOnPlateau::new("loss", 3, 10, 0.0, Mode::Max, 0.5, 1e-5)?)
        .add_callback(History::new(&history_path)?)
        .add_callback(CsvLogger::new(dir.join("training.csv"))?)
        .add_callback(ModelCheckpoint::new(dir.join("checkpoint.txt"), Some("mse".into()), false));

    let config = TrainConfig::new(150).with_shuffle(1);
    let result = model.fit(&data, &config)?;

    println!("final loss {:.5}, mse {:.5}, lr {:.5}", result["loss"], result["mse"], model.learning_rate());
    for err in model.take_callback_errors() {
        eprintln!("callback error: {err}");
    }

    for x in [-0.5, 0.0, 0.5] {
        println!("f({x:+.1}) = {:.4} (expected {:.4})", model.predict(&[x])?[0], x * x);
    }

    let records = read_records(&history_path)?;
    println!("{} history records, last: {:?}", records.len(), records.last());
    Ok(())
}
