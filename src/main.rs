// Small end-to-end run of the engine: fit a line with a two-layer network.
// Set RUST_LOG=debug for per-layer detail.
//
// More demos:
//   cargo run --example xor
//   cargo run --example regression
//   cargo run --example classifier
use std::env;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format;

use ferrite_nn_engine::{
    ActivationFunction, Dense, EarlyStopper, Input, LossType, Metric, Mode, Model, Sgd,
    StandardMetric,
};

fn main() -> ferrite_nn_engine::Result<()> {
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .event_format(format().with_target(false).without_time())
        .init();

    // y = 0.5x + 0.25 on [0, 1)
    let inputs: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 / 20.0]).collect();
    let targets: Vec<Vec<f64>> = inputs.iter().map(|x| vec![0.5 * x[0] + 0.25]).collect();

    let mut rng = StdRng::seed_from_u64(42);
    let mut model = Model::new("line");
    model
        .add_layer(Input::new(1)?)?
        .add_layer(Dense::new(8, 1, ActivationFunction::Tanh, &mut rng)?)?
        .add_layer(Dense::new(1, 8, ActivationFunction::Identity, &mut rng)?)?;

    let metrics: Vec<Box<dyn Metric>> = vec![Box::new(StandardMetric::Mse), Box::new(StandardMetric::Rmse)];
    model.compile(Sgd::new(0.02), LossType::Mse, metrics);
    // Stop once the running loss climbs over a five-epoch span.
    model.add_callback(EarlyStopper::new("loss", 5, 20, 0.0, Mode::Max)?);
    model.summary();

    let result = model.train(&inputs, &targets, 300)?;
    for (name, value) in &result {
        info!("{name}: {value:.6}");
    }

    let probe = model.predict(&[0.8])?;
    info!("f(0.8) = {:.4} (expected 0.6500)", probe[0]);
    Ok(())
}
