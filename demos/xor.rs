/// XOR with a 2 → 4 → 1 sigmoid network.
///
/// Run with:
///   cargo run --example xor
use rand::rngs::StdRng;
use rand::SeedableRng;

use ferrite_nn_engine::{ActivationFunction, Dense, LossType, Model, Sgd};

fn main() -> ferrite_nn_engine::Result<()> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut model = Model::new("xor");
    model
        .add_layer(Dense::new(4, 2, ActivationFunction::Sigmoid, &mut rng)?.with_name("hidden"))?
        .add_layer(Dense::new(1, 4, ActivationFunction::Sigmoid, &mut rng)?.with_name("out"))?;
    model.compile(Sgd::new(0.5), LossType::Mse, vec![]);

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    // The loss history accumulates across calls, so the logged loss is a
    // running mean over everything seen so far.
    for round in 0..10 {
        let metrics = model.train(&inputs, &expected_outputs, 500)?;
        println!("Round {round}: loss = {:.6}", metrics["loss"]);
    }

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, model.predict(input)?[0]);
    }
    Ok(())
}
