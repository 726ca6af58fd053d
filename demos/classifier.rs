/// Two-blob classification built from a JSON model description.
///
/// Architecture: 2 → 8 (ReLU) → Dropout(0.25) → 2 (Identity) → Softmax
/// Loss:         MSE against one-hot labels
/// Metrics:      MSE plus an argmax accuracy defined inline
///
/// Training runs on a worker thread and reports progress over a channel, the
/// way a UI would drive it.
///
/// Run with:
///   cargo run --example classifier
use std::sync::mpsc;
use std::thread;

use ferrite_nn_engine::{Dataset, FnMetric, Metric, ModelSpec, Sgd, StandardMetric, TrainConfig};

const SPEC: &str = r#"{
    "name": "blobs",
    "input_size": 2,
    "seed": 11,
    "layers": [
        { "type": "dense", "name": "hidden", "units": 8, "activation": "ReLU" },
        { "type": "dropout", "rate": 0.25 },
        { "type": "dense", "name": "logits", "units": 2, "activation": "Identity" },
        { "type": "softmax", "classes": 2 }
    ],
    "loss": "mse",
    "learning_rate": 0.1
}"#;

/// Two blobs centred at (0.3, 0.3) and (0.7, 0.7), one-hot labels.
fn blobs(n: usize) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let centers = [(0.3f64, 0.3f64), (0.7f64, 0.7f64)];
    let mut inputs = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let class = i % 2;
        let (cx, cy) = centers[class];
        let angle = i as f64 * 2.399;
        let r = 0.12 * (i as f64 * 0.31).sin().abs();
        inputs.push(vec![cx + r * angle.cos(), cy + r * angle.sin()]);
        let mut one_hot = vec![0.0, 0.0];
        one_hot[class] = 1.0;
        labels.push(one_hot);
    }
    (inputs, labels)
}

fn argmax(values: &[f64]) -> usize {
    values.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}

fn main() -> ferrite_nn_engine::Result<()> {
    let spec: ModelSpec = serde_json::from_str(SPEC)?;
    let mut model = spec.build()?;
    let metrics: Vec<Box<dyn Metric>> = vec![
        Box::new(StandardMetric::Mse),
        Box::new(FnMetric::new("accuracy", |p: &[f64], t: &[f64]| {
            if argmax(p) == argmax(t) { 1.0 } else { 0.0 }
        })),
    ];
    model.compile(Sgd::new(spec.learning_rate), spec.loss, metrics);
    model.summary();

    let (inputs, labels) = blobs(200);
    let data = Dataset::new(inputs, labels)?;

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let config = TrainConfig::new(60).with_shuffle(3).with_progress(tx);
        model.fit(&data, &config).map(|metrics| (model, metrics))
    });

    for stats in rx {
        if stats.epoch % 10 == 0 {
            println!(
                "epoch {:>3}/{}  loss {:.4}  accuracy {:.0}  ({} ms)",
                stats.epoch,
                stats.total_epochs,
                stats.mean_loss,
                stats.metrics.get("accuracy").copied().unwrap_or_default(),
                stats.elapsed_ms,
            );
        }
    }

    let (mut model, metrics) = match worker.join() {
        Ok(result) => result?,
        Err(_) => panic!("training thread panicked"),
    };
    println!("final metrics: {metrics:?}");
    for point in [[0.3, 0.3], [0.7, 0.7]] {
        println!("{point:?} -> {:.3?}", model.predict(&point)?);
    }
    Ok(())
}
