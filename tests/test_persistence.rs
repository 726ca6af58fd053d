// Textual callback output, model/spec JSON and dataset loading.

use std::io::Write;

use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::NamedTempFile;

use ferrite_nn_engine::callbacks::{read_records, CsvLogger, History, ModelCheckpoint};
use ferrite_nn_engine::{
    ActivationFunction, Dataset, Dense, Dropout, Input, LayerSpec, LossType, Metric, Model, ModelSpec,
    NnError, Sgd, StandardMetric,
};

fn trained_model() -> Model {
    let mut rng = StdRng::seed_from_u64(17);
    let mut model = Model::new("persisted");
    model
        .add_layer(Input::new(2).unwrap())
        .unwrap()
        .add_layer(Dense::new(3, 2, ActivationFunction::Sigmoid, &mut rng).unwrap())
        .unwrap()
        .add_layer(Dense::new(1, 3, ActivationFunction::Identity, &mut rng).unwrap())
        .unwrap();
    let metrics: Vec<Box<dyn Metric>> = vec![Box::new(StandardMetric::Mse)];
    model.compile(Sgd::new(0.1), LossType::Mse, metrics);
    model
}

fn xor() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    (
        vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
    )
}

#[test]
fn checkpoint_writes_one_line_per_layer_plus_score() {
    let file = NamedTempFile::new().unwrap();
    let mut model = trained_model();
    model.add_callback(ModelCheckpoint::new(file.path(), Some("mse".into()), false));
    let (inputs, targets) = xor();
    let metrics = model.train(&inputs, &targets, 2).unwrap();

    let records = read_records(file.path()).unwrap();
    assert_eq!(records.len(), 4);
    assert!(records[..3].iter().all(|r| r.starts_with('[') && r.ends_with(']')));
    assert_eq!(records[1].split_whitespace().count(), 6);
    assert_eq!(records[3], format!("{:.6}", metrics["mse"]));
}

#[test]
fn weights_only_checkpoint_omits_the_score() {
    let file = NamedTempFile::new().unwrap();
    let model = trained_model();
    ModelCheckpoint::weights_only(file.path()).save(model.layers(), Some(0.5)).unwrap();
    assert_eq!(read_records(file.path()).unwrap().len(), 3);
}

#[test]
fn history_records_every_metric_every_epoch() {
    let file = NamedTempFile::new().unwrap();
    let mut model = trained_model();
    model.add_callback(History::new(file.path()).unwrap());
    let (inputs, targets) = xor();
    model.train(&inputs, &targets, 3).unwrap();

    let records = read_records(file.path()).unwrap();
    assert_eq!(records.len(), 6);
    assert!(records[0].starts_with("1,loss,"));
    assert!(records[1].starts_with("1,mse,"));
    assert!(records[5].starts_with("3,mse,"));
}

#[test]
fn csv_logger_writes_header_then_rows() {
    let file = NamedTempFile::new().unwrap();
    let mut model = trained_model();
    model.add_callback(CsvLogger::new(file.path()).unwrap());
    let (inputs, targets) = xor();
    model.train(&inputs, &targets, 2).unwrap();

    let records = read_records(file.path()).unwrap();
    assert_eq!(records[0], "epoch,learning_rate,loss,mse");
    assert_eq!(records.len(), 3);
    assert!(records[2].starts_with("2,0.100000,"));
}

#[test]
fn missing_record_file_reports_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    match read_records(&path) {
        Err(NnError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[test]
fn saved_model_predicts_identically_after_loading() {
    let file = NamedTempFile::new().unwrap();
    let mut model = trained_model();
    let (inputs, targets) = xor();
    model.train(&inputs, &targets, 20).unwrap();
    model.save_json(file.path()).unwrap();

    let mut loaded = Model::load_json(file.path()).unwrap();
    assert_eq!(loaded.name(), "persisted");
    assert!(!loaded.is_compiled());
    for input in &inputs {
        let expected = model.predict(input).unwrap();
        let actual = loaded.predict(input).unwrap();
        assert_relative_eq!(expected[0], actual[0], epsilon = 1e-12);
    }
}

/// Saves a small input → dropout model, lets `corrupt` edit the JSON, then
/// reloads it.
fn reload_after(corrupt: impl FnOnce(&mut serde_json::Value)) -> ferrite_nn_engine::Result<Model> {
    let mut model = Model::new("corruptible");
    model
        .add_layer(Input::new(2).unwrap())
        .unwrap()
        .add_layer(Dropout::new(2, 0.5).unwrap())
        .unwrap();
    let file = NamedTempFile::new().unwrap();
    model.save_json(file.path()).unwrap();

    let text = std::fs::read_to_string(file.path()).unwrap();
    let mut json: serde_json::Value = serde_json::from_str(&text).unwrap();
    corrupt(&mut json);
    std::fs::write(file.path(), json.to_string()).unwrap();
    Model::load_json(file.path())
}

#[test]
fn malformed_layers_are_rejected_on_load() {
    assert!(reload_after(|_| {}).is_ok());

    let out_of_range = reload_after(|json| json["layers"][1]["dropped"] = serde_json::json!([7]));
    assert!(matches!(out_of_range, Err(NnError::InvalidConfig(_))));

    let short_kernel = reload_after(|json| {
        json["layers"][0]["weights"]["kernels"] = serde_json::json!({ "rows": 1, "cols": 1, "data": [[1.0]] });
    });
    assert!(matches!(short_kernel, Err(NnError::ShapeMismatch { .. })));

    let short_biases = reload_after(|json| json["layers"][0]["biases"]["values"] = serde_json::json!([0.0]));
    assert!(matches!(short_biases, Err(NnError::ShapeMismatch { .. })));
}

#[test]
fn model_spec_survives_a_json_round_trip() {
    let spec = ModelSpec {
        name: "spec".into(),
        input_size: 3,
        seed: 5,
        layers: vec![
            LayerSpec::Input { name: None, trainable: false },
            LayerSpec::Dense {
                name: Some("hidden".into()),
                units: 4,
                activation: ActivationFunction::elu(),
                kernel_initializer: ferrite_nn_engine::Initializer::XavierNormal,
                bias_initializer: ferrite_nn_engine::Initializer::Constant(0.1),
                trainable: true,
            },
            LayerSpec::Softmax { name: None, classes: 2 },
        ],
        loss: LossType::Ridge { lambda: 0.01 },
        learning_rate: 0.02,
        metrics: vec![StandardMetric::Rmse],
    };
    let file = NamedTempFile::new().unwrap();
    spec.save_json(file.path()).unwrap();
    let loaded = ModelSpec::load_json(file.path()).unwrap();
    assert_eq!(loaded, spec);

    let model = loaded.build_compiled().unwrap();
    assert_eq!(model.summary().total, 16);
    assert_eq!(model.layer_by_name("hidden").unwrap().biases().unwrap(), &[0.1; 4]);
}

#[test]
fn dataset_loads_from_csv_with_header() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "x1,x2,label").unwrap();
    writeln!(file, "0.5,1.5,1").unwrap();
    writeln!(file, "\"2\",3,0").unwrap();
    file.flush().unwrap();

    let data = Dataset::from_csv(file.path(), 1).unwrap();
    assert_eq!(data.inputs(), &[vec![0.5, 1.5], vec![2.0, 3.0]]);
    assert_eq!(data.targets(), &[vec![1.0], vec![0.0]]);
}
