// Properties of the loss functions and the confusion-derived metrics.

use approx::assert_relative_eq;

use ferrite_nn_engine::loss::{cross_entropy, lasso_regression, mse, ridge_regression, rmse};
use ferrite_nn_engine::metrics::{f1_score, jaccard_index, precision, recall, specificity};
use ferrite_nn_engine::{LossType, Metric, NnError, StandardMetric};

const SAMPLES: [[f64; 4]; 3] = [
    [0.0, 1.0, 2.0, 3.0],
    [-1.5, 0.25, 8.0, 1e-3],
    [1e6, -1e6, 0.5, 0.5],
];

#[test]
fn mse_of_a_vector_with_itself_is_zero() {
    for p in &SAMPLES {
        assert_eq!(mse(p, p), 0.0);
        assert_eq!(rmse(p, p), 0.0);
    }
    assert_eq!(mse(&[], &[]), 0.0);
    assert_eq!(rmse(&[], &[]), 0.0);
}

#[test]
fn rmse_is_the_root_of_mse() {
    for p in &SAMPLES {
        for t in &SAMPLES {
            assert_relative_eq!(rmse(p, t), mse(p, t).sqrt(), max_relative = 1e-12);
        }
    }
}

#[test]
fn mse_is_a_mean() {
    assert_relative_eq!(mse(&[1.0, 3.0], &[0.0, 0.0]), 5.0);
}

#[test]
fn penalized_losses_add_to_the_squared_error() {
    let p = [1.0, 2.0];
    let t = [0.5, -1.0];
    let sse = 0.25 + 9.0;
    assert_relative_eq!(ridge_regression(&p, &t, 0.1), sse + 0.1 * (0.25 + 1.0), epsilon = 1e-12);
    assert_relative_eq!(lasso_regression(&p, &t, 0.1), sse + 0.1 * (0.5 + 1.0), epsilon = 1e-12);
}

#[test]
fn cross_entropy_rejects_truth_outside_the_open_interval() {
    assert!(cross_entropy(&[0.2, 0.8], &[0.3, 0.7]).unwrap().is_finite());
    assert!(matches!(cross_entropy(&[0.2, 0.8], &[0.0, 1.0]), Err(NnError::NumericDomain(_))));
}

#[test]
fn loss_type_checks_lengths() {
    assert!(matches!(
        LossType::Rmse.compute(&[1.0, 2.0], &[1.0]),
        Err(NnError::ShapeMismatch { .. })
    ));
}

#[test]
fn identical_vectors_score_perfectly() {
    let v = [1.0, 0.0, 1.0, 1.0, 0.0];
    assert_eq!(precision(&v, &v), 1.0);
    assert_eq!(recall(&v, &v), 1.0);
    assert_eq!(f1_score(&v, &v), 1.0);
    assert_eq!(specificity(&v, &v), 1.0);
    assert_eq!(jaccard_index(&v, &v), 1.0);
}

#[test]
fn disjoint_vectors_have_defined_scores() {
    let predicted = [1.0, 1.0, 0.0];
    let truth = [0.0, 0.0, 1.0];
    for score in [
        precision(&predicted, &truth),
        recall(&predicted, &truth),
        f1_score(&predicted, &truth),
    ] {
        assert_eq!(score, 0.0);
    }
}

#[test]
fn all_negative_vectors_do_not_divide_by_zero() {
    let zeros = [0.0; 4];
    assert_eq!(precision(&zeros, &zeros), 1.0);
    assert_eq!(recall(&zeros, &zeros), 1.0);
    assert!(!f1_score(&zeros, &zeros).is_nan());
}

#[test]
fn standard_metrics_are_named_in_snake_case() {
    assert_eq!(StandardMetric::F1Score.name(), "f1_score");
    assert_eq!(StandardMetric::JaccardIndex.name(), "jaccard_index");
    assert_relative_eq!(StandardMetric::Rmse.measure(&[3.0], &[0.0]), 3.0);
}
