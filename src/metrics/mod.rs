//! Metrics score predictions for monitoring; they take no part in gradients.

pub mod confusion;

use serde::{Serialize, Deserialize};

use crate::loss::{mse, rmse, soft_dice_loss};

pub use confusion::{
    f1_score, false_negatives, false_positives, jaccard_index, precision, recall, sensitivity,
    specificity, true_negatives, true_positives,
};

/// A named scalar score of a prediction against the truth.
pub trait Metric: Send {
    fn name(&self) -> &str;
    fn measure(&self, predicted: &[f64], truth: &[f64]) -> f64;
}

/// The metrics shipped with the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardMetric {
    Mse,
    Rmse,
    Precision,
    Recall,
    F1Score,
    Sensitivity,
    Specificity,
    JaccardIndex,
    SoftDice,
}

impl Metric for StandardMetric {
    fn name(&self) -> &str {
        match self {
            StandardMetric::Mse => "mse",
            StandardMetric::Rmse => "rmse",
            StandardMetric::Precision => "precision",
            StandardMetric::Recall => "recall",
            StandardMetric::F1Score => "f1_score",
            StandardMetric::Sensitivity => "sensitivity",
            StandardMetric::Specificity => "specificity",
            StandardMetric::JaccardIndex => "jaccard_index",
            StandardMetric::SoftDice => "soft_dice",
        }
    }

    fn measure(&self, predicted: &[f64], truth: &[f64]) -> f64 {
        match self {
            StandardMetric::Mse => mse(predicted, truth),
            StandardMetric::Rmse => rmse(predicted, truth),
            StandardMetric::Precision => precision(predicted, truth),
            StandardMetric::Recall => recall(predicted, truth),
            StandardMetric::F1Score => f1_score(predicted, truth),
            StandardMetric::Sensitivity => sensitivity(predicted, truth),
            StandardMetric::Specificity => specificity(predicted, truth),
            StandardMetric::JaccardIndex => jaccard_index(predicted, truth),
            StandardMetric::SoftDice => soft_dice_loss(predicted, truth),
        }
    }
}

/// Wraps a plain function as a metric.
pub struct FnMetric<F> {
    name: String,
    f: F,
}

impl<F> FnMetric<F>
where
    F: Fn(&[f64], &[f64]) -> f64 + Send,
{
    pub fn new(name: impl Into<String>, f: F) -> FnMetric<F> {
        FnMetric { name: name.into(), f }
    }
}

impl<F> Metric for FnMetric<F>
where
    F: Fn(&[f64], &[f64]) -> f64 + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn measure(&self, predicted: &[f64], truth: &[f64]) -> f64 {
        (self.f)(predicted, truth)
    }
}
