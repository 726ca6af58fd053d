pub mod math;
pub mod activation;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod optim;
pub mod callbacks;
pub mod data;
pub mod model;
pub mod train;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::{BatchNorm, Dense, Dropout, Flatten, Initializer, Input, Layer, Softmax};
pub use loss::loss_type::LossType;
pub use metrics::{FnMetric, Metric, StandardMetric};
pub use optim::{Optimizer, Sgd};
pub use callbacks::{Callback, Control, EarlyStopper, Mode, ReduceLearningRateOnPlateau};
pub use data::{DataSource, Dataset};
pub use model::{LayerSpec, Model, ModelSpec};
pub use train::{EpochStats, TrainConfig};
pub use error::{NnError, Result};
