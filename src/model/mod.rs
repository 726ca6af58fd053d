pub mod model;
pub mod spec;

pub use model::{Model, Summary, SummaryRow};
pub use spec::{LayerSpec, ModelSpec};
