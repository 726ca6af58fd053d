use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while configuring, training or persisting a model.
#[derive(Error, Debug)]
pub enum NnError {
    #[error("shape mismatch in {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        got: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("layer index {index} out of range for a model with {len} layers")]
    LayerIndexOutOfRange { index: usize, len: usize },

    #[error("model must be compiled before training")]
    NotCompiled,

    #[error("model has no layers")]
    EmptyModel,

    #[error("numeric domain error: {0}")]
    NumericDomain(String),

    #[error("non-finite value produced by {0}")]
    NonFinite(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(String),
}

pub type Result<T> = std::result::Result<T, NnError>;

impl NnError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> NnError {
        NnError::Io { path: path.into(), source }
    }

    pub(crate) fn shape(context: impl Into<String>, expected: usize, got: usize) -> NnError {
        NnError::ShapeMismatch { context: context.into(), expected, got }
    }
}
