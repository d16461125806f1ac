use thiserror::Error;

/// Malformed focal loss configuration, surfaced once at configuration time.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Alpha count mismatch: expected {expected} class weights (or none), got {actual}")]
    AlphaCountMismatch { expected: usize, actual: usize },

    #[error("Gamma must be non-negative, got {0}")]
    NegativeGamma(f64),

    #[error("Gamma must be finite, got {0}")]
    NonFiniteGamma(f64),

    #[error("Invalid alpha for class {class}: {value} (must be finite and non-negative)")]
    InvalidAlpha { class: usize, value: f64 },

    #[error("Class count must be at least 1")]
    ZeroClassCount,
}

/// Custom error type for the FocalRust crate.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum FocalRustError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Invalid label at index {index}: {value} is not a class id in [0, {class_count})")]
    InvalidLabel {
        index: usize,
        value: f64,
        class_count: usize,
    },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("{layer_type} Layer takes {min}..={max} {kind} blobs, got {actual}")]
    BlobCountMismatch {
        layer_type: String,
        kind: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Layer {0} used before setup()")]
    LayerNotSetUp(String),

    #[error("Backward called before any forward pass: no normalizer is cached")]
    BackwardBeforeForward,

    #[error("Cached normalizer belongs to a batch of {cached} examples, backward received {actual}")]
    StaleNormalizer { cached: usize, actual: usize },

    #[error("Unknown layer type: {0}")]
    UnknownLayerType(String),

    #[error("Layer type already registered: {0}")]
    DuplicateLayerType(String),

    #[error("Layer type mismatch: factory for {expected} received a {actual} parameter")]
    LayerTypeMismatch { expected: String, actual: String },
}
