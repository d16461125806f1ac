//! # focalrust-core
//!
//! Focal loss for classifier training: a stateless CPU kernel over class
//! probability matrices ([`nn::losses::FocalLoss`]) and a layer adapter
//! ([`nn::layers::FocalLossLayer`]) that a host graph engine drives through
//! the [`nn::Layer`] trait and the [`nn::LayerRegistry`].

// Core modules
pub mod autograd;
pub mod config;
pub mod device;
pub mod ops;
pub mod tensor;
pub mod types;

pub mod nn;
pub mod utils;

pub mod error;

// Re-export the main types so they are reachable as `focalrust_core::FocalLoss`, etc.
pub use config::{FocalLossParameter, LayerParameter};
pub use device::StorageDevice;
pub use error::{ConfigError, FocalRustError};
pub use nn::{FocalLoss, FocalLossLayer, FocalLossOutput, Layer, LayerRegistry, Normalizer, PropagateDown};
pub use ops::traits::FocalNumeric;
pub use tensor::Tensor;
pub use types::DType;
// Re-export traits required by public functions/structs
pub use num_traits;
