// src/nn/mod.rs
// Loss kernels, the host layer trait, and the layer registry

pub mod layer; // Trait Layer
pub mod layers;
pub mod losses;
pub mod registry;

// Re-export common items
pub use layer::Layer;
pub use layers::FocalLossLayer;
pub use losses::{FocalLoss, FocalLossOutput, Normalizer, PropagateDown};
pub use registry::LayerRegistry;
