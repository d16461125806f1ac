// src/nn/layers/mod.rs
// Layers wiring the loss kernels into a host graph

pub mod focal_loss;

// Re-export key layer structs
pub use focal_loss::FocalLossLayer;
