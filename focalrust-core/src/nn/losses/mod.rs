// src/nn/losses/mod.rs

//! # Loss Functions
//!
//! Loss kernels operating on flat row-major slices. They are independent of
//! any graph engine; [`crate::nn::layers`] adapts them to host layers.

pub mod focal;

pub use focal::{FocalLoss, FocalLossOutput, Normalizer, PropagateDown};
