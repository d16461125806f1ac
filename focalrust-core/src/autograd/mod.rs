//! Gradient verification for the loss kernels.
//!
//! The kernels compute their gradients analytically; [`grad_check::check_grad`]
//! compares them against central finite differences of the forward pass.

pub mod grad_check;

pub use grad_check::{check_grad, GradCheckError};
