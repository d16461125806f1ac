//! # Numeric Operations Module (`ops`)
//!
//! Holds the element-type bounds shared by the loss kernels. The kernels
//! themselves live under [`crate::nn::losses`].

pub mod traits;
