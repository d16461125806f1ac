// src/tensor/create.rs

use crate::error::FocalRustError;
use crate::ops::traits::FocalNumeric;
use crate::tensor::Tensor;
use rand::Rng;
use rand_distr::{Dirichlet, Distribution};

/// Creates a new CPU tensor filled with zeros with the specified shape.
pub fn zeros<T: FocalNumeric>(shape: &[usize]) -> Tensor<T> {
    let numel = shape.iter().product();
    Tensor {
        shape: shape.to_vec(),
        data: vec![T::zero(); numel],
        grad: None,
        device: Default::default(),
    }
}

/// Creates a CPU tensor of shape `[1]` holding `value`, the layout of a loss output.
pub fn scalar<T: FocalNumeric>(value: T) -> Tensor<T> {
    Tensor {
        shape: vec![1],
        data: vec![value],
        grad: None,
        device: Default::default(),
    }
}

/// Creates a `[batch_size, class_count]` tensor whose rows are random probability
/// distributions, drawn from a flat Dirichlet (every concentration `concentration`).
///
/// Small concentrations give peaked rows (confident predictions), large ones
/// give near-uniform rows.
///
/// # Errors
/// `TensorCreationError` if `class_count < 2` or `concentration` is not positive,
/// since no Dirichlet exists for those.
pub fn random_probabilities<T: FocalNumeric, R: Rng + ?Sized>(
    batch_size: usize,
    class_count: usize,
    concentration: f64,
    rng: &mut R,
) -> Result<Tensor<T>, FocalRustError> {
    let shape = vec![batch_size, class_count];
    let dirichlet = Dirichlet::new_with_size(concentration, class_count).map_err(|_| {
        FocalRustError::TensorCreationError {
            data_len: 0,
            shape: shape.clone(),
        }
    })?;

    let mut data = Vec::with_capacity(batch_size * class_count);
    for _ in 0..batch_size {
        let row: Vec<f64> = dirichlet.sample(rng);
        data.extend(row.into_iter().map(T::from_f64));
    }
    Tensor::new(data, shape)
}
