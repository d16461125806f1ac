// src/tensor/mod.rs

use crate::device::StorageDevice;
use crate::error::FocalRustError;
use crate::ops::traits::FocalNumeric;
use crate::types::DType;

pub mod create;

pub use create::{random_probabilities, scalar, zeros};

/// A dense row-major buffer exchanged between the host engine and a layer.
///
/// `data` holds the forward values and `grad` the gradient written by a
/// backward pass. The gradient buffer is allocated lazily, the first time a
/// layer writes into it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T: FocalNumeric> {
    shape: Vec<usize>,
    data: Vec<T>,
    grad: Option<Vec<T>>,
    device: StorageDevice,
}

impl<T: FocalNumeric> Tensor<T> {
    /// Creates a new CPU tensor from data and shape.
    ///
    /// # Errors
    /// `TensorCreationError` if `data.len()` differs from the product of `shape`.
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> Result<Self, FocalRustError> {
        Self::new_on(data, shape, StorageDevice::CPU)
    }

    /// Creates a new tensor bound to `device`.
    pub fn new_on(data: Vec<T>, shape: Vec<usize>, device: StorageDevice) -> Result<Self, FocalRustError> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(FocalRustError::TensorCreationError {
                data_len: data.len(),
                shape,
            });
        }
        Ok(Tensor {
            shape,
            data,
            grad: None,
            device,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    pub fn device(&self) -> StorageDevice {
        self.device
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns the gradient, if one has been written.
    pub fn grad(&self) -> Option<&[T]> {
        self.grad.as_deref()
    }

    /// Returns the gradient buffer, allocating it zero-filled if absent.
    pub fn grad_or_init(&mut self) -> &mut [T] {
        self.data_and_grad_mut().1
    }

    /// Borrows the data together with the (lazily allocated) gradient, so a
    /// backward pass can read one while writing the other.
    pub fn data_and_grad_mut(&mut self) -> (&[T], &mut [T]) {
        let numel = self.data.len();
        let grad = self.grad.get_or_insert_with(|| vec![T::zero(); numel]);
        (self.data.as_slice(), grad.as_mut_slice())
    }

    /// Replaces the gradient.
    ///
    /// # Errors
    /// `ShapeMismatch` if `grad` does not have one entry per element.
    pub fn set_grad(&mut self, grad: Vec<T>) -> Result<(), FocalRustError> {
        if grad.len() != self.data.len() {
            return Err(FocalRustError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: vec![grad.len()],
                operation: "Tensor set_grad".to_string(),
            });
        }
        self.grad = Some(grad);
        Ok(())
    }

    pub fn clear_grad(&mut self) {
        self.grad = None;
    }

    /// Changes the shape in place.
    ///
    /// When the element count changes, data is resized (new slots are zero)
    /// and any gradient is dropped.
    pub fn reshape(&mut self, shape: &[usize]) {
        let numel: usize = shape.iter().product();
        if numel != self.data.len() {
            self.data.resize(numel, T::zero());
            self.grad = None;
        }
        self.shape = shape.to_vec();
    }
}
