use crate::device::StorageDevice;
use crate::error::FocalRustError;
use crate::ops::traits::FocalNumeric;
use crate::tensor::Tensor;
use log::warn;

/// The base trait for layers driven by a host execution engine.
///
/// The host calls [`setup`](Layer::setup) once when the graph is built, then
/// [`reshape`](Layer::reshape) and [`forward`](Layer::forward) for every batch,
/// and [`backward`](Layer::backward) when gradients are requested.
/// `bottom` tensors are the layer inputs and `top` tensors its outputs.
///
/// Only CPU kernels exist. The default `forward_gpu`/`backward_gpu` run the
/// CPU path, so a GPU-bound graph still trains.
pub trait Layer<T: FocalNumeric>: std::fmt::Debug + Send {
    /// The registered type name, e.g. `"FocalLoss"`.
    fn type_name(&self) -> &'static str;

    fn min_bottom_blobs(&self) -> usize;
    fn max_bottom_blobs(&self) -> usize;
    fn min_top_blobs(&self) -> usize;
    fn max_top_blobs(&self) -> usize;

    /// Validates the number of bottom and top tensors against the layer bounds.
    ///
    /// # Errors
    /// `BlobCountMismatch` naming the offending side.
    fn check_blob_counts(&self, bottom: usize, top: usize) -> Result<(), FocalRustError> {
        let checks = [
            ("bottom", self.min_bottom_blobs(), self.max_bottom_blobs(), bottom),
            ("top", self.min_top_blobs(), self.max_top_blobs(), top),
        ];
        for (kind, min, max, actual) in checks {
            if actual < min || actual > max {
                return Err(FocalRustError::BlobCountMismatch {
                    layer_type: self.type_name().to_string(),
                    kind,
                    min,
                    max,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// One-time configuration from the first batch's shapes.
    fn setup(&mut self, bottom: &[Tensor<T>], top: &mut [Tensor<T>]) -> Result<(), FocalRustError>;

    /// Adjusts the `top` shapes for the current `bottom` shapes.
    fn reshape(&mut self, bottom: &[Tensor<T>], top: &mut [Tensor<T>]) -> Result<(), FocalRustError>;

    fn forward_cpu(&mut self, bottom: &[Tensor<T>], top: &mut [Tensor<T>]) -> Result<(), FocalRustError>;

    fn backward_cpu(
        &mut self,
        top: &[Tensor<T>],
        propagate_down: &[bool],
        bottom: &mut [Tensor<T>],
    ) -> Result<(), FocalRustError>;

    fn forward_gpu(&mut self, bottom: &[Tensor<T>], top: &mut [Tensor<T>]) -> Result<(), FocalRustError> {
        warn!("{} Layer has no {} forward kernel, using the CPU path", self.type_name(), StorageDevice::GPU);
        self.forward_cpu(bottom, top)
    }

    fn backward_gpu(
        &mut self,
        top: &[Tensor<T>],
        propagate_down: &[bool],
        bottom: &mut [Tensor<T>],
    ) -> Result<(), FocalRustError> {
        warn!("{} Layer has no {} backward kernel, using the CPU path", self.type_name(), StorageDevice::GPU);
        self.backward_cpu(top, propagate_down, bottom)
    }

    /// Runs the forward pass on the device of the first bottom tensor.
    fn forward(&mut self, bottom: &[Tensor<T>], top: &mut [Tensor<T>]) -> Result<(), FocalRustError> {
        match bottom.first().map(|t| t.device()).unwrap_or_default() {
            StorageDevice::CPU => self.forward_cpu(bottom, top),
            StorageDevice::GPU => self.forward_gpu(bottom, top),
        }
    }

    /// Runs the backward pass on the device of the first bottom tensor.
    fn backward(
        &mut self,
        top: &[Tensor<T>],
        propagate_down: &[bool],
        bottom: &mut [Tensor<T>],
    ) -> Result<(), FocalRustError> {
        match bottom.first().map(|t| t.device()).unwrap_or_default() {
            StorageDevice::CPU => self.backward_cpu(top, propagate_down, bottom),
            StorageDevice::GPU => self.backward_gpu(top, propagate_down, bottom),
        }
    }
}
