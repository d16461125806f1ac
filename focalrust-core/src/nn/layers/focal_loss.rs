// src/nn/layers/focal_loss.rs

use crate::config::{FocalLossParameter, LayerParameter, FOCAL_LOSS_TYPE};
use crate::error::FocalRustError;
use crate::nn::layer::Layer;
use crate::nn::losses::focal::{refuse_label_gradient, FocalLoss, Normalizer, PropagateDown};
use crate::ops::traits::FocalNumeric;
use crate::tensor::Tensor;
use log::{debug, info};

/// Host adapter running [`FocalLoss`] inside a layer graph.
///
/// Bottoms: `[probabilities, labels]` plus an optional third input that is
/// ignored. Tops: `[loss]` plus an optional second output that is left alone.
/// The loss top has shape `[1]`.
///
/// The layer caches the [`Normalizer`] of its last forward pass, so each
/// backward call must follow the forward call of the same batch. Use one layer
/// per concurrent execution context, or the stateless kernel directly.
#[derive(Debug)]
pub struct FocalLossLayer<T: FocalNumeric> {
    name: String,
    param: FocalLossParameter,
    kernel: Option<FocalLoss<T>>,
    normalizer: Option<Normalizer<T>>,
}

impl<T: FocalNumeric> FocalLossLayer<T> {
    /// Creates an un-setup layer from its parameter record.
    ///
    /// # Errors
    /// `LayerTypeMismatch` if `param.layer_type` is not `"FocalLoss"`.
    pub fn new(param: &LayerParameter) -> Result<Self, FocalRustError> {
        if param.layer_type != FOCAL_LOSS_TYPE {
            return Err(FocalRustError::LayerTypeMismatch {
                expected: FOCAL_LOSS_TYPE.to_string(),
                actual: param.layer_type.clone(),
            });
        }
        Ok(Self::from_parameter(&param.name, param.focal_loss_param.clone()))
    }

    pub fn from_parameter(name: &str, param: FocalLossParameter) -> Self {
        FocalLossLayer {
            name: name.to_string(),
            param,
            kernel: None,
            normalizer: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured kernel, once [`setup`](Layer::setup) ran.
    pub fn kernel(&self) -> Option<&FocalLoss<T>> {
        self.kernel.as_ref()
    }

    /// Normalizer cached by the last forward pass.
    pub fn cached_normalizer(&self) -> Option<Normalizer<T>> {
        self.normalizer
    }

    fn configured_kernel(&self) -> Result<&FocalLoss<T>, FocalRustError> {
        self.kernel
            .as_ref()
            .ok_or_else(|| FocalRustError::LayerNotSetUp(self.name.clone()))
    }
}

/// Reads `(batch_size, class_count)` from a probability tensor of shape `[N, C, ...]`.
fn batch_and_classes<T: FocalNumeric>(probabilities: &Tensor<T>) -> Result<(usize, usize), FocalRustError> {
    match probabilities.shape() {
        [batch_size, classes @ ..] if !classes.is_empty() => Ok((*batch_size, classes.iter().product())),
        shape => Err(FocalRustError::ShapeMismatch {
            expected: vec![0, 0],
            actual: shape.to_vec(),
            operation: "FocalLoss: probabilities must be at least 2-D".to_string(),
        }),
    }
}

fn check_class_count<T: FocalNumeric>(kernel: &FocalLoss<T>, probabilities: &Tensor<T>) -> Result<usize, FocalRustError> {
    let (batch_size, classes) = batch_and_classes(probabilities)?;
    if classes != kernel.class_count() {
        return Err(FocalRustError::ShapeMismatch {
            expected: vec![batch_size, kernel.class_count()],
            actual: probabilities.shape().to_vec(),
            operation: "FocalLoss: class count changed since setup".to_string(),
        });
    }
    Ok(batch_size)
}

impl<T: FocalNumeric> Layer<T> for FocalLossLayer<T> {
    fn type_name(&self) -> &'static str {
        FOCAL_LOSS_TYPE
    }

    fn min_bottom_blobs(&self) -> usize {
        2
    }

    fn max_bottom_blobs(&self) -> usize {
        3
    }

    fn min_top_blobs(&self) -> usize {
        1
    }

    fn max_top_blobs(&self) -> usize {
        2
    }

    fn setup(&mut self, bottom: &[Tensor<T>], top: &mut [Tensor<T>]) -> Result<(), FocalRustError> {
        self.check_blob_counts(bottom.len(), top.len())?;
        let (_, class_count) = batch_and_classes(&bottom[0])?;
        let kernel = FocalLoss::from_parameter(&self.param, class_count)?;
        info!(
            "Setting up {} ({}): {} classes, gamma = {}, {:?}",
            self.name,
            FOCAL_LOSS_TYPE,
            class_count,
            kernel.gamma(),
            T::DTYPE
        );
        self.kernel = Some(kernel);
        self.normalizer = None;
        Ok(())
    }

    fn reshape(&mut self, bottom: &[Tensor<T>], top: &mut [Tensor<T>]) -> Result<(), FocalRustError> {
        self.check_blob_counts(bottom.len(), top.len())?;
        let (batch_size, _) = batch_and_classes(&bottom[0])?;
        if bottom[1].numel() != batch_size {
            return Err(FocalRustError::ShapeMismatch {
                expected: vec![batch_size],
                actual: bottom[1].shape().to_vec(),
                operation: "FocalLoss reshape: one label per example".to_string(),
            });
        }
        top[0].reshape(&[1]);
        Ok(())
    }

    fn forward_cpu(&mut self, bottom: &[Tensor<T>], top: &mut [Tensor<T>]) -> Result<(), FocalRustError> {
        self.check_blob_counts(bottom.len(), top.len())?;
        let kernel = self.configured_kernel()?;
        check_class_count(kernel, &bottom[0])?;

        let out = kernel.forward(bottom[0].data(), bottom[1].data())?;
        top[0].reshape(&[1]);
        top[0].data_mut()[0] = out.loss;
        self.normalizer = Some(out.normalizer);
        Ok(())
    }

    fn backward_cpu(
        &mut self,
        top: &[Tensor<T>],
        propagate_down: &[bool],
        bottom: &mut [Tensor<T>],
    ) -> Result<(), FocalRustError> {
        let propagate = PropagateDown::from(propagate_down);
        if propagate.labels {
            refuse_label_gradient();
        }
        if !propagate.probabilities {
            return Ok(());
        }
        self.check_blob_counts(bottom.len(), top.len())?;

        let kernel = self.configured_kernel()?;
        let normalizer = self.normalizer.ok_or(FocalRustError::BackwardBeforeForward)?;
        check_class_count(kernel, &bottom[0])?;

        // The loss top's gradient carries the loss weight.
        let upstream = top[0].grad().and_then(|g| g.first().copied()).unwrap_or_else(T::one);

        let (probabilities, rest) = bottom.split_at_mut(1);
        let labels = rest[0].data();
        let (probs, grad) = probabilities[0].data_and_grad_mut();
        kernel.backward_into(probs, labels, upstream, &normalizer, propagate, grad)?;
        debug!("{} backward done, upstream = {}", self.name, upstream);
        Ok(())
    }
}

#[cfg(test)]
#[path = "focal_loss_test.rs"]
mod tests;
