// focalrust-core/src/nn/losses/focal.rs

use crate::error::{ConfigError, FocalRustError};
use crate::config::FocalLossParameter;
use crate::ops::traits::FocalNumeric;
use log::{debug, error, warn};

/// Message of the fatal error raised when label gradients are requested.
pub const LABEL_GRADIENT_FATAL: &str = "FocalLoss Layer cannot backpropagate to label inputs.";

/// Divisor applied to the summed batch loss: `max(1, batch_size)`.
///
/// Returned by [`FocalLoss::forward`] and passed back into
/// [`FocalLoss::backward`] for the same batch. Holding it as a value instead of
/// kernel state lets one kernel serve several batches at once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer<T: FocalNumeric> {
    value: T,
    batch_size: usize,
}

impl<T: FocalNumeric> Normalizer<T> {
    /// Computes the normalizer for a batch. An empty batch is clamped to 1.
    pub fn for_batch(batch_size: usize) -> Self {
        Normalizer {
            value: T::from_f64(batch_size.max(1) as f64),
            batch_size,
        }
    }

    pub fn value(&self) -> T {
        self.value
    }

    /// The batch size this normalizer was computed for.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Result of a forward pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocalLossOutput<T: FocalNumeric> {
    /// Mean focal loss over the batch.
    pub loss: T,
    /// Divisor used for `loss`, required by the paired backward call.
    pub normalizer: Normalizer<T>,
}

/// Which inputs of the loss the host wants gradients for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropagateDown {
    pub probabilities: bool,
    pub labels: bool,
}

impl PropagateDown {
    /// Gradient for the probabilities only, the usual training request.
    pub fn probabilities_only() -> Self {
        PropagateDown {
            probabilities: true,
            labels: false,
        }
    }
}

impl From<&[bool]> for PropagateDown {
    /// Reads a host `propagate_down` mask (`[probabilities, labels, ..]`).
    /// Missing entries count as `false`.
    fn from(mask: &[bool]) -> Self {
        PropagateDown {
            probabilities: mask.first().copied().unwrap_or(false),
            labels: mask.get(1).copied().unwrap_or(false),
        }
    }
}

/// Focal loss over per-example class probabilities.
///
/// For an example whose true class `c` received probability `p`, the loss term is
///
/// \\[ -\alpha_c (1-p)^\gamma \ln(\max(p, \epsilon)) \\]
///
/// and the batch loss is the sum of the terms divided by `max(1, batch_size)`.
/// `epsilon` is [`FocalNumeric::prob_floor`], so probabilities at or near zero
/// yield a large but finite loss and gradient.
///
/// The kernel is immutable after [`configure`](Self::configure) and can be shared
/// across threads; per-batch state travels in [`Normalizer`].
///
/// # Fields
/// * `alphas`: Per-class weights; empty means every class weighs one.
/// * `gamma`: Focusing exponent, non-negative.
/// * `class_count`: Number of columns of the probability matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FocalLoss<T: FocalNumeric> {
    alphas: Vec<T>,
    gamma: T,
    class_count: usize,
}

impl<T: FocalNumeric> FocalLoss<T> {
    /// Creates a configured kernel.
    ///
    /// # Arguments
    /// * `alphas`: One weight per class, or empty for uniform weight 1.0.
    /// * `gamma`: Focusing exponent.
    /// * `class_count`: Number of classes.
    ///
    /// # Errors
    /// Returns `FocalRustError::Config` if `class_count` is zero, `gamma` is
    /// negative or not finite, an alpha is negative or not finite, or a
    /// non-empty `alphas` does not hold exactly `class_count` entries.
    pub fn configure(alphas: Vec<T>, gamma: T, class_count: usize) -> Result<Self, FocalRustError> {
        if class_count == 0 {
            return Err(ConfigError::ZeroClassCount.into());
        }
        if !gamma.is_finite() {
            return Err(ConfigError::NonFiniteGamma(gamma.as_f64()).into());
        }
        if gamma < T::zero() {
            return Err(ConfigError::NegativeGamma(gamma.as_f64()).into());
        }
        if !alphas.is_empty() && alphas.len() != class_count {
            return Err(ConfigError::AlphaCountMismatch {
                expected: class_count,
                actual: alphas.len(),
            }
            .into());
        }
        if let Some((class, value)) = alphas
            .iter()
            .enumerate()
            .find(|(_, a)| !a.is_finite() || **a < T::zero())
        {
            return Err(ConfigError::InvalidAlpha {
                class,
                value: value.as_f64(),
            }
            .into());
        }
        if alphas.is_empty() {
            warn!("FocalLoss: no alpha given, weighting all {} classes with 1.0", class_count);
        }

        Ok(FocalLoss {
            alphas,
            gamma,
            class_count,
        })
    }

    /// Creates a kernel from a host parameter record.
    pub fn from_parameter(param: &FocalLossParameter, class_count: usize) -> Result<Self, FocalRustError> {
        let alphas = param.alpha.iter().map(|&a| T::from_f64(a as f64)).collect();
        Self::configure(alphas, T::from_f64(param.gamma as f64), class_count)
    }

    /// Weight of `class`, or `None` if `class >= class_count`.
    /// Every class weighs 1.0 when no alphas were configured.
    pub fn alpha(&self, class: usize) -> Option<T> {
        if class >= self.class_count {
            return None;
        }
        Some(self.weight(class))
    }

    fn weight(&self, class: usize) -> T {
        self.alphas.get(class).copied().unwrap_or_else(T::one)
    }

    pub fn alphas(&self) -> &[T] {
        &self.alphas
    }

    pub fn gamma(&self) -> T {
        self.gamma
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }

    /// Unnormalized loss term of one example whose true class `class` got probability `p`.
    pub fn loss_term(&self, p: T, class: usize) -> T {
        let p = clamp_probability(p);
        let focus = (T::one() - p).powf(self.gamma);
        -self.weight(class) * focus * p.ln()
    }

    /// Derivative of [`loss_term`](Self::loss_term) with respect to `p`.
    ///
    /// \\[ -\alpha_c \left(-\gamma (1-p)^{\gamma-1} \ln p + \frac{(1-p)^\gamma}{p}\right) \\]
    ///
    /// `p` and the base of `(1-p)^(gamma-1)` are floored at epsilon, so the
    /// result stays finite for `gamma < 1` at `p = 1` and for `p` near zero.
    /// Values beyond the range of `T` saturate at `±T::max_value()`.
    pub fn loss_term_grad(&self, p: T, class: usize) -> T {
        saturate(self.term_grad_f64(p, class))
    }

    /// Unsaturated derivative, evaluated in `f64`. Near the floor `1 / p` is
    /// close to `f32::MAX`, so any weight above one would overflow in `f32`.
    fn term_grad_f64(&self, p: T, class: usize) -> f64 {
        let floor = T::prob_floor().as_f64();
        let p = clamp_probability(p).as_f64();
        let gamma = self.gamma.as_f64();
        let one_minus_p = 1.0 - p;
        let focus = one_minus_p.powf(gamma);
        let focus_prime = one_minus_p.max(floor).powf(gamma - 1.0);
        -self.weight(class).as_f64() * (-gamma * focus_prime * p.ln() + focus / p)
    }

    /// Computes the batch loss.
    ///
    /// # Arguments
    /// * `probabilities`: Row-major `[batch_size, class_count]` probabilities.
    /// * `labels`: `batch_size` class ids stored as floats.
    ///
    /// # Returns
    /// The mean loss and the [`Normalizer`] to hand to [`backward`](Self::backward).
    ///
    /// # Errors
    /// `ShapeMismatch` if `probabilities` is not `labels.len() * class_count` long,
    /// `InvalidLabel` if a label is not an integral class id.
    pub fn forward(&self, probabilities: &[T], labels: &[T]) -> Result<FocalLossOutput<T>, FocalRustError> {
        let batch_size = self.check_inputs(probabilities, labels, "FocalLoss forward")?;

        let mut loss = T::zero();
        for (i, &label) in labels.iter().enumerate() {
            let class = label_index(i, label, self.class_count)?;
            let p = probabilities[i * self.class_count + class];
            loss += self.loss_term(p, class);
        }

        let normalizer = Normalizer::for_batch(batch_size);
        let loss = loss / normalizer.value();
        debug!(
            "FocalLoss forward: batch_size = {}, loss = {}, normalizer = {}",
            batch_size, loss, normalizer.value()
        );
        Ok(FocalLossOutput { loss, normalizer })
    }

    /// Writes the gradient of the batch loss with respect to `probabilities` into `grad_out`.
    ///
    /// Every entry is zero except each row's true-label column. The buffer is
    /// then scaled by `upstream / normalizer`. When `propagate.probabilities` is
    /// false nothing is computed and `grad_out` is left untouched.
    ///
    /// # Panics
    /// Panics if `propagate.labels` is set: labels are ground truth and have no
    /// gradient, and continuing would feed garbage into upstream parameters.
    ///
    /// # Errors
    /// `ShapeMismatch` if the inputs or `grad_out` have the wrong length,
    /// `StaleNormalizer` if `normalizer` was computed for another batch size,
    /// `InvalidLabel` for a label that is not a class id.
    pub fn backward_into(
        &self,
        probabilities: &[T],
        labels: &[T],
        upstream: T,
        normalizer: &Normalizer<T>,
        propagate: PropagateDown,
        grad_out: &mut [T],
    ) -> Result<(), FocalRustError> {
        if propagate.labels {
            refuse_label_gradient();
        }
        if !propagate.probabilities {
            return Ok(());
        }

        let batch_size = self.check_inputs(probabilities, labels, "FocalLoss backward")?;
        if grad_out.len() != probabilities.len() {
            return Err(FocalRustError::ShapeMismatch {
                expected: vec![batch_size, self.class_count],
                actual: vec![grad_out.len()],
                operation: "FocalLoss backward: gradient buffer".to_string(),
            });
        }
        if normalizer.batch_size() != batch_size {
            return Err(FocalRustError::StaleNormalizer {
                cached: normalizer.batch_size(),
                actual: batch_size,
            });
        }

        // Labels are resolved before the buffer is touched.
        let classes = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| label_index(i, label, self.class_count))
            .collect::<Result<Vec<_>, _>>()?;

        let scale = upstream.as_f64() / normalizer.value().as_f64();
        grad_out.iter_mut().for_each(|g| *g = T::zero());
        for (i, &class) in classes.iter().enumerate() {
            let idx = i * self.class_count + class;
            let term = self.term_grad_f64(probabilities[idx], class).clamp(-f64::MAX, f64::MAX);
            grad_out[idx] = saturate(term * scale);
        }

        debug!(
            "FocalLoss backward: batch_size = {}, scale = {}",
            batch_size, scale
        );
        Ok(())
    }

    /// Allocating variant of [`backward_into`](Self::backward_into).
    ///
    /// Returns `None` when `propagate.probabilities` is false.
    pub fn backward(
        &self,
        probabilities: &[T],
        labels: &[T],
        upstream: T,
        normalizer: &Normalizer<T>,
        propagate: PropagateDown,
    ) -> Result<Option<Vec<T>>, FocalRustError> {
        if !propagate.probabilities && !propagate.labels {
            return Ok(None);
        }
        let mut grad = vec![T::zero(); probabilities.len()];
        self.backward_into(probabilities, labels, upstream, normalizer, propagate, &mut grad)?;
        Ok(Some(grad))
    }

    fn check_inputs(&self, probabilities: &[T], labels: &[T], operation: &str) -> Result<usize, FocalRustError> {
        let batch_size = labels.len();
        if probabilities.len() != batch_size * self.class_count {
            return Err(FocalRustError::ShapeMismatch {
                expected: vec![batch_size, self.class_count],
                actual: vec![probabilities.len()],
                operation: operation.to_string(),
            });
        }
        Ok(batch_size)
    }
}

/// Halts the run: a label gradient has no meaning and must never reach upstream parameters.
pub(crate) fn refuse_label_gradient() -> ! {
    error!("{}", LABEL_GRADIENT_FATAL);
    panic!("{}", LABEL_GRADIENT_FATAL);
}

/// Clamps a probability into `[epsilon, 1]`.
fn clamp_probability<T: FocalNumeric>(p: T) -> T {
    p.max(T::prob_floor()).min(T::one())
}

/// Narrows an `f64` into `T`, saturating at `±T::max_value()`.
fn saturate<T: FocalNumeric>(value: f64) -> T {
    let max = T::max_value().as_f64();
    T::from_f64(value.clamp(-max, max))
}

/// Converts a float label into a class id.
pub(crate) fn label_index<T: FocalNumeric>(
    index: usize,
    label: T,
    class_count: usize,
) -> Result<usize, FocalRustError> {
    let value = label.as_f64();
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= class_count as f64 {
        return Err(FocalRustError::InvalidLabel {
            index,
            value,
            class_count,
        });
    }
    Ok(value as usize)
}

#[cfg(test)]
#[path = "focal_test.rs"]
mod tests;
