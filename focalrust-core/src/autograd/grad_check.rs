use crate::error::FocalRustError;
use crate::ops::traits::FocalNumeric;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradCheckError {
    #[error("Gradient check failed at element index {element_index}: Analytical grad {analytical_grad:?} != Numerical grad {numerical_grad:?}. Difference: {difference:?}")]
    GradientMismatch {
        element_index: usize,
        analytical_grad: f64, // Use f64 for precision
        numerical_grad: f64,
        difference: f64,
    },
    #[error("Analytical gradient has {analytical} elements but the input has {input}")]
    LengthMismatch { input: usize, analytical: usize },
    #[error("Forward function execution failed during gradient check: {0}")]
    ForwardPassError(FocalRustError),
    #[error("Numerical gradient is NaN or infinite for element {element_index}. Details: Loss+: {loss_plus:?}, Loss-: {loss_minus:?}")]
    NumericalGradNaNOrInfinite {
        element_index: usize,
        loss_plus: f64,
        loss_minus: f64,
    },
    #[error("Analytical gradient is NaN or infinite for element {element_index}. Value: {value:?}")]
    AnalyticalGradNaNOrInfinite { element_index: usize, value: f64 },
}

impl From<FocalRustError> for GradCheckError {
    fn from(err: FocalRustError) -> Self {
        GradCheckError::ForwardPassError(err)
    }
}

/// Checks an analytical gradient against numerical gradients using central finite differences.
///
/// # Arguments
/// * `func`: Scalar function of the flat input (typically a loss forward pass).
/// * `input`: Point at which the gradient is evaluated.
/// * `analytical`: Gradient computed by the kernel under test, same length as `input`.
/// * `epsilon`: Perturbation applied to each element in turn.
/// * `tolerance`: An element fails only if both the absolute and the relative
///   difference exceed this value.
pub fn check_grad<T, F>(
    func: F,
    input: &[T],
    analytical: &[T],
    epsilon: f64,
    tolerance: f64,
) -> Result<(), GradCheckError>
where
    T: FocalNumeric,
    F: Fn(&[T]) -> Result<T, FocalRustError>,
{
    if input.len() != analytical.len() {
        return Err(GradCheckError::LengthMismatch {
            input: input.len(),
            analytical: analytical.len(),
        });
    }

    let mut perturbed = input.to_vec();
    for elem_idx in 0..input.len() {
        let original = input[elem_idx];

        perturbed[elem_idx] = T::from_f64(original.as_f64() + epsilon);
        let loss_plus = func(&perturbed).map_err(GradCheckError::ForwardPassError)?.as_f64();

        perturbed[elem_idx] = T::from_f64(original.as_f64() - epsilon);
        let loss_minus = func(&perturbed).map_err(GradCheckError::ForwardPassError)?.as_f64();

        perturbed[elem_idx] = original;

        let numerical_grad = (loss_plus - loss_minus) / (2.0 * epsilon);
        let analytical_grad = analytical[elem_idx].as_f64();

        if !numerical_grad.is_finite() {
            return Err(GradCheckError::NumericalGradNaNOrInfinite {
                element_index: elem_idx,
                loss_plus,
                loss_minus,
            });
        }
        if !analytical_grad.is_finite() {
            return Err(GradCheckError::AnalyticalGradNaNOrInfinite {
                element_index: elem_idx,
                value: analytical_grad,
            });
        }

        let difference = (analytical_grad - numerical_grad).abs();
        let close = approx::relative_eq!(
            analytical_grad,
            numerical_grad,
            epsilon = tolerance,
            max_relative = tolerance
        );
        if !close {
            return Err(GradCheckError::GradientMismatch {
                element_index: elem_idx,
                analytical_grad,
                numerical_grad,
                difference,
            });
        }
    }

    Ok(())
}
