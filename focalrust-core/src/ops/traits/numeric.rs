use crate::types::DType;
use num_traits::{Float, NumAssignOps, NumOps};
use std::fmt::{Debug, Display};

/// A trait representing the floating-point types usable by the focal loss kernels.
///
/// This trait bounds the types (`f32`, `f64`) that the generic kernels run on.
/// It ensures that the type supports the necessary mathematical operations
/// (`powf`, `ln`, `max`), comparisons and thread-safe sharing.
pub trait FocalNumeric:
    Float // Includes Num + Copy + NumCast + ToPrimitive
    + NumAssignOps // AddAssign, MulAssign, ...
    + NumOps
    + PartialOrd
    + Debug
    + Display
    + Copy
    + Send
    + Sync
    + 'static
{
    /// The `DType` tag matching this element type.
    const DTYPE: DType;

    /// Lower bound applied to a probability before `ln` or division.
    ///
    /// This is the IEEE-754 single-precision minimum normal value for both
    /// precisions, so f32 and f64 runs clamp at the same magnitude.
    fn prob_floor() -> Self;

    /// Widens the value to `f64` for logging and gradient checks.
    fn as_f64(self) -> f64;

    /// Narrows an `f64` into this type.
    fn from_f64(value: f64) -> Self;
}

impl FocalNumeric for f32 {
    const DTYPE: DType = DType::F32;

    fn prob_floor() -> Self {
        f32::MIN_POSITIVE
    }

    fn as_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl FocalNumeric for f64 {
    const DTYPE: DType = DType::F64;

    fn prob_floor() -> Self {
        f32::MIN_POSITIVE as f64
    }

    fn as_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}
