/// Element types a focal loss buffer can hold.
///
/// Labels travel as floating-point values (see `FocalLoss::forward`), so only
/// the two float precisions exist here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating-point type.
    F32,
    /// 64-bit floating-point type.
    F64,
}
