use crate::ops::traits::FocalNumeric;

/// Checks that two slices are approximately equal (length and data within tolerance).
/// Panics with the first offending index if they differ.
pub fn check_slice_near<T: FocalNumeric>(actual: &[T], expected: &[T], tolerance: f64) {
    assert_eq!(actual.len(), expected.len(), "Data length mismatch");

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let diff = (a.as_f64() - e.as_f64()).abs();
        if diff > tolerance || diff.is_nan() {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Checks that every non-`(row, label)` entry of a row-major gradient is exactly zero.
pub fn check_zero_outside_labels<T: FocalNumeric>(grad: &[T], labels: &[usize], class_count: usize) {
    for (idx, g) in grad.iter().enumerate() {
        let (row, col) = (idx / class_count, idx % class_count);
        if labels[row] != col && *g != T::zero() {
            panic!("Non-zero gradient {:?} at row {}, column {} (label {})", g, row, col, labels[row]);
        }
    }
}
