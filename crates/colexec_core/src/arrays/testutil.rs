//! Test utilities.
//!
//! Note this isn't behind a `#[cfg(test)]` flag since this should be usable
//! outside of this crate.
//!
//! Should not be used outside of tests.

use crate::arrays::array::Array;
use crate::arrays::block::Block;

/// Asserts that two arrays are logically equal.
///
/// Floats are compared by bit pattern, so NaN equals NaN.
pub fn assert_arrays_eq(a: &Array, b: &Array) {
    assert_eq!(a.datatype(), b.datatype(), "data types differ");
    assert_eq!(a.len(), b.len(), "logical lengths differ");

    for row_idx in 0..a.len() {
        let a_val = a.logical_value(row_idx).unwrap();
        let b_val = b.logical_value(row_idx).unwrap();

        assert!(
            a_val.is_identical(&b_val),
            "values differ at row {row_idx}: {a_val:?} != {b_val:?}"
        );
    }
}

/// Asserts that two blocks are logically equal, including column names.
pub fn assert_blocks_eq(a: &Block, b: &Block) {
    assert_eq!(a.num_rows(), b.num_rows(), "num rows differ");
    assert_eq!(a.num_columns(), b.num_columns(), "num columns differ");

    for (a_col, b_col) in a.columns().iter().zip(b.columns()) {
        assert_eq!(a_col.name, b_col.name, "column names differ");
        assert_arrays_eq(&a_col.array, &b_col.array);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_eq() {
        let a = Array::from_iter([1, 2, 3]);
        let b = Array::from_iter([1, 2, 3]);

        assert_arrays_eq(&a, &b);
    }

    #[test]
    fn arrays_eq_with_constant() {
        let a = Array::from_iter([2, 2, 2]);
        let b = Array::new_constant(Array::from_iter([2]), 3).unwrap();

        assert_arrays_eq(&a, &b);
    }

    #[test]
    fn arrays_eq_nan() {
        let a = Array::from_iter([f64::NAN]);
        let b = Array::from_iter([f64::NAN]);

        assert_arrays_eq(&a, &b);
    }

    #[test]
    #[should_panic]
    fn arrays_not_eq() {
        let a = Array::from_iter([1, 2, 3]);
        let b = Array::from_iter(["a", "b", "c"]);

        assert_arrays_eq(&a, &b);
    }
}
