use colexec_error::{DbError, ErrorKind, Result};

use super::{OutBuffer, PutBuffer, downcast_execution_format};
use crate::arrays::array::Array;
use crate::arrays::array::physical_type::ScalarStorage;
use crate::arrays::array::validity::Validity;
use crate::arrays::datatype::DataType;

#[derive(Debug, Clone, Copy)]
pub struct BinaryExecutor;

impl BinaryExecutor {
    /// Execute a binary operation over every row of `array1` and `array2`,
    /// placing results in `out`.
    ///
    /// Rows where either input is null are set to null in the output without
    /// calling `op`.
    pub fn execute<S1, S2, O, Op>(
        array1: &Array,
        array2: &Array,
        out: OutBuffer<O::StorageType>,
        mut op: Op,
    ) -> Result<()>
    where
        S1: ScalarStorage,
        S2: ScalarStorage,
        O: ScalarStorage,
        Op: FnMut(&S1::StorageType, &S2::StorageType, PutBuffer<O::StorageType>),
    {
        if array1.len() != array2.len() || array1.len() != out.values.len() {
            return Err(
                DbError::with_kind(ErrorKind::SizeMismatch, "Binary inputs differ in length")
                    .with_field("left", array1.len())
                    .with_field("right", array2.len())
                    .with_field("out", out.values.len()),
            );
        }

        let input1 = downcast_execution_format::<S1>(array1)?;
        let input2 = downcast_execution_format::<S2>(array2)?;

        let validity1 = &array1.validity;
        let validity2 = &array2.validity;

        if validity1.all_valid() && validity2.all_valid() {
            for idx in 0..array1.len() {
                op(
                    input1.get(idx),
                    input2.get(idx),
                    PutBuffer::new(idx, out.values, out.validity),
                );
            }
        } else {
            for idx in 0..array1.len() {
                if validity1.is_valid(idx) && validity2.is_valid(idx) {
                    op(
                        input1.get(idx),
                        input2.get(idx),
                        PutBuffer::new(idx, out.values, out.validity),
                    );
                } else {
                    out.validity.set_invalid(idx);
                }
            }
        }

        Ok(())
    }

    /// Execute a binary operation, allocating a new output array of type
    /// `datatype`.
    pub fn execute_new<S1, S2, O, Op>(
        array1: &Array,
        array2: &Array,
        datatype: DataType,
        op: Op,
    ) -> Result<Array>
    where
        S1: ScalarStorage,
        S2: ScalarStorage,
        O: ScalarStorage,
        Op: FnMut(&S1::StorageType, &S2::StorageType, PutBuffer<O::StorageType>),
    {
        let len = array1.len();
        let mut values = vec![O::StorageType::default(); len];
        let mut validity = Validity::new_all_valid(len);

        Self::execute::<S1, S2, O, _>(
            array1,
            array2,
            OutBuffer {
                values: &mut values,
                validity: &mut validity,
            },
            op,
        )?;

        Array::try_new(datatype, validity, O::new_array_data(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::physical_type::{PhysicalI32, PhysicalI64};
    use crate::arrays::testutil::assert_arrays_eq;

    #[test]
    fn binary_simple_add() {
        let left = Array::from_iter([1_i32, 2, 3]);
        let right = Array::from_iter([4_i32, 5, 6]);

        let got = BinaryExecutor::execute_new::<PhysicalI32, PhysicalI32, PhysicalI64, _>(
            &left,
            &right,
            DataType::Int64,
            |&a, &b, buf| buf.put(&(a as i64 + b as i64)),
        )
        .unwrap();

        assert_arrays_eq(&Array::from_iter([5_i64, 7, 9]), &got);
    }

    #[test]
    fn binary_nulls_propagate() {
        let left = Array::from_iter([Some(1_i32), None, Some(3)]);
        let right = Array::from_iter([Some(4_i32), Some(5), None]);

        let got = BinaryExecutor::execute_new::<PhysicalI32, PhysicalI32, PhysicalI32, _>(
            &left,
            &right,
            DataType::Int32,
            |&a, &b, buf| buf.put(&(a + b)),
        )
        .unwrap();

        assert_arrays_eq(&Array::from_iter([Some(5_i32), None, None]), &got);
    }

    #[test]
    fn binary_with_constant() {
        let left = Array::from_iter([1_i32, 2, 3]);
        let right = Array::new_constant(Array::from_iter([10_i32]), 3).unwrap();

        let got = BinaryExecutor::execute_new::<PhysicalI32, PhysicalI32, PhysicalI32, _>(
            &left,
            &right,
            DataType::Int32,
            |&a, &b, buf| buf.put(&(a * b)),
        )
        .unwrap();

        assert_arrays_eq(&Array::from_iter([10_i32, 20, 30]), &got);
    }

    #[test]
    fn binary_put_null() {
        let left = Array::from_iter([1_i32, 0]);
        let right = Array::from_iter([1_i32, 1]);

        let got = BinaryExecutor::execute_new::<PhysicalI32, PhysicalI32, PhysicalI32, _>(
            &left,
            &right,
            DataType::Int32,
            |&a, &b, buf| {
                if a == 0 {
                    buf.put_null();
                } else {
                    buf.put(&(a + b));
                }
            },
        )
        .unwrap();

        assert_arrays_eq(&Array::from_iter([Some(2_i32), None]), &got);
    }

    #[test]
    fn binary_length_mismatch() {
        let left = Array::from_iter([1_i32, 2]);
        let right = Array::from_iter([1_i32]);

        let err = BinaryExecutor::execute_new::<PhysicalI32, PhysicalI32, PhysicalI32, _>(
            &left,
            &right,
            DataType::Int32,
            |&a, &b, buf| buf.put(&(a + b)),
        )
        .unwrap_err();
        assert_eq!(ErrorKind::SizeMismatch, err.kind());
    }
}
