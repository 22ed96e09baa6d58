use colexec_error::{DbError, ErrorKind, Result};

use super::{OutBuffer, PutBuffer, downcast_execution_format};
use crate::arrays::array::Array;
use crate::arrays::array::physical_type::ScalarStorage;
use crate::arrays::array::validity::Validity;
use crate::arrays::datatype::DataType;

#[derive(Debug, Clone, Copy)]
pub struct UnaryExecutor;

impl UnaryExecutor {
    /// Execute a unary operation on `array`, placing results in `out`.
    pub fn execute<S, O, Op>(
        array: &Array,
        out: OutBuffer<O::StorageType>,
        mut op: Op,
    ) -> Result<()>
    where
        S: ScalarStorage,
        O: ScalarStorage,
        Op: FnMut(&S::StorageType, PutBuffer<O::StorageType>),
    {
        if array.len() != out.values.len() {
            return Err(
                DbError::with_kind(ErrorKind::SizeMismatch, "Unary input differs from output")
                    .with_field("input", array.len())
                    .with_field("out", out.values.len()),
            );
        }

        let input = downcast_execution_format::<S>(array)?;
        let validity = &array.validity;

        if validity.all_valid() {
            for idx in 0..array.len() {
                op(input.get(idx), PutBuffer::new(idx, out.values, out.validity));
            }
        } else {
            for idx in 0..array.len() {
                if validity.is_valid(idx) {
                    op(input.get(idx), PutBuffer::new(idx, out.values, out.validity));
                } else {
                    out.validity.set_invalid(idx);
                }
            }
        }

        Ok(())
    }

    /// Execute a unary operation, allocating a new output array of type
    /// `datatype`.
    pub fn execute_new<S, O, Op>(array: &Array, datatype: DataType, op: Op) -> Result<Array>
    where
        S: ScalarStorage,
        O: ScalarStorage,
        Op: FnMut(&S::StorageType, PutBuffer<O::StorageType>),
    {
        let len = array.len();
        let mut values = vec![O::StorageType::default(); len];
        let mut validity = Validity::new_all_valid(len);

        Self::execute::<S, O, _>(
            array,
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
    use crate::arrays::array::physical_type::{PhysicalF64, PhysicalI32};
    use crate::arrays::testutil::assert_arrays_eq;

    #[test]
    fn unary_with_nulls() {
        let arr = Array::from_iter([Some(1_i32), None, Some(4)]);

        let got = UnaryExecutor::execute_new::<PhysicalI32, PhysicalF64, _>(
            &arr,
            DataType::Float64,
            |&v, buf| buf.put(&(v as f64 / 2.0)),
        )
        .unwrap();

        assert_arrays_eq(&Array::from_iter([Some(0.5_f64), None, Some(2.0)]), &got);
    }
}
