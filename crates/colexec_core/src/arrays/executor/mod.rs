pub mod binary;
pub mod unary;

use colexec_error::Result;

use super::array::Array;
use super::array::array_data::ArrayData;
use super::array::physical_type::ScalarStorage;
use super::array::validity::Validity;

/// How the values of an array are read during execution.
#[derive(Debug, Clone, Copy)]
pub enum ExecutionFormat<'a, T> {
    /// One value per row.
    Flat(&'a [T]),
    /// A single value shared by every row.
    Constant(&'a T),
}

impl<'a, T> ExecutionFormat<'a, T> {
    /// Get the value for a logical row.
    ///
    /// Panics if the row is out of bounds for a flat buffer.
    #[inline]
    pub fn get(&self, idx: usize) -> &'a T {
        match self {
            Self::Flat(values) => &values[idx],
            Self::Constant(value) => value,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Constant(_))
    }
}

/// Get the execution format for a primitive array.
///
/// Constant arrays are read through their single value without being
/// materialized.
pub fn downcast_execution_format<S: ScalarStorage>(
    array: &Array,
) -> Result<ExecutionFormat<'_, S::StorageType>> {
    match &array.data {
        ArrayData::Constant(c) => {
            let values = S::get_storage(&c.value.data)?;
            Ok(ExecutionFormat::Constant(&values[0]))
        }
        other => Ok(ExecutionFormat::Flat(S::get_storage(other)?)),
    }
}

/// Wrapper around a value buffer and validity buffer that will be used to
/// construct a full array.
#[derive(Debug)]
pub struct OutBuffer<'a, T> {
    pub values: &'a mut [T],
    pub validity: &'a mut Validity,
}

/// Helper for assigning a value to a location in a buffer.
#[derive(Debug)]
pub struct PutBuffer<'a, T> {
    idx: usize,
    values: &'a mut [T],
    validity: &'a mut Validity,
}

impl<'a, T: Copy> PutBuffer<'a, T> {
    pub(crate) fn new(idx: usize, values: &'a mut [T], validity: &'a mut Validity) -> Self {
        debug_assert_eq!(values.len(), validity.len());
        PutBuffer {
            idx,
            values,
            validity,
        }
    }

    pub fn put(self, val: &T) {
        self.values[self.idx] = *val;
    }

    pub fn put_null(self) {
        self.validity.set_invalid(self.idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::array::physical_type::PhysicalI32;

    #[test]
    fn constant_format_reads_single_value() {
        let arr = Array::new_constant(Array::from_iter([7_i32]), 4).unwrap();
        let format = downcast_execution_format::<PhysicalI32>(&arr).unwrap();

        assert!(format.is_constant());
        assert_eq!(&7, format.get(3));
    }

    #[test]
    fn flat_format_wrong_type() {
        let arr = Array::from_iter([1_i64]);
        downcast_execution_format::<PhysicalI32>(&arr).unwrap_err();
    }
}
