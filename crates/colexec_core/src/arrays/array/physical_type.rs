use std::fmt::Debug;
use std::sync::Arc;

use colexec_error::{DbError, ErrorKind, Result};
use half::f16;

use super::array_data::ArrayData;

/// How values of a type are physically laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Utf8,
    Binary,
    List,
    Struct,
}

impl PhysicalType {
    /// If this is a fixed-size primitive.
    pub const fn is_primitive(&self) -> bool {
        !matches!(
            self,
            PhysicalType::Utf8 | PhysicalType::Binary | PhysicalType::List | PhysicalType::Struct
        )
    }
}

/// Marker type for accessing a primitive buffer with a concrete Rust type.
pub trait ScalarStorage: Debug + Sync + Send + Clone + Copy + 'static {
    const PHYSICAL_TYPE: PhysicalType;

    type StorageType: Debug + Default + Copy + PartialEq + Sync + Send + 'static;

    /// Get the values from array data.
    ///
    /// Errors if the array data isn't storing this physical type.
    fn get_storage(data: &ArrayData) -> Result<&[Self::StorageType]>;

    /// Get mutable values from array data.
    ///
    /// Clones the underlying buffer first if it's shared with another array.
    fn get_storage_mut(data: &mut ArrayData) -> Result<&mut [Self::StorageType]>;

    /// Wrap values in array data.
    fn new_array_data(values: Vec<Self::StorageType>) -> ArrayData;
}

macro_rules! generate_primitive {
    ($prim:ty, $name:ident, $variant:ident) => {
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl ScalarStorage for $name {
            const PHYSICAL_TYPE: PhysicalType = PhysicalType::$variant;

            type StorageType = $prim;

            fn get_storage(data: &ArrayData) -> Result<&[Self::StorageType]> {
                match data {
                    ArrayData::$variant(values) => Ok(values.as_slice()),
                    other => Err(storage_mismatch(Self::PHYSICAL_TYPE, other)),
                }
            }

            fn get_storage_mut(data: &mut ArrayData) -> Result<&mut [Self::StorageType]> {
                match data {
                    ArrayData::$variant(values) => Ok(Arc::make_mut(values).as_mut_slice()),
                    other => Err(storage_mismatch(Self::PHYSICAL_TYPE, other)),
                }
            }

            fn new_array_data(values: Vec<Self::StorageType>) -> ArrayData {
                ArrayData::$variant(Arc::new(values))
            }
        }
    };
}

generate_primitive!(i8, PhysicalI8, Int8);
generate_primitive!(i16, PhysicalI16, Int16);
generate_primitive!(i32, PhysicalI32, Int32);
generate_primitive!(i64, PhysicalI64, Int64);
generate_primitive!(i128, PhysicalI128, Int128);
generate_primitive!(u8, PhysicalU8, UInt8);
generate_primitive!(u16, PhysicalU16, UInt16);
generate_primitive!(u32, PhysicalU32, UInt32);
generate_primitive!(u64, PhysicalU64, UInt64);
generate_primitive!(f16, PhysicalF16, Float16);
generate_primitive!(f32, PhysicalF32, Float32);
generate_primitive!(f64, PhysicalF64, Float64);

fn storage_mismatch(want: PhysicalType, have: &ArrayData) -> DbError {
    DbError::with_kind(ErrorKind::IllegalColumn, "Unexpected physical storage")
        .with_field("want", format!("{want:?}"))
        .with_field("have", have.kind_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_storage_matches_variant() {
        let data = PhysicalI32::new_array_data(vec![1, 2, 3]);
        assert_eq!(&[1, 2, 3], PhysicalI32::get_storage(&data).unwrap());

        let err = PhysicalI64::get_storage(&data).unwrap_err();
        assert_eq!(ErrorKind::IllegalColumn, err.kind());
    }

    #[test]
    fn get_storage_mut_copies_shared_buffer() {
        let mut a = PhysicalI32::new_array_data(vec![1, 2, 3]);
        let b = a.clone();

        PhysicalI32::get_storage_mut(&mut a).unwrap()[0] = 9;

        assert_eq!(&[9, 2, 3], PhysicalI32::get_storage(&a).unwrap());
        assert_eq!(&[1, 2, 3], PhysicalI32::get_storage(&b).unwrap());
    }
}
