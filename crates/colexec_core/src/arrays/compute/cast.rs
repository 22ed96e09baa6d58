use colexec_error::{DbError, ErrorKind, Result};
use half::f16;

use crate::arrays::array::Array;
use crate::arrays::array::physical_type::{
    PhysicalF16,
    PhysicalF32,
    PhysicalF64,
    PhysicalI8,
    PhysicalI16,
    PhysicalI32,
    PhysicalI64,
    PhysicalI128,
    PhysicalType,
    PhysicalU8,
    PhysicalU16,
    PhysicalU32,
    PhysicalU64,
    ScalarStorage,
};
use crate::arrays::datatype::DataType;
use crate::arrays::executor::unary::UnaryExecutor;
use crate::arrays::scalar::decimal::pow10;

/// Conversions between native numeric types.
///
/// Integer conversions wrap, float to integer conversions saturate.
pub trait NativeCast: Copy + Default + 'static {
    fn from_i128(v: i128) -> Self;
    fn from_f64(v: f64) -> Self;
    fn to_i128(self) -> i128;
    fn to_f64(self) -> f64;
}

macro_rules! impl_native_cast {
    ($prim:ty) => {
        impl NativeCast for $prim {
            fn from_i128(v: i128) -> Self {
                v as $prim
            }

            fn from_f64(v: f64) -> Self {
                v as $prim
            }

            fn to_i128(self) -> i128 {
                self as i128
            }

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_native_cast!(i8);
impl_native_cast!(i16);
impl_native_cast!(i32);
impl_native_cast!(i64);
impl_native_cast!(i128);
impl_native_cast!(u8);
impl_native_cast!(u16);
impl_native_cast!(u32);
impl_native_cast!(u64);
impl_native_cast!(f32);
impl_native_cast!(f64);

impl NativeCast for f16 {
    fn from_i128(v: i128) -> Self {
        f16::from_f64(v as f64)
    }

    fn from_f64(v: f64) -> Self {
        f16::from_f64(v)
    }

    fn to_i128(self) -> i128 {
        f16::to_f64(self) as i128
    }

    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }
}

/// Cast a numeric array to another numeric type.
///
/// Decimal values are rescaled to the target scale. Validity is shared with
/// the input, and constant arrays stay constant.
pub fn cast_numeric_array(array: &Array, to: &DataType) -> Result<Array> {
    if array.datatype() == to {
        return Ok(array.clone());
    }

    if !array.datatype().is_numeric() || !to.is_numeric() {
        return Err(DbError::with_kind(
            ErrorKind::IllegalArgumentType,
            "Numeric cast requires numeric types",
        )
        .with_field("from", array.datatype())
        .with_field("to", to));
    }

    if let Some(value) = array.constant_value() {
        let casted = cast_numeric_array(value, to)?;
        return Array::new_constant(casted, array.len());
    }

    let casted = match array.datatype().physical_type() {
        PhysicalType::Int8 => cast_from::<PhysicalI8>(array, to)?,
        PhysicalType::Int16 => cast_from::<PhysicalI16>(array, to)?,
        PhysicalType::Int32 => cast_from::<PhysicalI32>(array, to)?,
        PhysicalType::Int64 => cast_from::<PhysicalI64>(array, to)?,
        PhysicalType::Int128 => cast_from::<PhysicalI128>(array, to)?,
        PhysicalType::UInt8 => cast_from::<PhysicalU8>(array, to)?,
        PhysicalType::UInt16 => cast_from::<PhysicalU16>(array, to)?,
        PhysicalType::UInt32 => cast_from::<PhysicalU32>(array, to)?,
        PhysicalType::UInt64 => cast_from::<PhysicalU64>(array, to)?,
        PhysicalType::Float16 => cast_from::<PhysicalF16>(array, to)?,
        PhysicalType::Float32 => cast_from::<PhysicalF32>(array, to)?,
        PhysicalType::Float64 => cast_from::<PhysicalF64>(array, to)?,
        other => {
            return Err(
                DbError::with_kind(ErrorKind::IllegalColumn, "Unexpected physical type for cast")
                    .with_field("physical_type", format!("{other:?}")),
            );
        }
    };

    casted.with_validity(array.validity().clone())
}

fn cast_from<S>(array: &Array, to: &DataType) -> Result<Array>
where
    S: ScalarStorage,
    S::StorageType: NativeCast,
{
    match to.physical_type() {
        PhysicalType::Int8 => cast_to::<S, PhysicalI8>(array, to),
        PhysicalType::Int16 => cast_to::<S, PhysicalI16>(array, to),
        PhysicalType::Int32 => cast_to::<S, PhysicalI32>(array, to),
        PhysicalType::Int64 => cast_to::<S, PhysicalI64>(array, to),
        PhysicalType::Int128 => cast_to::<S, PhysicalI128>(array, to),
        PhysicalType::UInt8 => cast_to::<S, PhysicalU8>(array, to),
        PhysicalType::UInt16 => cast_to::<S, PhysicalU16>(array, to),
        PhysicalType::UInt32 => cast_to::<S, PhysicalU32>(array, to),
        PhysicalType::UInt64 => cast_to::<S, PhysicalU64>(array, to),
        PhysicalType::Float16 => cast_to::<S, PhysicalF16>(array, to),
        PhysicalType::Float32 => cast_to::<S, PhysicalF32>(array, to),
        PhysicalType::Float64 => cast_to::<S, PhysicalF64>(array, to),
        other => Err(DbError::with_kind(
            ErrorKind::IllegalArgumentType,
            "Unexpected physical type for cast target",
        )
        .with_field("physical_type", format!("{other:?}"))),
    }
}

fn decimal_scale(datatype: &DataType) -> i32 {
    datatype.decimal_meta().map(|m| m.scale as i32).unwrap_or(0)
}

fn cast_to<S, T>(array: &Array, to: &DataType) -> Result<Array>
where
    S: ScalarStorage,
    S::StorageType: NativeCast,
    T: ScalarStorage,
    T::StorageType: NativeCast,
{
    let from = array.datatype();
    let from_scale = decimal_scale(from);
    let to_scale = decimal_scale(to);
    let datatype = to.clone();

    match (from.is_float(), to.is_float()) {
        (false, false) => {
            let diff = to_scale - from_scale;
            if diff >= 0 {
                let mul = pow10::<i128>(diff as u32);
                UnaryExecutor::execute_new::<S, T, _>(array, datatype, |&v, buf| {
                    let scaled = v.to_i128().wrapping_mul(mul);
                    buf.put(&<T::StorageType as NativeCast>::from_i128(scaled))
                })
            } else {
                let div = pow10::<i128>((-diff) as u32);
                UnaryExecutor::execute_new::<S, T, _>(array, datatype, |&v, buf| {
                    buf.put(&<T::StorageType as NativeCast>::from_i128(v.to_i128() / div))
                })
            }
        }
        (false, true) => {
            let div = 10f64.powi(from_scale);
            UnaryExecutor::execute_new::<S, T, _>(array, datatype, |&v, buf| {
                buf.put(&<T::StorageType as NativeCast>::from_f64(v.to_i128() as f64 / div))
            })
        }
        (true, false) => {
            let mul = 10f64.powi(to_scale);
            let round = to.is_decimal();
            UnaryExecutor::execute_new::<S, T, _>(array, datatype, |&v, buf| {
                let scaled = v.to_f64() * mul;
                let scaled = if round { scaled.round() } else { scaled };
                buf.put(&<T::StorageType as NativeCast>::from_f64(scaled))
            })
        }
        (true, true) => UnaryExecutor::execute_new::<S, T, _>(array, datatype, |&v, buf| {
            buf.put(&<T::StorageType as NativeCast>::from_f64(v.to_f64()))
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::arrays::array::array_data::ArrayData;
    use crate::arrays::array::validity::Validity;
    use crate::arrays::datatype::DecimalTypeMeta;
    use crate::arrays::testutil::assert_arrays_eq;

    #[test]
    fn int_to_wider_int() {
        let arr = Array::from_iter([Some(1_i32), None, Some(-3)]);
        let got = cast_numeric_array(&arr, &DataType::Int64).unwrap();

        assert_arrays_eq(&Array::from_iter([Some(1_i64), None, Some(-3)]), &got);
    }

    #[test]
    fn int_to_decimal_scales() {
        let arr = Array::from_iter([5_i32, -2]);
        let to = DataType::Decimal64(DecimalTypeMeta::new(12, 2));
        let got = cast_numeric_array(&arr, &to).unwrap();

        let expected = Array::new(to, PhysicalI64::new_array_data(vec![500, -200])).unwrap();
        assert_arrays_eq(&expected, &got);
    }

    #[test]
    fn decimal_to_float() {
        let arr = Array::new(
            DataType::Decimal64(DecimalTypeMeta::new(9, 2)),
            PhysicalI64::new_array_data(vec![150, -25]),
        )
        .unwrap();
        let got = cast_numeric_array(&arr, &DataType::Float64).unwrap();

        assert_arrays_eq(&Array::from_iter([1.5_f64, -0.25]), &got);
    }

    #[test]
    fn decimal_rescale_down() {
        let arr = Array::new(
            DataType::Decimal64(DecimalTypeMeta::new(9, 3)),
            PhysicalI64::new_array_data(vec![12345]),
        )
        .unwrap();
        let to = DataType::Decimal128(DecimalTypeMeta::new(20, 1));
        let got = cast_numeric_array(&arr, &to).unwrap();

        let expected = Array::new(to, PhysicalI128::new_array_data(vec![123])).unwrap();
        assert_arrays_eq(&expected, &got);
    }

    #[test]
    fn float16_to_float32() {
        let arr = Array::from_iter([f16::from_f32(1.5)]);
        let got = cast_numeric_array(&arr, &DataType::Float32).unwrap();

        assert_arrays_eq(&Array::from_iter([1.5_f32]), &got);
    }

    #[test]
    fn constant_stays_constant() {
        let arr = Array::new_constant(Array::from_iter([2_i16]), 5).unwrap();
        let got = cast_numeric_array(&arr, &DataType::Float64).unwrap();

        assert!(got.is_constant());
        assert_arrays_eq(&Array::from_iter([2.0_f64; 5]), &got);
    }

    #[test]
    fn validity_shared_with_input() {
        let validity = Validity::from_iter([true, false]);
        let arr = Array::try_new(
            DataType::Int32,
            validity,
            ArrayData::Int32(Arc::new(vec![1, 2])),
        )
        .unwrap();
        let got = cast_numeric_array(&arr, &DataType::Int64).unwrap();

        assert_eq!(arr.validity(), got.validity());
    }

    #[test]
    fn string_cast_rejected() {
        let arr = Array::from_iter(["a"]);
        let err = cast_numeric_array(&arr, &DataType::Int64).unwrap_err();
        assert_eq!(ErrorKind::IllegalArgumentType, err.kind());
    }
}
