use std::fmt::{Debug, Display};

use colexec_error::{DbError, ErrorKind, Result};
use num_traits::{PrimInt, Signed, WrappingMul, Zero};

use crate::arrays::array::physical_type::{PhysicalI64, PhysicalI128, ScalarStorage};
use crate::arrays::datatype::{DataType, DecimalTypeMeta};

pub trait DecimalPrimitive: PrimInt + Signed + WrappingMul + Debug + Display + 'static {
    /// Returns the base 10 log of this number, rounded down.
    fn ilog10(self) -> u32;

    fn as_f64(self) -> f64;
}

impl DecimalPrimitive for i64 {
    fn ilog10(self) -> u32 {
        i64::ilog10(self)
    }

    fn as_f64(self) -> f64 {
        self as f64
    }
}

impl DecimalPrimitive for i128 {
    fn ilog10(self) -> u32 {
        i128::ilog10(self)
    }

    fn as_f64(self) -> f64 {
        self as f64
    }
}

pub trait DecimalType: Debug + Sync + Send + Copy + 'static {
    /// The underlying primitive type storing the decimal's value.
    type Primitive: DecimalPrimitive;

    /// Physical storage for arrays of this decimal.
    type Storage: ScalarStorage<StorageType = Self::Primitive>;

    /// Max precision for this decimal type.
    const MAX_PRECISION: u8;

    /// Wrap metadata in the matching data type.
    fn datatype_from_decimal_meta(meta: DecimalTypeMeta) -> DataType;

    /// Validates that the value is within the provided precision.
    fn validate_precision(value: Self::Primitive, precision: u8) -> Result<()> {
        if precision > Self::MAX_PRECISION {
            return Err(DbError::with_kind(
                ErrorKind::IllegalArgumentType,
                "Precision is greater than max precision",
            )
            .with_field("precision", precision)
            .with_field("max", Self::MAX_PRECISION));
        }

        if value.is_zero() {
            return Ok(());
        }

        let digits = value.abs().ilog10() + 1;
        if digits > precision as u32 {
            return Err(DbError::new(format!(
                "{value} cannot be stored in decimal with a precision of {precision}"
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal64Type;

impl DecimalType for Decimal64Type {
    type Primitive = i64;
    type Storage = PhysicalI64;
    const MAX_PRECISION: u8 = 18;

    fn datatype_from_decimal_meta(meta: DecimalTypeMeta) -> DataType {
        DataType::Decimal64(meta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal128Type;

impl DecimalType for Decimal128Type {
    type Primitive = i128;
    type Storage = PhysicalI128;
    const MAX_PRECISION: u8 = 38;

    fn datatype_from_decimal_meta(meta: DecimalTypeMeta) -> DataType {
        DataType::Decimal128(meta)
    }
}

/// Compute `10^exp` in the decimal's primitive, wrapping on overflow.
pub fn pow10<P: DecimalPrimitive>(exp: u32) -> P {
    let ten = P::from(10).unwrap_or_else(P::one);
    let mut out = P::one();
    for _ in 0..exp {
        out = out.wrapping_mul(&ten);
    }
    out
}

/// Represents a single decimal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalScalar<T: DecimalType> {
    pub precision: u8,
    pub scale: i8,
    pub value: T::Primitive,
}

pub type Decimal64Scalar = DecimalScalar<Decimal64Type>;
pub type Decimal128Scalar = DecimalScalar<Decimal128Type>;

impl<T: DecimalType> DecimalScalar<T> {
    /// Convert to a float, dividing by the scale.
    pub fn to_f64(&self) -> f64 {
        self.value.as_f64() / 10f64.powi(self.scale as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_precision() {
        Decimal64Type::validate_precision(222, 3).unwrap();
        Decimal64Type::validate_precision(222, 4).unwrap();
        Decimal64Type::validate_precision(0, 1).unwrap();

        Decimal64Type::validate_precision(222, 2).unwrap_err();
        Decimal64Type::validate_precision(222, 19).unwrap_err();
    }

    #[test]
    fn pow10_values() {
        assert_eq!(1_i64, pow10::<i64>(0));
        assert_eq!(1000_i64, pow10::<i64>(3));
        assert_eq!(10_i128.pow(20), pow10::<i128>(20));
    }

    #[test]
    fn scalar_to_f64() {
        let d = Decimal64Scalar {
            precision: 9,
            scale: 2,
            value: 12345,
        };
        assert_eq!(123.45, d.to_f64());
    }
}
