pub mod decimal;

use std::fmt;

use decimal::{Decimal64Scalar, Decimal128Scalar};
use half::f16;

/// A single logical value read out of an array.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float16(f16),
    Float32(f32),
    Float64(f64),
    Decimal64(Decimal64Scalar),
    Decimal128(Decimal128Scalar),
    Utf8(String),
    Binary(Vec<u8>),
    List(Vec<ScalarValue>),
    Struct(Vec<ScalarValue>),
}

impl ScalarValue {
    pub const fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Compare two values for bit-identical equality.
    ///
    /// Unlike `PartialEq`, floats are compared by their bit patterns so NaN is
    /// identical to itself and `0.0` differs from `-0.0`.
    pub fn is_identical(&self, other: &ScalarValue) -> bool {
        match (self, other) {
            (Self::Float16(a), Self::Float16(b)) => a.to_bits() == b.to_bits(),
            (Self::Float32(a), Self::Float32(b)) => a.to_bits() == b.to_bits(),
            (Self::Float64(a), Self::Float64(b)) => a.to_bits() == b.to_bits(),
            (Self::List(a), Self::List(b)) | (Self::Struct(a), Self::Struct(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a.is_identical(b))
            }
            (a, b) => a == b,
        }
    }
}

macro_rules! impl_from_primitive {
    ($prim:ty, $variant:ident) => {
        impl From<$prim> for ScalarValue {
            fn from(value: $prim) -> Self {
                ScalarValue::$variant(value)
            }
        }
    };
}

impl_from_primitive!(i8, Int8);
impl_from_primitive!(i16, Int16);
impl_from_primitive!(i32, Int32);
impl_from_primitive!(i64, Int64);
impl_from_primitive!(i128, Int128);
impl_from_primitive!(u8, UInt8);
impl_from_primitive!(u16, UInt16);
impl_from_primitive!(u32, UInt32);
impl_from_primitive!(u64, UInt64);
impl_from_primitive!(f16, Float16);
impl_from_primitive!(f32, Float32);
impl_from_primitive!(f64, Float64);

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => ScalarValue::Null,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Int128(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float16(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Decimal64(v) => write!(f, "{}", v.to_f64()),
            Self::Decimal128(v) => write!(f, "{}", v.to_f64()),
            Self::Utf8(v) => write!(f, "{v}"),
            Self::Binary(v) => write!(f, "{v:?}"),
            Self::List(vals) => {
                write!(f, "[")?;
                for (idx, v) in vals.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Self::Struct(vals) => {
                write!(f, "{{")?;
                for (idx, v) in vals.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
