//! Result types of binary arithmetic.
//!
//! Every function here is a pure function of the operand types.
//!
//! Integers widen to the next size up from the widest operand so that the
//! result of a single operation can't overflow (capped at Int128 for signed
//! and UInt64 for unsigned results). The result is signed if either operand
//! is signed, and always signed for subtraction. Mixing an integer with a
//! float gives a float of the next size up, capped at Float64. Decimals
//! follow precision/scale rules, integers combined with decimals are treated
//! as decimals with a scale of zero. Division always produces a float.

use colexec_error::{DbError, ErrorKind, Result};

use crate::arrays::datatype::{DataType, DecimalTypeMeta};
use crate::arrays::scalar::decimal::{Decimal128Type, DecimalType};

/// Kind of binary arithmetic operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithKind {
    Add,
    Sub,
    Mul,
    Div,
}

/// Compute the result type of applying `kind` to `left` and `right`.
pub fn promote_binary(kind: ArithKind, left: &DataType, right: &DataType) -> Result<DataType> {
    if !left.is_numeric() || !right.is_numeric() {
        return Err(DbError::with_kind(
            ErrorKind::IllegalArgumentType,
            "Arithmetic requires numeric operands",
        )
        .with_field("left", left)
        .with_field("right", right));
    }

    match kind {
        ArithKind::Div => Ok(result_of_floating_point_division(left, right)),
        ArithKind::Add | ArithKind::Sub | ArithKind::Mul => {
            if left.is_decimal() || right.is_decimal() {
                if left.is_float() || right.is_float() {
                    return Ok(DataType::Float64);
                }
                return result_of_decimal(kind, left, right);
            }

            let signed = kind == ArithKind::Sub || is_signed(left) || is_signed(right);
            let float = left.is_float() || right.is_float();
            let width = max_width(left, right);

            Ok(construct(signed, float, next_size(width)))
        }
    }
}

/// Division produces Float32 only when both operands are floats of at most
/// four bytes, and Float64 otherwise.
pub fn result_of_floating_point_division(left: &DataType, right: &DataType) -> DataType {
    if left.is_float() && right.is_float() && max_width(left, right) <= 4 {
        DataType::Float32
    } else {
        DataType::Float64
    }
}

fn is_signed(datatype: &DataType) -> bool {
    datatype.is_signed_integer() || datatype.is_float()
}

fn max_width(left: &DataType, right: &DataType) -> usize {
    let l = left.byte_width().unwrap_or(8);
    let r = right.byte_width().unwrap_or(8);
    l.max(r)
}

fn next_size(width: usize) -> usize {
    (width * 2).min(16)
}

fn construct(signed: bool, float: bool, width: usize) -> DataType {
    if float {
        return if width <= 4 {
            DataType::Float32
        } else {
            DataType::Float64
        };
    }

    match (signed, width) {
        (true, 2) => DataType::Int16,
        (true, 4) => DataType::Int32,
        (true, 8) => DataType::Int64,
        (true, _) => DataType::Int128,
        (false, 2) => DataType::UInt16,
        (false, 4) => DataType::UInt32,
        (false, _) => DataType::UInt64,
    }
}

/// Get decimal metadata for a decimal or integer type.
///
/// Integers get a precision wide enough for every value of the type.
pub fn decimal_meta_for(datatype: &DataType) -> Option<DecimalTypeMeta> {
    let precision = match datatype {
        DataType::Decimal64(m) | DataType::Decimal128(m) => return Some(*m),
        DataType::Int8 | DataType::UInt8 => 3,
        DataType::Int16 | DataType::UInt16 => 5,
        DataType::Int32 | DataType::UInt32 => 10,
        DataType::Int64 => 19,
        DataType::UInt64 => 20,
        DataType::Int128 => 38,
        _ => return None,
    };
    Some(DecimalTypeMeta::new(precision, 0))
}

fn result_of_decimal(kind: ArithKind, left: &DataType, right: &DataType) -> Result<DataType> {
    let (l, r) = match (decimal_meta_for(left), decimal_meta_for(right)) {
        (Some(l), Some(r)) => (l, r),
        _ => {
            return Err(DbError::with_kind(
                ErrorKind::IllegalArgumentType,
                "Decimal arithmetic requires decimal or integer operands",
            )
            .with_field("left", left)
            .with_field("right", right));
        }
    };

    let max_precision = Decimal128Type::MAX_PRECISION as i32;
    let (p1, s1) = (l.precision as i32, l.scale as i32);
    let (p2, s2) = (r.precision as i32, r.scale as i32);

    let (precision, scale) = match kind {
        ArithKind::Add | ArithKind::Sub => {
            let scale = s1.max(s2);
            let precision = (p1 - s1).max(p2 - s2) + scale + 1;
            (precision, scale)
        }
        ArithKind::Mul => (p1 + p2, s1 + s2),
        ArithKind::Div => return Ok(DataType::Float64),
    };

    if scale > max_precision {
        return Err(DbError::with_kind(
            ErrorKind::IllegalArgumentType,
            "Decimal result scale exceeds max precision",
        )
        .with_field("scale", scale)
        .with_field("max", max_precision)
        .with_field("left", left)
        .with_field("right", right));
    }

    DataType::decimal(precision.min(max_precision) as u8, scale as i8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn promote(kind: ArithKind, left: DataType, right: DataType) -> DataType {
        promote_binary(kind, &left, &right).unwrap()
    }

    #[test]
    fn integer_widening() {
        assert_eq!(
            DataType::Int64,
            promote(ArithKind::Mul, DataType::Int32, DataType::Int32)
        );
        assert_eq!(
            DataType::Int16,
            promote(ArithKind::Add, DataType::Int8, DataType::Int8)
        );
        assert_eq!(
            DataType::UInt32,
            promote(ArithKind::Add, DataType::UInt16, DataType::UInt8)
        );
        assert_eq!(
            DataType::Int128,
            promote(ArithKind::Add, DataType::Int64, DataType::UInt32)
        );
        assert_eq!(
            DataType::UInt64,
            promote(ArithKind::Mul, DataType::UInt64, DataType::UInt64)
        );
        assert_eq!(
            DataType::Int128,
            promote(ArithKind::Add, DataType::Int128, DataType::Int8)
        );
    }

    #[test]
    fn subtraction_is_signed() {
        assert_eq!(
            DataType::Int16,
            promote(ArithKind::Sub, DataType::UInt8, DataType::UInt8)
        );
        assert_eq!(
            DataType::Int128,
            promote(ArithKind::Sub, DataType::UInt64, DataType::UInt64)
        );
    }

    #[test]
    fn float_promotion() {
        assert_eq!(
            DataType::Float64,
            promote(ArithKind::Add, DataType::Int32, DataType::Float32)
        );
        assert_eq!(
            DataType::Float32,
            promote(ArithKind::Add, DataType::Float16, DataType::Float16)
        );
        assert_eq!(
            DataType::Float64,
            promote(ArithKind::Mul, DataType::Float64, DataType::Int128)
        );
    }

    #[test]
    fn division_is_floating() {
        assert_eq!(
            DataType::Float64,
            promote(ArithKind::Div, DataType::Int32, DataType::Int32)
        );
        assert_eq!(
            DataType::Float64,
            promote(ArithKind::Div, DataType::Int32, DataType::Float32)
        );
        assert_eq!(
            DataType::Float32,
            promote(ArithKind::Div, DataType::Float32, DataType::Float16)
        );
        assert_eq!(
            DataType::Float64,
            promote(
                ArithKind::Div,
                DataType::decimal(9, 2).unwrap(),
                DataType::Float64
            )
        );
        assert_eq!(
            DataType::Float64,
            promote(
                ArithKind::Div,
                DataType::decimal(9, 2).unwrap(),
                DataType::decimal(9, 2).unwrap()
            )
        );
    }

    #[test]
    fn decimal_add() {
        assert_eq!(
            DataType::decimal(11, 3).unwrap(),
            promote(
                ArithKind::Add,
                DataType::decimal(9, 2).unwrap(),
                DataType::decimal(10, 3).unwrap()
            )
        );
        // Int32 is decimal(10, 0).
        assert_eq!(
            DataType::decimal(13, 2).unwrap(),
            promote(
                ArithKind::Sub,
                DataType::decimal(9, 2).unwrap(),
                DataType::Int32
            )
        );
    }

    #[test]
    fn decimal_mul() {
        assert_eq!(
            DataType::decimal(19, 5).unwrap(),
            promote(
                ArithKind::Mul,
                DataType::decimal(9, 2).unwrap(),
                DataType::decimal(10, 3).unwrap()
            )
        );
        assert_eq!(
            DataType::decimal(38, 10).unwrap(),
            promote(
                ArithKind::Mul,
                DataType::decimal(30, 5).unwrap(),
                DataType::decimal(30, 5).unwrap()
            )
        );

        let err = promote_binary(
            ArithKind::Mul,
            &DataType::decimal(38, 20).unwrap(),
            &DataType::decimal(38, 20).unwrap(),
        )
        .unwrap_err();
        assert_eq!(ErrorKind::IllegalArgumentType, err.kind());
    }

    #[test]
    fn decimal_with_float() {
        assert_eq!(
            DataType::Float64,
            promote(
                ArithKind::Add,
                DataType::decimal(9, 2).unwrap(),
                DataType::Float32
            )
        );
    }

    #[test]
    fn non_numeric_rejected() {
        let err = promote_binary(ArithKind::Add, &DataType::Utf8, &DataType::Int32).unwrap_err();
        assert_eq!(ErrorKind::IllegalArgumentType, err.kind());
    }

    #[test]
    fn promotion_is_deterministic() {
        let types = [
            DataType::Int8,
            DataType::UInt16,
            DataType::Int64,
            DataType::UInt64,
            DataType::Float16,
            DataType::Float64,
            DataType::decimal(9, 2).unwrap(),
            DataType::decimal(20, 4).unwrap(),
        ];
        for kind in [ArithKind::Add, ArithKind::Sub, ArithKind::Mul, ArithKind::Div] {
            for l in &types {
                for r in &types {
                    let a = promote_binary(kind, l, r).unwrap();
                    let b = promote_binary(kind, l, r).unwrap();
                    assert_eq!(a, b);
                }
            }
        }
    }
}
