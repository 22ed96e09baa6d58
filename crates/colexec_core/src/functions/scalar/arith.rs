use std::fmt::Debug;
use std::marker::PhantomData;

use colexec_error::{DbError, ErrorKind, Result};
use half::f16;
use tracing::trace;

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
use crate::arrays::compute::cast::{NativeCast, cast_numeric_array};
use crate::arrays::datatype::{DataType, DecimalTypeMeta};
use crate::arrays::executor::binary::BinaryExecutor;
use crate::functions::compile::CompiledFunction;
use crate::functions::promotion::{ArithKind, decimal_meta_for, promote_binary};
use crate::functions::{ScalarFunction, illegal_column_error, invalid_input_types_error};

/// Native arithmetic on a physical type.
///
/// Integers wrap on overflow and produce zero when divided by zero. Floats
/// follow IEEE semantics.
pub trait ArithNative: NativeCast + Debug + PartialEq + Sync + Send {
    fn add_native(self, rhs: Self) -> Self;
    fn sub_native(self, rhs: Self) -> Self;
    fn mul_native(self, rhs: Self) -> Self;
    fn div_native(self, rhs: Self) -> Self;
}

macro_rules! impl_arith_native_int {
    ($prim:ty) => {
        impl ArithNative for $prim {
            fn add_native(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            fn sub_native(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            fn mul_native(self, rhs: Self) -> Self {
                self.wrapping_mul(rhs)
            }

            fn div_native(self, rhs: Self) -> Self {
                if rhs == 0 { 0 } else { self.wrapping_div(rhs) }
            }
        }
    };
}

macro_rules! impl_arith_native_float {
    ($prim:ty) => {
        impl ArithNative for $prim {
            fn add_native(self, rhs: Self) -> Self {
                self + rhs
            }

            fn sub_native(self, rhs: Self) -> Self {
                self - rhs
            }

            fn mul_native(self, rhs: Self) -> Self {
                self * rhs
            }

            fn div_native(self, rhs: Self) -> Self {
                self / rhs
            }
        }
    };
}

impl_arith_native_int!(i8);
impl_arith_native_int!(i16);
impl_arith_native_int!(i32);
impl_arith_native_int!(i64);
impl_arith_native_int!(i128);
impl_arith_native_int!(u8);
impl_arith_native_int!(u16);
impl_arith_native_int!(u32);
impl_arith_native_int!(u64);
impl_arith_native_float!(f16);
impl_arith_native_float!(f32);
impl_arith_native_float!(f64);

/// A binary arithmetic operation applied after both operands have been cast
/// to a common physical type.
pub trait ArithOperation: Debug + Default + Clone + Copy + Sync + Send + 'static {
    const NAME: &'static str;
    const ALIASES: &'static [&'static str];
    const KIND: ArithKind;

    fn apply<T: ArithNative>(left: T, right: T) -> T;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AddOp;

impl ArithOperation for AddOp {
    const NAME: &'static str = "plus";
    const ALIASES: &'static [&'static str] = &["+"];
    const KIND: ArithKind = ArithKind::Add;

    fn apply<T: ArithNative>(left: T, right: T) -> T {
        left.add_native(right)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SubOp;

impl ArithOperation for SubOp {
    const NAME: &'static str = "minus";
    const ALIASES: &'static [&'static str] = &["-"];
    const KIND: ArithKind = ArithKind::Sub;

    fn apply<T: ArithNative>(left: T, right: T) -> T {
        left.sub_native(right)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MulOp;

impl ArithOperation for MulOp {
    const NAME: &'static str = "multiply";
    const ALIASES: &'static [&'static str] = &["*"];
    const KIND: ArithKind = ArithKind::Mul;

    fn apply<T: ArithNative>(left: T, right: T) -> T {
        left.mul_native(right)
    }
}

/// Floating point division. Operands are cast to the float result type
/// before dividing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DivOp;

impl ArithOperation for DivOp {
    const NAME: &'static str = "divide";
    const ALIASES: &'static [&'static str] = &["/"];
    const KIND: ArithKind = ArithKind::Div;

    fn apply<T: ArithNative>(left: T, right: T) -> T {
        left.div_native(right)
    }
}

type ArithKernel = fn(&Array, &Array, DataType) -> Result<Array>;

fn arith_kernel<O, S>(left: &Array, right: &Array, datatype: DataType) -> Result<Array>
where
    O: ArithOperation,
    S: ScalarStorage,
    S::StorageType: ArithNative,
{
    BinaryExecutor::execute_new::<S, S, S, _>(left, right, datatype, |&a, &b, buf| {
        buf.put(&O::apply(a, b))
    })
}

/// Select the kernel for operands and results of the given physical type.
fn select_kernel<O: ArithOperation>(physical: PhysicalType) -> Result<ArithKernel> {
    let kernel: ArithKernel = match physical {
        PhysicalType::Int8 => arith_kernel::<O, PhysicalI8>,
        PhysicalType::Int16 => arith_kernel::<O, PhysicalI16>,
        PhysicalType::Int32 => arith_kernel::<O, PhysicalI32>,
        PhysicalType::Int64 => arith_kernel::<O, PhysicalI64>,
        PhysicalType::Int128 => arith_kernel::<O, PhysicalI128>,
        PhysicalType::UInt8 => arith_kernel::<O, PhysicalU8>,
        PhysicalType::UInt16 => arith_kernel::<O, PhysicalU16>,
        PhysicalType::UInt32 => arith_kernel::<O, PhysicalU32>,
        PhysicalType::UInt64 => arith_kernel::<O, PhysicalU64>,
        PhysicalType::Float16 => arith_kernel::<O, PhysicalF16>,
        PhysicalType::Float32 => arith_kernel::<O, PhysicalF32>,
        PhysicalType::Float64 => arith_kernel::<O, PhysicalF64>,
        other => {
            return Err(DbError::with_kind(
                ErrorKind::IllegalArgumentType,
                "No arithmetic kernel for physical type",
            )
            .with_field("function", O::NAME)
            .with_field("physical_type", format!("{other:?}")));
        }
    };
    Ok(kernel)
}

/// Type an operand is cast to before applying the operation.
///
/// Decimal multiplication keeps each operand's scale so that the raw product
/// has the scale of the result. Everything else is cast to the result type.
fn operand_type(kind: ArithKind, operand: &DataType, result: &DataType) -> DataType {
    match result {
        DataType::Decimal64(m) | DataType::Decimal128(m) if kind == ArithKind::Mul => {
            let scale = decimal_meta_for(operand).map(|o| o.scale).unwrap_or(0);
            let meta = DecimalTypeMeta::new(m.precision, scale);
            match result {
                DataType::Decimal64(_) => DataType::Decimal64(meta),
                _ => DataType::Decimal128(meta),
            }
        }
        _ => result.clone(),
    }
}

/// Binary arithmetic over numeric columns with type promotion.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryArithmetic<O: ArithOperation> {
    _op: PhantomData<O>,
}

impl<O: ArithOperation> BinaryArithmetic<O> {
    pub const fn new() -> Self {
        BinaryArithmetic { _op: PhantomData }
    }
}

impl<O: ArithOperation> ScalarFunction for BinaryArithmetic<O> {
    fn name(&self) -> &'static str {
        O::NAME
    }

    fn aliases(&self) -> &'static [&'static str] {
        O::ALIASES
    }

    fn arity(&self) -> usize {
        2
    }

    fn return_type_impl(&self, inputs: &[DataType]) -> Result<DataType> {
        promote_binary(O::KIND, &inputs[0], &inputs[1])
            .map_err(|_| invalid_input_types_error(self, inputs))
    }

    fn execute_impl(&self, inputs: &[Array], _num_rows: usize) -> Result<Array> {
        for input in inputs {
            if !input.data().physical_type().is_primitive() {
                return Err(illegal_column_error(self, input));
            }
        }

        let (left, right) = (&inputs[0], &inputs[1]);
        let result = self.return_type_impl(&[left.datatype().clone(), right.datatype().clone()])?;

        let left = cast_numeric_array(left, &operand_type(O::KIND, left.datatype(), &result))?;
        let right = cast_numeric_array(right, &operand_type(O::KIND, right.datatype(), &result))?;

        let kernel = select_kernel::<O>(result.physical_type())?;
        kernel(&left, &right, result)
    }

    fn is_compilable(&self, inputs: &[DataType]) -> bool {
        inputs.len() == 2
            && inputs
                .iter()
                .all(|t| t.is_numeric() && !t.is_decimal())
    }

    fn compile(&self, inputs: &[DataType]) -> Result<CompiledFunction> {
        if !self.is_compilable(inputs) {
            return Err(invalid_input_types_error(self, inputs));
        }

        let result = self.return_type(inputs)?;
        let left_type = operand_type(O::KIND, &inputs[0], &result);
        let right_type = operand_type(O::KIND, &inputs[1], &result);
        let kernel = select_kernel::<O>(result.physical_type())?;

        trace!(function = O::NAME, %result, "compiled arithmetic kernel");

        let return_type = result.clone();
        Ok(CompiledFunction::new(
            O::NAME,
            inputs.to_vec(),
            result,
            Box::new(move |inputs, _num_rows| {
                let left = cast_numeric_array(&inputs[0], &left_type)?;
                let right = cast_numeric_array(&inputs[1], &right_type)?;
                kernel(&left, &right, return_type.clone())
            }),
        ))
    }
}
