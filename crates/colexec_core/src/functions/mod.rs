pub mod compile;
pub mod executor;
pub mod promotion;
pub mod registry;
pub mod scalar;

use std::fmt::Debug;

use colexec_error::{DbError, ErrorKind, Result, not_implemented};
use tracing::trace;

use crate::arrays::array::Array;
use crate::arrays::block::Block;
use crate::arrays::datatype::DataType;
use compile::CompiledFunction;

/// A function producing one output value per input row.
///
/// Implementations provide the `*_impl` methods. Callers should go through
/// `return_type` and `execute` which check the number of arguments and row
/// counts first, and handle constant arguments.
pub trait ScalarFunction: Debug + Sync + Send {
    /// Name used to look up this function.
    fn name(&self) -> &'static str;

    /// Other names this function may be looked up by.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Number of arguments this function accepts.
    fn arity(&self) -> usize;

    /// Compute the return type from the argument types.
    ///
    /// Argument count has already been checked.
    fn return_type_impl(&self, inputs: &[DataType]) -> Result<DataType>;

    /// Execute the function over `num_rows` rows.
    ///
    /// Argument count and lengths have already been checked. Implementations
    /// must check the physical column kind of each input and return an
    /// `IllegalColumn` error for kinds they don't handle.
    fn execute_impl(&self, inputs: &[Array], num_rows: usize) -> Result<Array>;

    /// If true, calls where every argument is constant are executed on a
    /// single row and the result broadcast back out as a constant.
    ///
    /// If false, constant arrays are passed to `execute_impl` as is.
    fn use_default_implementation_for_constants(&self) -> bool {
        true
    }

    /// If `compile` can produce a kernel for these argument types.
    fn is_compilable(&self, _inputs: &[DataType]) -> bool {
        false
    }

    /// Produce a kernel specialized for the argument types.
    fn compile(&self, inputs: &[DataType]) -> Result<CompiledFunction> {
        not_implemented!(
            "compiling {} for {}",
            self.name(),
            display_types(inputs)
        )
    }

    fn return_type(&self, inputs: &[DataType]) -> Result<DataType> {
        check_num_args(self, inputs.len())?;
        self.return_type_impl(inputs)
    }

    fn execute(&self, inputs: &[Array], num_rows: usize) -> Result<Array> {
        check_num_args(self, inputs.len())?;
        check_input_lengths(self, inputs, num_rows)?;

        if self.use_default_implementation_for_constants()
            && !inputs.is_empty()
            && inputs.iter().all(|input| input.is_constant())
        {
            trace!(function = self.name(), "executing on constant arguments");

            let values = inputs
                .iter()
                .map(|input| match input.constant_value() {
                    Some(value) => Ok(value.clone()),
                    None => Err(DbError::new("Expected constant argument")),
                })
                .collect::<Result<Vec<_>>>()?;

            let out = self.execute_impl(&values, 1)?;
            return Array::new_constant(out, num_rows);
        }

        let out = self.execute_impl(inputs, num_rows)?;
        if out.len() != num_rows {
            return Err(DbError::with_kind(
                ErrorKind::SizeMismatch,
                "Function produced the wrong number of rows",
            )
            .with_field("function", self.name())
            .with_field("expected", num_rows)
            .with_field("got", out.len()));
        }

        Ok(out)
    }
}

/// Execute a function on columns of a block, writing the result to the
/// column at `result`.
///
/// The result column is typically reserved with `Block::insert_placeholder`
/// and must have the function's return type.
pub fn execute_on_block(
    func: &dyn ScalarFunction,
    block: &mut Block,
    arguments: &[usize],
    result: usize,
) -> Result<()> {
    let inputs = collect_arguments(block, arguments)?;
    let out = func.execute(&inputs, block.num_rows())?;
    block.set_column(result, out)
}

pub(crate) fn collect_arguments(block: &Block, arguments: &[usize]) -> Result<Vec<Array>> {
    arguments
        .iter()
        .map(|&idx| block.try_column(idx).map(|c| c.array.clone()))
        .collect()
}

/// Check the number of arguments passed to a function.
pub fn check_num_args<F>(func: &F, have: usize) -> Result<()>
where
    F: ScalarFunction + ?Sized,
{
    if have != func.arity() {
        return Err(DbError::with_kind(
            ErrorKind::ArgumentCountMismatch,
            format!(
                "Number of arguments for function {} doesn't match: passed {have}, should be {}",
                func.name(),
                func.arity()
            ),
        )
        .with_field("function", func.name())
        .with_field("expected", func.arity())
        .with_field("got", have));
    }
    Ok(())
}

fn check_input_lengths<F>(func: &F, inputs: &[Array], num_rows: usize) -> Result<()>
where
    F: ScalarFunction + ?Sized,
{
    for (idx, input) in inputs.iter().enumerate() {
        if input.len() != num_rows {
            return Err(DbError::with_kind(
                ErrorKind::SizeMismatch,
                "Function argument has the wrong number of rows",
            )
            .with_field("function", func.name())
            .with_field("argument", idx)
            .with_field("expected", num_rows)
            .with_field("got", input.len()));
        }
    }
    Ok(())
}

/// Return an error indicating the argument types aren't supported by the
/// function.
pub fn invalid_input_types_error<F>(func: &F, got: &[DataType]) -> DbError
where
    F: ScalarFunction + ?Sized,
{
    let types = display_types(got);
    DbError::with_kind(
        ErrorKind::IllegalArgumentType,
        format!(
            "Illegal types {types} of arguments of function {}",
            func.name()
        ),
    )
    .with_field("function", func.name())
    .with_field("types", types)
}

/// Return an error indicating the column kind isn't handled by the function.
pub fn illegal_column_error<F>(func: &F, column: &Array) -> DbError
where
    F: ScalarFunction + ?Sized,
{
    DbError::with_kind(
        ErrorKind::IllegalColumn,
        format!(
            "Illegal column {} of argument of function {}",
            column.data().kind_name(),
            func.name()
        ),
    )
    .with_field("function", func.name())
    .with_field("column", column.data().kind_name())
    .with_field("datatype", column.datatype())
}

fn display_types(types: &[DataType]) -> String {
    let types: Vec<_> = types.iter().map(|t| t.to_string()).collect();
    format!("({})", types.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrays::testutil::assert_arrays_eq;
    use crate::functions::scalar::arith::{AddOp, BinaryArithmetic};
    use crate::functions::scalar::string_or_array::{LengthOp, StringOrArrayToScalar};

    #[test]
    fn execute_on_block_placeholder() {
        let mut block = Block::try_from_arrays([
            ("a", Array::from_iter([1_i8, 2])),
            ("b", Array::from_iter([3_i8, 4])),
        ])
        .unwrap();

        let func = BinaryArithmetic::<AddOp>::new();
        let datatype = func.return_type(&[DataType::Int8, DataType::Int8]).unwrap();
        let result = block.insert_placeholder("a + b", &datatype).unwrap();

        execute_on_block(&func, &mut block, &[0, 1], result).unwrap();
        assert_arrays_eq(
            &Array::from_iter([4_i16, 6]),
            &block.column(result).unwrap().array,
        );
    }

    #[test]
    fn execute_on_block_missing_argument() {
        let mut block = Block::try_from_arrays([("s", Array::from_iter(["a"]))]).unwrap();
        let result = block.insert_placeholder("out", &DataType::Int64).unwrap();

        let func = StringOrArrayToScalar::<LengthOp>::new();
        execute_on_block(&func, &mut block, &[5], result).unwrap_err();
    }

    #[test]
    fn wrong_row_count() {
        let func = StringOrArrayToScalar::<LengthOp>::new();
        let err = func
            .execute(&[Array::from_iter(["a", "b"])], 3)
            .unwrap_err();
        assert_eq!(ErrorKind::SizeMismatch, err.kind());
    }

    #[test]
    fn illegal_column_message() {
        let func = BinaryArithmetic::<AddOp>::new();
        let err = illegal_column_error(&func, &Array::from_iter(["a"]));
        assert_eq!(
            "Illegal column ColumnVarlen of argument of function plus",
            err.get_msg()
        );
    }
}
