use std::fmt;

use colexec_error::{DbError, ErrorKind, Result};

use crate::arrays::array::Array;
use crate::arrays::datatype::DataType;

/// Kernel executing a function over already checked inputs.
pub type Kernel = dyn Fn(&[Array], usize) -> Result<Array> + Sync + Send;

/// A function specialized for a fixed set of argument types.
///
/// The kernel is selected once when compiling. Executing only checks that the
/// inputs still have the types it was compiled for.
pub struct CompiledFunction {
    name: &'static str,
    input_types: Vec<DataType>,
    return_type: DataType,
    kernel: Box<Kernel>,
}

impl CompiledFunction {
    pub fn new(
        name: &'static str,
        input_types: Vec<DataType>,
        return_type: DataType,
        kernel: Box<Kernel>,
    ) -> Self {
        CompiledFunction {
            name,
            input_types,
            return_type,
            kernel,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn input_types(&self) -> &[DataType] {
        &self.input_types
    }

    pub fn return_type(&self) -> &DataType {
        &self.return_type
    }

    pub fn execute(&self, inputs: &[Array], num_rows: usize) -> Result<Array> {
        if inputs.len() != self.input_types.len() {
            return Err(DbError::with_kind(
                ErrorKind::ArgumentCountMismatch,
                "Wrong number of arguments for compiled function",
            )
            .with_field("function", self.name)
            .with_field("expected", self.input_types.len())
            .with_field("got", inputs.len()));
        }

        for (input, datatype) in inputs.iter().zip(&self.input_types) {
            if input.datatype() != datatype {
                return Err(DbError::with_kind(
                    ErrorKind::IllegalColumn,
                    "Argument type differs from compiled type",
                )
                .with_field("function", self.name)
                .with_field("expected", datatype)
                .with_field("got", input.datatype()));
            }
            if input.len() != num_rows {
                return Err(DbError::with_kind(
                    ErrorKind::SizeMismatch,
                    "Function argument has the wrong number of rows",
                )
                .with_field("function", self.name)
                .with_field("expected", num_rows)
                .with_field("got", input.len()));
            }
        }

        (self.kernel)(inputs, num_rows)
    }
}

impl fmt::Debug for CompiledFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledFunction")
            .field("name", &self.name)
            .field("input_types", &self.input_types)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}
