use std::sync::Arc;

use colexec_error::{DbError, Result};
use tracing::trace;

use super::registry::FunctionRegistry;
use super::{ScalarFunction, collect_arguments};
use crate::arrays::array::Array;
use crate::arrays::block::Block;
use crate::arrays::datatype::DataType;
use crate::config::ExecutionConfig;

/// Resolves functions by name and executes them over blocks, using compiled
/// kernels when enabled.
#[derive(Debug, Clone)]
pub struct FunctionExecutor {
    registry: Arc<FunctionRegistry>,
    config: ExecutionConfig,
}

impl FunctionExecutor {
    pub fn new(registry: Arc<FunctionRegistry>, config: ExecutionConfig) -> Self {
        FunctionExecutor { registry, config }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn return_type(&self, name: &str, inputs: &[DataType]) -> Result<DataType> {
        self.registry.get(name)?.return_type(inputs)
    }

    /// Execute the function `name` on the `arguments` columns of `block`,
    /// writing the output into column `result`.
    pub fn execute(
        &self,
        name: &str,
        block: &mut Block,
        arguments: &[usize],
        result: usize,
    ) -> Result<()> {
        let func = self.registry.get(name)?;
        let inputs = collect_arguments(block, arguments)?;
        let out = self.execute_arrays(func.as_ref(), &inputs, block.num_rows())?;
        block.set_column(result, out)
    }

    /// Execute a function on arrays directly.
    pub fn execute_arrays(
        &self,
        func: &dyn ScalarFunction,
        inputs: &[Array],
        num_rows: usize,
    ) -> Result<Array> {
        let types: Vec<_> = inputs.iter().map(|a| a.datatype().clone()).collect();

        if !self.config.compile_expressions || !func.is_compilable(&types) {
            return func.execute(inputs, num_rows);
        }

        trace!(function = func.name(), "using compiled kernel");
        let compiled = func.compile(&types)?;
        let out = compiled.execute(inputs, num_rows)?;

        if self.config.verify_compiled_kernels {
            let expected = func.execute(inputs, num_rows)?;
            verify_same(func.name(), &expected, &out)?;
        }

        Ok(out)
    }
}

fn verify_same(name: &str, expected: &Array, got: &Array) -> Result<()> {
    if expected.datatype() != got.datatype() || expected.len() != got.len() {
        return Err(
            DbError::new("Compiled kernel output differs from interpreted output")
                .with_field("function", name)
                .with_field("expected_type", expected.datatype())
                .with_field("got_type", got.datatype()),
        );
    }

    for row in 0..expected.len() {
        let a = expected.logical_value(row)?;
        let b = got.logical_value(row)?;
        if !a.is_identical(&b) {
            return Err(
                DbError::new("Compiled kernel output differs from interpreted output")
                    .with_field("function", name)
                    .with_field("row", row)
                    .with_field("expected", a)
                    .with_field("got", b),
            );
        }
    }

    Ok(())
}
