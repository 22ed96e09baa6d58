pub mod arith;
pub mod string_or_array;

use std::sync::Arc;

use arith::{AddOp, BinaryArithmetic, DivOp, MulOp, SubOp};
use string_or_array::{CharLengthOp, EmptyOp, LengthOp, NotEmptyOp, StringOrArrayToScalar};

use super::ScalarFunction;

/// All builtin scalar functions, in registration order.
pub fn builtin_functions() -> Vec<Arc<dyn ScalarFunction>> {
    vec![
        Arc::new(BinaryArithmetic::<AddOp>::new()),
        Arc::new(BinaryArithmetic::<SubOp>::new()),
        Arc::new(BinaryArithmetic::<MulOp>::new()),
        Arc::new(BinaryArithmetic::<DivOp>::new()),
        Arc::new(StringOrArrayToScalar::<LengthOp>::new()),
        Arc::new(StringOrArrayToScalar::<CharLengthOp>::new()),
        Arc::new(StringOrArrayToScalar::<EmptyOp>::new()),
        Arc::new(StringOrArrayToScalar::<NotEmptyOp>::new()),
    ]
}
