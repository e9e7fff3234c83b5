// mantle-core - Type inspection functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The type and assert_type functions.

use crate::error::{Error, Result};
use crate::types::{infer, RecursionGuard, Type};
use crate::values::Value;

use super::FunctionCallContext;

/// type(value): the tightest inferred type of the value.
pub(crate) fn builtin_type(context: &mut FunctionCallContext) -> Result<Value> {
    Ok(Value::from_type(infer(context.argument(0))))
}

/// assert_type(type, value): the value when it is an instance of the type;
/// otherwise the recovery block's result, or an error showing both types.
pub(crate) fn builtin_assert_type(context: &mut FunctionCallContext) -> Result<Value> {
    let first = context.argument(0).clone();
    let expected: Type = match first {
        Value::Type(ty) => (*ty).clone(),
        Value::String(expression) => context.evaluator.resolve_type_expression(&expression)?,
        _ => {
            return Err(Error::internal(
                "assert_type dispatched on a non-type argument",
            ))
        }
    };
    let value = context.argument(1).clone();
    let mut guard = RecursionGuard::new();
    if expected.is_instance(&value, &mut guard) {
        return Ok(value);
    }
    let actual = infer(&value);
    if context.block().is_some() {
        return context.yield_block(&[Value::from_type(expected), Value::from_type(actual)]);
    }
    Err(context.error_at_argument(
        1,
        format!("type assertion failed: expected {expected} but found {actual}"),
    ))
}
