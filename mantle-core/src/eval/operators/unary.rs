// mantle-core - Unary operators
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The unary operators `-` and `!`.

use crate::error::{Error, Result};
use crate::values::Value;

use super::UnaryCallContext;

pub(super) fn negate(context: &mut UnaryCallContext) -> Result<Value> {
    match context.operand() {
        Value::Integer(i) => i.checked_neg().map(Value::Integer).ok_or_else(|| {
            context.error(format!("negation of {i} results in an arithmetic overflow."))
        }),
        Value::Float(f) => Ok(Value::Float(-f)),
        _ => Err(Error::internal(
            "negation dispatched on a non-numeric operand",
        )),
    }
}

pub(super) fn logical_not(context: &mut UnaryCallContext) -> Result<Value> {
    Ok(Value::Boolean(!context.operand().is_truthy()))
}
