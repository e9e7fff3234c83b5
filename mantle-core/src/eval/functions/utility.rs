// mantle-core - Utility functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! with, fail, and the control-flow functions break/next/return.
//!
//! break, next, and return do not unwind anything themselves: they produce
//! the corresponding sentinel value, which propagates through the Ok
//! channel and is interpreted by the enclosing iteration or function
//! frame. A sentinel that escapes to the top level is an error there.

use crate::error::Result;
use crate::values::Value;

use super::FunctionCallContext;

/// with(args...) |params| { ... }: apply the block to the arguments.
pub(crate) fn builtin_with(context: &mut FunctionCallContext) -> Result<Value> {
    let arguments = context.arguments().to_vec();
    context.yield_block(&arguments)
}

/// fail(args...): abort evaluation with the joined message.
pub(crate) fn builtin_fail(context: &mut FunctionCallContext) -> Result<Value> {
    let message = context
        .arguments()
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    Err(context.error(message))
}

pub(crate) fn builtin_break(_context: &mut FunctionCallContext) -> Result<Value> {
    Ok(Value::Break)
}

pub(crate) fn builtin_next(context: &mut FunctionCallContext) -> Result<Value> {
    Ok(Value::Next(
        context.arguments().first().cloned().map(Box::new),
    ))
}

pub(crate) fn builtin_return(context: &mut FunctionCallContext) -> Result<Value> {
    Ok(Value::Return(
        context.arguments().first().cloned().map(Box::new),
    ))
}
