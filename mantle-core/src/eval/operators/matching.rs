// mantle-core - Match operators
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The match operators `=~` and `!~`.
//!
//! A string right operand is compiled as a regular expression; a regex
//! right operand is used directly. On a successful match the capture
//! groups become the match variables `$0`, `$1`, ... in the current scope's
//! ephemeral match frame, for both operators. A type right operand turns
//! the expression into an instance test and sets no match variables.

use crate::error::{Error, Result};
use crate::types::RecursionGuard;
use crate::values::{Value, ValueRegex};

use super::BinaryCallContext;

/// Match a string against a compiled regex, setting match variables in the
/// current scope on success.
fn search(context: &mut BinaryCallContext, regex: &regex::Regex) -> bool {
    let subject = match context.left() {
        Value::String(s) => s.clone(),
        _ => return false,
    };
    match regex.captures(&subject) {
        Some(captures) => {
            let groups: Vec<Option<String>> = captures
                .iter()
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect();
            context.evaluator.scope().set_match_variables(&groups);
            true
        }
        None => false,
    }
}

fn compile(context: &BinaryCallContext) -> Result<ValueRegex> {
    match context.right() {
        Value::String(pattern) => ValueRegex::new(pattern).map_err(|e| {
            context.error_at_right(format!("invalid regular expression /{pattern}/: {e}"))
        }),
        Value::Regex(regex) => Ok(regex.clone()),
        _ => Err(Error::internal("match dispatched on a non-pattern operand")),
    }
}

fn instance_of(context: &BinaryCallContext) -> Result<bool> {
    match context.right() {
        Value::Type(ty) => {
            let mut guard = RecursionGuard::new();
            Ok(ty.is_instance(context.left(), &mut guard))
        }
        _ => Err(Error::internal("match dispatched on a non-type operand")),
    }
}

pub(super) fn match_string_pattern(context: &mut BinaryCallContext) -> Result<Value> {
    let regex = compile(context)?;
    Ok(Value::Boolean(search(context, regex.regex())))
}

pub(super) fn not_match_string_pattern(context: &mut BinaryCallContext) -> Result<Value> {
    let regex = compile(context)?;
    Ok(Value::Boolean(!search(context, regex.regex())))
}

pub(super) fn match_string_regex(context: &mut BinaryCallContext) -> Result<Value> {
    match_string_pattern(context)
}

pub(super) fn not_match_string_regex(context: &mut BinaryCallContext) -> Result<Value> {
    not_match_string_pattern(context)
}

pub(super) fn match_type(context: &mut BinaryCallContext) -> Result<Value> {
    Ok(Value::Boolean(instance_of(context)?))
}

pub(super) fn not_match_type(context: &mut BinaryCallContext) -> Result<Value> {
    Ok(Value::Boolean(!instance_of(context)?))
}
