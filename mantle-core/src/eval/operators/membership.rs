// mantle-core - The in operator
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The `in` operator: substring, element, key, pattern, and instance
//! search. String comparisons are case-insensitive; hash search inspects
//! keys. The final Any/Any entry makes `in` answer false rather than fail
//! for right operands that cannot contain anything.

use crate::error::{Error, Result};
use crate::types::RecursionGuard;
use crate::values::{loose_equal, Value};

use super::BinaryCallContext;

pub(super) fn string_in_string(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::String(needle), Value::String(haystack)) => {
            let needle = needle.to_lowercase();
            let haystack = haystack.to_lowercase();
            Ok(Value::Boolean(haystack.contains(&needle)))
        }
        _ => Err(Error::internal("in dispatched on wrong operands")),
    }
}

pub(super) fn regex_in_string(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Regex(regex), Value::String(subject)) => {
            Ok(Value::Boolean(regex.regex().is_match(subject)))
        }
        _ => Err(Error::internal("in dispatched on wrong operands")),
    }
}

pub(super) fn regex_in_array(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Regex(regex), Value::Array(items)) => Ok(Value::Boolean(items.iter().any(
            |item| matches!(item, Value::String(s) if regex.regex().is_match(s)),
        ))),
        _ => Err(Error::internal("in dispatched on wrong operands")),
    }
}

pub(super) fn regex_in_hash(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Regex(regex), Value::Hash(hash)) => Ok(Value::Boolean(hash.keys().any(
            |key| matches!(key, Value::String(s) if regex.regex().is_match(s)),
        ))),
        _ => Err(Error::internal("in dispatched on wrong operands")),
    }
}

pub(super) fn type_in_array(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Type(ty), Value::Array(items)) => {
            let mut guard = RecursionGuard::new();
            Ok(Value::Boolean(
                items.iter().any(|item| ty.is_instance(item, &mut guard)),
            ))
        }
        _ => Err(Error::internal("in dispatched on wrong operands")),
    }
}

pub(super) fn type_in_hash(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Type(ty), Value::Hash(hash)) => {
            let mut guard = RecursionGuard::new();
            Ok(Value::Boolean(
                hash.keys().any(|key| ty.is_instance(key, &mut guard)),
            ))
        }
        _ => Err(Error::internal("in dispatched on wrong operands")),
    }
}

pub(super) fn value_in_array(context: &mut BinaryCallContext) -> Result<Value> {
    match context.right() {
        Value::Array(items) => Ok(Value::Boolean(
            items.iter().any(|item| loose_equal(context.left(), item)),
        )),
        _ => Err(Error::internal("in dispatched on wrong operands")),
    }
}

pub(super) fn value_in_hash(context: &mut BinaryCallContext) -> Result<Value> {
    match context.right() {
        Value::Hash(hash) => Ok(Value::Boolean(
            hash.keys().any(|key| loose_equal(context.left(), key)),
        )),
        _ => Err(Error::internal("in dispatched on wrong operands")),
    }
}

pub(super) fn never_in(_context: &mut BinaryCallContext) -> Result<Value> {
    Ok(Value::Boolean(false))
}
