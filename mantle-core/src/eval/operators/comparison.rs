// mantle-core - Comparison operators
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Comparison operator handlers: == != < <= > >=.
//!
//! String pairs compare case-insensitively under Unicode case folding for
//! all six operators. Type pairs compare by structural equality and mutual
//! assignability for equality, and by assignability for the relational
//! operators (`A < B` reads "A is strictly more specific than B").

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::types::{RecursionGuard, Type};
use crate::values::{compare_ignore_case, equals_ignore_case, loose_equal, Value};

use super::BinaryCallContext;

fn strings<'a>(context: &'a BinaryCallContext) -> Result<(&'a str, &'a str)> {
    match (context.left(), context.right()) {
        (Value::String(l), Value::String(r)) => Ok((l, r)),
        _ => Err(Error::internal(
            "string comparison dispatched on non-strings",
        )),
    }
}

fn types<'a>(context: &'a BinaryCallContext) -> Result<(&'a Type, &'a Type)> {
    match (context.left(), context.right()) {
        (Value::Type(l), Value::Type(r)) => Ok((l.as_ref(), r.as_ref())),
        _ => Err(Error::internal("type comparison dispatched on non-types")),
    }
}

/// Structural equality or mutual assignability.
fn types_equal(left: &Type, right: &Type) -> bool {
    if left == right {
        return true;
    }
    let mut guard = RecursionGuard::new();
    left.is_assignable(right, &mut guard) && right.is_assignable(left, &mut guard)
}

pub(super) fn equals_strings(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = strings(context)?;
    Ok(Value::Boolean(equals_ignore_case(l, r)))
}

pub(super) fn not_equals_strings(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = strings(context)?;
    Ok(Value::Boolean(!equals_ignore_case(l, r)))
}

pub(super) fn equals_types(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = types(context)?;
    Ok(Value::Boolean(types_equal(l, r)))
}

pub(super) fn not_equals_types(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = types(context)?;
    Ok(Value::Boolean(!types_equal(l, r)))
}

pub(super) fn equals_values(context: &mut BinaryCallContext) -> Result<Value> {
    Ok(Value::Boolean(loose_equal(context.left(), context.right())))
}

pub(super) fn not_equals_values(context: &mut BinaryCallContext) -> Result<Value> {
    Ok(Value::Boolean(!loose_equal(
        context.left(),
        context.right(),
    )))
}

/// The numeric ordering after promotion; None for unordered floats (NaN).
fn numeric_ordering(context: &BinaryCallContext) -> Result<Option<Ordering>> {
    match (context.left(), context.right()) {
        (Value::Integer(l), Value::Integer(r)) => Ok(Some(l.cmp(r))),
        (Value::Integer(l), Value::Float(r)) => Ok((*l as f64).partial_cmp(r)),
        (Value::Float(l), Value::Integer(r)) => Ok(l.partial_cmp(&(*r as f64))),
        (Value::Float(l), Value::Float(r)) => Ok(l.partial_cmp(r)),
        _ => Err(Error::internal(
            "numeric comparison dispatched on non-numeric operands",
        )),
    }
}

pub(super) fn less_than_numbers(context: &mut BinaryCallContext) -> Result<Value> {
    let ordering = numeric_ordering(context)?;
    Ok(Value::Boolean(ordering == Some(Ordering::Less)))
}

pub(super) fn less_equal_numbers(context: &mut BinaryCallContext) -> Result<Value> {
    let ordering = numeric_ordering(context)?;
    Ok(Value::Boolean(matches!(
        ordering,
        Some(Ordering::Less | Ordering::Equal)
    )))
}

pub(super) fn greater_than_numbers(context: &mut BinaryCallContext) -> Result<Value> {
    let ordering = numeric_ordering(context)?;
    Ok(Value::Boolean(ordering == Some(Ordering::Greater)))
}

pub(super) fn greater_equal_numbers(context: &mut BinaryCallContext) -> Result<Value> {
    let ordering = numeric_ordering(context)?;
    Ok(Value::Boolean(matches!(
        ordering,
        Some(Ordering::Greater | Ordering::Equal)
    )))
}

pub(super) fn less_than_strings(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = strings(context)?;
    Ok(Value::Boolean(compare_ignore_case(l, r) == Ordering::Less))
}

pub(super) fn less_equal_strings(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = strings(context)?;
    Ok(Value::Boolean(compare_ignore_case(l, r) != Ordering::Greater))
}

pub(super) fn greater_than_strings(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = strings(context)?;
    Ok(Value::Boolean(
        compare_ignore_case(l, r) == Ordering::Greater,
    ))
}

pub(super) fn greater_equal_strings(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = strings(context)?;
    Ok(Value::Boolean(compare_ignore_case(l, r) != Ordering::Less))
}

pub(super) fn less_than_types(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = types(context)?;
    let mut guard = RecursionGuard::new();
    Ok(Value::Boolean(
        r.is_assignable(l, &mut guard) && !types_equal(l, r),
    ))
}

pub(super) fn less_equal_types(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = types(context)?;
    let mut guard = RecursionGuard::new();
    Ok(Value::Boolean(r.is_assignable(l, &mut guard)))
}

pub(super) fn greater_than_types(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = types(context)?;
    let mut guard = RecursionGuard::new();
    Ok(Value::Boolean(
        l.is_assignable(r, &mut guard) && !types_equal(l, r),
    ))
}

pub(super) fn greater_equal_types(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = types(context)?;
    let mut guard = RecursionGuard::new();
    Ok(Value::Boolean(l.is_assignable(r, &mut guard)))
}
