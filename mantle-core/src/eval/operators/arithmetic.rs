// mantle-core - Arithmetic operators
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Arithmetic operator handlers: + - * / % << >> and the collection forms
//! of + - <<.
//!
//! Integer arithmetic checks for wrapping explicitly, including the
//! MIN / -1 division case, and reports overflow rather than wrapping
//! silently. Float arithmetic emulates the hardware status word: operate,
//! then test the result against the operands for divide-by-zero, overflow
//! (an infinite result from finite operands), and underflow (a zero or
//! subnormal result where the exact value is non-zero). Errors anchor at
//! the operand that triggered them.

use crate::error::{Error, Result};
use crate::values::{loose_equal, Value, ValueHash};

use super::BinaryCallContext;

/// Numeric operands after promotion: Integer only when both sides are.
enum NumericPair {
    Integers(i64, i64),
    Floats(f64, f64),
}

fn numeric_pair(context: &BinaryCallContext) -> Result<NumericPair> {
    match (context.left(), context.right()) {
        (Value::Integer(l), Value::Integer(r)) => Ok(NumericPair::Integers(*l, *r)),
        (Value::Integer(l), Value::Float(r)) => Ok(NumericPair::Floats(*l as f64, *r)),
        (Value::Float(l), Value::Integer(r)) => Ok(NumericPair::Floats(*l, *r as f64)),
        (Value::Float(l), Value::Float(r)) => Ok(NumericPair::Floats(*l, *r)),
        _ => Err(Error::internal(
            "numeric operator dispatched on non-numeric operands",
        )),
    }
}

/// Check an emulated float status word after an operation.
fn check_float(
    context: &BinaryCallContext,
    operation: &str,
    left: f64,
    right: f64,
    result: f64,
    exact_is_nonzero: bool,
) -> Result<Value> {
    if result.is_infinite() && left.is_finite() && right.is_finite() {
        return Err(context.error_at_right(format!(
            "{operation} of {left} and {right} results in an arithmetic overflow."
        )));
    }
    if exact_is_nonzero && (result == 0.0 || result.is_subnormal()) {
        return Err(context.error_at_right(format!(
            "{operation} of {left} and {right} results in an arithmetic underflow."
        )));
    }
    Ok(Value::Float(result))
}

pub(super) fn add(context: &mut BinaryCallContext) -> Result<Value> {
    match numeric_pair(context)? {
        NumericPair::Integers(l, r) => l.checked_add(r).map(Value::Integer).ok_or_else(|| {
            context.error_at_right(format!(
                "addition of {l} and {r} results in an arithmetic overflow."
            ))
        }),
        NumericPair::Floats(l, r) => check_float(context, "addition", l, r, l + r, false),
    }
}

pub(super) fn subtract(context: &mut BinaryCallContext) -> Result<Value> {
    match numeric_pair(context)? {
        NumericPair::Integers(l, r) => l.checked_sub(r).map(Value::Integer).ok_or_else(|| {
            context.error_at_right(format!(
                "subtraction of {l} and {r} results in an arithmetic overflow."
            ))
        }),
        NumericPair::Floats(l, r) => check_float(context, "subtraction", l, r, l - r, false),
    }
}

pub(super) fn multiply(context: &mut BinaryCallContext) -> Result<Value> {
    match numeric_pair(context)? {
        NumericPair::Integers(l, r) => l.checked_mul(r).map(Value::Integer).ok_or_else(|| {
            context.error_at_right(format!(
                "multiplication of {l} and {r} results in an arithmetic overflow."
            ))
        }),
        NumericPair::Floats(l, r) => {
            check_float(context, "multiplication", l, r, l * r, l != 0.0 && r != 0.0)
        }
    }
}

pub(super) fn divide(context: &mut BinaryCallContext) -> Result<Value> {
    match numeric_pair(context)? {
        NumericPair::Integers(l, r) => {
            if r == 0 {
                return Err(context.error_at_right("cannot divide by zero."));
            }
            if l == i64::MIN && r == -1 {
                return Err(context.error_at_right(format!(
                    "division of {l} by {r} results in an arithmetic overflow."
                )));
            }
            Ok(Value::Integer(l / r))
        }
        NumericPair::Floats(l, r) => {
            if r == 0.0 {
                return Err(context.error_at_right("cannot divide by zero."));
            }
            check_float(context, "division", l, r, l / r, l != 0.0 && r.is_finite())
        }
    }
}

pub(super) fn modulo(context: &mut BinaryCallContext) -> Result<Value> {
    match numeric_pair(context)? {
        NumericPair::Integers(l, r) => {
            if r == 0 {
                return Err(context.error_at_right("cannot divide by zero."));
            }
            l.checked_rem(r).map(Value::Integer).ok_or_else(|| {
                context.error_at_right(format!(
                    "modulo of {l} by {r} results in an arithmetic overflow."
                ))
            })
        }
        NumericPair::Floats(..) => Err(Error::internal("modulo dispatched on float operands")),
    }
}

pub(super) fn shift_left(context: &mut BinaryCallContext) -> Result<Value> {
    match numeric_pair(context)? {
        NumericPair::Integers(l, r) => shift(context, l, r, false),
        NumericPair::Floats(..) => Err(Error::internal("shift dispatched on float operands")),
    }
}

pub(super) fn shift_right(context: &mut BinaryCallContext) -> Result<Value> {
    match numeric_pair(context)? {
        NumericPair::Integers(l, r) => shift(context, l, r, true),
        NumericPair::Floats(..) => Err(Error::internal("shift dispatched on float operands")),
    }
}

/// A negative count shifts in the opposite direction.
fn shift(context: &BinaryCallContext, value: i64, count: i64, rightward: bool) -> Result<Value> {
    let direction = if count < 0 { !rightward } else { rightward };
    let overflow = || {
        let name = if rightward { "right shift" } else { "left shift" };
        context.error_at_right(format!(
            "{name} of {value} by {count} results in an arithmetic overflow."
        ))
    };
    let magnitude = count.checked_abs().ok_or_else(overflow)?;
    if magnitude >= 64 {
        return Err(overflow());
    }
    let magnitude = magnitude as u32;
    if direction {
        Ok(Value::Integer(value >> magnitude))
    } else {
        // checked_shl only validates the count; verify the value survives.
        match value.checked_shl(magnitude) {
            Some(result) if (result >> magnitude) == value => Ok(Value::Integer(result)),
            _ => Err(overflow()),
        }
    }
}

pub(super) fn array_concat(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Array(l), Value::Array(r)) => {
            let mut result = l.clone();
            result.append(r.clone());
            Ok(Value::Array(result))
        }
        _ => Err(Error::internal("array concat dispatched on non-arrays")),
    }
}

pub(super) fn array_concat_hash(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Array(l), Value::Hash(r)) => {
            let mut result = l.clone();
            for (k, v) in r.iter() {
                result.push_back(Value::array([k.clone(), v.clone()]));
            }
            Ok(Value::Array(result))
        }
        _ => Err(Error::internal("array concat dispatched on wrong operands")),
    }
}

pub(super) fn array_append(context: &mut BinaryCallContext) -> Result<Value> {
    match context.left() {
        Value::Array(l) => {
            let mut result = l.clone();
            result.push_back(context.right().clone());
            Ok(Value::Array(result))
        }
        _ => Err(Error::internal("array append dispatched on non-array")),
    }
}

pub(super) fn array_difference(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Array(l), Value::Array(r)) => Ok(Value::Array(
            l.iter()
                .filter(|item| !r.iter().any(|removed| loose_equal(item, removed)))
                .cloned()
                .collect(),
        )),
        _ => Err(Error::internal("array difference dispatched on non-arrays")),
    }
}

pub(super) fn hash_merge(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Hash(l), Value::Hash(r)) => {
            let mut result = l.clone();
            for (k, v) in r.iter() {
                result.insert(k.clone(), v.clone());
            }
            Ok(Value::Hash(result))
        }
        _ => Err(Error::internal("hash merge dispatched on non-hashes")),
    }
}

/// Merge an array into a hash: either an array of [key, value] pairs or a
/// flat even-sized list.
pub(super) fn hash_merge_array(context: &mut BinaryCallContext) -> Result<Value> {
    let (l, r) = match (context.left(), context.right()) {
        (Value::Hash(l), Value::Array(r)) => (l.clone(), r.clone()),
        _ => return Err(Error::internal("hash merge dispatched on wrong operands")),
    };
    let mut result = l;
    let all_pairs = !r.is_empty()
        && r.iter()
            .all(|item| matches!(item, Value::Array(pair) if pair.len() == 2));
    if all_pairs {
        for item in &r {
            if let Value::Array(pair) = item {
                result.insert(pair[0].clone(), pair[1].clone());
            }
        }
    } else {
        if r.len() % 2 != 0 {
            return Err(context.error_at_right(format!(
                "expected an array of [key, value] pairs or an even number of elements but found {} elements.",
                r.len()
            )));
        }
        let mut items = r.iter();
        while let (Some(k), Some(v)) = (items.next(), items.next()) {
            result.insert(k.clone(), v.clone());
        }
    }
    Ok(Value::Hash(result))
}

pub(super) fn hash_difference(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Hash(l), Value::Hash(r)) => {
            let result: ValueHash = l
                .iter()
                .filter(|(k, _)| !r.contains_key(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Ok(Value::Hash(result))
        }
        _ => Err(Error::internal("hash difference dispatched on non-hashes")),
    }
}

pub(super) fn hash_remove_keys(context: &mut BinaryCallContext) -> Result<Value> {
    match (context.left(), context.right()) {
        (Value::Hash(l), Value::Array(r)) => {
            let result: ValueHash = l
                .iter()
                .filter(|(k, _)| !r.iter().any(|removed| loose_equal(k, removed)))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Ok(Value::Hash(result))
        }
        _ => Err(Error::internal("hash difference dispatched on wrong operands")),
    }
}
