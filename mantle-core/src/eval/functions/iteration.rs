// mantle-core - Iteration functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The iteration functions: each, reverse_each, step, map, filter, reduce.
//!
//! All of them stream through [`drive`], which flattens a chain of nested
//! iterator values down to its base iterable and walks it in the combined
//! order, applying any stored transform lambdas element by element. `map`
//! without that machinery would have to materialize; instead it returns a
//! transforming iterator so `reverse_each(map(...))` streams lazily.
//!
//! Block arity selects the yield shape: two parameters receive
//! `(key, value)` over hashes and `(index, value)` otherwise; one parameter
//! receives a `[key, value]` pair over hashes and the bare value otherwise.

use std::rc::Rc;

use im::Vector;

use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::values::{IteratorTransform, Value, ValueHash, ValueIterator};

use super::FunctionCallContext;

/// What a yield decided about the rest of the iteration.
pub(crate) enum IterationSignal {
    Continue,
    /// Stop the iteration; `break` inside a block.
    Stop,
    /// Unwind past the iteration, carrying a sentinel (`return`).
    Bubble(Value),
}

/// Walk an iterator, applying its transforms and yielding each element.
///
/// Returns the sentinel to bubble out of the calling function, if any.
pub(crate) fn drive(
    evaluator: &mut Evaluator,
    iterator: &ValueIterator,
    yield_fn: &mut dyn FnMut(&mut Evaluator, Option<&Value>, &Value, i64) -> Result<IterationSignal>,
) -> Result<Option<Value>> {
    let flat = iterator.flatten();
    let elements = base_elements(flat.base)?;
    let len = elements.len();
    let step = flat.step.max(1) as usize;
    let indices: Vec<usize> = if flat.reverse {
        (0..len).rev().step_by(step).collect()
    } else {
        (0..len).step_by(step).collect()
    };

    let mut produced: i64 = 0;
    for index in indices {
        let (key, value) = &elements[index];
        let mut key = key.clone();
        let mut value = value.clone();
        for transform in &flat.transforms {
            let arity = transform.lambda.parameters.len();
            let arguments = yield_arguments(arity, key.as_ref(), &value, produced);
            match evaluator.call_lambda_in(&transform.lambda, &transform.scope, &arguments)? {
                Value::Break => return Ok(None),
                Value::Return(v) => return Ok(Some(Value::Return(v))),
                transformed => {
                    value = transformed;
                    key = None;
                }
            }
        }
        match yield_fn(evaluator, key.as_ref(), &value, produced)? {
            IterationSignal::Continue => {}
            IterationSignal::Stop => return Ok(None),
            IterationSignal::Bubble(sentinel) => return Ok(Some(sentinel)),
        }
        produced += 1;
    }
    Ok(None)
}

/// The (key, value) elements of a base iterable, in source order.
fn base_elements(base: &Value) -> Result<Vec<(Option<Value>, Value)>> {
    match base {
        Value::Array(items) => Ok(items.iter().map(|v| (None, v.clone())).collect()),
        Value::Hash(hash) => Ok(hash
            .iter()
            .map(|(k, v)| (Some(k.clone()), v.clone()))
            .collect()),
        Value::String(s) => Ok(s
            .chars()
            .map(|c| (None, Value::string(c.to_string())))
            .collect()),
        Value::Integer(count) if *count >= 0 => {
            Ok((0..*count).map(|i| (None, Value::Integer(i))).collect())
        }
        other => Err(Error::internal(format!(
            "value '{other}' is not iterable"
        ))),
    }
}

/// Shape block arguments by parameter count, per the yielding contract.
pub(crate) fn yield_arguments(
    parameter_count: usize,
    key: Option<&Value>,
    value: &Value,
    index: i64,
) -> Vec<Value> {
    match key {
        Some(k) => {
            if parameter_count == 1 {
                vec![Value::array([k.clone(), value.clone()])]
            } else {
                vec![k.clone(), value.clone()]
            }
        }
        None => {
            if parameter_count == 1 {
                vec![value.clone()]
            } else {
                vec![Value::Integer(index), value.clone()]
            }
        }
    }
}

/// Materialize an iterator value: the underlying collection when no state
/// changes it, otherwise the array the traversal produces.
pub(crate) fn materialize(evaluator: &mut Evaluator, iterator: &ValueIterator) -> Result<Value> {
    {
        let flat = iterator.flatten();
        if flat.transforms.is_empty() && flat.step <= 1 && !flat.reverse {
            return Ok(flat.base.clone());
        }
    }
    let mut items: Vector<Value> = Vector::new();
    drive(evaluator, iterator, &mut |_, key, value, _| {
        let element = match key {
            Some(k) => Value::array([k.clone(), value.clone()]),
            None => value.clone(),
        };
        items.push_back(element);
        Ok(IterationSignal::Continue)
    })?;
    Ok(Value::Array(items))
}

/// Drive an iterator yielding into the call's block; used by each,
/// reverse_each, and step.
fn iterate_with_block(
    context: &mut FunctionCallContext,
    iterator: &ValueIterator,
) -> Result<Option<Value>> {
    let lambda = match context.block() {
        Some(lambda) => Rc::clone(lambda),
        None => return Err(Error::internal("iteration dispatched without a block")),
    };
    let scope = context.evaluator.scope().clone();
    let parameter_count = lambda.parameters.len();
    drive(context.evaluator, iterator, &mut |evaluator, key, value, index| {
        let arguments = yield_arguments(parameter_count, key, value, index);
        match evaluator.call_lambda_in(&lambda, &scope, &arguments)? {
            Value::Break => Ok(IterationSignal::Stop),
            Value::Return(v) => Ok(IterationSignal::Bubble(Value::Return(v))),
            _ => Ok(IterationSignal::Continue),
        }
    })
}

pub(crate) fn builtin_each(context: &mut FunctionCallContext) -> Result<Value> {
    let iterator = ValueIterator::new(context.argument(0).clone(), 1, false);
    if let Some(sentinel) = iterate_with_block(context, &iterator)? {
        return Ok(sentinel);
    }
    Ok(context.argument(0).clone())
}

pub(crate) fn builtin_reverse_each_lazy(context: &mut FunctionCallContext) -> Result<Value> {
    let iterator = ValueIterator::new(context.argument(0).clone(), 1, true);
    Ok(Value::Iterator(Rc::new(iterator)))
}

pub(crate) fn builtin_reverse_each(context: &mut FunctionCallContext) -> Result<Value> {
    let iterator = ValueIterator::new(context.argument(0).clone(), 1, true);
    if let Some(sentinel) = iterate_with_block(context, &iterator)? {
        return Ok(sentinel);
    }
    Ok(Value::Iterator(Rc::new(iterator)))
}

pub(crate) fn builtin_step_lazy(context: &mut FunctionCallContext) -> Result<Value> {
    let step = context.argument(1).as_integer().unwrap_or(1);
    let iterator = ValueIterator::new(context.argument(0).clone(), step, false);
    Ok(Value::Iterator(Rc::new(iterator)))
}

pub(crate) fn builtin_step(context: &mut FunctionCallContext) -> Result<Value> {
    let step = context.argument(1).as_integer().unwrap_or(1);
    let iterator = ValueIterator::new(context.argument(0).clone(), step, false);
    if let Some(sentinel) = iterate_with_block(context, &iterator)? {
        return Ok(sentinel);
    }
    Ok(Value::Iterator(Rc::new(iterator)))
}

pub(crate) fn builtin_map(context: &mut FunctionCallContext) -> Result<Value> {
    let lambda = match context.block() {
        Some(lambda) => Rc::clone(lambda),
        None => return Err(Error::internal("map dispatched without a block")),
    };
    let transform = IteratorTransform {
        lambda,
        scope: context.evaluator.scope().clone(),
    };
    let iterator = ValueIterator::transforming(context.argument(0).clone(), transform);
    Ok(Value::Iterator(Rc::new(iterator)))
}

pub(crate) fn builtin_filter(context: &mut FunctionCallContext) -> Result<Value> {
    let lambda = match context.block() {
        Some(lambda) => Rc::clone(lambda),
        None => return Err(Error::internal("filter dispatched without a block")),
    };
    let scope = context.evaluator.scope().clone();
    let parameter_count = lambda.parameters.len();
    let argument = context.argument(0).clone();
    let hash_mode = matches!(argument, Value::Hash(_));
    let iterator = ValueIterator::new(argument, 1, false);

    let mut kept_items: Vector<Value> = Vector::new();
    let mut kept_entries = ValueHash::new();
    let sentinel = drive(context.evaluator, &iterator, &mut |evaluator, key, value, index| {
        let arguments = yield_arguments(parameter_count, key, value, index);
        match evaluator.call_lambda_in(&lambda, &scope, &arguments)? {
            Value::Break => Ok(IterationSignal::Stop),
            Value::Return(v) => Ok(IterationSignal::Bubble(Value::Return(v))),
            result => {
                if result.is_truthy() {
                    match key {
                        Some(k) if hash_mode => kept_entries.insert(k.clone(), value.clone()),
                        Some(k) => {
                            kept_items.push_back(Value::array([k.clone(), value.clone()]));
                        }
                        None => kept_items.push_back(value.clone()),
                    }
                }
                Ok(IterationSignal::Continue)
            }
        }
    })?;
    if let Some(sentinel) = sentinel {
        return Ok(sentinel);
    }
    if hash_mode {
        Ok(Value::Hash(kept_entries))
    } else {
        Ok(Value::Array(kept_items))
    }
}

pub(crate) fn builtin_reduce(context: &mut FunctionCallContext) -> Result<Value> {
    let lambda = match context.block() {
        Some(lambda) => Rc::clone(lambda),
        None => return Err(Error::internal("reduce dispatched without a block")),
    };
    let scope = context.evaluator.scope().clone();
    let iterator = ValueIterator::new(context.argument(0).clone(), 1, false);
    let mut memo: Option<Value> = context.arguments().get(1).cloned();

    let sentinel = drive(context.evaluator, &iterator, &mut |evaluator, key, value, _| {
        let element = match key {
            Some(k) => Value::array([k.clone(), value.clone()]),
            None => value.clone(),
        };
        match memo.take() {
            None => {
                memo = Some(element);
                Ok(IterationSignal::Continue)
            }
            Some(current) => {
                match evaluator.call_lambda_in(&lambda, &scope, &[current.clone(), element])? {
                    Value::Break => {
                        memo = Some(current);
                        Ok(IterationSignal::Stop)
                    }
                    Value::Return(v) => Ok(IterationSignal::Bubble(Value::Return(v))),
                    result => {
                        memo = Some(result);
                        Ok(IterationSignal::Continue)
                    }
                }
            }
        }
    })?;
    if let Some(sentinel) = sentinel {
        return Ok(sentinel);
    }
    Ok(memo.unwrap_or(Value::Undef))
}
