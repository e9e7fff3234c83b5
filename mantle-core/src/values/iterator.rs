// mantle-core - Lazy iterator values
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lazy iterator values.
//!
//! An iterator wraps an underlying iterable (array, hash, string, integer
//! count, or another iterator) together with its traversal state: a step, a
//! reverse flag, and an optional transform lambda installed by `map`.
//! Nothing is materialized until a consumer drives the iterator, so
//! compositions such as `reverse_each(map(...))` stream element by element.
//!
//! This module only stores the state; the driving logic lives with the
//! iteration functions in the evaluator, which own the machinery to invoke
//! the transform lambda.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use mantle_ast::Lambda;

use crate::scope::Scope;
use crate::values::Value;

/// A transform applied lazily to each element, installed by `map`.
#[derive(Clone)]
pub struct IteratorTransform {
    /// The mapping lambda.
    pub lambda: Rc<Lambda>,
    /// The scope the lambda closes over.
    pub scope: Scope,
}

impl fmt::Debug for IteratorTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IteratorTransform")
    }
}

impl PartialEq for IteratorTransform {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.lambda, &other.lambda)
    }
}

impl Eq for IteratorTransform {}

/// A lazy view over an iterable value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueIterator {
    value: Value,
    step: i64,
    reverse: bool,
    transform: Option<IteratorTransform>,
}

impl ValueIterator {
    /// Create an iterator over the given iterable.
    #[must_use]
    pub fn new(value: Value, step: i64, reverse: bool) -> Self {
        ValueIterator {
            value,
            step,
            reverse,
            transform: None,
        }
    }

    /// Create a transforming iterator, as installed by `map`.
    #[must_use]
    pub fn transforming(value: Value, transform: IteratorTransform) -> Self {
        ValueIterator {
            value,
            step: 1,
            reverse: false,
            transform: Some(transform),
        }
    }

    /// The underlying iterable.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn step(&self) -> i64 {
        self.step
    }

    #[must_use]
    pub fn reverse(&self) -> bool {
        self.reverse
    }

    /// The transform, if one is installed.
    #[must_use]
    pub fn transform(&self) -> Option<&IteratorTransform> {
        self.transform.as_ref()
    }

    /// Flatten a chain of nested iterators down to the base iterable.
    ///
    /// Reverse flags cancel pairwise, steps multiply, and transforms apply
    /// innermost first.
    #[must_use]
    pub fn flatten(&self) -> FlattenedIterator<'_> {
        let mut reverse = self.reverse;
        let mut step = self.step.max(1);
        let mut transforms = Vec::new();
        if let Some(t) = &self.transform {
            transforms.push(t.clone());
        }
        let mut base = &self.value;
        while let Value::Iterator(inner) = base {
            reverse ^= inner.reverse;
            step = step.saturating_mul(inner.step.max(1));
            if let Some(t) = &inner.transform {
                transforms.push(t.clone());
            }
            base = &inner.value;
        }
        // Collected outermost first; apply innermost first.
        transforms.reverse();
        FlattenedIterator {
            base,
            reverse,
            step,
            transforms,
        }
    }
}

impl Hash for ValueIterator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.step.hash(state);
        self.reverse.hash(state);
    }
}

impl fmt::Display for ValueIterator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iterator[{}]", self.value)
    }
}

/// The result of flattening a chain of iterators.
pub struct FlattenedIterator<'a> {
    /// The base iterable (never itself an iterator).
    pub base: &'a Value,
    /// Whether traversal runs back to front.
    pub reverse: bool,
    /// Combined step; every nth element is produced.
    pub step: i64,
    /// Transforms to apply, innermost first.
    pub transforms: Vec<IteratorTransform>,
}
