// mantle-core - Type membership
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Type membership: is a value an instance of a type.

use crate::types::{RecursionGuard, Type};
use crate::values::{codepoint_count, Value};

impl Type {
    /// Determine whether the given value is an instance of this type.
    ///
    /// The guard terminates traversal of cyclic alias graphs; create one
    /// per query.
    #[must_use]
    pub fn is_instance(&self, value: &Value, guard: &mut RecursionGuard) -> bool {
        match self {
            Type::Any => true,
            Type::Undef => matches!(value, Value::Undef),
            Type::NotUndef(inner) => {
                if matches!(value, Value::Undef) {
                    return false;
                }
                match inner {
                    Some(t) => t.is_instance(value, guard),
                    None => true,
                }
            }
            Type::Default => matches!(value, Value::Default),
            Type::Boolean => matches!(value, Value::Boolean(_)),
            Type::Scalar => matches!(
                value,
                Value::Integer(_)
                    | Value::Float(_)
                    | Value::String(_)
                    | Value::Boolean(_)
                    | Value::Regex(_)
            ),
            Type::Numeric => matches!(value, Value::Integer(_) | Value::Float(_)),
            Type::Data => is_data(value),
            Type::Collection { from, to } => {
                let size = match value {
                    Value::Array(items) => items.len() as i64,
                    Value::Hash(h) => h.len() as i64,
                    _ => return false,
                };
                *from <= size && size <= *to
            }
            Type::Integer { from, to } => match value {
                Value::Integer(i) => from <= i && i <= to,
                _ => false,
            },
            Type::Float { from, to } => match value {
                Value::Float(f) => from <= f && f <= to,
                _ => false,
            },
            Type::String { from, to } => match value {
                Value::String(s) => {
                    let length = codepoint_count(s) as i64;
                    *from <= length && length <= *to
                }
                _ => false,
            },
            Type::Pattern(patterns) => match value {
                Value::String(s) => patterns.iter().any(|p| p.regex().is_match(s)),
                _ => false,
            },
            Type::Enum(values) => match value {
                Value::String(s) => values.iter().any(|v| v.as_str() == &**s),
                _ => false,
            },
            Type::Regexp(pattern) => match value {
                Value::Regex(r) => match pattern {
                    Some(p) => &**p == r.pattern(),
                    None => true,
                },
                _ => false,
            },
            Type::Array { element, from, to } => match value {
                Value::Array(items) => {
                    let size = items.len() as i64;
                    *from <= size
                        && size <= *to
                        && items.iter().all(|item| element.is_instance(item, guard))
                }
                _ => false,
            },
            Type::Hash {
                key,
                value: value_type,
                from,
                to,
            } => match value {
                Value::Hash(h) => {
                    let size = h.len() as i64;
                    *from <= size
                        && size <= *to
                        && h.iter().all(|(k, v)| {
                            key.is_instance(k, guard) && value_type.is_instance(v, guard)
                        })
                }
                _ => false,
            },
            Type::Tuple { types, from, to } => match value {
                Value::Array(items) => {
                    let size = items.len() as i64;
                    if size < *from || size > *to {
                        return false;
                    }
                    items.iter().enumerate().all(|(i, item)| {
                        // The last element type repeats for the tail.
                        match types.get(i).or_else(|| types.last()) {
                            Some(t) => t.is_instance(item, guard),
                            None => false,
                        }
                    })
                }
                _ => false,
            },
            Type::Struct(members) => match value {
                Value::Hash(h) => {
                    for member in members {
                        match h.get_str(&member.key) {
                            Some(v) => {
                                if !member.value_type.is_instance(v, guard) {
                                    return false;
                                }
                            }
                            None => {
                                if member.required {
                                    return false;
                                }
                            }
                        }
                    }
                    // Keys not named by any member are not allowed.
                    h.keys().all(|k| {
                        k.as_string()
                            .is_some_and(|key| members.iter().any(|m| m.key == key))
                    })
                }
                _ => false,
            },
            Type::Variant(alternatives) => alternatives
                .iter()
                .any(|alternative| alternative.is_instance(value, guard)),
            Type::Optional(inner) => {
                if matches!(value, Value::Undef) {
                    return true;
                }
                match inner {
                    Some(t) => t.is_instance(value, guard),
                    None => true,
                }
            }
            Type::Type(inner) => match value {
                Value::Type(v) => match inner {
                    Some(t) => t.is_assignable(v, guard),
                    None => true,
                },
                _ => false,
            },
            Type::CatalogEntry => matches!(value, Value::Resource(_)),
            Type::Resource { type_name, title } => match value {
                Value::Resource(r) => {
                    if r.is_class() {
                        return false;
                    }
                    if let Some(name) = type_name {
                        if !crate::values::equals_ignore_case(name, r.type_name()) {
                            return false;
                        }
                    }
                    match title {
                        Some(t) => t == r.title(),
                        None => true,
                    }
                }
                _ => false,
            },
            Type::Class(name) => match value {
                Value::Resource(r) => {
                    r.is_class()
                        && match name {
                            Some(n) => crate::values::equals_ignore_case(n, r.title()),
                            None => true,
                        }
                }
                _ => false,
            },
            // No host-runtime objects exist at this layer.
            Type::Runtime => false,
            Type::Iterable => match value {
                Value::Array(_) | Value::Hash(_) | Value::String(_) | Value::Iterator(_) => true,
                Value::Integer(i) => *i >= 0,
                _ => false,
            },
            Type::Iterator => matches!(value, Value::Iterator(_)),
            // Lambdas are not first-class values; Callable only describes
            // signatures.
            Type::Callable(_) => false,
            Type::Alias(alias) => {
                if guard.enter(alias, value as *const Value as *const ()) {
                    return true;
                }
                match alias.resolved() {
                    Some(body) => body.is_instance(value, guard),
                    None => false,
                }
            }
        }
    }
}

/// The recursive Data check: Scalar, Undef, Array[Data], Hash[String, Data].
fn is_data(value: &Value) -> bool {
    match value {
        Value::Undef
        | Value::Boolean(_)
        | Value::Integer(_)
        | Value::Float(_)
        | Value::String(_)
        | Value::Regex(_) => true,
        Value::Array(items) => items.iter().all(is_data),
        Value::Hash(h) => h
            .iter()
            .all(|(k, v)| matches!(k, Value::String(_)) && is_data(v)),
        _ => false,
    }
}
