// mantle-core - Type assignability
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The subtype relation: `assignable(T, U)` iff every value of `U` is also
//! a value of `T`.
//!
//! Aliases on either side resolve through the recursion guard, which
//! assumes success on re-entry so that mutually recursive aliases
//! terminate. A source-side Variant distributes (every alternative must be
//! accepted), Optional is treated as Variant[inner, Undef], and
//! NotUndef[T] as T with undef stripped out.

use crate::values::equals_ignore_case;

use super::{RecursionGuard, StructMember, Type, UNBOUNDED};

impl Type {
    /// Determine whether `other` is assignable to this type.
    #[must_use]
    pub fn is_assignable(&self, other: &Type, guard: &mut RecursionGuard) -> bool {
        if let Type::Alias(alias) = self {
            if guard.enter(alias, other as *const Type as *const ()) {
                return true;
            }
            return match alias.resolved() {
                Some(body) => body.is_assignable(other, guard),
                None => false,
            };
        }
        if matches!(self, Type::Any) {
            return true;
        }

        // Source-side forms that decompose before the per-variant rules.
        match other {
            Type::Alias(alias) => {
                if guard.enter(alias, self as *const Type as *const ()) {
                    return true;
                }
                return match alias.resolved() {
                    Some(body) => self.is_assignable(&body, guard),
                    None => false,
                };
            }
            Type::Variant(alternatives) => {
                return alternatives
                    .iter()
                    .all(|alternative| self.is_assignable(alternative, guard));
            }
            Type::Optional(inner) => {
                if !self.is_assignable(&Type::Undef, guard) {
                    return false;
                }
                return match inner {
                    Some(t) => self.is_assignable(t, guard),
                    None => self.is_assignable(&Type::Any, guard),
                };
            }
            Type::NotUndef(Some(inner)) => {
                let stripped = strip_undef(inner);
                return self.is_assignable(&stripped, guard);
            }
            _ => {}
        }

        match self {
            Type::Any | Type::Alias(_) => unreachable!("handled above"),
            Type::Undef => matches!(other, Type::Undef),
            Type::NotUndef(inner) => {
                if other.admits_undef() {
                    return false;
                }
                match inner {
                    Some(t) => t.is_assignable(other, guard),
                    None => true,
                }
            }
            Type::Default => matches!(other, Type::Default),
            Type::Boolean => matches!(other, Type::Boolean),
            Type::Scalar => matches!(
                other,
                Type::Scalar
                    | Type::Numeric
                    | Type::Boolean
                    | Type::Integer { .. }
                    | Type::Float { .. }
                    | Type::String { .. }
                    | Type::Enum(_)
                    | Type::Pattern(_)
                    | Type::Regexp(_)
            ),
            Type::Numeric => matches!(
                other,
                Type::Numeric | Type::Integer { .. } | Type::Float { .. }
            ),
            Type::Data => data_assignable(other, guard),
            Type::Collection { from, to } => {
                let range = source_size_range(other);
                match range {
                    Some((f, t)) => *from <= f && t <= *to,
                    None => false,
                }
            }
            Type::Integer { from, to } => match other {
                Type::Integer { from: f, to: t } => from <= f && t <= to,
                _ => false,
            },
            Type::Float { from, to } => match other {
                Type::Float { from: f, to: t } => from <= f && t <= to,
                _ => false,
            },
            Type::String { from, to } => match other {
                Type::String { from: f, to: t } => from <= f && t <= to,
                Type::Enum(values) => values.iter().all(|v| {
                    let length = v.chars().count() as i64;
                    *from <= length && length <= *to
                }),
                // Pattern constrains content, not length.
                Type::Pattern(_) => *from == 0 && *to == UNBOUNDED,
                _ => false,
            },
            Type::Pattern(patterns) => match other {
                Type::Enum(values) => values
                    .iter()
                    .all(|v| patterns.iter().any(|p| p.regex().is_match(v))),
                Type::Pattern(others) => others
                    .iter()
                    .all(|o| patterns.iter().any(|p| p.pattern() == o.pattern())),
                _ => false,
            },
            Type::Enum(values) => match other {
                Type::Enum(others) => others.iter().all(|o| values.contains(o)),
                _ => false,
            },
            Type::Regexp(pattern) => match other {
                Type::Regexp(other_pattern) => match pattern {
                    Some(p) => other_pattern.as_ref().is_some_and(|o| o == p),
                    None => true,
                },
                _ => false,
            },
            Type::Array { element, from, to } => match other {
                Type::Array {
                    element: other_element,
                    from: f,
                    to: t,
                } => from <= f && t <= to && element.is_assignable(other_element, guard),
                Type::Tuple {
                    types,
                    from: f,
                    to: t,
                } => {
                    from <= f
                        && t <= to
                        && types.iter().all(|ty| element.is_assignable(ty, guard))
                }
                _ => false,
            },
            Type::Hash {
                key,
                value,
                from,
                to,
            } => match other {
                Type::Hash {
                    key: other_key,
                    value: other_value,
                    from: f,
                    to: t,
                } => {
                    from <= f
                        && t <= to
                        && key.is_assignable(other_key, guard)
                        && value.is_assignable(other_value, guard)
                }
                Type::Struct(members) => {
                    let required = members.iter().filter(|m| m.required).count() as i64;
                    let total = members.len() as i64;
                    *from <= required
                        && total <= *to
                        && members.iter().all(|member| {
                            key.is_assignable(&Type::Enum(vec![member.key.clone()]), guard)
                                && value.is_assignable(&member.value_type, guard)
                        })
                }
                _ => false,
            },
            Type::Tuple { types, from, to } => match other {
                Type::Tuple {
                    types: other_types,
                    from: f,
                    to: t,
                } => {
                    // Both tails repeat, so compare out to the longer list.
                    let positions = types.len().max(other_types.len());
                    from <= f
                        && t <= to
                        && (0..positions).all(|i| {
                            let own = types.get(i).or_else(|| types.last());
                            let theirs = other_types.get(i).or_else(|| other_types.last());
                            match (own, theirs) {
                                (Some(own), Some(theirs)) => own.is_assignable(theirs, guard),
                                // One side is the empty tuple; sizes govern.
                                _ => true,
                            }
                        })
                }
                Type::Array {
                    element,
                    from: f,
                    to: t,
                } => {
                    from <= f
                        && t <= to
                        && types.iter().all(|ty| ty.is_assignable(element, guard))
                }
                _ => false,
            },
            Type::Struct(members) => match other {
                Type::Struct(other_members) => {
                    struct_assignable(members, other_members, guard)
                }
                Type::Hash {
                    key: other_key,
                    value: other_value,
                    from: f,
                    to: t,
                } => {
                    let required = members.iter().filter(|m| m.required).count() as i64;
                    let total = members.len() as i64;
                    let keys = Type::Enum(members.iter().map(|m| m.key.clone()).collect());
                    required <= *f
                        && *t <= total
                        && keys.is_assignable(other_key, guard)
                        && members
                            .iter()
                            .all(|m| m.value_type.is_assignable(other_value, guard))
                }
                _ => false,
            },
            Type::Variant(alternatives) => alternatives
                .iter()
                .any(|alternative| alternative.is_assignable(other, guard)),
            Type::Optional(inner) => {
                if matches!(other, Type::Undef) {
                    return true;
                }
                match inner {
                    Some(t) => t.is_assignable(other, guard),
                    None => true,
                }
            }
            Type::Type(inner) => match other {
                Type::Type(other_inner) => match inner {
                    None => true,
                    Some(t) => match other_inner {
                        Some(o) => t.is_assignable(o, guard),
                        None => t.is_assignable(&Type::Any, guard),
                    },
                },
                _ => false,
            },
            Type::CatalogEntry => matches!(
                other,
                Type::CatalogEntry | Type::Resource { .. } | Type::Class(_)
            ),
            Type::Resource { type_name, title } => match other {
                Type::Resource {
                    type_name: other_name,
                    title: other_title,
                } => match type_name {
                    None => true,
                    Some(name) => {
                        other_name
                            .as_ref()
                            .is_some_and(|o| equals_ignore_case(name, o))
                            && match title {
                                None => true,
                                Some(t) => other_title.as_ref().is_some_and(|o| o == t),
                            }
                    }
                },
                _ => false,
            },
            Type::Class(name) => match other {
                Type::Class(other_name) => match name {
                    None => true,
                    Some(n) => other_name
                        .as_ref()
                        .is_some_and(|o| equals_ignore_case(n, o)),
                },
                _ => false,
            },
            Type::Runtime => matches!(other, Type::Runtime),
            Type::Iterable => match other {
                Type::Iterable
                | Type::Iterator
                | Type::Array { .. }
                | Type::Hash { .. }
                | Type::Tuple { .. }
                | Type::Struct(_)
                | Type::Collection { .. }
                | Type::String { .. }
                | Type::Enum(_)
                | Type::Pattern(_) => true,
                Type::Integer { from, .. } => *from >= 0,
                _ => false,
            },
            Type::Iterator => matches!(other, Type::Iterator),
            Type::Callable(callable) => match other {
                Type::Callable(other_callable) => {
                    let own = Type::Tuple {
                        types: callable.parameter_types.clone(),
                        from: callable.from,
                        to: callable.to,
                    };
                    let theirs = Type::Tuple {
                        types: other_callable.parameter_types.clone(),
                        from: other_callable.from,
                        to: other_callable.to,
                    };
                    if !own.is_assignable(&theirs, guard) {
                        return false;
                    }
                    match (&callable.block, &other_callable.block) {
                        (None, None) => true,
                        (Some(b), Some(o)) => b.is_assignable(o, guard),
                        _ => false,
                    }
                }
                _ => false,
            },
        }
    }
}

/// Remove undef from a source type, for NotUndef[T] decomposition.
fn strip_undef(t: &Type) -> Type {
    match t {
        // The empty Variant is the bottom type: no values.
        Type::Undef => Type::Variant(Vec::new()),
        Type::Any => Type::NotUndef(None),
        Type::Optional(Some(inner)) => strip_undef(inner),
        Type::Optional(None) => Type::NotUndef(None),
        Type::Variant(alternatives) => Type::Variant(
            alternatives
                .iter()
                .filter(|a| !matches!(a, Type::Undef))
                .map(strip_undef)
                .collect(),
        ),
        other => other.clone(),
    }
}

/// The size range of value sizes a source type can produce, for Collection.
fn source_size_range(other: &Type) -> Option<(i64, i64)> {
    match other {
        Type::Collection { from, to }
        | Type::Array { from, to, .. }
        | Type::Hash { from, to, .. }
        | Type::Tuple { from, to, .. } => Some((*from, *to)),
        Type::Struct(members) => {
            let required = members.iter().filter(|m| m.required).count() as i64;
            Some((required, members.len() as i64))
        }
        _ => None,
    }
}

/// Struct-from-struct assignability: every required key of the target must
/// be supplied, every provided member must fit, and the source may not add
/// keys the target does not name.
fn struct_assignable(
    members: &[StructMember],
    other_members: &[StructMember],
    guard: &mut RecursionGuard,
) -> bool {
    for member in members {
        match other_members.iter().find(|o| o.key == member.key) {
            Some(other_member) => {
                if member.required && !other_member.required {
                    return false;
                }
                if !member
                    .value_type
                    .is_assignable(&other_member.value_type, guard)
                {
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
    other_members
        .iter()
        .all(|o| members.iter().any(|m| m.key == o.key))
}

/// Data-from assignability, factored out for readability.
fn data_assignable(other: &Type, guard: &mut RecursionGuard) -> bool {
    match other {
        Type::Data
        | Type::Undef
        | Type::Scalar
        | Type::Numeric
        | Type::Boolean
        | Type::Integer { .. }
        | Type::Float { .. }
        | Type::String { .. }
        | Type::Enum(_)
        | Type::Pattern(_)
        | Type::Regexp(_) => true,
        Type::Array { element, .. } => Type::Data.is_assignable(element, guard),
        Type::Hash { key, value, .. } => {
            Type::any_string().is_assignable(key, guard)
                && Type::Data.is_assignable(value, guard)
        }
        Type::Tuple { types, .. } => types
            .iter()
            .all(|t| Type::Data.is_assignable(t, guard)),
        Type::Struct(members) => members
            .iter()
            .all(|m| Type::Data.is_assignable(&m.value_type, guard)),
        _ => false,
    }
}
