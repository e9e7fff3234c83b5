// mantle-core - The type system
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The Mantle type system.
//!
//! [`Type`] is a closed tagged union over every type in the language,
//! recursive through arrays, hashes, tuples, structs, variants, optionals,
//! callables, and named aliases. Types are immutable once constructed;
//! aliases carry a lazily resolved body behind a shared cell so that
//! self-referential aliases can be created before their body is known.
//!
//! Membership ([`Type::is_instance`]) and assignability
//! ([`Type::is_assignable`]) live in their own modules and both take a
//! [`RecursionGuard`] that terminates traversal of cyclic alias graphs by
//! assuming success on re-entry of a visited pair.

mod assignable;
mod guard;
mod instance;
mod parse;

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::values::{ValueHash, ValueRegex, Value};

pub use guard::RecursionGuard;
pub use parse::{parse, parse_with, TypeResolver};

/// Unbounded length or range bound.
pub const UNBOUNDED: i64 = i64::MAX;

/// A Mantle type.
#[derive(Clone, Debug)]
pub enum Type {
    /// The universal top type.
    Any,
    /// Matches only undef.
    Undef,
    /// Matches any value other than undef, optionally restricted further.
    NotUndef(Option<Rc<Type>>),
    /// Matches only the `default` literal.
    Default,
    Boolean,
    /// Union of Numeric, String, Boolean, and Regexp.
    Scalar,
    /// Union of Integer and Float.
    Numeric,
    /// Union of Scalar, Undef, Array[Data], and Hash[String, Data].
    Data,
    /// Any array or hash with a size in the given range.
    Collection { from: i64, to: i64 },
    /// Integers within an inclusive range.
    Integer { from: i64, to: i64 },
    /// Floats within an inclusive range.
    Float { from: f64, to: f64 },
    /// Strings with a codepoint length in the given range.
    String { from: i64, to: i64 },
    /// Strings matching at least one of the patterns.
    Pattern(Vec<ValueRegex>),
    /// Strings drawn from an exact set.
    Enum(Vec<std::string::String>),
    /// Regex values, optionally with an exact pattern.
    Regexp(Option<Rc<str>>),
    Array {
        element: Rc<Type>,
        from: i64,
        to: i64,
    },
    Hash {
        key: Rc<Type>,
        value: Rc<Type>,
        from: i64,
        to: i64,
    },
    /// Positionally typed arrays; the last element type repeats to fill the
    /// size range.
    Tuple {
        types: Vec<Type>,
        from: i64,
        to: i64,
    },
    /// String-keyed hashes with per-key value types.
    Struct(Vec<StructMember>),
    /// Union of the alternatives.
    Variant(Vec<Type>),
    /// Equivalent to Variant[inner, Undef].
    Optional(Option<Rc<Type>>),
    /// The metatype of first-class types.
    Type(Option<Rc<Type>>),
    /// Union of Resource and Class.
    CatalogEntry,
    /// Resource references, optionally narrowed by type name and title.
    Resource {
        type_name: Option<std::string::String>,
        title: Option<std::string::String>,
    },
    /// Class references, optionally narrowed by name.
    Class(Option<std::string::String>),
    /// Host-runtime objects; opaque at this layer.
    Runtime,
    /// Anything the iteration functions can stream over.
    Iterable,
    /// Lazy iterator values.
    Iterator,
    /// Function and block signatures.
    Callable(CallableType),
    /// A named user alias; may refer to itself.
    Alias(AliasType),
}

/// One member of a Struct type.
#[derive(Clone, Debug, PartialEq)]
pub struct StructMember {
    /// The member key.
    pub key: std::string::String,
    /// The member's value type.
    pub value_type: Type,
    /// Whether the key must be present.
    pub required: bool,
}

impl StructMember {
    #[must_use]
    pub fn new(key: impl Into<std::string::String>, value_type: Type, required: bool) -> Self {
        StructMember {
            key: key.into(),
            value_type,
            required,
        }
    }
}

/// A Callable signature: positional parameter types with an arity range and
/// an optional block type.
#[derive(Clone, Debug, PartialEq)]
pub struct CallableType {
    /// Positional parameter types; the last repeats to fill the range.
    pub parameter_types: Vec<Type>,
    /// Minimum argument count.
    pub from: i64,
    /// Maximum argument count.
    pub to: i64,
    /// The block signature, if the callable takes a block.
    pub block: Option<Rc<Type>>,
}

impl CallableType {
    /// A callable accepting exactly the given parameter types.
    #[must_use]
    pub fn new(parameter_types: Vec<Type>) -> Self {
        let count = parameter_types.len() as i64;
        CallableType {
            parameter_types,
            from: count,
            to: count,
            block: None,
        }
    }
}

// ============================================================================
// Aliases
// ============================================================================

/// A named type alias with a lazily resolved body.
///
/// The body lives behind a shared cell: a recursive alias is created
/// unresolved, registered so its own body can refer to it, and resolved
/// once the body has been evaluated. Equality and hashing use the name.
#[derive(Clone, Debug)]
pub struct AliasType {
    inner: Rc<AliasInner>,
}

#[derive(Debug)]
struct AliasInner {
    name: std::string::String,
    resolved: RefCell<Option<Rc<Type>>>,
}

impl AliasType {
    /// Create an alias whose body is not yet known.
    #[must_use]
    pub fn unresolved(name: impl Into<std::string::String>) -> Self {
        AliasType {
            inner: Rc::new(AliasInner {
                name: name.into(),
                resolved: RefCell::new(None),
            }),
        }
    }

    /// Create an alias with a known body.
    #[must_use]
    pub fn new(name: impl Into<std::string::String>, body: Type) -> Self {
        let alias = AliasType::unresolved(name);
        alias.resolve_to(body);
        alias
    }

    /// The alias name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Supply the alias body. Later calls replace the body; the evaluator
    /// only resolves each alias once.
    pub fn resolve_to(&self, body: Type) {
        *self.inner.resolved.borrow_mut() = Some(Rc::new(body));
    }

    /// The resolved body, if resolution has happened.
    #[must_use]
    pub fn resolved(&self) -> Option<Rc<Type>> {
        self.inner.resolved.borrow().clone()
    }

    /// A stable identity for recursion guards.
    #[must_use]
    pub(crate) fn guard_key(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }
}

impl PartialEq for AliasType {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner) || self.inner.name == other.inner.name
    }
}

impl Eq for AliasType {}

// ============================================================================
// Constructors
// ============================================================================

impl Type {
    /// Strings of any length.
    #[must_use]
    pub fn any_string() -> Self {
        Type::String {
            from: 0,
            to: UNBOUNDED,
        }
    }

    /// Integers within an inclusive range.
    #[must_use]
    pub fn integer(from: i64, to: i64) -> Self {
        Type::Integer { from, to }
    }

    /// Integers of any value.
    #[must_use]
    pub fn any_integer() -> Self {
        Type::Integer {
            from: i64::MIN,
            to: i64::MAX,
        }
    }

    /// Floats of any value.
    #[must_use]
    pub fn any_float() -> Self {
        Type::Float {
            from: f64::NEG_INFINITY,
            to: f64::INFINITY,
        }
    }

    /// Arrays of the given element type, any length.
    #[must_use]
    pub fn array_of(element: Type) -> Self {
        Type::Array {
            element: Rc::new(element),
            from: 0,
            to: UNBOUNDED,
        }
    }

    /// Hashes with the given key and value types, any size.
    #[must_use]
    pub fn hash_of(key: Type, value: Type) -> Self {
        Type::Hash {
            key: Rc::new(key),
            value: Rc::new(value),
            from: 0,
            to: UNBOUNDED,
        }
    }

    /// An optional (undef-admitting) form of the given type.
    #[must_use]
    pub fn optional(inner: Type) -> Self {
        Type::Optional(Some(Rc::new(inner)))
    }

    /// The simple name of the type, without parameters.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Type::Any => "Any",
            Type::Undef => "Undef",
            Type::NotUndef(_) => "NotUndef",
            Type::Default => "Default",
            Type::Boolean => "Boolean",
            Type::Scalar => "Scalar",
            Type::Numeric => "Numeric",
            Type::Data => "Data",
            Type::Collection { .. } => "Collection",
            Type::Integer { .. } => "Integer",
            Type::Float { .. } => "Float",
            Type::String { .. } => "String",
            Type::Pattern(_) => "Pattern",
            Type::Enum(_) => "Enum",
            Type::Regexp(_) => "Regexp",
            Type::Array { .. } => "Array",
            Type::Hash { .. } => "Hash",
            Type::Tuple { .. } => "Tuple",
            Type::Struct(_) => "Struct",
            Type::Variant(_) => "Variant",
            Type::Optional(_) => "Optional",
            Type::Type(_) => "Type",
            Type::CatalogEntry => "CatalogEntry",
            Type::Resource { .. } => "Resource",
            Type::Class(_) => "Class",
            Type::Runtime => "Runtime",
            Type::Iterable => "Iterable",
            Type::Iterator => "Iterator",
            Type::Callable(_) => "Callable",
            Type::Alias(_) => "Alias",
        }
    }

    /// Yield the type with every numeric and length range widened to
    /// unbounded, recursing through parameters. Idempotent.
    #[must_use]
    pub fn generalize(&self) -> Type {
        match self {
            Type::Collection { .. } => Type::Collection {
                from: 0,
                to: UNBOUNDED,
            },
            Type::Integer { .. } => Type::any_integer(),
            Type::Float { .. } => Type::any_float(),
            Type::String { .. } => Type::any_string(),
            Type::Array { element, .. } => Type::Array {
                element: Rc::new(element.generalize()),
                from: 0,
                to: UNBOUNDED,
            },
            Type::Hash { key, value, .. } => Type::Hash {
                key: Rc::new(key.generalize()),
                value: Rc::new(value.generalize()),
                from: 0,
                to: UNBOUNDED,
            },
            Type::Tuple { types, .. } => Type::Tuple {
                types: types.iter().map(Type::generalize).collect(),
                from: 0,
                to: UNBOUNDED,
            },
            Type::Struct(members) => Type::Struct(
                members
                    .iter()
                    .map(|m| StructMember::new(m.key.clone(), m.value_type.generalize(), m.required))
                    .collect(),
            ),
            Type::Variant(alternatives) => {
                Type::Variant(alternatives.iter().map(Type::generalize).collect())
            }
            Type::Optional(Some(inner)) => Type::optional(inner.generalize()),
            Type::NotUndef(Some(inner)) => Type::NotUndef(Some(Rc::new(inner.generalize()))),
            Type::Type(Some(inner)) => Type::Type(Some(Rc::new(inner.generalize()))),
            other => other.clone(),
        }
    }

    /// True when undef is an instance of the type.
    #[must_use]
    pub fn admits_undef(&self) -> bool {
        match self {
            Type::Any | Type::Undef | Type::Data | Type::Optional(_) => true,
            Type::Variant(alternatives) => alternatives.iter().any(Type::admits_undef),
            Type::Alias(alias) => alias
                .resolved()
                .is_some_and(|body| body.admits_undef()),
            _ => false,
        }
    }
}

// ============================================================================
// Inference
// ============================================================================

/// Infer the tightest type of a value: `Integer[5, 5]` for 5, the singleton
/// `Enum` for a string, an exact `Tuple` for an array, a `Struct` for a
/// string-keyed hash.
#[must_use]
pub fn infer(value: &Value) -> Type {
    match value {
        Value::Undef => Type::Undef,
        Value::Default => Type::Default,
        Value::Boolean(_) => Type::Boolean,
        Value::Integer(i) => Type::integer(*i, *i),
        Value::Float(f) => Type::Float { from: *f, to: *f },
        Value::String(s) => Type::Enum(vec![s.to_string()]),
        Value::Regex(r) => Type::Regexp(Some(r.pattern().into())),
        Value::Array(items) => {
            let types: Vec<Type> = items.iter().map(infer).collect();
            let count = types.len() as i64;
            Type::Tuple {
                types,
                from: count,
                to: count,
            }
        }
        Value::Hash(h) => infer_hash(h),
        Value::Type(t) => Type::Type(Some(Rc::new((**t).clone()))),
        Value::Resource(r) => {
            if r.is_class() {
                Type::Class(Some(r.title().to_string()))
            } else {
                Type::Resource {
                    type_name: Some(r.type_name().to_string()),
                    title: Some(r.title().to_string()),
                }
            }
        }
        Value::Iterator(_) => Type::Iterator,
        // The sentinels have no language-level type; Any keeps internal
        // diagnostics from failing if one leaks into a message.
        Value::Break | Value::Next(_) | Value::Return(_) => Type::Any,
    }
}

/// The generalized type of a value as shown in diagnostics: the shape of
/// the value without the literal-derived constraints `infer` produces.
#[must_use]
pub fn display_type(value: &Value) -> Type {
    match value {
        Value::Undef => Type::Undef,
        Value::Default => Type::Default,
        Value::Boolean(_) => Type::Boolean,
        Value::Integer(_) => Type::any_integer(),
        Value::Float(_) => Type::any_float(),
        Value::String(_) => Type::any_string(),
        Value::Regex(_) => Type::Regexp(None),
        Value::Array(_) => Type::array_of(Type::Any),
        Value::Hash(_) => Type::hash_of(Type::Any, Type::Any),
        Value::Type(_) => Type::Type(None),
        Value::Resource(r) => {
            if r.is_class() {
                Type::Class(None)
            } else {
                Type::Resource {
                    type_name: Some(r.type_name().to_string()),
                    title: None,
                }
            }
        }
        Value::Iterator(_) => Type::Iterator,
        Value::Break | Value::Next(_) | Value::Return(_) => Type::Any,
    }
}

fn infer_hash(hash: &ValueHash) -> Type {
    let string_keyed = hash.keys().all(|k| matches!(k, Value::String(_)));
    if string_keyed {
        let members = hash
            .iter()
            .map(|(k, v)| {
                let key = k.as_string().unwrap_or_default().to_string();
                StructMember::new(key, infer(v), true)
            })
            .collect();
        return Type::Struct(members);
    }
    let size = hash.len() as i64;
    Type::Hash {
        key: Rc::new(Type::Variant(hash.keys().map(infer).collect())),
        value: Rc::new(Type::Variant(hash.values().map(infer).collect())),
        from: size,
        to: size,
    }
}

// ============================================================================
// Equality and hashing
// ============================================================================

fn float_bound_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Any, Type::Any)
            | (Type::Undef, Type::Undef)
            | (Type::Default, Type::Default)
            | (Type::Boolean, Type::Boolean)
            | (Type::Scalar, Type::Scalar)
            | (Type::Numeric, Type::Numeric)
            | (Type::Data, Type::Data)
            | (Type::CatalogEntry, Type::CatalogEntry)
            | (Type::Runtime, Type::Runtime)
            | (Type::Iterable, Type::Iterable)
            | (Type::Iterator, Type::Iterator) => true,
            (Type::NotUndef(a), Type::NotUndef(b)) => a == b,
            (
                Type::Collection { from: f1, to: t1 },
                Type::Collection { from: f2, to: t2 },
            ) => f1 == f2 && t1 == t2,
            (Type::Integer { from: f1, to: t1 }, Type::Integer { from: f2, to: t2 }) => {
                f1 == f2 && t1 == t2
            }
            (Type::Float { from: f1, to: t1 }, Type::Float { from: f2, to: t2 }) => {
                float_bound_bits(*f1) == float_bound_bits(*f2)
                    && float_bound_bits(*t1) == float_bound_bits(*t2)
            }
            (Type::String { from: f1, to: t1 }, Type::String { from: f2, to: t2 }) => {
                f1 == f2 && t1 == t2
            }
            (Type::Pattern(a), Type::Pattern(b)) => a == b,
            (Type::Enum(a), Type::Enum(b)) => a == b,
            (Type::Regexp(a), Type::Regexp(b)) => a == b,
            (
                Type::Array {
                    element: e1,
                    from: f1,
                    to: t1,
                },
                Type::Array {
                    element: e2,
                    from: f2,
                    to: t2,
                },
            ) => f1 == f2 && t1 == t2 && e1 == e2,
            (
                Type::Hash {
                    key: k1,
                    value: v1,
                    from: f1,
                    to: t1,
                },
                Type::Hash {
                    key: k2,
                    value: v2,
                    from: f2,
                    to: t2,
                },
            ) => f1 == f2 && t1 == t2 && k1 == k2 && v1 == v2,
            (
                Type::Tuple {
                    types: ty1,
                    from: f1,
                    to: t1,
                },
                Type::Tuple {
                    types: ty2,
                    from: f2,
                    to: t2,
                },
            ) => f1 == f2 && t1 == t2 && ty1 == ty2,
            (Type::Struct(a), Type::Struct(b)) => a == b,
            (Type::Variant(a), Type::Variant(b)) => a == b,
            (Type::Optional(a), Type::Optional(b)) => a == b,
            (Type::Type(a), Type::Type(b)) => a == b,
            (
                Type::Resource {
                    type_name: n1,
                    title: t1,
                },
                Type::Resource {
                    type_name: n2,
                    title: t2,
                },
            ) => n1 == n2 && t1 == t2,
            (Type::Class(a), Type::Class(b)) => a == b,
            (Type::Callable(a), Type::Callable(b)) => a == b,
            (Type::Alias(a), Type::Alias(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Type::NotUndef(inner) | Type::Optional(inner) | Type::Type(inner) => {
                inner.hash(state);
            }
            Type::Collection { from, to }
            | Type::Integer { from, to }
            | Type::String { from, to } => {
                from.hash(state);
                to.hash(state);
            }
            Type::Float { from, to } => {
                float_bound_bits(*from).hash(state);
                float_bound_bits(*to).hash(state);
            }
            Type::Pattern(patterns) => patterns.hash(state),
            Type::Enum(values) => values.hash(state),
            Type::Regexp(pattern) => pattern.hash(state),
            Type::Array { element, from, to } => {
                element.hash(state);
                from.hash(state);
                to.hash(state);
            }
            Type::Hash {
                key,
                value,
                from,
                to,
            } => {
                key.hash(state);
                value.hash(state);
                from.hash(state);
                to.hash(state);
            }
            Type::Tuple { types, from, to } => {
                for t in types {
                    t.hash(state);
                }
                from.hash(state);
                to.hash(state);
            }
            Type::Struct(members) => {
                for member in members {
                    member.key.hash(state);
                    member.value_type.hash(state);
                    member.required.hash(state);
                }
            }
            Type::Variant(alternatives) => {
                for t in alternatives {
                    t.hash(state);
                }
            }
            Type::Resource { type_name, title } => {
                type_name.hash(state);
                title.hash(state);
            }
            Type::Class(name) => name.hash(state),
            Type::Callable(callable) => {
                for t in &callable.parameter_types {
                    t.hash(state);
                }
                callable.from.hash(state);
                callable.to.hash(state);
                callable.block.hash(state);
            }
            Type::Alias(alias) => alias.name().hash(state),
            _ => {}
        }
    }
}

// ============================================================================
// Display
// ============================================================================

fn write_length_bounds(
    f: &mut fmt::Formatter<'_>,
    lead: bool,
    from: i64,
    to: i64,
) -> fmt::Result {
    if from == 0 && to == UNBOUNDED {
        return Ok(());
    }
    if lead {
        write!(f, "[")?;
    } else {
        write!(f, ", ")?;
    }
    write!(f, "{from}")?;
    if to == UNBOUNDED {
        write!(f, ", default")?;
    } else {
        write!(f, ", {to}")?;
    }
    if lead {
        write!(f, "]")?;
    }
    Ok(())
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any
            | Type::Undef
            | Type::Default
            | Type::Boolean
            | Type::Scalar
            | Type::Numeric
            | Type::Data
            | Type::CatalogEntry
            | Type::Runtime
            | Type::Iterable
            | Type::Iterator => write!(f, "{}", self.name()),
            Type::NotUndef(None) => write!(f, "NotUndef"),
            Type::NotUndef(Some(inner)) => write!(f, "NotUndef[{inner}]"),
            Type::Collection { from, to } => {
                write!(f, "Collection")?;
                write_length_bounds(f, true, *from, *to)
            }
            Type::Integer { from, to } => {
                if *from == i64::MIN && *to == i64::MAX {
                    return write!(f, "Integer");
                }
                write!(f, "Integer[")?;
                if *from == i64::MIN {
                    write!(f, "default")?;
                } else {
                    write!(f, "{from}")?;
                }
                if *to == i64::MAX {
                    write!(f, ", default]")
                } else {
                    write!(f, ", {to}]")
                }
            }
            Type::Float { from, to } => {
                if *from == f64::NEG_INFINITY && *to == f64::INFINITY {
                    return write!(f, "Float");
                }
                write!(f, "Float[")?;
                if *from == f64::NEG_INFINITY {
                    write!(f, "default")?;
                } else {
                    write!(f, "{from}")?;
                }
                if *to == f64::INFINITY {
                    write!(f, ", default]")
                } else {
                    write!(f, ", {to}]")
                }
            }
            Type::String { from, to } => {
                write!(f, "String")?;
                write_length_bounds(f, true, *from, *to)
            }
            Type::Pattern(patterns) => {
                write!(f, "Pattern[")?;
                for (i, p) in patterns.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, "]")
            }
            Type::Enum(values) => {
                write!(f, "Enum[")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{v}'")?;
                }
                write!(f, "]")
            }
            Type::Regexp(None) => write!(f, "Regexp"),
            Type::Regexp(Some(pattern)) => write!(f, "Regexp[/{pattern}/]"),
            Type::Array { element, from, to } => {
                if matches!(&**element, Type::Any) && *from == 0 && *to == UNBOUNDED {
                    return write!(f, "Array");
                }
                write!(f, "Array[{element}")?;
                write_length_bounds(f, false, *from, *to)?;
                write!(f, "]")
            }
            Type::Hash {
                key,
                value,
                from,
                to,
            } => {
                if matches!(&**key, Type::Any)
                    && matches!(&**value, Type::Any)
                    && *from == 0
                    && *to == UNBOUNDED
                {
                    return write!(f, "Hash");
                }
                write!(f, "Hash[{key}, {value}")?;
                write_length_bounds(f, false, *from, *to)?;
                write!(f, "]")
            }
            Type::Tuple { types, from, to } => {
                write!(f, "Tuple[")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                let exact = types.len() as i64;
                if *from != exact || *to != exact {
                    write!(f, ", {from}")?;
                    if *to == UNBOUNDED {
                        write!(f, ", default")?;
                    } else {
                        write!(f, ", {to}")?;
                    }
                }
                write!(f, "]")
            }
            Type::Struct(members) => {
                write!(f, "Struct[{{")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if member.required {
                        write!(f, "'{}' => {}", member.key, member.value_type)?;
                    } else {
                        write!(f, "Optional['{}'] => {}", member.key, member.value_type)?;
                    }
                }
                write!(f, "}}]")
            }
            Type::Variant(alternatives) => {
                write!(f, "Variant[")?;
                for (i, t) in alternatives.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, "]")
            }
            Type::Optional(None) => write!(f, "Optional"),
            Type::Optional(Some(inner)) => write!(f, "Optional[{inner}]"),
            Type::Type(None) => write!(f, "Type"),
            Type::Type(Some(inner)) => write!(f, "Type[{inner}]"),
            Type::Resource { type_name, title } => match (type_name, title) {
                (None, _) => write!(f, "Resource"),
                (Some(name), None) => write!(f, "{name}"),
                (Some(name), Some(title)) => write!(f, "{name}['{title}']"),
            },
            Type::Class(None) => write!(f, "Class"),
            Type::Class(Some(name)) => write!(f, "Class['{name}']"),
            Type::Callable(callable) => {
                write!(f, "Callable[")?;
                let mut first = true;
                for t in &callable.parameter_types {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{t}")?;
                }
                let exact = callable.parameter_types.len() as i64;
                if callable.from != exact || callable.to != exact {
                    if !first {
                        write!(f, ", ")?;
                    }
                    first = false;
                    write!(f, "{}", callable.from)?;
                    if callable.to == UNBOUNDED {
                        write!(f, ", default")?;
                    } else {
                        write!(f, ", {}", callable.to)?;
                    }
                }
                if let Some(block) = &callable.block {
                    if !first {
                        write!(f, ", ")?;
                    }
                    write!(f, "{block}")?;
                }
                write!(f, "]")
            }
            Type::Alias(alias) => write!(f, "{}", alias.name()),
        }
    }
}
