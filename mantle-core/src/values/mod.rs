// mantle-core - Runtime value model
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The runtime value model for Mantle.
//!
//! [`Value`] is the central enum representing all runtime values. Values are
//! immutable and use reference counting for cheap sharing; arrays are
//! persistent vectors and hashes preserve insertion order.
//!
//! Equality and hashing here are the *strict* forms used for hash keys:
//! strings compare case-sensitively, while Integer and Float cross-compare
//! numerically (and hash identically when equal). The case-insensitive
//! Unicode comparison performed by the language-level `==`, `!=` and the
//! relational operators lives in the free functions of this module
//! ([`equals_ignore_case`], [`compare_ignore_case`], [`loose_equal`]) and is
//! never used for hash keys.

pub mod iterator;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use im::Vector;
use indexmap::IndexMap;
use num_traits::ToPrimitive;

use crate::types::Type;

pub use iterator::{IteratorTransform, ValueIterator};

/// The core value type for Mantle.
#[derive(Clone, Debug)]
pub enum Value {
    /// Absence of a value; distinct from the empty string.
    Undef,
    /// The `default` literal.
    Default,
    /// Boolean true or false.
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating point number.
    Float(f64),
    /// Immutable UTF-8 string.
    String(Rc<str>),
    /// Compiled regular expression plus its original pattern text.
    Regex(ValueRegex),
    /// Ordered sequence of values (persistent, structural sharing).
    Array(Vector<Value>),
    /// Insertion-ordered mapping from value to value.
    Hash(ValueHash),
    /// A first-class type.
    Type(Rc<Type>),
    /// A resource reference: (type name, title).
    Resource(ResourceReference),
    /// A lazy view over an iterable.
    Iterator(Rc<ValueIterator>),
    /// Control flow: `break` escaping a block.
    Break,
    /// Control flow: `next` with an optional value for the current element.
    Next(Option<Box<Value>>),
    /// Control flow: `return` with an optional value from a function frame.
    Return(Option<Box<Value>>),
}

impl Value {
    /// Create a string value.
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    /// Create an array value from an iterator of values.
    pub fn array(values: impl IntoIterator<Item = Value>) -> Self {
        Value::Array(values.into_iter().collect())
    }

    /// Create a type value.
    #[must_use]
    pub fn from_type(ty: Type) -> Self {
        Value::Type(Rc::new(ty))
    }

    /// True unless the value is `undef` or `false`.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Undef | Value::Boolean(false))
    }

    /// True for the control-flow sentinels.
    #[must_use]
    pub fn is_control(&self) -> bool {
        matches!(self, Value::Break | Value::Next(_) | Value::Return(_))
    }

    /// The value as a string slice, if it is a string.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Undef
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

// ============================================================================
// Regex values
// ============================================================================

/// A compiled regular expression value.
///
/// Equality and hashing compare the original pattern text; the compiled
/// regex is immutable and shared.
#[derive(Clone, Debug)]
pub struct ValueRegex {
    pattern: Rc<str>,
    regex: Rc<regex::Regex>,
}

impl ValueRegex {
    /// Compile a pattern into a regex value.
    pub fn new(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(ValueRegex {
            pattern: pattern.into(),
            regex: Rc::new(regex::Regex::new(pattern)?),
        })
    }

    /// The original pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The compiled regex.
    #[must_use]
    pub fn regex(&self) -> &regex::Regex {
        &self.regex
    }
}

impl PartialEq for ValueRegex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for ValueRegex {}

impl Hash for ValueRegex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.pattern.hash(state);
    }
}

impl fmt::Display for ValueRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.pattern)
    }
}

// ============================================================================
// Hash values
// ============================================================================

/// An insertion-ordered mapping from value to value.
///
/// Key lookup uses the strict (case-sensitive) value equality. Two hashes
/// are equal when they hold the same entries regardless of order, so the
/// hash combines per-entry hashes commutatively.
#[derive(Clone, Debug, Default)]
pub struct ValueHash {
    entries: Rc<IndexMap<Value, Value>>,
}

impl ValueHash {
    /// Create an empty hash.
    #[must_use]
    pub fn new() -> Self {
        ValueHash::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Look up a value by string key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries.get(&Value::string(key))
    }

    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    /// The entry at the given insertion index.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<(&Value, &Value)> {
        self.entries.get_index(index)
    }

    /// Insert an entry, replacing any existing value for the key.
    pub fn insert(&mut self, key: Value, value: Value) {
        Rc::make_mut(&mut self.entries).insert(key, value);
    }

    /// Remove an entry by key.
    pub fn remove(&mut self, key: &Value) {
        Rc::make_mut(&mut self.entries).shift_remove(key);
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter()
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.keys()
    }

    /// Iterate values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }
}

impl FromIterator<(Value, Value)> for ValueHash {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        ValueHash {
            entries: Rc::new(iter.into_iter().collect()),
        }
    }
}

impl PartialEq for ValueHash {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap equality is order-insensitive, matching the contract.
        self.entries == other.entries
    }
}

impl Eq for ValueHash {}

impl Hash for ValueHash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Equality ignores entry order, so combine entry hashes with a
        // commutative operation before feeding the result to the hasher.
        let mut combined: u64 = 0;
        for (k, v) in self.entries.iter() {
            let mut entry_hasher = std::collections::hash_map::DefaultHasher::new();
            k.hash(&mut entry_hasher);
            v.hash(&mut entry_hasher);
            combined = combined.wrapping_add(entry_hasher.finish());
        }
        self.entries.len().hash(state);
        combined.hash(state);
    }
}

// ============================================================================
// Resource references
// ============================================================================

/// A reference to a catalog resource: type name plus title.
///
/// Type names are stored in canonical capitalized form (`Foo::Bar`); titles
/// compare case-sensitively.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceReference {
    type_name: String,
    title: String,
}

impl ResourceReference {
    /// Create a reference, canonicalizing the type name.
    #[must_use]
    pub fn new(type_name: &str, title: impl Into<String>) -> Self {
        ResourceReference {
            type_name: canonicalize_type_name(type_name),
            title: title.into(),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// True when this references a class rather than a resource.
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.type_name == "Class"
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.type_name, self.title)
    }
}

/// Capitalize each `::`-separated segment of a resource type name.
#[must_use]
pub fn canonicalize_type_name(name: &str) -> String {
    name.split("::")
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("::")
}

// ============================================================================
// Strict equality and hashing
// ============================================================================

/// Normalize float bits so that -0.0 == 0.0 and all NaNs agree.
fn normalize_float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0.0_f64.to_bits()
    } else {
        f.to_bits()
    }
}

/// True when the float is exactly an i64 value.
fn float_as_exact_integer(f: f64) -> Option<i64> {
    if f.fract() != 0.0 || !f.is_finite() {
        return None;
    }
    // i64::MAX is not exactly representable as f64; verify the round trip.
    let i = f.to_i64()?;
    ((i as f64) == f).then_some(i)
}

/// Hash a numeric value so that an Integer and a Float that compare equal
/// hash identically.
fn hash_numeric<H: Hasher>(state: &mut H, int: Option<i64>, float: f64) {
    const NUMERIC_DISCRIMINANT: u8 = 1;
    NUMERIC_DISCRIMINANT.hash(state);
    match int.or_else(|| float_as_exact_integer(float)) {
        Some(i) => i.hash(state),
        None => normalize_float_bits(float).hash(state),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undef, Value::Undef) => true,
            (Value::Default, Value::Default) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => {
                normalize_float_bits(*a) == normalize_float_bits(*b)
            }
            // Integer and Float compare by numeric value; equality holds iff
            // the float is exactly representable as the integer value.
            (Value::Integer(a), Value::Float(b)) => float_as_exact_integer(*b) == Some(*a),
            (Value::Float(a), Value::Integer(b)) => float_as_exact_integer(*a) == Some(*b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Regex(a), Value::Regex(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => a == b,
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Resource(a), Value::Resource(b)) => a == b,
            (Value::Iterator(a), Value::Iterator(b)) => Rc::ptr_eq(a, b) || a == b,
            (Value::Break, Value::Break) => true,
            (Value::Next(a), Value::Next(b)) => a == b,
            (Value::Return(a), Value::Return(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Value::Undef | Value::Default | Value::Break => {
                std::mem::discriminant(self).hash(state);
            }
            Value::Boolean(b) => {
                std::mem::discriminant(self).hash(state);
                b.hash(state);
            }
            // Numeric values hash through hash_numeric so that 1 and 1.0,
            // which compare equal, also hash equal.
            Value::Integer(i) => hash_numeric(state, Some(*i), *i as f64),
            Value::Float(f) => hash_numeric(state, None, *f),
            Value::String(s) => {
                std::mem::discriminant(self).hash(state);
                s.hash(state);
            }
            Value::Regex(r) => {
                std::mem::discriminant(self).hash(state);
                r.hash(state);
            }
            Value::Array(items) => {
                std::mem::discriminant(self).hash(state);
                for item in items {
                    item.hash(state);
                }
            }
            Value::Hash(h) => {
                std::mem::discriminant(self).hash(state);
                h.hash(state);
            }
            Value::Type(t) => {
                std::mem::discriminant(self).hash(state);
                t.hash(state);
            }
            Value::Resource(r) => {
                std::mem::discriminant(self).hash(state);
                r.hash(state);
            }
            Value::Iterator(it) => {
                std::mem::discriminant(self).hash(state);
                it.hash(state);
            }
            Value::Next(v) | Value::Return(v) => {
                std::mem::discriminant(self).hash(state);
                v.hash(state);
            }
        }
    }
}

// ============================================================================
// Case-insensitive comparison
// ============================================================================

/// Compare two strings case-insensitively under Unicode case folding.
#[must_use]
pub fn equals_ignore_case(left: &str, right: &str) -> bool {
    if left == right {
        return true;
    }
    let mut left_chars = left.chars().flat_map(char::to_lowercase);
    let mut right_chars = right.chars().flat_map(char::to_lowercase);
    loop {
        match (left_chars.next(), right_chars.next()) {
            (None, None) => return true,
            (Some(l), Some(r)) if l == r => {}
            _ => return false,
        }
    }
}

/// Collate two strings case-insensitively under Unicode case folding.
#[must_use]
pub fn compare_ignore_case(left: &str, right: &str) -> std::cmp::Ordering {
    let left_chars = left.chars().flat_map(char::to_lowercase);
    let right_chars = right.chars().flat_map(char::to_lowercase);
    left_chars.cmp(right_chars)
}

/// The equality used by the language-level `==` operator and everything
/// built on it (`in`, case/selector matching, array search): identical to
/// strict equality except that string pairs compare case-insensitively.
#[must_use]
pub fn loose_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::String(a), Value::String(b)) => equals_ignore_case(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| loose_equal(x, y))
        }
        (Value::Hash(a), Value::Hash(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).is_some_and(|other| loose_equal(v, other)))
        }
        _ => left == right,
    }
}

/// The number of Unicode codepoints in a string; the unit of String type
/// length bounds.
#[must_use]
pub fn codepoint_count(s: &str) -> usize {
    s.chars().count()
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undef => write!(f, "undef"),
            Value::Default => write!(f, "default"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(x) => {
                if x.fract() == 0.0 && x.is_finite() {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::String(s) => write!(f, "{s}"),
            Value::Regex(r) => write!(f, "{r}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Hash(h) => {
                write!(f, "{{")?;
                for (i, (k, v)) in h.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k} => {v}")?;
                }
                write!(f, "}}")
            }
            Value::Type(t) => write!(f, "{t}"),
            Value::Resource(r) => write!(f, "{r}"),
            Value::Iterator(it) => write!(f, "{it}"),
            Value::Break => write!(f, "break"),
            Value::Next(_) => write!(f, "next"),
            Value::Return(_) => write!(f, "return"),
        }
    }
}
