// mantle-core - Type expression parsing
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Parsing of type expressions.
//!
//! Operator dispatch patterns (`"String"`, `"Numeric"`), function
//! signatures (`"Callable[Iterable, 1, 1, Callable[1,2]]"`), parameter
//! type annotations, and type alias bodies are all written as type
//! expression strings and parsed here. Names that are not built-in types
//! are handed to a [`TypeResolver`], which is how alias bodies find other
//! aliases (and themselves) through the registry.

use std::rc::Rc;

use crate::error::{Error, Result};
use crate::values::ValueRegex;

use super::{CallableType, StructMember, Type, UNBOUNDED};

/// Resolves type names the parser does not recognise as built-ins.
pub trait TypeResolver {
    /// Resolve a non-built-in type name to a type.
    fn resolve(&mut self, name: &str) -> Result<Type>;
}

/// A resolver for contexts where only built-in types may appear, such as
/// the operator dispatch tables.
struct NoAliases;

impl TypeResolver for NoAliases {
    fn resolve(&mut self, name: &str) -> Result<Type> {
        Err(Error::evaluation(format!("unknown type '{name}'")))
    }
}

/// Parse a type expression containing only built-in types.
pub fn parse(source: &str) -> Result<Type> {
    parse_with(source, &mut NoAliases)
}

/// Parse a type expression, resolving unknown names through the resolver.
pub fn parse_with(source: &str, resolver: &mut dyn TypeResolver) -> Result<Type> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        position: 0,
        resolver,
    };
    let ty = parser.parse_type()?;
    if parser.position != parser.tokens.len() {
        return Err(Error::evaluation(format!(
            "unexpected trailing input in type expression '{source}'"
        )));
    }
    Ok(ty)
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Integer(i64),
    Float(f64),
    String(String),
    Regex(String),
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    Arrow,
}

fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\n' | '\r' => {
                chars.next();
            }
            '[' => {
                chars.next();
                tokens.push(Token::OpenBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::CloseBracket);
            }
            '{' => {
                chars.next();
                tokens.push(Token::OpenBrace);
            }
            '}' => {
                chars.next();
                tokens.push(Token::CloseBrace);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '=' => {
                chars.next();
                if chars.next() != Some('>') {
                    return Err(Error::evaluation(format!(
                        "unexpected '=' in type expression '{source}'"
                    )));
                }
                tokens.push(Token::Arrow);
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some('\\') => match chars.next() {
                            Some(escaped) => text.push(escaped),
                            None => {
                                return Err(Error::evaluation(format!(
                                    "unterminated string in type expression '{source}'"
                                )))
                            }
                        },
                        Some(other) => text.push(other),
                        None => {
                            return Err(Error::evaluation(format!(
                                "unterminated string in type expression '{source}'"
                            )))
                        }
                    }
                }
                tokens.push(Token::String(text));
            }
            '/' => {
                chars.next();
                let mut pattern = String::new();
                loop {
                    match chars.next() {
                        Some('/') => break,
                        Some('\\') => match chars.next() {
                            Some('/') => pattern.push('/'),
                            Some(other) => {
                                pattern.push('\\');
                                pattern.push(other);
                            }
                            None => {
                                return Err(Error::evaluation(format!(
                                    "unterminated regex in type expression '{source}'"
                                )))
                            }
                        },
                        Some(other) => pattern.push(other),
                        None => {
                            return Err(Error::evaluation(format!(
                                "unterminated regex in type expression '{source}'"
                            )))
                        }
                    }
                }
                tokens.push(Token::Regex(pattern));
            }
            '-' | '0'..='9' => {
                let mut text = String::new();
                if c == '-' {
                    text.push(c);
                    chars.next();
                }
                let mut float = false;
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        text.push(d);
                        chars.next();
                    } else if d == '.' && !float {
                        float = true;
                        text.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if float {
                    let value = text.parse::<f64>().map_err(|_| {
                        Error::evaluation(format!("invalid number '{text}' in type expression"))
                    })?;
                    tokens.push(Token::Float(value));
                } else {
                    let value = text.parse::<i64>().map_err(|_| {
                        Error::evaluation(format!("invalid number '{text}' in type expression"))
                    })?;
                    tokens.push(Token::Integer(value));
                }
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_alphanumeric() || d == '_' || d == ':' {
                        name.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(name));
            }
            other => {
                return Err(Error::evaluation(format!(
                    "unexpected character '{other}' in type expression '{source}'"
                )));
            }
        }
    }
    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

/// One bracketed argument of a parameterized type.
enum Argument {
    Type(Type),
    Integer(i64),
    Float(f64),
    String(String),
    Regex(String),
    Default,
}

struct Parser<'a> {
    tokens: Vec<Token>,
    position: usize,
    resolver: &'a mut dyn TypeResolver,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        match self.next() {
            Some(ref t) if t == token => Ok(()),
            other => Err(Error::evaluation(format!(
                "expected {token:?} in type expression but found {other:?}"
            ))),
        }
    }

    fn parse_type(&mut self) -> Result<Type> {
        match self.next() {
            Some(Token::Name(name)) => {
                let arguments = if self.peek() == Some(&Token::OpenBracket) {
                    self.next();
                    let mut arguments = Vec::new();
                    if self.peek() != Some(&Token::CloseBracket) {
                        loop {
                            arguments.push(self.parse_argument()?);
                            match self.next() {
                                Some(Token::Comma) => continue,
                                Some(Token::CloseBracket) => break,
                                other => {
                                    return Err(Error::evaluation(format!(
                                        "expected ',' or ']' in type expression but found {other:?}"
                                    )))
                                }
                            }
                        }
                    } else {
                        self.next();
                    }
                    arguments
                } else {
                    Vec::new()
                };
                self.build(&name, arguments)
            }
            other => Err(Error::evaluation(format!(
                "expected a type name but found {other:?}"
            ))),
        }
    }

    fn parse_argument(&mut self) -> Result<Argument> {
        match self.peek() {
            Some(Token::Integer(i)) => {
                let i = *i;
                self.next();
                Ok(Argument::Integer(i))
            }
            Some(Token::Float(f)) => {
                let f = *f;
                self.next();
                Ok(Argument::Float(f))
            }
            Some(Token::String(_)) => match self.next() {
                Some(Token::String(s)) => Ok(Argument::String(s)),
                _ => unreachable!("peeked a string token"),
            },
            Some(Token::Regex(_)) => match self.next() {
                Some(Token::Regex(p)) => Ok(Argument::Regex(p)),
                _ => unreachable!("peeked a regex token"),
            },
            Some(Token::Name(name)) if name == "default" => {
                self.next();
                Ok(Argument::Default)
            }
            Some(Token::OpenBrace) => self.parse_struct_literal(),
            _ => Ok(Argument::Type(self.parse_type()?)),
        }
    }

    /// Parse `{ 'key' => Type, Optional['key'] => Type, ... }`.
    fn parse_struct_literal(&mut self) -> Result<Argument> {
        self.expect(&Token::OpenBrace)?;
        let mut members = Vec::new();
        if self.peek() != Some(&Token::CloseBrace) {
            loop {
                let (key, explicit) = self.parse_struct_key()?;
                self.expect(&Token::Arrow)?;
                let value_type = self.parse_type()?;
                // A plain key is optional when its value type admits undef;
                // Optional[...] and NotUndef[...] keys say so explicitly.
                let required = explicit.unwrap_or_else(|| !value_type.admits_undef());
                members.push(StructMember::new(key, value_type, required));
                match self.next() {
                    Some(Token::Comma) => continue,
                    Some(Token::CloseBrace) => break,
                    other => {
                        return Err(Error::evaluation(format!(
                            "expected ',' or '}}' in struct type but found {other:?}"
                        )))
                    }
                }
            }
        } else {
            self.next();
        }
        Ok(Argument::Type(Type::Struct(members)))
    }

    fn parse_struct_key(&mut self) -> Result<(String, Option<bool>)> {
        match self.next() {
            Some(Token::String(key)) => Ok((key, None)),
            Some(Token::Name(wrapper)) if wrapper == "Optional" || wrapper == "NotUndef" => {
                self.expect(&Token::OpenBracket)?;
                let key = match self.next() {
                    Some(Token::String(key)) => key,
                    other => {
                        return Err(Error::evaluation(format!(
                            "expected a quoted struct key but found {other:?}"
                        )))
                    }
                };
                self.expect(&Token::CloseBracket)?;
                Ok((key, Some(wrapper == "NotUndef")))
            }
            other => Err(Error::evaluation(format!(
                "expected a struct key but found {other:?}"
            ))),
        }
    }

    fn build(&mut self, name: &str, arguments: Vec<Argument>) -> Result<Type> {
        match name {
            "Any" => no_arguments(name, arguments, Type::Any),
            "Undef" => no_arguments(name, arguments, Type::Undef),
            "Default" => no_arguments(name, arguments, Type::Default),
            "Boolean" => no_arguments(name, arguments, Type::Boolean),
            "Scalar" => no_arguments(name, arguments, Type::Scalar),
            "Numeric" => no_arguments(name, arguments, Type::Numeric),
            "Data" => no_arguments(name, arguments, Type::Data),
            "CatalogEntry" => no_arguments(name, arguments, Type::CatalogEntry),
            "Runtime" => no_arguments(name, arguments, Type::Runtime),
            "Iterable" => no_arguments(name, arguments, Type::Iterable),
            "Iterator" => no_arguments(name, arguments, Type::Iterator),
            "NotUndef" => match one_optional_type(name, arguments)? {
                Some(inner) => Ok(Type::NotUndef(Some(Rc::new(inner)))),
                None => Ok(Type::NotUndef(None)),
            },
            "Optional" => match one_optional_type(name, arguments)? {
                Some(inner) => Ok(Type::optional(inner)),
                None => Ok(Type::Optional(None)),
            },
            "Type" => match one_optional_type(name, arguments)? {
                Some(inner) => Ok(Type::Type(Some(Rc::new(inner)))),
                None => Ok(Type::Type(None)),
            },
            "Collection" => {
                let (from, to) = integer_bounds(name, &arguments, 0, UNBOUNDED)?;
                Ok(Type::Collection { from, to })
            }
            "Integer" => {
                let (from, to) = integer_bounds(name, &arguments, i64::MIN, i64::MAX)?;
                Ok(Type::Integer { from, to })
            }
            "String" => {
                let (from, to) = integer_bounds(name, &arguments, 0, UNBOUNDED)?;
                Ok(Type::String { from, to })
            }
            "Float" => {
                let mut bounds = [f64::NEG_INFINITY, f64::INFINITY];
                if arguments.len() > 2 {
                    return Err(too_many_arguments(name));
                }
                for (i, argument) in arguments.iter().enumerate() {
                    bounds[i] = match argument {
                        Argument::Float(f) => *f,
                        Argument::Integer(n) => *n as f64,
                        Argument::Default => bounds[i],
                        _ => return Err(bad_argument(name)),
                    };
                }
                Ok(Type::Float {
                    from: bounds[0],
                    to: bounds[1],
                })
            }
            "Pattern" => {
                let mut patterns = Vec::new();
                for argument in arguments {
                    match argument {
                        Argument::Regex(p) | Argument::String(p) => {
                            patterns.push(compile_pattern(&p)?);
                        }
                        _ => return Err(bad_argument(name)),
                    }
                }
                Ok(Type::Pattern(patterns))
            }
            "Enum" => {
                let mut values = Vec::new();
                for argument in arguments {
                    match argument {
                        Argument::String(s) => values.push(s),
                        _ => return Err(bad_argument(name)),
                    }
                }
                Ok(Type::Enum(values))
            }
            "Regexp" => match arguments.len() {
                0 => Ok(Type::Regexp(None)),
                1 => match arguments.into_iter().next() {
                    Some(Argument::Regex(p)) | Some(Argument::String(p)) => {
                        // Validate eagerly so a bad pattern fails here.
                        compile_pattern(&p)?;
                        Ok(Type::Regexp(Some(p.into())))
                    }
                    _ => Err(bad_argument(name)),
                },
                _ => Err(too_many_arguments(name)),
            },
            "Array" => {
                let mut arguments = arguments.into_iter();
                let element = match arguments.next() {
                    None => Type::Any,
                    Some(Argument::Type(t)) => t,
                    Some(_) => return Err(bad_argument(name)),
                };
                let rest: Vec<Argument> = arguments.collect();
                let (from, to) = integer_bounds(name, &rest, 0, UNBOUNDED)?;
                Ok(Type::Array {
                    element: Rc::new(element),
                    from,
                    to,
                })
            }
            "Hash" => {
                let mut arguments = arguments.into_iter();
                let (key, value) = match (arguments.next(), arguments.next()) {
                    (None, _) => (Type::Any, Type::Any),
                    (Some(Argument::Type(k)), Some(Argument::Type(v))) => (k, v),
                    _ => return Err(bad_argument(name)),
                };
                let rest: Vec<Argument> = arguments.collect();
                let (from, to) = integer_bounds(name, &rest, 0, UNBOUNDED)?;
                Ok(Type::Hash {
                    key: Rc::new(key),
                    value: Rc::new(value),
                    from,
                    to,
                })
            }
            "Tuple" => {
                let mut types = Vec::new();
                let mut bounds = Vec::new();
                for argument in arguments {
                    match argument {
                        Argument::Type(t) if bounds.is_empty() => types.push(t),
                        Argument::Integer(_) | Argument::Default if bounds.len() < 2 => {
                            bounds.push(argument);
                        }
                        _ => return Err(bad_argument(name)),
                    }
                }
                let exact = types.len() as i64;
                let (from, to) = integer_bounds(name, &bounds, exact, exact)?;
                Ok(Type::Tuple { types, from, to })
            }
            "Struct" => match arguments.into_iter().next() {
                Some(Argument::Type(t @ Type::Struct(_))) => Ok(t),
                _ => Err(bad_argument(name)),
            },
            "Variant" => {
                let mut alternatives = Vec::new();
                for argument in arguments {
                    match argument {
                        Argument::Type(t) => alternatives.push(t),
                        _ => return Err(bad_argument(name)),
                    }
                }
                Ok(Type::Variant(alternatives))
            }
            "Resource" => {
                let mut type_name = None;
                let mut title = None;
                for argument in arguments {
                    let text = match argument {
                        Argument::String(s) => s,
                        // A bare name argument resolves to a resource type
                        // reference; take its name back out.
                        Argument::Type(Type::Resource {
                            type_name: Some(n),
                            title: None,
                        }) => n,
                        _ => return Err(bad_argument(name)),
                    };
                    if type_name.is_none() {
                        type_name = Some(crate::values::canonicalize_type_name(&text));
                    } else if title.is_none() {
                        title = Some(text);
                    } else {
                        return Err(too_many_arguments(name));
                    }
                }
                Ok(Type::Resource { type_name, title })
            }
            "Class" => match arguments.into_iter().next() {
                None => Ok(Type::Class(None)),
                Some(Argument::String(s)) => Ok(Type::Class(Some(s))),
                Some(_) => Err(bad_argument(name)),
            },
            "Callable" => build_callable(arguments),
            other => {
                let base = self.resolver.resolve(other)?;
                if arguments.is_empty() {
                    return Ok(base);
                }
                // The only parameterizable resolver-provided type is a bare
                // resource type name taking its title (e.g. File['x']).
                match base {
                    Type::Resource {
                        type_name,
                        title: None,
                    } => match (arguments.len(), arguments.into_iter().next()) {
                        (1, Some(Argument::String(title))) => Ok(Type::Resource {
                            type_name,
                            title: Some(title),
                        }),
                        _ => Err(bad_argument(other)),
                    },
                    _ => Err(Error::evaluation(format!(
                        "type {other} does not accept parameters"
                    ))),
                }
            }
        }
    }
}

/// Callable arguments are parameter types, then an optional arity range,
/// then an optional block signature. A bare `Callable` accepts any arity.
fn build_callable(arguments: Vec<Argument>) -> Result<Type> {
    if arguments.is_empty() {
        return Ok(Type::Callable(CallableType {
            parameter_types: Vec::new(),
            from: 0,
            to: UNBOUNDED,
            block: None,
        }));
    }
    let mut parameter_types = Vec::new();
    let mut bounds: Vec<i64> = Vec::new();
    let mut block = None;
    let mut iter = arguments.into_iter().peekable();
    while let Some(argument) = iter.next() {
        match argument {
            Argument::Type(t) => {
                if !bounds.is_empty() || block.is_some() {
                    // After the arity range only the block may appear.
                    match t {
                        Type::Callable(_) if block.is_none() && iter.peek().is_none() => {
                            block = Some(Rc::new(t));
                        }
                        _ => return Err(bad_argument("Callable")),
                    }
                } else if matches!(t, Type::Callable(_)) && iter.peek().is_none() {
                    block = Some(Rc::new(t));
                } else {
                    parameter_types.push(t);
                }
            }
            Argument::Integer(i) if bounds.len() < 2 && block.is_none() => bounds.push(i),
            Argument::Default if bounds.len() < 2 && block.is_none() => {
                bounds.push(if bounds.is_empty() { 0 } else { UNBOUNDED });
            }
            _ => return Err(bad_argument("Callable")),
        }
    }
    let exact = parameter_types.len() as i64;
    let (from, to) = match bounds.len() {
        0 => (exact, exact),
        1 => (bounds[0], UNBOUNDED),
        _ => (bounds[0], bounds[1]),
    };
    Ok(Type::Callable(CallableType {
        parameter_types,
        from,
        to,
        block,
    }))
}

fn compile_pattern(pattern: &str) -> Result<ValueRegex> {
    ValueRegex::new(pattern)
        .map_err(|e| Error::evaluation(format!("invalid regex pattern /{pattern}/: {e}")))
}

fn no_arguments(name: &str, arguments: Vec<Argument>, ty: Type) -> Result<Type> {
    if arguments.is_empty() {
        Ok(ty)
    } else {
        Err(Error::evaluation(format!(
            "type {name} does not accept parameters"
        )))
    }
}

fn one_optional_type(name: &str, arguments: Vec<Argument>) -> Result<Option<Type>> {
    match arguments.len() {
        0 => Ok(None),
        1 => match arguments.into_iter().next() {
            Some(Argument::Type(t)) => Ok(Some(t)),
            _ => Err(bad_argument(name)),
        },
        _ => Err(too_many_arguments(name)),
    }
}

fn integer_bounds(
    name: &str,
    bounds: &[Argument],
    default_from: i64,
    default_to: i64,
) -> Result<(i64, i64)> {
    let mut from = default_from;
    let mut to = default_to;
    if bounds.len() > 2 {
        return Err(too_many_arguments(name));
    }
    for (i, argument) in bounds.iter().enumerate() {
        let bound = match argument {
            Argument::Integer(n) => Some(*n),
            Argument::Default => None,
            _ => return Err(bad_argument(name)),
        };
        match (i, bound) {
            (0, Some(n)) => {
                from = n;
                // A single lower bound leaves the upper end open.
                if bounds.len() == 1 {
                    to = i64::MAX;
                }
            }
            (1, Some(n)) => to = n,
            // An explicit `default` upper bound is unbounded.
            (1, None) => to = i64::MAX,
            _ => {}
        }
    }
    Ok((from, to))
}

fn bad_argument(name: &str) -> Error {
    Error::evaluation(format!("invalid parameter for type {name}"))
}

fn too_many_arguments(name: &str) -> Error {
    Error::evaluation(format!("too many parameters for type {name}"))
}
