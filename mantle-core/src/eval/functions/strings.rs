// mantle-core - String functions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The split function: plain separator, regex value, and Regexp type
//! overloads. An empty separator splits into codepoints; the plain form
//! drops empty segments, the regex forms keep them.

use im::Vector;

use crate::error::{Error, Result};
use crate::types::Type;
use crate::values::{Value, ValueRegex};

use super::FunctionCallContext;

fn split_codepoints(subject: &str) -> Value {
    let items: Vector<Value> = subject
        .chars()
        .map(|c| Value::string(c.to_string()))
        .collect();
    Value::Array(items)
}

fn subject_and_pattern<'a>(context: &'a FunctionCallContext) -> Result<(&'a str, &'a Value)> {
    match context.argument(0) {
        Value::String(subject) => Ok((subject, context.argument(1))),
        _ => Err(Error::internal("split dispatched on a non-string subject")),
    }
}

pub(crate) fn builtin_split_plain(context: &mut FunctionCallContext) -> Result<Value> {
    let (subject, separator) = subject_and_pattern(context)?;
    let separator = match separator {
        Value::String(s) => s,
        _ => return Err(Error::internal("split dispatched on a non-string separator")),
    };
    if separator.is_empty() {
        return Ok(split_codepoints(subject));
    }
    let items: Vector<Value> = subject
        .split(&**separator)
        .filter(|segment| !segment.is_empty())
        .map(Value::string)
        .collect();
    Ok(Value::Array(items))
}

fn split_by_regex(subject: &str, regex: &ValueRegex) -> Value {
    if regex.pattern().is_empty() {
        return split_codepoints(subject);
    }
    let items: Vector<Value> = regex
        .regex()
        .split(subject)
        .map(Value::string)
        .collect();
    Value::Array(items)
}

pub(crate) fn builtin_split_regex(context: &mut FunctionCallContext) -> Result<Value> {
    let (subject, pattern) = subject_and_pattern(context)?;
    match pattern {
        Value::Regex(regex) => Ok(split_by_regex(subject, regex)),
        _ => Err(Error::internal("split dispatched on a non-regex pattern")),
    }
}

pub(crate) fn builtin_split_regex_type(context: &mut FunctionCallContext) -> Result<Value> {
    let (subject, pattern) = subject_and_pattern(context)?;
    let pattern = match pattern {
        Value::Type(ty) => match &**ty {
            Type::Regexp(pattern) => pattern.clone(),
            _ => return Err(Error::internal("split dispatched on a non-Regexp type")),
        },
        _ => return Err(Error::internal("split dispatched on a non-type pattern")),
    };
    match pattern {
        None => Ok(split_codepoints(subject)),
        Some(pattern) => {
            let regex = ValueRegex::new(&pattern).map_err(|e| {
                context.error_at_argument(1, format!("invalid regular expression /{pattern}/: {e}"))
            })?;
            Ok(split_by_regex(subject, &regex))
        }
    }
}
