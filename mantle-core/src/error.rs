// mantle-core - Error types for the Mantle compiler core
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Error types for evaluation, declaration, and catalog construction.
//!
//! One taxonomy covers the whole core. Every error that has a source
//! location renders as `"<message> at <file>:<line>:<column>"`; errors
//! raised outside any source context render the bare message. Control flow
//! (`break`/`next`/`return`) is *not* an error: the sentinels travel as
//! values through the `Ok` channel.

use std::fmt;
use std::rc::Rc;

use mantle_ast::Position;

/// Result type for the Mantle compiler core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the compiler core.
#[derive(Debug, Clone)]
pub enum Error {
    /// A parse error propagated from the external parser.
    Parse {
        message: String,
        origin: Option<Origin>,
    },
    /// An error raised while evaluating an expression: wrong operand type,
    /// division by zero, arithmetic overflow, no matching signature, type
    /// assertion failure, and the like.
    Evaluation {
        message: String,
        origin: Option<Origin>,
    },
    /// A declaration error: duplicate class / defined type / alias, or a
    /// malformed name.
    Declaration {
        message: String,
        origin: Option<Origin>,
    },
    /// A catalog error: duplicate resource declaration or an unresolved
    /// relationship target.
    Catalog {
        message: String,
        origin: Option<Origin>,
    },
    /// A broken internal invariant; always a bug in the core.
    Internal { message: String },
}

/// Where an error was raised: the source file and position.
#[derive(Debug, Clone)]
pub struct Origin {
    pub path: Rc<str>,
    pub position: Position,
}

impl Origin {
    #[must_use]
    pub fn new(path: Rc<str>, position: Position) -> Self {
        Origin { path, position }
    }
}

impl Error {
    /// Create an evaluation error without a source location.
    pub fn evaluation(message: impl Into<String>) -> Self {
        Error::Evaluation {
            message: message.into(),
            origin: None,
        }
    }

    /// Create a declaration error without a source location.
    pub fn declaration(message: impl Into<String>) -> Self {
        Error::Declaration {
            message: message.into(),
            origin: None,
        }
    }

    /// Create a catalog error without a source location.
    pub fn catalog(message: impl Into<String>) -> Self {
        Error::Catalog {
            message: message.into(),
            origin: None,
        }
    }

    /// Create an internal error. Reaching this path is a bug.
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Attach a source location if the error does not already carry one.
    #[must_use]
    pub fn with_origin(self, path: &Rc<str>, position: Position) -> Self {
        let origin = Some(Origin::new(Rc::clone(path), position));
        match self {
            Error::Parse {
                message,
                origin: None,
            } => Error::Parse { message, origin },
            Error::Evaluation {
                message,
                origin: None,
            } => Error::Evaluation { message, origin },
            Error::Declaration {
                message,
                origin: None,
            } => Error::Declaration { message, origin },
            Error::Catalog {
                message,
                origin: None,
            } => Error::Catalog { message, origin },
            other => other,
        }
    }

    /// The error message without any location suffix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Error::Parse { message, .. }
            | Error::Evaluation { message, .. }
            | Error::Declaration { message, .. }
            | Error::Catalog { message, .. }
            | Error::Internal { message } => message,
        }
    }

    /// The source location, if the error carries one.
    #[must_use]
    pub fn origin(&self) -> Option<&Origin> {
        match self {
            Error::Parse { origin, .. }
            | Error::Evaluation { origin, .. }
            | Error::Declaration { origin, .. }
            | Error::Catalog { origin, .. } => origin.as_ref(),
            Error::Internal { .. } => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin() {
            Some(origin) => write!(
                f,
                "{} at {}:{}",
                self.message(),
                origin.path,
                origin.position
            ),
            None => write!(f, "{}", self.message()),
        }
    }
}

impl std::error::Error for Error {}
