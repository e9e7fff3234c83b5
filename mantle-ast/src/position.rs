// mantle-ast - Source positions
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Source positions attached to every expression and statement.

use std::fmt;

/// A line/column position within a source file.
///
/// Lines and columns are 1-based; the parser guarantees a position on every
/// expression, so diagnostics can always be anchored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
