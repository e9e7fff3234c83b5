// mantle-ast - Syntax tree for the Mantle configuration language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # mantle-ast
//!
//! The syntax tree consumed by the Mantle compiler core.
//!
//! Trees are produced by an external parser and consumed read-only by the
//! evaluator; every expression carries a source position. The registry in
//! `mantle-core` holds `Rc` handles to [`SyntaxTree`] roots together with
//! statement indices, so trees must stay immutable once constructed.

pub mod ast;
pub mod position;

pub use ast::{
    Attribute, BinaryOperator, CaseExpression, CaseProposition, ClassStatement,
    CollectorExpression, DefinedTypeStatement, Expression, ExpressionKind, FunctionCall, Hostname,
    IfExpression, Lambda, Literal, NodeStatement, Parameter, ResourceBody, ResourceExpression,
    SelectorExpression, Statement, SyntaxTree, TypeAliasStatement, UnaryOperator,
};
pub use position::Position;
