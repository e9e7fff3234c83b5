// mantle-core - Type system, value model, and evaluator core for Mantle
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # mantle-core
//!
//! The compiler core for the Mantle configuration language: the runtime
//! value model, the type algebra with its assignability relation, operator
//! and function dispatch, the declaration registry, and the catalog the
//! evaluator compiles into.
//!
//! Parsing is an external collaborator: the core consumes a read-only
//! [`mantle_ast::SyntaxTree`] and walks it with an [`Evaluator`].
//!
//! # Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use mantle_ast::{Expression, ExpressionKind, Literal, Position, Statement, SyntaxTree};
//! use mantle_core::{Evaluator, Value};
//!
//! // $x = 42, built the way an external parser would.
//! let position = Position::new(1, 1);
//! let assignment = Expression::new(
//!     ExpressionKind::Assignment {
//!         name: "x".into(),
//!         value: Box::new(Expression::new(
//!             ExpressionKind::Literal(Literal::Integer(42)),
//!             position,
//!         )),
//!     },
//!     position,
//! );
//! let tree = SyntaxTree::new("site.mn", vec![Statement::Expression(assignment)]);
//!
//! let mut evaluator = Evaluator::new();
//! evaluator.compile(&tree).unwrap();
//! assert_eq!(evaluator.scope().lookup("x"), Some(Value::Integer(42)));
//! ```
//!
//! # Core Components
//!
//! - [`Value`] - the runtime value universe
//! - [`Type`] - the type algebra with `is_instance` / `is_assignable`
//! - [`Evaluator`] - the AST-walking evaluator and its dispatch tables
//! - [`Registry`] - classes, defined types, nodes, and type aliases
//! - [`Catalog`] - the resource catalog sink

pub mod catalog;
pub mod error;
pub mod eval;
pub mod registry;
pub mod scope;
pub mod types;
pub mod values;

pub use catalog::{Catalog, RelationshipKind};
pub use error::{Error, Result};
pub use eval::Evaluator;
pub use registry::Registry;
pub use scope::Scope;
pub use types::{infer, AliasType, CallableType, RecursionGuard, StructMember, Type};
pub use values::{
    loose_equal, ResourceReference, Value, ValueHash, ValueIterator, ValueRegex,
};
