// mantle-core - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared helpers for the mantle-core integration tests.
//!
//! Parsing is outside the core, so tests build syntax trees the way an
//! external parser would, through the constructors here, and drive them
//! with a fresh [`Evaluator`].

#![allow(dead_code)]

use std::rc::Rc;

use mantle_ast::{
    Attribute, BinaryOperator, CaseExpression, CaseProposition, Expression, ExpressionKind,
    FunctionCall, IfExpression, Lambda, Literal, Parameter, Position, ResourceBody,
    ResourceExpression, SelectorExpression, Statement, SyntaxTree, UnaryOperator,
};
use mantle_core::{Evaluator, Value};

/// The position used by all constructed expressions.
pub fn pos() -> Position {
    Position::new(1, 1)
}

pub fn expr(kind: ExpressionKind) -> Expression {
    Expression::new(kind, pos())
}

pub fn int(value: i64) -> Expression {
    expr(ExpressionKind::Literal(Literal::Integer(value)))
}

pub fn float(value: f64) -> Expression {
    expr(ExpressionKind::Literal(Literal::Float(value)))
}

pub fn boolean(value: bool) -> Expression {
    expr(ExpressionKind::Literal(Literal::Boolean(value)))
}

pub fn string(value: &str) -> Expression {
    expr(ExpressionKind::Literal(Literal::String(value.into())))
}

pub fn undef() -> Expression {
    expr(ExpressionKind::Literal(Literal::Undef))
}

pub fn default_literal() -> Expression {
    expr(ExpressionKind::Literal(Literal::Default))
}

pub fn regex(pattern: &str) -> Expression {
    expr(ExpressionKind::Literal(Literal::Regex(pattern.into())))
}

pub fn type_expr(source: &str) -> Expression {
    expr(ExpressionKind::TypeExpression(source.into()))
}

pub fn variable(name: &str) -> Expression {
    expr(ExpressionKind::Variable(name.into()))
}

pub fn array(items: Vec<Expression>) -> Expression {
    expr(ExpressionKind::Array(items))
}

pub fn hash(entries: Vec<(Expression, Expression)>) -> Expression {
    expr(ExpressionKind::Hash(entries))
}

pub fn assign(name: &str, value: Expression) -> Expression {
    expr(ExpressionKind::Assignment {
        name: name.into(),
        value: Box::new(value),
    })
}

pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
    expr(ExpressionKind::Binary {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn unary(operator: UnaryOperator, operand: Expression) -> Expression {
    expr(ExpressionKind::Unary {
        operator,
        operand: Box::new(operand),
    })
}

pub fn lambda(parameters: Vec<&str>, body: Vec<Expression>) -> Rc<Lambda> {
    Rc::new(Lambda {
        parameters: parameters
            .into_iter()
            .map(|name| Parameter::new(name, pos()))
            .collect(),
        body,
        position: pos(),
    })
}

pub fn call(name: &str, arguments: Vec<Expression>) -> Expression {
    expr(ExpressionKind::FunctionCall(FunctionCall {
        name: name.into(),
        arguments,
        lambda: None,
    }))
}

pub fn call_with_block(
    name: &str,
    arguments: Vec<Expression>,
    block: Rc<Lambda>,
) -> Expression {
    expr(ExpressionKind::FunctionCall(FunctionCall {
        name: name.into(),
        arguments,
        lambda: Some(block),
    }))
}

pub fn if_expr(
    condition: Expression,
    then_body: Vec<Expression>,
    else_body: Option<Vec<Expression>>,
) -> Expression {
    expr(ExpressionKind::If(IfExpression {
        unless: false,
        condition: Box::new(condition),
        then_body,
        elsifs: Vec::new(),
        else_body,
    }))
}

pub fn unless_expr(condition: Expression, then_body: Vec<Expression>) -> Expression {
    expr(ExpressionKind::If(IfExpression {
        unless: true,
        condition: Box::new(condition),
        then_body,
        elsifs: Vec::new(),
        else_body: None,
    }))
}

pub fn case_expr(control: Expression, propositions: Vec<(Vec<Expression>, Vec<Expression>)>) -> Expression {
    expr(ExpressionKind::Case(CaseExpression {
        expression: Box::new(control),
        propositions: propositions
            .into_iter()
            .map(|(options, body)| CaseProposition {
                options,
                body,
                position: pos(),
            })
            .collect(),
    }))
}

pub fn selector(control: Expression, cases: Vec<(Expression, Expression)>) -> Expression {
    expr(ExpressionKind::Selector(SelectorExpression {
        expression: Box::new(control),
        cases,
    }))
}

pub fn resource(type_name: &str, title: Expression, attributes: Vec<(&str, Expression)>) -> Expression {
    expr(ExpressionKind::Resource(ResourceExpression {
        type_name: type_name.into(),
        bodies: vec![ResourceBody {
            title,
            attributes: attributes
                .into_iter()
                .map(|(name, value)| Attribute {
                    name: name.into(),
                    value,
                    position: pos(),
                })
                .collect(),
            position: pos(),
        }],
    }))
}

/// Build a tree rooted at a test path.
pub fn tree(statements: Vec<Statement>) -> Rc<SyntaxTree> {
    SyntaxTree::new("test.mn", statements)
}

/// Evaluate one expression in a fresh evaluator.
pub fn eval_expr(expression: Expression) -> Result<Value, String> {
    let mut evaluator = Evaluator::new();
    evaluator
        .evaluate(&expression)
        .map_err(|e| e.to_string())
}

/// Evaluate one expression in an existing evaluator.
pub fn eval_with(evaluator: &mut Evaluator, expression: Expression) -> Result<Value, String> {
    evaluator
        .evaluate(&expression)
        .map_err(|e| e.to_string())
}

/// Compile a program into a fresh evaluator, returning it for inspection.
pub fn eval_program(statements: Vec<Statement>) -> Result<Evaluator, String> {
    let mut evaluator = Evaluator::new();
    evaluator
        .compile(&tree(statements))
        .map_err(|e| e.to_string())?;
    Ok(evaluator)
}

/// Assert an expression evaluates to the expected value.
#[track_caller]
pub fn assert_eval(expression: Expression, expected: Value) {
    match eval_expr(expression) {
        Ok(actual) => assert_eq!(actual, expected, "evaluation did not match"),
        Err(error) => panic!("evaluation failed: {error}"),
    }
}

/// Assert an expression fails to evaluate, with the message containing the
/// given fragment.
#[track_caller]
pub fn assert_eval_err(expression: Expression, fragment: &str) {
    match eval_expr(expression) {
        Ok(value) => panic!("expected an error containing '{fragment}' but got '{value}'"),
        Err(error) => assert!(
            error.contains(fragment),
            "expected error to contain '{fragment}' but it was '{error}'"
        ),
    }
}
