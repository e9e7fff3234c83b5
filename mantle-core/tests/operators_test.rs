// mantle-core - Operator integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Integration tests for binary and unary operator dispatch.

mod common;

use common::*;
use mantle_ast::{BinaryOperator, UnaryOperator};
use mantle_core::{Evaluator, RelationshipKind, Value};

// ============================================================================
// Arithmetic
// ============================================================================

#[test]
fn integer_arithmetic() {
    assert_eval(binary(BinaryOperator::Plus, int(1), int(2)), Value::Integer(3));
    assert_eval(binary(BinaryOperator::Minus, int(1), int(2)), Value::Integer(-1));
    assert_eval(binary(BinaryOperator::Multiply, int(6), int(7)), Value::Integer(42));
    assert_eval(binary(BinaryOperator::Divide, int(7), int(2)), Value::Integer(3));
    assert_eval(binary(BinaryOperator::Modulo, int(7), int(2)), Value::Integer(1));
}

#[test]
fn mixed_arithmetic_promotes_to_float() {
    assert_eval(
        binary(BinaryOperator::Plus, int(1), float(0.5)),
        Value::Float(1.5),
    );
    assert_eval(
        binary(BinaryOperator::Divide, float(1.0), int(4)),
        Value::Float(0.25),
    );
}

#[test]
fn division_by_zero_is_an_error() {
    assert_eval_err(
        binary(BinaryOperator::Divide, int(1), int(0)),
        "cannot divide by zero.",
    );
    assert_eval_err(
        binary(BinaryOperator::Divide, float(1.0), float(0.0)),
        "cannot divide by zero.",
    );
    assert_eval_err(
        binary(BinaryOperator::Modulo, int(1), int(0)),
        "cannot divide by zero.",
    );
}

#[test]
fn min_divided_by_minus_one_overflows() {
    assert_eval_err(
        binary(BinaryOperator::Divide, int(i64::MIN), int(-1)),
        "arithmetic overflow",
    );
}

#[test]
fn integer_overflow_is_detected_not_wrapped() {
    assert_eval_err(
        binary(BinaryOperator::Plus, int(i64::MAX), int(1)),
        "arithmetic overflow",
    );
    assert_eval_err(
        binary(BinaryOperator::Multiply, int(i64::MAX), int(2)),
        "arithmetic overflow",
    );
    assert_eval_err(unary(UnaryOperator::Negate, int(i64::MIN)), "arithmetic overflow");
}

#[test]
fn float_overflow_and_underflow_are_detected() {
    assert_eval_err(
        binary(BinaryOperator::Multiply, float(f64::MAX), float(2.0)),
        "arithmetic overflow",
    );
    assert_eval_err(
        binary(BinaryOperator::Divide, float(f64::MIN_POSITIVE), float(f64::MAX)),
        "arithmetic underflow",
    );
}

#[test]
fn shifts_check_their_range() {
    assert_eval(binary(BinaryOperator::LeftShift, int(1), int(4)), Value::Integer(16));
    assert_eval(binary(BinaryOperator::RightShift, int(16), int(2)), Value::Integer(4));
    // Negative counts shift the other way.
    assert_eval(binary(BinaryOperator::LeftShift, int(16), int(-2)), Value::Integer(4));
    assert_eval(binary(BinaryOperator::RightShift, int(1), int(-4)), Value::Integer(16));
    assert_eval_err(
        binary(BinaryOperator::LeftShift, int(1), int(64)),
        "arithmetic overflow",
    );
    assert_eval_err(
        binary(BinaryOperator::LeftShift, int(i64::MAX), int(1)),
        "arithmetic overflow",
    );
}

#[test]
fn plus_concatenates_collections() {
    assert_eval(
        binary(BinaryOperator::Plus, array(vec![int(1)]), array(vec![int(2)])),
        Value::array([Value::Integer(1), Value::Integer(2)]),
    );
    assert_eval(
        binary(
            BinaryOperator::Plus,
            hash(vec![(string("a"), int(1))]),
            hash(vec![(string("a"), int(2)), (string("b"), int(3))]),
        ),
        Value::Hash(
            [
                (Value::string("a"), Value::Integer(2)),
                (Value::string("b"), Value::Integer(3)),
            ]
            .into_iter()
            .collect(),
        ),
    );
}

#[test]
fn minus_removes_elements_and_keys() {
    assert_eval(
        binary(
            BinaryOperator::Minus,
            array(vec![int(1), int(2), int(3)]),
            array(vec![int(2)]),
        ),
        Value::array([Value::Integer(1), Value::Integer(3)]),
    );
    assert_eval(
        binary(
            BinaryOperator::Minus,
            hash(vec![(string("a"), int(1)), (string("b"), int(2))]),
            array(vec![string("a")]),
        ),
        Value::Hash([(Value::string("b"), Value::Integer(2))].into_iter().collect()),
    );
}

#[test]
fn left_shift_appends_to_arrays() {
    assert_eval(
        binary(BinaryOperator::LeftShift, array(vec![int(1)]), string("x")),
        Value::array([Value::Integer(1), Value::string("x")]),
    );
}

#[test]
fn inapplicable_operands_are_an_error() {
    assert_eval_err(
        binary(BinaryOperator::Divide, string("a"), int(1)),
        "operator '/' is not applicable to (String, Integer)",
    );
    assert_eval_err(
        binary(BinaryOperator::LessThan, boolean(true), int(1)),
        "operator '<' is not applicable",
    );
}

// ============================================================================
// Equality and comparison
// ============================================================================

#[test]
fn string_equality_is_case_insensitive() {
    assert_eval(
        binary(BinaryOperator::Equals, string("ABC"), string("abc")),
        Value::Boolean(true),
    );
    assert_eval(
        binary(BinaryOperator::NotEquals, string("ABC"), string("abc")),
        Value::Boolean(false),
    );
    assert_eval(
        binary(BinaryOperator::Equals, string("STRASSE"), string("strasse")),
        Value::Boolean(true),
    );
}

#[test]
fn numeric_equality_crosses_integer_and_float() {
    assert_eval(binary(BinaryOperator::Equals, int(1), float(1.0)), Value::Boolean(true));
    assert_eval(binary(BinaryOperator::Equals, int(1), float(1.5)), Value::Boolean(false));
}

#[test]
fn type_equality_uses_mutual_assignability() {
    assert_eval(
        binary(
            BinaryOperator::Equals,
            type_expr("Variant[Integer, String]"),
            type_expr("Variant[String, Integer]"),
        ),
        Value::Boolean(true),
    );
    assert_eval(
        binary(BinaryOperator::NotEquals, type_expr("Integer"), type_expr("String")),
        Value::Boolean(true),
    );
}

#[test]
fn string_ordering_folds_case() {
    assert_eval(
        binary(BinaryOperator::LessThan, string("Apple"), string("banana")),
        Value::Boolean(true),
    );
    assert_eval(
        binary(BinaryOperator::GreaterEqual, string("PEAR"), string("pear")),
        Value::Boolean(true),
    );
}

#[test]
fn type_ordering_is_specificity() {
    assert_eval(
        binary(BinaryOperator::LessThan, type_expr("Integer[0, 5]"), type_expr("Integer")),
        Value::Boolean(true),
    );
    assert_eval(
        binary(BinaryOperator::GreaterThan, type_expr("Numeric"), type_expr("Integer")),
        Value::Boolean(true),
    );
    assert_eval(
        binary(BinaryOperator::LessThan, type_expr("Integer"), type_expr("Integer")),
        Value::Boolean(false),
    );
}

// ============================================================================
// Logical operators
// ============================================================================

#[test]
fn and_or_short_circuit() {
    // The right side would fail; short-circuiting must skip it.
    assert_eval(
        binary(
            BinaryOperator::And,
            boolean(false),
            binary(BinaryOperator::Divide, int(1), int(0)),
        ),
        Value::Boolean(false),
    );
    assert_eval(
        binary(
            BinaryOperator::Or,
            boolean(true),
            binary(BinaryOperator::Divide, int(1), int(0)),
        ),
        Value::Boolean(true),
    );
    assert_eval(binary(BinaryOperator::And, int(1), string("x")), Value::Boolean(true));
    assert_eval(binary(BinaryOperator::Or, undef(), boolean(false)), Value::Boolean(false));
}

// ============================================================================
// in
// ============================================================================

#[test]
fn in_searches_strings_arrays_and_hashes() {
    assert_eval(
        binary(BinaryOperator::In, string("LO"), string("hello")),
        Value::Boolean(true),
    );
    assert_eval(
        binary(BinaryOperator::In, int(2), array(vec![int(1), int(2)])),
        Value::Boolean(true),
    );
    assert_eval(
        binary(
            BinaryOperator::In,
            string("A"),
            array(vec![string("a"), string("b")]),
        ),
        Value::Boolean(true),
    );
    assert_eval(
        binary(
            BinaryOperator::In,
            string("a"),
            hash(vec![(string("a"), int(1))]),
        ),
        Value::Boolean(true),
    );
    assert_eval(
        binary(
            BinaryOperator::In,
            regex("^b"),
            array(vec![string("apple"), string("banana")]),
        ),
        Value::Boolean(true),
    );
    assert_eval(
        binary(
            BinaryOperator::In,
            type_expr("Integer"),
            array(vec![string("a"), int(3)]),
        ),
        Value::Boolean(true),
    );
    assert_eval(binary(BinaryOperator::In, int(1), int(2)), Value::Boolean(false));
}

// ============================================================================
// Match operators
// ============================================================================

#[test]
fn match_sets_match_variables() {
    let mut evaluator = Evaluator::new();
    let matched = eval_with(
        &mut evaluator,
        binary(BinaryOperator::Match, string("hello world"), regex("(h\\w+) (w\\w+)")),
    )
    .unwrap();
    assert_eq!(matched, Value::Boolean(true));
    assert_eq!(
        evaluator.scope().lookup("0"),
        Some(Value::string("hello world"))
    );
    assert_eq!(evaluator.scope().lookup("1"), Some(Value::string("hello")));
    assert_eq!(evaluator.scope().lookup("2"), Some(Value::string("world")));
}

#[test]
fn match_with_string_pattern_and_type() {
    assert_eval(
        binary(BinaryOperator::Match, string("web01"), string("^web\\d+")),
        Value::Boolean(true),
    );
    assert_eval(
        binary(BinaryOperator::NotMatch, string("db01"), string("^web\\d+")),
        Value::Boolean(true),
    );
    assert_eval(
        binary(BinaryOperator::Match, int(5), type_expr("Integer[0, 10]")),
        Value::Boolean(true),
    );
    assert_eval(
        binary(BinaryOperator::NotMatch, int(11), type_expr("Integer[0, 10]")),
        Value::Boolean(true),
    );
}

#[test]
fn invalid_patterns_are_an_error() {
    assert_eval_err(
        binary(BinaryOperator::Match, string("a"), string("(unclosed")),
        "invalid regular expression",
    );
}

// ============================================================================
// Relationship operators
// ============================================================================

#[test]
fn relationship_operators_install_edges() {
    let mut evaluator = Evaluator::new();
    eval_with(
        &mut evaluator,
        resource("file", string("/tmp/a"), vec![]),
    )
    .unwrap();
    eval_with(
        &mut evaluator,
        resource("service", string("app"), vec![]),
    )
    .unwrap();

    let result = eval_with(
        &mut evaluator,
        binary(
            BinaryOperator::Before,
            type_expr("File['/tmp/a']"),
            type_expr("Service['app']"),
        ),
    )
    .unwrap();
    // The expression's value is its right operand, so chains associate.
    assert!(matches!(result, Value::Type(_)));

    let edges = evaluator.catalog().edges();
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source.to_string(), "File[/tmp/a]");
    assert_eq!(edges[0].target.to_string(), "Service[app]");
    assert_eq!(edges[0].kind, RelationshipKind::Before);
    evaluator.finish().unwrap();
}

#[test]
fn relationship_operands_cross_product_arrays() {
    let mut evaluator = Evaluator::new();
    for title in ["/a", "/b"] {
        eval_with(&mut evaluator, resource("file", string(title), vec![])).unwrap();
    }
    eval_with(&mut evaluator, resource("service", string("s"), vec![])).unwrap();

    eval_with(
        &mut evaluator,
        binary(
            BinaryOperator::Notify,
            array(vec![type_expr("File['/a']"), type_expr("File['/b']")]),
            type_expr("Service['s']"),
        ),
    )
    .unwrap();
    let edges = evaluator.catalog().edges();
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|e| e.kind == RelationshipKind::Notify));
}

#[test]
fn unresolved_relationship_targets_fail_finalization() {
    let mut evaluator = Evaluator::new();
    eval_with(&mut evaluator, resource("file", string("/a"), vec![])).unwrap();
    eval_with(
        &mut evaluator,
        binary(
            BinaryOperator::Before,
            type_expr("File['/a']"),
            type_expr("Service['missing']"),
        ),
    )
    .unwrap();
    let error = evaluator.finish().unwrap_err().to_string();
    assert!(error.contains("Service[missing]"), "unexpected error: {error}");
}

#[test]
fn non_resources_cannot_be_related() {
    assert_eval_err(
        binary(BinaryOperator::Before, int(1), int(2)),
        "is not a resource reference",
    );
}

// ============================================================================
// Unary operators
// ============================================================================

#[test]
fn negation_and_not() {
    assert_eval(unary(UnaryOperator::Negate, int(5)), Value::Integer(-5));
    assert_eval(unary(UnaryOperator::Negate, float(1.5)), Value::Float(-1.5));
    assert_eval(unary(UnaryOperator::Not, boolean(true)), Value::Boolean(false));
    assert_eval(unary(UnaryOperator::Not, undef()), Value::Boolean(true));
    assert_eval(unary(UnaryOperator::Not, string("")), Value::Boolean(false));
    assert_eval_err(unary(UnaryOperator::Negate, string("a")), "not applicable");
}
