// mantle-core - Evaluator integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! End-to-end evaluator tests: assignment, conditionals, resources,
//! classes, defined types, type aliases, and collectors.

mod common;

use common::*;
use mantle_ast::{
    Attribute, BinaryOperator, ClassStatement, DefinedTypeStatement, Parameter, ResourceBody,
    ResourceExpression, ExpressionKind, Statement, TypeAliasStatement,
};
use mantle_core::{Evaluator, Value};

fn expression_statement(expression: mantle_ast::Expression) -> Statement {
    Statement::Expression(expression)
}

// ============================================================================
// Variables and assignment
// ============================================================================

#[test]
fn assignment_binds_once() {
    let evaluator = eval_program(vec![
        expression_statement(assign("x", int(1))),
        expression_statement(assign("y", variable("x"))),
    ])
    .unwrap();
    assert_eq!(evaluator.scope().lookup("x"), Some(Value::Integer(1)));
    assert_eq!(evaluator.scope().lookup("y"), Some(Value::Integer(1)));

    let error = eval_program(vec![
        expression_statement(assign("x", int(1))),
        expression_statement(assign("x", int(2))),
    ])
    .map(|_| ())
    .unwrap_err();
    assert!(error.contains("cannot re-assign variable '$x'"));
}

#[test]
fn match_variables_cannot_be_assigned() {
    assert_eval_err(assign("0", int(1)), "cannot assign to match variable");
}

#[test]
fn unknown_variables_are_undef_unless_strict() {
    assert_eval(variable("missing"), Value::Undef);

    let mut evaluator = Evaluator::new();
    evaluator.set_strict_variables(true);
    let error = eval_with(&mut evaluator, variable("missing")).unwrap_err();
    assert!(error.contains("unknown variable '$missing'"));
}

#[test]
fn errors_carry_their_source_location() {
    let error = eval_expr(binary(BinaryOperator::Divide, int(1), int(0))).unwrap_err();
    assert!(
        error.contains("cannot divide by zero.") && error.contains(" at "),
        "unexpected error: {error}"
    );
}

// ============================================================================
// Conditionals
// ============================================================================

#[test]
fn if_and_unless_choose_branches() {
    assert_eval(
        if_expr(boolean(true), vec![int(1)], Some(vec![int(2)])),
        Value::Integer(1),
    );
    assert_eval(
        if_expr(boolean(false), vec![int(1)], Some(vec![int(2)])),
        Value::Integer(2),
    );
    assert_eval(if_expr(boolean(false), vec![int(1)], None), Value::Undef);
    assert_eval(unless_expr(boolean(false), vec![int(1)]), Value::Integer(1));
    // Only undef and false are falsy.
    assert_eval(
        if_expr(string(""), vec![int(1)], Some(vec![int(2)])),
        Value::Integer(1),
    );
}

#[test]
fn if_conditions_scope_their_match_variables() {
    let mut evaluator = Evaluator::new();
    let result = eval_with(
        &mut evaluator,
        if_expr(
            binary(BinaryOperator::Match, string("ab12"), regex("(\\d+)")),
            vec![variable("1")],
            None,
        ),
    )
    .unwrap();
    assert_eq!(result, Value::string("12"));
    // Released once the if completes.
    assert_eq!(evaluator.scope().lookup("1"), None);
}

#[test]
fn case_matches_literals_regexes_and_types() {
    let make_case = |control: mantle_ast::Expression| {
        case_expr(
            control,
            vec![
                (vec![type_expr("Integer")], vec![string("int")]),
                (vec![regex("^h")], vec![string("h-word")]),
                (vec![string("FOO"), string("bar")], vec![string("foobar")]),
                (vec![default_literal()], vec![string("other")]),
            ],
        )
    };
    assert_eval(make_case(int(3)), Value::string("int"));
    assert_eval(make_case(string("hello")), Value::string("h-word"));
    // Case option comparison is case-insensitive for strings.
    assert_eval(make_case(string("foo")), Value::string("foobar"));
    assert_eval(make_case(boolean(true)), Value::string("other"));
}

#[test]
fn case_without_a_match_or_default_is_undef() {
    assert_eval(
        case_expr(int(9), vec![(vec![int(1)], vec![string("one")])]),
        Value::Undef,
    );
}

#[test]
fn selector_requires_a_match() {
    let make_selector = |control: mantle_ast::Expression| {
        selector(
            control,
            vec![
                (int(1), string("one")),
                (type_expr("String"), string("stringy")),
                (default_literal(), string("fallback")),
            ],
        )
    };
    assert_eval(make_selector(int(1)), Value::string("one"));
    assert_eval(make_selector(string("x")), Value::string("stringy"));
    assert_eval(make_selector(float(9.5)), Value::string("fallback"));

    let error = eval_expr(selector(int(9), vec![(int(1), string("one"))])).unwrap_err();
    assert!(error.contains("no matching entry for selector"));
}

// ============================================================================
// Resources and the catalog
// ============================================================================

#[test]
fn resources_land_in_the_catalog_in_order() {
    let evaluator = eval_program(vec![
        expression_statement(resource(
            "file",
            string("/etc/app.conf"),
            vec![("mode", string("0644")), ("owner", string("root"))],
        )),
        expression_statement(resource("service", string("app"), vec![])),
    ])
    .unwrap();

    let references: Vec<String> = evaluator
        .catalog()
        .resources()
        .map(|r| r.reference().to_string())
        .collect();
    assert_eq!(references, ["File[/etc/app.conf]", "Service[app]"]);

    let file = evaluator.catalog().resources().next().unwrap();
    assert_eq!(file.parameter("mode"), Some(&Value::string("0644")));
    assert_eq!(file.parameter("missing"), None);
}

#[test]
fn duplicate_resources_are_a_catalog_error() {
    let error = eval_program(vec![
        expression_statement(resource("file", string("/a"), vec![])),
        expression_statement(resource("file", string("/a"), vec![])),
    ])
    .map(|_| ())
    .unwrap_err();
    assert!(
        error.contains("resource File[/a] is already declared"),
        "unexpected error: {error}"
    );
}

#[test]
fn array_titles_declare_multiple_resources() {
    let evaluator = eval_program(vec![expression_statement(resource_with_titles(
        "file",
        array(vec![string("/a"), string("/b")]),
    ))])
    .unwrap();
    assert_eq!(evaluator.catalog().resources().count(), 2);
}

fn resource_with_titles(type_name: &str, title: mantle_ast::Expression) -> mantle_ast::Expression {
    expr(ExpressionKind::Resource(ResourceExpression {
        type_name: type_name.into(),
        bodies: vec![ResourceBody {
            title,
            attributes: Vec::new(),
            position: pos(),
        }],
    }))
}

#[test]
fn collectors_return_matching_references() {
    let mut evaluator = eval_program(vec![
        expression_statement(resource(
            "file",
            string("/a"),
            vec![("owner", string("root"))],
        )),
        expression_statement(resource(
            "file",
            string("/b"),
            vec![("owner", string("app"))],
        )),
        expression_statement(resource("service", string("s"), vec![])),
    ])
    .unwrap();

    let all = eval_with(
        &mut evaluator,
        expr(ExpressionKind::Collector(mantle_ast::CollectorExpression {
            type_name: "file".into(),
            query: None,
            exported: false,
        })),
    )
    .unwrap();
    assert_eq!(
        all,
        Value::array([
            Value::Resource(mantle_core::ResourceReference::new("file", "/a")),
            Value::Resource(mantle_core::ResourceReference::new("file", "/b")),
        ])
    );

    let queried = eval_with(
        &mut evaluator,
        expr(ExpressionKind::Collector(mantle_ast::CollectorExpression {
            type_name: "file".into(),
            query: Some(("owner".into(), Box::new(string("root")))),
            exported: false,
        })),
    )
    .unwrap();
    assert_eq!(
        queried,
        Value::array([Value::Resource(mantle_core::ResourceReference::new(
            "file", "/a"
        ))])
    );
}

// ============================================================================
// Classes and defined types
// ============================================================================

fn class_with_body(
    name: &str,
    parameters: Vec<Parameter>,
    body: Vec<mantle_ast::Expression>,
) -> Statement {
    Statement::Class(ClassStatement {
        name: name.into(),
        parameters,
        parent: None,
        body,
        position: pos(),
    })
}

fn typed_parameter(name: &str, type_expression: &str) -> Parameter {
    Parameter {
        name: name.into(),
        type_expression: Some(type_expression.into()),
        default: None,
        position: pos(),
    }
}

fn parameter_with_default(name: &str, default: mantle_ast::Expression) -> Parameter {
    Parameter {
        name: name.into(),
        type_expression: None,
        default: Some(default),
        position: pos(),
    }
}

#[test]
fn class_bodies_evaluate_lazily_on_declaration() {
    let evaluator = eval_program(vec![
        class_with_body(
            "app",
            vec![],
            vec![resource("file", string("/etc/app"), vec![])],
        ),
        expression_statement(resource("class", string("app"), vec![])),
    ])
    .unwrap();

    let references: Vec<String> = evaluator
        .catalog()
        .resources()
        .map(|r| r.reference().to_string())
        .collect();
    assert_eq!(references, ["Class[app]", "File[/etc/app]"]);
}

#[test]
fn undeclared_classes_never_evaluate() {
    let evaluator = eval_program(vec![class_with_body(
        "app",
        vec![],
        vec![resource("file", string("/etc/app"), vec![])],
    )])
    .unwrap();
    assert_eq!(evaluator.catalog().resources().count(), 0);
}

#[test]
fn class_parameters_bind_with_defaults_and_types() {
    let evaluator = eval_program(vec![
        class_with_body(
            "app",
            vec![
                typed_parameter("port", "Integer[1, 65535]"),
                parameter_with_default("owner", string("root")),
            ],
            vec![resource("file", variable("owner"), vec![])],
        ),
        expression_statement(resource("class", string("app"), vec![("port", int(8080))])),
    ])
    .unwrap();
    assert!(evaluator
        .catalog()
        .resources()
        .any(|r| r.reference().to_string() == "File[root]"));
}

#[test]
fn class_parameter_type_mismatches_are_an_error() {
    let error = eval_program(vec![
        class_with_body("app", vec![typed_parameter("port", "Integer")], vec![]),
        expression_statement(resource("class", string("app"), vec![("port", string("80"))])),
    ])
    .map(|_| ())
    .unwrap_err();
    assert!(
        error.contains("parameter 'port' expects Integer"),
        "unexpected error: {error}"
    );
}

#[test]
fn declaring_an_undefined_class_is_an_error() {
    let error = eval_program(vec![expression_statement(resource(
        "class",
        string("ghost"),
        vec![],
    ))])
    .map(|_| ())
    .unwrap_err();
    assert!(error.contains("class 'ghost' is not defined"));
}

#[test]
fn defined_types_instantiate_per_title() {
    let definition = Statement::DefinedType(DefinedTypeStatement {
        name: "app::vhost".into(),
        parameters: vec![parameter_with_default("port", int(80))],
        body: vec![resource(
            "file",
            binary(BinaryOperator::Plus, string("/etc/vhost/"), variable("title")),
            vec![],
        )],
        position: pos(),
    });
    let error = eval_program(vec![
        definition,
        expression_statement(resource("app::vhost", string("a"), vec![])),
    ])
    .map(|_| ())
    .unwrap_err();
    // String + String is not an arithmetic operation in this language.
    assert!(error.contains("operator '+' is not applicable"));

    let definition = Statement::DefinedType(DefinedTypeStatement {
        name: "app::vhost".into(),
        parameters: vec![parameter_with_default("port", int(80))],
        body: vec![resource("file", variable("title"), vec![])],
        position: pos(),
    });
    let evaluator = eval_program(vec![
        definition,
        expression_statement(resource("app::vhost", string("a"), vec![])),
        expression_statement(resource("app::vhost", string("b"), vec![("port", int(81))])),
    ])
    .unwrap();
    let references: Vec<String> = evaluator
        .catalog()
        .resources()
        .map(|r| r.reference().to_string())
        .collect();
    assert_eq!(
        references,
        ["App::Vhost[a]", "File[a]", "App::Vhost[b]", "File[b]"]
    );
}

#[test]
fn unknown_defined_type_parameters_are_an_error() {
    let definition = Statement::DefinedType(DefinedTypeStatement {
        name: "thing".into(),
        parameters: vec![],
        body: vec![],
        position: pos(),
    });
    let error = eval_program(vec![
        definition,
        expression_statement(resource("thing", string("t"), vec![("bogus", int(1))])),
    ])
    .map(|_| ())
    .unwrap_err();
    assert!(error.contains("'bogus' is not a valid parameter"));
}

// ============================================================================
// Type aliases
// ============================================================================

#[test]
fn aliases_resolve_through_the_registry() {
    let mut evaluator = eval_program(vec![Statement::TypeAlias(TypeAliasStatement {
        name: "Port".into(),
        body: "Integer[0, 65535]".into(),
        position: pos(),
    })])
    .unwrap();
    let result = eval_with(
        &mut evaluator,
        binary(BinaryOperator::Match, int(8080), type_expr("Port")),
    )
    .unwrap();
    assert_eq!(result, Value::Boolean(true));
    let result = eval_with(
        &mut evaluator,
        binary(BinaryOperator::Match, int(-1), type_expr("Port")),
    )
    .unwrap();
    assert_eq!(result, Value::Boolean(false));
}

#[test]
fn recursive_aliases_resolve_and_terminate() {
    let mut evaluator = eval_program(vec![Statement::TypeAlias(TypeAliasStatement {
        name: "Tree".into(),
        body: "Variant[Integer, Array[Tree]]".into(),
        position: pos(),
    })])
    .unwrap();
    let nested = array(vec![int(1), array(vec![int(2), array(vec![int(3)])])]);
    let result = eval_with(
        &mut evaluator,
        binary(BinaryOperator::Match, nested, type_expr("Tree")),
    )
    .unwrap();
    assert_eq!(result, Value::Boolean(true));

    let bad = array(vec![int(1), array(vec![string("x")])]);
    let result = eval_with(
        &mut evaluator,
        binary(BinaryOperator::Match, bad, type_expr("Tree")),
    )
    .unwrap();
    assert_eq!(result, Value::Boolean(false));
}

#[test]
fn unknown_type_names_are_an_error() {
    let error = eval_expr(call(
        "assert_type",
        vec![string("no_such_type"), int(1)],
    ))
    .unwrap_err();
    assert!(error.contains("unknown type"));
}

// ============================================================================
// Relationship chains through programs
// ============================================================================

#[test]
fn chained_relationships_associate_left_to_right() {
    let chain = binary(
        BinaryOperator::Before,
        binary(
            BinaryOperator::Before,
            type_expr("File['/a']"),
            type_expr("File['/b']"),
        ),
        type_expr("File['/c']"),
    );
    let evaluator = eval_program(vec![
        expression_statement(resource_with_titles(
            "file",
            array(vec![string("/a"), string("/b"), string("/c")]),
        )),
        expression_statement(chain),
    ])
    .unwrap();
    let edges = evaluator.catalog().edges();
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].source.to_string(), "File[/a]");
    assert_eq!(edges[0].target.to_string(), "File[/b]");
    assert_eq!(edges[1].source.to_string(), "File[/b]");
    assert_eq!(edges[1].target.to_string(), "File[/c]");
    evaluator.finish().unwrap();
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn duplicate_attributes_are_an_error() {
    let duplicated = expr(ExpressionKind::Resource(ResourceExpression {
        type_name: "file".into(),
        bodies: vec![ResourceBody {
            title: string("/a"),
            attributes: vec![
                Attribute {
                    name: "mode".into(),
                    value: string("0644"),
                    position: pos(),
                },
                Attribute {
                    name: "mode".into(),
                    value: string("0600"),
                    position: pos(),
                },
            ],
            position: pos(),
        }],
    }));
    assert_eval_err(duplicated, "attribute 'mode' already exists");
}
