// mantle-core - AST-walking evaluator
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The AST-walking evaluator.
//!
//! One evaluator drives a syntax tree to completion on one thread:
//! definitions are harvested into the registry first, then top-level
//! expressions evaluate in order, then a node definition can be matched and
//! evaluated. Operators and functions dispatch through the tables in the
//! submodules; classes evaluate lazily at first declaration.
//!
//! Control flow (`break`/`next`/`return`) travels as sentinel values
//! through the Ok channel. Every construct that sequences expressions
//! checks for a sentinel and stops, and the top level converts an escaped
//! sentinel into an evaluation error.

pub mod functions;
pub mod operators;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use im::Vector;
use indexmap::IndexMap;
use tracing::{debug, trace};

use mantle_ast::{
    BinaryOperator, CaseExpression, CollectorExpression, Expression, ExpressionKind, FunctionCall,
    IfExpression, Lambda, Literal, Parameter, Position, ResourceExpression, SelectorExpression,
    Statement, SyntaxTree, UnaryOperator,
};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::registry::{self, Registry};
use crate::scope::{self, Scope};
use crate::types::{self, display_type, infer, AliasType, RecursionGuard, Type, TypeResolver};
use crate::values::{
    canonicalize_type_name, loose_equal, ResourceReference, Value, ValueHash, ValueRegex,
};

use functions::FunctionDescriptor;
use operators::{BinaryDescriptor, UnaryDescriptor};

/// Evaluation depth limit guarding runaway recursion.
const MAX_EVALUATION_DEPTH: usize = 1000;

/// The evaluator.
pub struct Evaluator {
    registry: Registry,
    catalog: Catalog,
    top_scope: Scope,
    scope: Scope,
    /// Resolved type aliases, by name.
    aliases: HashMap<String, AliasType>,
    binary_operators: Rc<HashMap<BinaryOperator, BinaryDescriptor>>,
    unary_operators: Rc<HashMap<UnaryOperator, UnaryDescriptor>>,
    functions: Rc<HashMap<&'static str, FunctionDescriptor>>,
    declared_classes: HashSet<String>,
    strict_variables: bool,
    path: Rc<str>,
    depth: usize,
}

impl Evaluator {
    /// Create an evaluator with the built-in operator and function tables.
    #[must_use]
    pub fn new() -> Self {
        let top_scope = Scope::new();
        Evaluator {
            registry: Registry::new(),
            catalog: Catalog::new(),
            scope: top_scope.clone(),
            top_scope,
            aliases: HashMap::new(),
            binary_operators: Rc::new(operators::create_binary_operators()),
            unary_operators: Rc::new(operators::create_unary_operators()),
            functions: Rc::new(functions::create_functions()),
            declared_classes: HashSet::new(),
            strict_variables: false,
            path: Rc::from("<main>"),
            depth: 0,
        }
    }

    /// Error on unknown variables instead of yielding undef.
    pub fn set_strict_variables(&mut self, strict: bool) {
        self.strict_variables = strict;
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub(crate) fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// The current scope.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub(crate) fn source_path(&self) -> &Rc<str> {
        &self.path
    }

    /// Compile a syntax tree: harvest definitions, then evaluate the
    /// top-level expressions in order.
    pub fn compile(&mut self, tree: &Rc<SyntaxTree>) -> Result<()> {
        self.path = Rc::clone(&tree.path);
        for (index, statement) in tree.statements.iter().enumerate() {
            match statement {
                Statement::Class(statement) => self
                    .registry
                    .register_class(tree, index)
                    .map_err(|e| e.with_origin(&tree.path, statement.position))?,
                Statement::DefinedType(statement) => self
                    .registry
                    .register_defined_type(tree, index)
                    .map_err(|e| e.with_origin(&tree.path, statement.position))?,
                Statement::TypeAlias(statement) => self
                    .registry
                    .register_type_alias(tree, index)
                    .map_err(|e| e.with_origin(&tree.path, statement.position))?,
                Statement::Node(statement) => {
                    let previous = self
                        .registry
                        .register_node(tree, index)
                        .map_err(|e| e.with_origin(&tree.path, statement.position))?;
                    if let Some(previous) = previous {
                        let message = format!(
                            "node definition conflicts with a previous definition at {}:{}",
                            previous.tree().path,
                            previous.statement().position
                        );
                        return Err(Error::declaration(message)
                            .with_origin(&tree.path, statement.position));
                    }
                }
                Statement::Expression(_) => {}
            }
        }
        for statement in &tree.statements {
            if let Statement::Expression(expression) = statement {
                let value = self.evaluate(expression)?;
                self.check_control(&value, expression.position)?;
            }
        }
        Ok(())
    }

    /// Match and evaluate the node definition for a hostname. Returns false
    /// when no definition matches.
    pub fn evaluate_node(&mut self, hostname: &str) -> Result<bool> {
        let Some(definition) = self.registry.find_node(hostname).cloned() else {
            return Ok(false);
        };
        debug!(hostname, "evaluating node definition");
        let saved_path = std::mem::replace(&mut self.path, Rc::clone(&definition.tree().path));
        let scope = self.top_scope.child();
        let result = self.with_scope(scope, |evaluator| {
            let statement = definition.statement();
            let value = evaluator.evaluate_body(&statement.body)?;
            evaluator.check_control(&value, statement.position)
        });
        self.path = saved_path;
        result?;
        Ok(true)
    }

    /// Verify the catalog and hand it out.
    pub fn finish(&self) -> Result<&Catalog> {
        self.catalog.finalize()?;
        Ok(&self.catalog)
    }

    /// Evaluate one expression.
    pub fn evaluate(&mut self, expression: &Expression) -> Result<Value> {
        if self.depth >= MAX_EVALUATION_DEPTH {
            return Err(
                Error::evaluation("evaluation exceeded the maximum allowed depth")
                    .with_origin(&self.path, expression.position),
            );
        }
        self.depth += 1;
        let result = self.evaluate_kind(&expression.kind, expression.position);
        self.depth -= 1;
        result.map_err(|e| e.with_origin(&self.path, expression.position))
    }

    /// Evaluate a body of expressions: the last value, or the first
    /// control-flow sentinel produced.
    pub fn evaluate_body(&mut self, body: &[Expression]) -> Result<Value> {
        let mut last = Value::Undef;
        for expression in body {
            let value = self.evaluate(expression)?;
            if value.is_control() {
                return Ok(value);
            }
            last = value;
        }
        Ok(last)
    }

    fn evaluate_kind(&mut self, kind: &ExpressionKind, position: Position) -> Result<Value> {
        match kind {
            ExpressionKind::Literal(literal) => self.literal_value(literal),
            ExpressionKind::TypeExpression(source) => {
                Ok(Value::from_type(self.resolve_type_expression(source)?))
            }
            ExpressionKind::Variable(name) => match self.scope.lookup(name) {
                Some(value) => Ok(value),
                None => {
                    if self.strict_variables && !scope::is_match_name(name) {
                        Err(Error::evaluation(format!("unknown variable '${name}'")))
                    } else {
                        Ok(Value::Undef)
                    }
                }
            },
            ExpressionKind::Array(items) => {
                let mut result = Vector::new();
                for item in items {
                    let value = self.evaluate(item)?;
                    if value.is_control() {
                        return Ok(value);
                    }
                    result.push_back(self.materialize(&value)?);
                }
                Ok(Value::Array(result))
            }
            ExpressionKind::Hash(entries) => {
                let mut result = ValueHash::new();
                for (key_expression, value_expression) in entries {
                    let key = self.evaluate(key_expression)?;
                    if key.is_control() {
                        return Ok(key);
                    }
                    let value = self.evaluate(value_expression)?;
                    if value.is_control() {
                        return Ok(value);
                    }
                    result.insert(self.materialize(&key)?, self.materialize(&value)?);
                }
                Ok(Value::Hash(result))
            }
            ExpressionKind::FunctionCall(call) => self.evaluate_function_call(call, position),
            ExpressionKind::Binary {
                operator,
                left,
                right,
            } => self.evaluate_binary(*operator, left, right, position),
            ExpressionKind::Unary { operator, operand } => {
                let value = self.evaluate(operand)?;
                if value.is_control() {
                    return Ok(value);
                }
                let table = Rc::clone(&self.unary_operators);
                let descriptor = table.get(operator).ok_or_else(|| {
                    Error::internal(format!(
                        "no dispatch table for operator '{}'",
                        operator.symbol()
                    ))
                })?;
                descriptor.dispatch(self, value, operand.position)
            }
            ExpressionKind::Assignment { name, value } => {
                if scope::is_match_name(name) {
                    return Err(Error::evaluation(format!(
                        "cannot assign to match variable '${name}'"
                    )));
                }
                let value = self.evaluate(value)?;
                if value.is_control() {
                    return Ok(value);
                }
                let value = self.materialize(&value)?;
                if !self.scope.set(name.clone(), value.clone()) {
                    return Err(Error::evaluation(format!(
                        "cannot re-assign variable '${name}'"
                    )));
                }
                Ok(value)
            }
            ExpressionKind::If(expression) => self.evaluate_if(expression),
            ExpressionKind::Case(expression) => self.evaluate_case(expression),
            ExpressionKind::Selector(expression) => self.evaluate_selector(expression),
            ExpressionKind::Resource(expression) => self.evaluate_resource(expression, position),
            ExpressionKind::Collector(expression) => self.evaluate_collector(expression),
        }
    }

    fn literal_value(&self, literal: &Literal) -> Result<Value> {
        Ok(match literal {
            Literal::Undef => Value::Undef,
            Literal::Default => Value::Default,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::String(s) => Value::string(s.as_str()),
            Literal::Regex(pattern) => Value::Regex(ValueRegex::new(pattern).map_err(|e| {
                Error::evaluation(format!("invalid regular expression /{pattern}/: {e}"))
            })?),
        })
    }

    fn evaluate_function_call(&mut self, call: &FunctionCall, position: Position) -> Result<Value> {
        let mut arguments = Vec::with_capacity(call.arguments.len());
        let mut argument_positions = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            let value = self.evaluate(argument)?;
            if value.is_control() {
                return Ok(value);
            }
            arguments.push(value);
            argument_positions.push(argument.position);
        }
        let functions = Rc::clone(&self.functions);
        let descriptor = functions
            .get(call.name.as_str())
            .ok_or_else(|| Error::evaluation(format!("unknown function '{}'", call.name)))?;
        trace!(function = %call.name, "dispatching function call");
        descriptor.dispatch(
            self,
            arguments,
            argument_positions,
            call.lambda.clone(),
            position,
        )
    }

    fn evaluate_binary(
        &mut self,
        operator: BinaryOperator,
        left: &Expression,
        right: &Expression,
        position: Position,
    ) -> Result<Value> {
        // and/or short-circuit: the right operand must not evaluate when
        // the left side decides, so they never reach the dispatch tables.
        match operator {
            BinaryOperator::And => {
                let left_value = self.evaluate(left)?;
                if left_value.is_control() {
                    return Ok(left_value);
                }
                if !left_value.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                let right_value = self.evaluate(right)?;
                if right_value.is_control() {
                    return Ok(right_value);
                }
                Ok(Value::Boolean(right_value.is_truthy()))
            }
            BinaryOperator::Or => {
                let left_value = self.evaluate(left)?;
                if left_value.is_control() {
                    return Ok(left_value);
                }
                if left_value.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                let right_value = self.evaluate(right)?;
                if right_value.is_control() {
                    return Ok(right_value);
                }
                Ok(Value::Boolean(right_value.is_truthy()))
            }
            _ => {
                let left_value = self.evaluate(left)?;
                if left_value.is_control() {
                    return Ok(left_value);
                }
                let right_value = self.evaluate(right)?;
                if right_value.is_control() {
                    return Ok(right_value);
                }
                self.dispatch_binary(
                    operator,
                    left_value,
                    left.position,
                    right_value,
                    right.position,
                    position,
                )
            }
        }
    }

    /// Dispatch an already-evaluated binary operation through the tables.
    pub fn dispatch_binary(
        &mut self,
        operator: BinaryOperator,
        left: Value,
        left_position: Position,
        right: Value,
        right_position: Position,
        position: Position,
    ) -> Result<Value> {
        let table = Rc::clone(&self.binary_operators);
        let descriptor = table.get(&operator).ok_or_else(|| {
            Error::internal(format!(
                "no dispatch table for operator '{}'",
                operator.symbol()
            ))
        })?;
        descriptor.dispatch(self, left, right, left_position, right_position, position)
    }

    fn evaluate_if(&mut self, expression: &IfExpression) -> Result<Value> {
        // Match variables set by a condition are visible in the chosen
        // branch and released when the expression completes.
        let _matches = self.scope.match_frame();
        let condition = self.evaluate(&expression.condition)?;
        if condition.is_control() {
            return Ok(condition);
        }
        if condition.is_truthy() != expression.unless {
            return self.evaluate_body(&expression.then_body);
        }
        for (elsif_condition, elsif_body) in &expression.elsifs {
            let condition = self.evaluate(elsif_condition)?;
            if condition.is_control() {
                return Ok(condition);
            }
            if condition.is_truthy() {
                return self.evaluate_body(elsif_body);
            }
        }
        match &expression.else_body {
            Some(body) => self.evaluate_body(body),
            None => Ok(Value::Undef),
        }
    }

    fn evaluate_case(&mut self, expression: &CaseExpression) -> Result<Value> {
        let control = self.evaluate(&expression.expression)?;
        if control.is_control() {
            return Ok(control);
        }
        let control = self.materialize(&control)?;
        let mut default_body: Option<&[Expression]> = None;
        for proposition in &expression.propositions {
            let frame = self.scope.match_frame();
            let mut matched = false;
            for option in &proposition.options {
                if matches!(option.kind, ExpressionKind::Literal(Literal::Default)) {
                    if default_body.is_none() {
                        default_body = Some(&proposition.body);
                    }
                    continue;
                }
                let option_value = self.evaluate(option)?;
                if option_value.is_control() {
                    return Ok(option_value);
                }
                if self.option_matches(&control, &option_value) {
                    matched = true;
                    break;
                }
            }
            if matched {
                return self.evaluate_body(&proposition.body);
            }
            drop(frame);
        }
        match default_body {
            Some(body) => self.evaluate_body(body),
            None => Ok(Value::Undef),
        }
    }

    fn evaluate_selector(&mut self, expression: &SelectorExpression) -> Result<Value> {
        let control = self.evaluate(&expression.expression)?;
        if control.is_control() {
            return Ok(control);
        }
        let control = self.materialize(&control)?;
        let mut default_result: Option<&Expression> = None;
        for (option, result) in &expression.cases {
            if matches!(option.kind, ExpressionKind::Literal(Literal::Default)) {
                if default_result.is_none() {
                    default_result = Some(result);
                }
                continue;
            }
            let frame = self.scope.match_frame();
            let option_value = self.evaluate(option)?;
            if option_value.is_control() {
                return Ok(option_value);
            }
            if self.option_matches(&control, &option_value) {
                return self.evaluate(result);
            }
            drop(frame);
        }
        match default_result {
            Some(result) => self.evaluate(result),
            None => Err(Error::evaluation(format!(
                "no matching entry for selector expression with value '{control}'"
            ))),
        }
    }

    /// Case and selector option matching: regex options match strings and
    /// set match variables, type options test membership, anything else
    /// compares with the `==` semantics.
    fn option_matches(&mut self, control: &Value, option: &Value) -> bool {
        match option {
            Value::Regex(regex) => match control {
                Value::String(subject) => match regex.regex().captures(subject) {
                    Some(captures) => {
                        let groups: Vec<Option<String>> = captures
                            .iter()
                            .map(|group| group.map(|m| m.as_str().to_string()))
                            .collect();
                        self.scope.set_match_variables(&groups);
                        true
                    }
                    None => false,
                },
                _ => false,
            },
            Value::Type(ty) => {
                let mut guard = RecursionGuard::new();
                ty.is_instance(control, &mut guard)
            }
            _ => loose_equal(control, option),
        }
    }

    fn evaluate_resource(
        &mut self,
        expression: &ResourceExpression,
        _position: Position,
    ) -> Result<Value> {
        let type_name = expression.type_name.to_lowercase();
        let mut references = Vector::new();
        for body in &expression.bodies {
            let title_value = self.evaluate(&body.title)?;
            if title_value.is_control() {
                return Ok(title_value);
            }
            let titles = self.resource_titles(&title_value, body.title.position)?;

            let mut attributes: IndexMap<String, Value> = IndexMap::new();
            for attribute in &body.attributes {
                let value = self.evaluate(&attribute.value)?;
                if value.is_control() {
                    return Ok(value);
                }
                let value = self.materialize(&value)?;
                if attributes.insert(attribute.name.clone(), value).is_some() {
                    return Err(Error::evaluation(format!(
                        "attribute '{}' already exists in this resource body",
                        attribute.name
                    ))
                    .with_origin(&self.path, attribute.position));
                }
            }

            for title in titles {
                if title.is_empty() {
                    return Err(Error::evaluation("resource title cannot be empty")
                        .with_origin(&self.path, body.position));
                }
                let reference = if type_name == "class" {
                    self.declare_class(&title, Some(&attributes), body.position)?
                } else if self.registry.find_defined_type(&type_name).is_some() {
                    self.declare_defined_type(&type_name, &title, &attributes, body.position)?
                } else {
                    let reference = ResourceReference::new(&type_name, title);
                    self.catalog
                        .add_resource(reference.clone(), attributes.clone(), body.position)
                        .map_err(|e| e.with_origin(&self.path, body.position))?;
                    reference
                };
                references.push_back(Value::Resource(reference));
            }
        }
        Ok(Value::Array(references))
    }

    fn resource_titles(&self, value: &Value, position: Position) -> Result<Vec<String>> {
        match value {
            Value::String(s) => Ok(vec![s.to_string()]),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.to_string()),
                    other => Err(Error::evaluation(format!(
                        "expected String for resource title but found {}",
                        display_type(other)
                    ))
                    .with_origin(&self.path, position)),
                })
                .collect(),
            other => Err(Error::evaluation(format!(
                "expected String for resource title but found {}",
                display_type(other)
            ))
            .with_origin(&self.path, position)),
        }
    }

    /// Declare a class, evaluating its body on first declaration.
    fn declare_class(
        &mut self,
        name: &str,
        arguments: Option<&IndexMap<String, Value>>,
        position: Position,
    ) -> Result<ResourceReference> {
        let name = name.to_lowercase();
        let reference = ResourceReference::new("class", name.clone());
        if self.declared_classes.contains(&name) {
            // A parameterless re-declaration is idempotent; passing
            // parameters twice is not.
            if arguments.is_some_and(|a| !a.is_empty()) {
                return Err(
                    Error::evaluation(format!("class '{name}' is already declared"))
                        .with_origin(&self.path, position),
                );
            }
            return Ok(reference);
        }
        let Some(definition) = self.registry.find_class(&name).cloned() else {
            return Err(
                Error::evaluation(format!("class '{name}' is not defined"))
                    .with_origin(&self.path, position),
            );
        };
        self.declared_classes.insert(name.clone());
        let parameters = arguments.cloned().unwrap_or_default();
        self.catalog
            .add_resource(reference.clone(), parameters.clone(), position)
            .map_err(|e| e.with_origin(&self.path, position))?;
        debug!(class = %name, "declaring class");

        let statement = definition.statement();
        if let Some(parent) = statement.parent.clone() {
            self.declare_class(&parent, None, position)?;
        }
        let scope = self.top_scope.child();
        scope.set("title", Value::string(name.as_str()));
        scope.set("name", Value::string(name.as_str()));
        self.bind_parameters(
            &scope,
            &statement.parameters,
            &parameters,
            "class",
            &name,
            position,
        )?;
        let saved_path = std::mem::replace(&mut self.path, Rc::clone(&definition.tree().path));
        let result = self.with_scope(scope, |evaluator| {
            let value = evaluator.evaluate_body(&statement.body)?;
            evaluator.check_control(&value, statement.position)
        });
        self.path = saved_path;
        result?;
        Ok(reference)
    }

    /// Declare a defined type resource and evaluate its body.
    fn declare_defined_type(
        &mut self,
        type_name: &str,
        title: &str,
        arguments: &IndexMap<String, Value>,
        position: Position,
    ) -> Result<ResourceReference> {
        let Some(definition) = self.registry.find_defined_type(type_name).cloned() else {
            return Err(Error::internal(
                "defined type disappeared from the registry",
            ));
        };
        let reference = ResourceReference::new(type_name, title);
        self.catalog
            .add_resource(reference.clone(), arguments.clone(), position)
            .map_err(|e| e.with_origin(&self.path, position))?;
        debug!(resource = %reference, "declaring defined type resource");

        let statement = definition.statement();
        let scope = self.top_scope.child();
        scope.set("title", Value::string(title));
        scope.set("name", Value::string(title));
        self.bind_parameters(
            &scope,
            &statement.parameters,
            arguments,
            "defined type",
            definition.name(),
            position,
        )?;
        let saved_path = std::mem::replace(&mut self.path, Rc::clone(&definition.tree().path));
        let result = self.with_scope(scope, |evaluator| {
            let value = evaluator.evaluate_body(&statement.body)?;
            evaluator.check_control(&value, statement.position)
        });
        self.path = saved_path;
        result?;
        Ok(reference)
    }

    /// Bind class / defined type parameters into the given scope, checking
    /// for unknown arguments, missing parameters, and type mismatches.
    fn bind_parameters(
        &mut self,
        scope: &Scope,
        parameters: &[Parameter],
        arguments: &IndexMap<String, Value>,
        kind: &str,
        name: &str,
        position: Position,
    ) -> Result<()> {
        for key in arguments.keys() {
            if !parameters.iter().any(|p| &p.name == key) {
                return Err(Error::evaluation(format!(
                    "'{key}' is not a valid parameter for {kind} '{name}'"
                ))
                .with_origin(&self.path, position));
            }
        }
        for parameter in parameters {
            let value = match arguments.get(&parameter.name) {
                Some(value) => value.clone(),
                None => match &parameter.default {
                    Some(default) => {
                        let value = self.with_scope(scope.clone(), |evaluator| {
                            evaluator.evaluate(default)
                        })?;
                        self.materialize(&value)?
                    }
                    None => {
                        return Err(Error::evaluation(format!(
                            "parameter '{}' is required for {kind} '{name}'",
                            parameter.name
                        ))
                        .with_origin(&self.path, position))
                    }
                },
            };
            if let Some(type_expression) = &parameter.type_expression {
                let expected = self.resolve_type_expression(type_expression)?;
                let mut guard = RecursionGuard::new();
                if !expected.is_instance(&value, &mut guard) {
                    return Err(Error::evaluation(format!(
                        "parameter '{}' expects {} but was given {}",
                        parameter.name,
                        expected,
                        infer(&value)
                    ))
                    .with_origin(&self.path, parameter.position));
                }
            }
            scope.set(parameter.name.clone(), value);
        }
        Ok(())
    }

    fn evaluate_collector(&mut self, expression: &CollectorExpression) -> Result<Value> {
        let type_name = canonicalize_type_name(&expression.type_name);
        let query = match &expression.query {
            Some((attribute, value_expression)) => {
                let value = self.evaluate(value_expression)?;
                if value.is_control() {
                    return Ok(value);
                }
                Some((attribute.clone(), value))
            }
            None => None,
        };
        let mut matches = Vector::new();
        for resource in self.catalog.resources() {
            if resource.reference().type_name() != type_name {
                continue;
            }
            if let Some((attribute, expected)) = &query {
                match resource.parameter(attribute) {
                    Some(actual) if loose_equal(actual, expected) => {}
                    _ => continue,
                }
            }
            matches.push_back(Value::Resource(resource.reference().clone()));
        }
        Ok(Value::Array(matches))
    }

    /// Invoke a lambda in the given scope with the given arguments.
    ///
    /// A `next` sentinel becomes the block's value here; `break` and
    /// `return` pass through for the caller to interpret.
    pub fn call_lambda_in(
        &mut self,
        lambda: &Lambda,
        scope: &Scope,
        arguments: &[Value],
    ) -> Result<Value> {
        if arguments.len() > lambda.parameters.len() {
            return Err(Error::evaluation(format!(
                "block expects at most {} arguments but was given {}",
                lambda.parameters.len(),
                arguments.len()
            ))
            .with_origin(&self.path, lambda.position));
        }
        let _frame = scope.parameter_frame();
        for (index, parameter) in lambda.parameters.iter().enumerate() {
            let value = match arguments.get(index) {
                Some(value) => value.clone(),
                None => match &parameter.default {
                    Some(default) => self
                        .with_scope(scope.clone(), |evaluator| evaluator.evaluate(default))?,
                    None => {
                        return Err(Error::evaluation(format!(
                            "block parameter '{}' is required",
                            parameter.name
                        ))
                        .with_origin(&self.path, parameter.position))
                    }
                },
            };
            if let Some(type_expression) = &parameter.type_expression {
                let expected = self.resolve_type_expression(type_expression)?;
                let mut guard = RecursionGuard::new();
                if !expected.is_instance(&value, &mut guard) {
                    return Err(Error::evaluation(format!(
                        "block parameter '{}' expects {} but was given {}",
                        parameter.name,
                        expected,
                        infer(&value)
                    ))
                    .with_origin(&self.path, parameter.position));
                }
            }
            scope.set(parameter.name.clone(), value);
        }
        let result = self.with_scope(scope.clone(), |evaluator| {
            evaluator.evaluate_body(&lambda.body)
        })?;
        Ok(match result {
            Value::Next(value) => value.map_or(Value::Undef, |boxed| *boxed),
            other => other,
        })
    }

    /// Resolve a type expression against the built-ins and the registry's
    /// type aliases.
    pub fn resolve_type_expression(&mut self, source: &str) -> Result<Type> {
        types::parse_with(source, self)
    }

    /// Collapse an iterator value into the collection it produces; any
    /// other value passes through.
    pub fn materialize(&mut self, value: &Value) -> Result<Value> {
        match value {
            Value::Iterator(iterator) => {
                let iterator = Rc::clone(iterator);
                functions::iteration::materialize(self, &iterator)
            }
            other => Ok(other.clone()),
        }
    }

    /// A control-flow sentinel escaping to a statement context is an error.
    fn check_control(&self, value: &Value, position: Position) -> Result<()> {
        let message = match value {
            Value::Break => "break cannot be used outside of a block",
            Value::Next(_) => "next cannot be used outside of a block",
            Value::Return(_) => "return cannot be used outside of a function",
            _ => return Ok(()),
        };
        Err(Error::evaluation(message).with_origin(&self.path, position))
    }

    /// Run with a different current scope, restoring the previous one on
    /// every exit path.
    fn with_scope<T>(
        &mut self,
        scope: Scope,
        body: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = std::mem::replace(&mut self.scope, scope);
        let result = body(self);
        self.scope = saved;
        result
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator::new()
    }
}

impl TypeResolver for Evaluator {
    /// Resolve non-built-in type names: resolved aliases first, then alias
    /// definitions in the registry (creating the alias unresolved so its
    /// own body can refer to it), then bare resource type names.
    fn resolve(&mut self, name: &str) -> Result<Type> {
        if let Some(alias) = self.aliases.get(name) {
            return Ok(Type::Alias(alias.clone()));
        }
        if self.registry.find_type_alias(name).is_some() {
            let body = {
                let definition = self
                    .registry
                    .find_type_alias(name)
                    .expect("alias was just found");
                definition.statement().body.clone()
            };
            let alias = AliasType::unresolved(name);
            self.aliases.insert(name.to_string(), alias.clone());
            let body_type = types::parse_with(&body, self)?;
            alias.resolve_to(body_type);
            return Ok(Type::Alias(alias));
        }
        if registry::is_valid_alias_name(name) {
            return Ok(Type::Resource {
                type_name: Some(canonicalize_type_name(name)),
                title: None,
            });
        }
        Err(Error::evaluation(format!("unknown type '{name}'")))
    }
}
