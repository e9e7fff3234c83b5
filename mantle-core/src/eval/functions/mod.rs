// mantle-core - Function dispatch
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Built-in function dispatch.
//!
//! Each function owns a descriptor with an ordered list of dispatchers: a
//! Callable signature (written as a type expression string and parsed at
//! table construction) plus a handler. Call resolution walks the
//! dispatchers in registration order and invokes the first whose signature
//! matches the actual arguments and block; when none matches, the single
//! diagnostic lists the available signatures against the inferred argument
//! types.

pub(crate) mod inspection;
pub(crate) mod iteration;
pub(crate) mod strings;
pub(crate) mod utility;

use std::collections::HashMap;
use std::rc::Rc;

use mantle_ast::{Lambda, Position};

use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::types::{display_type, parse, CallableType, RecursionGuard, Type};
use crate::values::Value;

/// Handler for one function dispatcher.
pub type FunctionHandler = fn(&mut FunctionCallContext) -> Result<Value>;

/// Call context handed to function handlers.
pub struct FunctionCallContext<'a> {
    pub(crate) evaluator: &'a mut Evaluator,
    name: &'static str,
    arguments: Vec<Value>,
    argument_positions: Vec<Position>,
    block: Option<Rc<Lambda>>,
    position: Position,
}

impl FunctionCallContext<'_> {
    /// The function name being called.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    #[must_use]
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// The argument at the given position. The signature match guarantees
    /// the position exists for the dispatched handler.
    #[must_use]
    pub fn argument(&self, index: usize) -> &Value {
        &self.arguments[index]
    }

    #[must_use]
    pub fn argument_position(&self, index: usize) -> Position {
        self.argument_positions
            .get(index)
            .copied()
            .unwrap_or(self.position)
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// The block lambda, if the call supplied one.
    #[must_use]
    pub fn block(&self) -> Option<&Rc<Lambda>> {
        self.block.as_ref()
    }

    /// Invoke the block with the given arguments in the calling scope.
    /// `next` inside the block becomes the block's value; `break` and
    /// `return` come back as sentinels for the caller to interpret.
    pub fn yield_block(&mut self, arguments: &[Value]) -> Result<Value> {
        let lambda = match &self.block {
            Some(lambda) => Rc::clone(lambda),
            None => return Err(Error::internal("function was dispatched without a block")),
        };
        let scope = self.evaluator.scope().clone();
        self.evaluator.call_lambda_in(&lambda, &scope, arguments)
    }

    /// An evaluation error anchored at the call.
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::evaluation(message).with_origin(self.evaluator.source_path(), self.position)
    }

    /// An evaluation error anchored at an argument.
    pub fn error_at_argument(&self, index: usize, message: impl Into<String>) -> Error {
        Error::evaluation(message)
            .with_origin(self.evaluator.source_path(), self.argument_position(index))
    }
}

/// One typed overload of a function.
struct FunctionDispatcher {
    signature: CallableType,
    handler: FunctionHandler,
}

/// A function descriptor: a name plus its ordered dispatchers.
pub struct FunctionDescriptor {
    name: &'static str,
    dispatchers: Vec<FunctionDispatcher>,
}

impl FunctionDescriptor {
    fn new(name: &'static str) -> Self {
        FunctionDescriptor {
            name,
            dispatchers: Vec::new(),
        }
    }

    /// Register a dispatcher. Signatures are written as Callable type
    /// expressions; the table is built from literals, so failures are bugs.
    fn add(&mut self, signature: &str, handler: FunctionHandler) {
        let parsed = parse(signature).expect("function signature parses");
        let signature = match parsed {
            Type::Callable(callable) => callable,
            _ => unreachable!("function signatures are Callable types"),
        };
        self.dispatchers.push(FunctionDispatcher { signature, handler });
    }

    /// Dispatch a call to the first matching overload.
    pub(crate) fn dispatch(
        &self,
        evaluator: &mut Evaluator,
        arguments: Vec<Value>,
        argument_positions: Vec<Position>,
        block: Option<Rc<Lambda>>,
        position: Position,
    ) -> Result<Value> {
        let selected = self
            .dispatchers
            .iter()
            .position(|dispatcher| signature_matches(&dispatcher.signature, &arguments, block.as_deref()));
        match selected {
            Some(index) => {
                let mut context = FunctionCallContext {
                    evaluator,
                    name: self.name,
                    arguments,
                    argument_positions,
                    block,
                    position,
                };
                (self.dispatchers[index].handler)(&mut context)
            }
            None => Err(self.no_match_error(&arguments, block.as_deref())),
        }
    }

    /// The single diagnostic for a call no overload accepts.
    fn no_match_error(&self, arguments: &[Value], block: Option<&Lambda>) -> Error {
        let actual: Vec<String> = arguments
            .iter()
            .map(|argument| display_type(argument).to_string())
            .collect();
        let with_block = match block {
            Some(lambda) => format!(" with a {}-parameter block", lambda.parameters.len()),
            None => String::new(),
        };
        let mut message = format!(
            "function '{}' cannot be called with arguments ({}){}; available signatures:",
            self.name,
            actual.join(", "),
            with_block
        );
        for dispatcher in &self.dispatchers {
            message.push_str("\n  ");
            message.push_str(&Type::Callable(dispatcher.signature.clone()).to_string());
        }
        Error::evaluation(message)
    }
}

/// Structural matching of actual arguments and block against a signature.
fn signature_matches(signature: &CallableType, arguments: &[Value], block: Option<&Lambda>) -> bool {
    let count = arguments.len() as i64;
    if count < signature.from || count > signature.to {
        return false;
    }
    for (index, argument) in arguments.iter().enumerate() {
        let parameter = signature
            .parameter_types
            .get(index)
            .or_else(|| signature.parameter_types.last());
        if let Some(parameter) = parameter {
            let mut guard = RecursionGuard::new();
            if !parameter.is_instance(argument, &mut guard) {
                return false;
            }
        }
    }
    match (&signature.block, block) {
        (None, None) => true,
        (Some(block_type), Some(lambda)) => match &**block_type {
            Type::Callable(callable) => {
                let parameters = lambda.parameters.len() as i64;
                callable.from <= parameters && parameters <= callable.to
            }
            _ => true,
        },
        _ => false,
    }
}

/// Build the function table, in registration order per function.
pub(crate) fn create_functions() -> HashMap<&'static str, FunctionDescriptor> {
    let mut table = HashMap::new();
    let mut register = |descriptor: FunctionDescriptor| {
        table.insert(descriptor.name, descriptor);
    };

    let mut each = FunctionDescriptor::new("each");
    each.add("Callable[Iterable, 1, 1, Callable[1,2]]", iteration::builtin_each);
    register(each);

    let mut reverse_each = FunctionDescriptor::new("reverse_each");
    reverse_each.add("Callable[Iterable, 1, 1]", iteration::builtin_reverse_each_lazy);
    reverse_each.add(
        "Callable[Iterable, 1, 1, Callable[1,2]]",
        iteration::builtin_reverse_each,
    );
    register(reverse_each);

    let mut step = FunctionDescriptor::new("step");
    step.add("Callable[Iterable, Integer[1], 2, 2]", iteration::builtin_step_lazy);
    step.add(
        "Callable[Iterable, Integer[1], 2, 2, Callable[1,2]]",
        iteration::builtin_step,
    );
    register(step);

    let mut map = FunctionDescriptor::new("map");
    map.add("Callable[Iterable, 1, 1, Callable[1,2]]", iteration::builtin_map);
    register(map);

    let mut filter = FunctionDescriptor::new("filter");
    filter.add("Callable[Iterable, 1, 1, Callable[1,2]]", iteration::builtin_filter);
    register(filter);

    let mut reduce = FunctionDescriptor::new("reduce");
    reduce.add("Callable[Iterable, 1, 1, Callable[2,2]]", iteration::builtin_reduce);
    reduce.add(
        "Callable[Iterable, Any, 2, 2, Callable[2,2]]",
        iteration::builtin_reduce,
    );
    register(reduce);

    let mut split = FunctionDescriptor::new("split");
    split.add("Callable[String, String]", strings::builtin_split_plain);
    split.add("Callable[String, Regexp]", strings::builtin_split_regex);
    split.add("Callable[String, Type[Regexp]]", strings::builtin_split_regex_type);
    register(split);

    let mut type_of = FunctionDescriptor::new("type");
    type_of.add("Callable[Any]", inspection::builtin_type);
    register(type_of);

    let mut assert_type = FunctionDescriptor::new("assert_type");
    assert_type.add("Callable[Type, Any]", inspection::builtin_assert_type);
    assert_type.add("Callable[String, Any]", inspection::builtin_assert_type);
    assert_type.add(
        "Callable[Type, Any, Callable[2,2]]",
        inspection::builtin_assert_type,
    );
    assert_type.add(
        "Callable[String, Any, Callable[2,2]]",
        inspection::builtin_assert_type,
    );
    register(assert_type);

    let mut with = FunctionDescriptor::new("with");
    with.add("Callable[Any, 0, default, Callable]", utility::builtin_with);
    register(with);

    let mut fail = FunctionDescriptor::new("fail");
    fail.add("Callable[Any, 0, default]", utility::builtin_fail);
    register(fail);

    let mut break_function = FunctionDescriptor::new("break");
    break_function.add("Callable[0, 0]", utility::builtin_break);
    register(break_function);

    let mut next_function = FunctionDescriptor::new("next");
    next_function.add("Callable[Any, 0, 1]", utility::builtin_next);
    register(next_function);

    let mut return_function = FunctionDescriptor::new("return");
    return_function.add("Callable[Any, 0, 1]", utility::builtin_return);
    register(return_function);

    table
}
