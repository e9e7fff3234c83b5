// mantle-core - Operator dispatch
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Binary and unary operator dispatch.
//!
//! Each operator owns a descriptor holding an ordered list of typed
//! dispatch entries. Entry patterns are written as type expression strings
//! and parsed when the tables are built; dispatch walks the entries in
//! registration order and invokes the first whose patterns match the
//! actual operand values, so first-declared wins. An operator with no
//! matching entry is an evaluation error naming the operand types.
//!
//! `and` and `or` never reach these tables: the evaluator intercepts them
//! for short-circuit evaluation.

mod arithmetic;
mod comparison;
mod matching;
mod membership;
mod relationships;
mod unary;

use std::collections::HashMap;

use mantle_ast::{BinaryOperator, Position, UnaryOperator};

use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::types::{display_type, parse, RecursionGuard, Type};
use crate::values::Value;

/// Handler for one binary dispatch entry.
pub type BinaryHandler = fn(&mut BinaryCallContext) -> Result<Value>;

/// Handler for one unary dispatch entry.
pub type UnaryHandler = fn(&mut UnaryCallContext) -> Result<Value>;

/// Call context handed to binary operator handlers.
pub struct BinaryCallContext<'a> {
    pub(crate) evaluator: &'a mut Evaluator,
    operator: BinaryOperator,
    left: Value,
    right: Value,
    left_position: Position,
    right_position: Position,
    position: Position,
}

impl BinaryCallContext<'_> {
    #[must_use]
    pub fn operator(&self) -> BinaryOperator {
        self.operator
    }

    #[must_use]
    pub fn left(&self) -> &Value {
        &self.left
    }

    #[must_use]
    pub fn right(&self) -> &Value {
        &self.right
    }

    #[must_use]
    pub fn left_position(&self) -> Position {
        self.left_position
    }

    #[must_use]
    pub fn right_position(&self) -> Position {
        self.right_position
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// An evaluation error anchored at the operator.
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::evaluation(message).with_origin(self.evaluator.source_path(), self.position)
    }

    /// An evaluation error anchored at the left operand.
    pub fn error_at_left(&self, message: impl Into<String>) -> Error {
        Error::evaluation(message).with_origin(self.evaluator.source_path(), self.left_position)
    }

    /// An evaluation error anchored at the right operand.
    pub fn error_at_right(&self, message: impl Into<String>) -> Error {
        Error::evaluation(message).with_origin(self.evaluator.source_path(), self.right_position)
    }
}

/// Call context handed to unary operator handlers.
pub struct UnaryCallContext<'a> {
    pub(crate) evaluator: &'a mut Evaluator,
    operator: UnaryOperator,
    operand: Value,
    position: Position,
}

impl UnaryCallContext<'_> {
    #[must_use]
    pub fn operator(&self) -> UnaryOperator {
        self.operator
    }

    #[must_use]
    pub fn operand(&self) -> &Value {
        &self.operand
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// An evaluation error anchored at the operand.
    pub fn error(&self, message: impl Into<String>) -> Error {
        Error::evaluation(message).with_origin(self.evaluator.source_path(), self.position)
    }
}

/// One typed dispatch entry of a binary operator.
struct BinaryDispatcher {
    left: Type,
    right: Type,
    handler: BinaryHandler,
}

/// The ordered dispatch table of one binary operator.
pub struct BinaryDescriptor {
    operator: BinaryOperator,
    dispatchers: Vec<BinaryDispatcher>,
}

impl BinaryDescriptor {
    fn new(operator: BinaryOperator) -> Self {
        BinaryDescriptor {
            operator,
            dispatchers: Vec::new(),
        }
    }

    /// Register a dispatch entry. Patterns are type expressions; the tables
    /// are built from literals, so a parse failure is a bug.
    fn add(&mut self, left: &str, right: &str, handler: BinaryHandler) {
        let left = parse(left).expect("operator dispatch pattern parses");
        let right = parse(right).expect("operator dispatch pattern parses");
        self.dispatchers.push(BinaryDispatcher {
            left,
            right,
            handler,
        });
    }

    /// Dispatch to the first entry matching both operands.
    pub(crate) fn dispatch(
        &self,
        evaluator: &mut Evaluator,
        left: Value,
        right: Value,
        left_position: Position,
        right_position: Position,
        position: Position,
    ) -> Result<Value> {
        let selected = self.dispatchers.iter().position(|dispatcher| {
            let mut guard = RecursionGuard::new();
            dispatcher.left.is_instance(&left, &mut guard)
                && dispatcher.right.is_instance(&right, &mut guard)
        });
        match selected {
            Some(index) => {
                let mut context = BinaryCallContext {
                    evaluator,
                    operator: self.operator,
                    left,
                    right,
                    left_position,
                    right_position,
                    position,
                };
                (self.dispatchers[index].handler)(&mut context)
            }
            None => Err(Error::evaluation(format!(
                "operator '{}' is not applicable to ({}, {})",
                self.operator.symbol(),
                display_type(&left),
                display_type(&right)
            ))),
        }
    }
}

/// One typed dispatch entry of a unary operator.
struct UnaryDispatcher {
    operand: Type,
    handler: UnaryHandler,
}

/// The ordered dispatch table of one unary operator.
pub struct UnaryDescriptor {
    operator: UnaryOperator,
    dispatchers: Vec<UnaryDispatcher>,
}

impl UnaryDescriptor {
    fn new(operator: UnaryOperator) -> Self {
        UnaryDescriptor {
            operator,
            dispatchers: Vec::new(),
        }
    }

    fn add(&mut self, operand: &str, handler: UnaryHandler) {
        let operand = parse(operand).expect("operator dispatch pattern parses");
        self.dispatchers.push(UnaryDispatcher { operand, handler });
    }

    pub(crate) fn dispatch(
        &self,
        evaluator: &mut Evaluator,
        operand: Value,
        position: Position,
    ) -> Result<Value> {
        let selected = self.dispatchers.iter().position(|dispatcher| {
            let mut guard = RecursionGuard::new();
            dispatcher.operand.is_instance(&operand, &mut guard)
        });
        match selected {
            Some(index) => {
                let mut context = UnaryCallContext {
                    evaluator,
                    operator: self.operator,
                    operand,
                    position,
                };
                (self.dispatchers[index].handler)(&mut context)
            }
            None => Err(Error::evaluation(format!(
                "operator '{}' is not applicable to {}",
                self.operator.symbol(),
                display_type(&operand)
            ))),
        }
    }
}

/// Build the binary operator tables, in the order the entries are declared.
pub(crate) fn create_binary_operators() -> HashMap<BinaryOperator, BinaryDescriptor> {
    let mut table = HashMap::new();

    let mut plus = BinaryDescriptor::new(BinaryOperator::Plus);
    plus.add("Numeric", "Numeric", arithmetic::add);
    plus.add("Array", "Array", arithmetic::array_concat);
    plus.add("Array", "Hash", arithmetic::array_concat_hash);
    plus.add("Hash", "Hash", arithmetic::hash_merge);
    plus.add("Hash", "Array", arithmetic::hash_merge_array);
    table.insert(BinaryOperator::Plus, plus);

    let mut minus = BinaryDescriptor::new(BinaryOperator::Minus);
    minus.add("Numeric", "Numeric", arithmetic::subtract);
    minus.add("Array", "Array", arithmetic::array_difference);
    minus.add("Hash", "Hash", arithmetic::hash_difference);
    minus.add("Hash", "Array", arithmetic::hash_remove_keys);
    table.insert(BinaryOperator::Minus, minus);

    let mut multiply = BinaryDescriptor::new(BinaryOperator::Multiply);
    multiply.add("Numeric", "Numeric", arithmetic::multiply);
    table.insert(BinaryOperator::Multiply, multiply);

    let mut divide = BinaryDescriptor::new(BinaryOperator::Divide);
    divide.add("Numeric", "Numeric", arithmetic::divide);
    table.insert(BinaryOperator::Divide, divide);

    let mut modulo = BinaryDescriptor::new(BinaryOperator::Modulo);
    modulo.add("Integer", "Integer", arithmetic::modulo);
    table.insert(BinaryOperator::Modulo, modulo);

    let mut left_shift = BinaryDescriptor::new(BinaryOperator::LeftShift);
    left_shift.add("Integer", "Integer", arithmetic::shift_left);
    left_shift.add("Array", "Any", arithmetic::array_append);
    table.insert(BinaryOperator::LeftShift, left_shift);

    let mut right_shift = BinaryDescriptor::new(BinaryOperator::RightShift);
    right_shift.add("Integer", "Integer", arithmetic::shift_right);
    table.insert(BinaryOperator::RightShift, right_shift);

    let mut equals = BinaryDescriptor::new(BinaryOperator::Equals);
    equals.add("String", "String", comparison::equals_strings);
    equals.add("Type", "Type", comparison::equals_types);
    equals.add("Any", "Any", comparison::equals_values);
    table.insert(BinaryOperator::Equals, equals);

    let mut not_equals = BinaryDescriptor::new(BinaryOperator::NotEquals);
    not_equals.add("String", "String", comparison::not_equals_strings);
    not_equals.add("Type", "Type", comparison::not_equals_types);
    not_equals.add("Any", "Any", comparison::not_equals_values);
    table.insert(BinaryOperator::NotEquals, not_equals);

    let mut less_than = BinaryDescriptor::new(BinaryOperator::LessThan);
    less_than.add("Numeric", "Numeric", comparison::less_than_numbers);
    less_than.add("String", "String", comparison::less_than_strings);
    less_than.add("Type", "Type", comparison::less_than_types);
    table.insert(BinaryOperator::LessThan, less_than);

    let mut less_equal = BinaryDescriptor::new(BinaryOperator::LessEqual);
    less_equal.add("Numeric", "Numeric", comparison::less_equal_numbers);
    less_equal.add("String", "String", comparison::less_equal_strings);
    less_equal.add("Type", "Type", comparison::less_equal_types);
    table.insert(BinaryOperator::LessEqual, less_equal);

    let mut greater_than = BinaryDescriptor::new(BinaryOperator::GreaterThan);
    greater_than.add("Numeric", "Numeric", comparison::greater_than_numbers);
    greater_than.add("String", "String", comparison::greater_than_strings);
    greater_than.add("Type", "Type", comparison::greater_than_types);
    table.insert(BinaryOperator::GreaterThan, greater_than);

    let mut greater_equal = BinaryDescriptor::new(BinaryOperator::GreaterEqual);
    greater_equal.add("Numeric", "Numeric", comparison::greater_equal_numbers);
    greater_equal.add("String", "String", comparison::greater_equal_strings);
    greater_equal.add("Type", "Type", comparison::greater_equal_types);
    table.insert(BinaryOperator::GreaterEqual, greater_equal);

    let mut is_in = BinaryDescriptor::new(BinaryOperator::In);
    is_in.add("String", "String", membership::string_in_string);
    is_in.add("Regexp", "String", membership::regex_in_string);
    is_in.add("Regexp", "Array", membership::regex_in_array);
    is_in.add("Regexp", "Hash", membership::regex_in_hash);
    is_in.add("Type", "Array", membership::type_in_array);
    is_in.add("Type", "Hash", membership::type_in_hash);
    is_in.add("Any", "Array", membership::value_in_array);
    is_in.add("Any", "Hash", membership::value_in_hash);
    is_in.add("Any", "Any", membership::never_in);
    table.insert(BinaryOperator::In, is_in);

    let mut matches = BinaryDescriptor::new(BinaryOperator::Match);
    matches.add("String", "String", matching::match_string_pattern);
    matches.add("String", "Regexp", matching::match_string_regex);
    matches.add("Any", "Type", matching::match_type);
    table.insert(BinaryOperator::Match, matches);

    let mut not_matches = BinaryDescriptor::new(BinaryOperator::NotMatch);
    not_matches.add("String", "String", matching::not_match_string_pattern);
    not_matches.add("String", "Regexp", matching::not_match_string_regex);
    not_matches.add("Any", "Type", matching::not_match_type);
    table.insert(BinaryOperator::NotMatch, not_matches);

    for operator in [
        BinaryOperator::Before,
        BinaryOperator::Notify,
        BinaryOperator::Require,
        BinaryOperator::Subscribe,
    ] {
        let mut descriptor = BinaryDescriptor::new(operator);
        descriptor.add("Any", "Any", relationships::relate);
        table.insert(operator, descriptor);
    }

    table
}

/// Build the unary operator tables.
pub(crate) fn create_unary_operators() -> HashMap<UnaryOperator, UnaryDescriptor> {
    let mut table = HashMap::new();

    let mut negate = UnaryDescriptor::new(UnaryOperator::Negate);
    negate.add("Numeric", unary::negate);
    table.insert(UnaryOperator::Negate, negate);

    let mut not = UnaryDescriptor::new(UnaryOperator::Not);
    not.add("Any", unary::logical_not);
    table.insert(UnaryOperator::Not, not);

    table
}
