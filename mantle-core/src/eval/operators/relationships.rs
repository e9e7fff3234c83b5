// mantle-core - Relationship operators
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The relationship operators `->`, `~>`, `<-`, and `<~`.
//!
//! These do not compute a value: they install edges in the catalog between
//! the resources referenced on either side. Each operand may be a single
//! resource reference, a resource type value (`File['x']`, `Class['y']`),
//! or an array or iterator of references; the two reference sets are
//! cross-producted. The expression evaluates to its right operand so
//! chains associate.

use mantle_ast::{BinaryOperator, Position};

use crate::catalog::RelationshipKind;
use crate::error::{Error, Result};
use crate::eval::Evaluator;
use crate::types::{display_type, Type};
use crate::values::{ResourceReference, Value};

use super::BinaryCallContext;

pub(super) fn relate(context: &mut BinaryCallContext) -> Result<Value> {
    let kind = match context.operator() {
        BinaryOperator::Before => RelationshipKind::Before,
        BinaryOperator::Notify => RelationshipKind::Notify,
        BinaryOperator::Require => RelationshipKind::Require,
        BinaryOperator::Subscribe => RelationshipKind::Subscribe,
        other => {
            return Err(Error::internal(format!(
                "operator '{}' is not a relationship operator",
                other.symbol()
            )))
        }
    };

    let left = context.left().clone();
    let right = context.right().clone();
    let left_position = context.left_position();
    let right_position = context.right_position();
    let position = context.position();

    let mut sources = Vec::new();
    gather(context.evaluator, &left, left_position, &mut sources)?;
    let mut targets = Vec::new();
    gather(context.evaluator, &right, right_position, &mut targets)?;
    for source in &sources {
        for target in &targets {
            context
                .evaluator
                .catalog_mut()
                .add_edge(source.clone(), target.clone(), kind, position);
        }
    }
    Ok(right)
}

/// Collect the resource references an operand contributes.
fn gather(
    evaluator: &mut Evaluator,
    value: &Value,
    position: Position,
    references: &mut Vec<ResourceReference>,
) -> Result<()> {
    match value {
        Value::Resource(reference) => {
            references.push(reference.clone());
            Ok(())
        }
        Value::Type(ty) => match &**ty {
            Type::Resource {
                type_name: Some(name),
                title: Some(title),
            } => {
                references.push(ResourceReference::new(name, title.clone()));
                Ok(())
            }
            Type::Class(Some(name)) => {
                references.push(ResourceReference::new("class", name.to_lowercase()));
                Ok(())
            }
            _ => Err(Error::evaluation(format!(
                "the type {ty} does not reference a specific resource"
            ))
            .with_origin(evaluator.source_path(), position)),
        },
        Value::Array(items) => {
            for item in items {
                gather(evaluator, item, position, references)?;
            }
            Ok(())
        }
        Value::Iterator(_) => {
            let materialized = evaluator.materialize(value)?;
            gather(evaluator, &materialized, position, references)
        }
        other => Err(Error::evaluation(format!(
            "the value '{other}' ({}) is not a resource reference",
            display_type(other)
        ))
        .with_origin(evaluator.source_path(), position)),
    }
}
