// mantle-core - Resource catalog
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The resource catalog the evaluator compiles into.
//!
//! Resources are kept in declaration order in an insertion-ordered index so
//! duplicate declarations are caught at insertion. Relationship edges are
//! recorded as they are evaluated; their endpoints may be declared later in
//! the manifest, so [`Catalog::finalize`] verifies that every edge resolves
//! once evaluation is complete.

use indexmap::IndexMap;
use mantle_ast::Position;
use tracing::debug;

use crate::error::{Error, Result};
use crate::values::{ResourceReference, Value};

/// The relationship kinds the chaining operators install.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationshipKind {
    /// Source is applied before target.
    Before,
    /// Source is applied before target, notifying it of changes.
    Notify,
    /// Source requires target to be applied first.
    Require,
    /// Source subscribes to changes in target.
    Subscribe,
}

impl RelationshipKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            RelationshipKind::Before => "before",
            RelationshipKind::Notify => "notify",
            RelationshipKind::Require => "require",
            RelationshipKind::Subscribe => "subscribe",
        }
    }
}

/// A resource in the catalog.
#[derive(Debug)]
pub struct Resource {
    reference: ResourceReference,
    parameters: IndexMap<String, Value>,
    position: Position,
}

impl Resource {
    #[must_use]
    pub fn reference(&self) -> &ResourceReference {
        &self.reference
    }

    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// The declared parameters in declaration order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.parameters.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }
}

/// A relationship edge between two resources.
#[derive(Debug)]
pub struct Edge {
    pub source: ResourceReference,
    pub target: ResourceReference,
    pub kind: RelationshipKind,
    pub position: Position,
}

/// The catalog sink.
#[derive(Debug, Default)]
pub struct Catalog {
    resources: IndexMap<ResourceReference, Resource>,
    edges: Vec<Edge>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Catalog::default()
    }

    /// Add a resource; a second declaration of the same reference is an
    /// error naming the original declaration site.
    pub fn add_resource(
        &mut self,
        reference: ResourceReference,
        parameters: IndexMap<String, Value>,
        position: Position,
    ) -> Result<&Resource> {
        if let Some(existing) = self.resources.get(&reference) {
            return Err(Error::catalog(format!(
                "resource {reference} is already declared at {}",
                existing.position
            )));
        }
        debug!(resource = %reference, "adding resource to catalog");
        let resource = Resource {
            reference: reference.clone(),
            parameters,
            position,
        };
        Ok(self.resources.entry(reference).or_insert(resource))
    }

    /// Record a relationship edge. Endpoints are verified by `finalize`.
    pub fn add_edge(
        &mut self,
        source: ResourceReference,
        target: ResourceReference,
        kind: RelationshipKind,
        position: Position,
    ) {
        debug!(source = %source, target = %target, kind = kind.name(), "adding edge");
        self.edges.push(Edge {
            source,
            target,
            kind,
            position,
        });
    }

    /// Look up a resource by reference.
    #[must_use]
    pub fn find(&self, reference: &ResourceReference) -> Option<&Resource> {
        self.resources.get(reference)
    }

    /// The resources in declaration order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    /// The recorded edges in evaluation order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Verify that every edge endpoint names a declared resource.
    pub fn finalize(&self) -> Result<()> {
        for edge in &self.edges {
            for endpoint in [&edge.source, &edge.target] {
                if !self.resources.contains_key(endpoint) {
                    return Err(Error::catalog(format!(
                        "cannot form a {} relationship: resource {endpoint} is not declared",
                        edge.kind.name()
                    )));
                }
            }
        }
        Ok(())
    }
}
