// mantle-core - Declaration registry
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The registry of user declarations harvested from syntax trees: classes,
//! defined types, node definitions, and type aliases.
//!
//! Entries hold a shared handle to the owning syntax tree plus the index of
//! the defining statement, so the tree stays alive for as long as the
//! registry references it. Class and defined type names are case-folded to
//! lowercase; alias names keep their capitalized spelling.
//!
//! Re-registering any name is an error, except for node definitions where
//! the previous definition is returned for the caller to report with both
//! source locations.

use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use mantle_ast::{
    ClassStatement, DefinedTypeStatement, Hostname, NodeStatement, Statement, SyntaxTree,
    TypeAliasStatement,
};

use crate::error::{Error, Result};
use crate::values::ValueRegex;

static CLASS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(::[a-z][a-z0-9_]*)*$").expect("class name pattern is valid")
});

static MODULE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("module name pattern is valid"));

static ALIAS_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][A-Za-z0-9_]*(::[A-Z][A-Za-z0-9_]*)*$")
        .expect("type alias name pattern is valid")
});

/// True when the name is a valid (lowercased) class or defined type name.
#[must_use]
pub fn is_valid_class_name(name: &str) -> bool {
    CLASS_NAME.is_match(name)
}

/// True when the name is a valid module name.
#[must_use]
pub fn is_valid_module_name(name: &str) -> bool {
    MODULE_NAME.is_match(name)
}

/// True when the name is a valid type alias name.
#[must_use]
pub fn is_valid_alias_name(name: &str) -> bool {
    ALIAS_NAME.is_match(name)
}

/// A registered class definition.
#[derive(Clone, Debug)]
pub struct ClassDefinition {
    name: String,
    tree: Rc<SyntaxTree>,
    index: usize,
}

impl ClassDefinition {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn tree(&self) -> &Rc<SyntaxTree> {
        &self.tree
    }

    /// The defining statement.
    #[must_use]
    pub fn statement(&self) -> &ClassStatement {
        match &self.tree.statements[self.index] {
            Statement::Class(statement) => statement,
            _ => unreachable!("registered statement index points at a class"),
        }
    }
}

/// A registered defined type.
#[derive(Clone, Debug)]
pub struct DefinedTypeDefinition {
    name: String,
    tree: Rc<SyntaxTree>,
    index: usize,
}

impl DefinedTypeDefinition {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn tree(&self) -> &Rc<SyntaxTree> {
        &self.tree
    }

    #[must_use]
    pub fn statement(&self) -> &DefinedTypeStatement {
        match &self.tree.statements[self.index] {
            Statement::DefinedType(statement) => statement,
            _ => unreachable!("registered statement index points at a defined type"),
        }
    }
}

/// A registered node definition.
#[derive(Clone, Debug)]
pub struct NodeDefinition {
    tree: Rc<SyntaxTree>,
    index: usize,
}

impl NodeDefinition {
    #[must_use]
    pub fn tree(&self) -> &Rc<SyntaxTree> {
        &self.tree
    }

    #[must_use]
    pub fn statement(&self) -> &NodeStatement {
        match &self.tree.statements[self.index] {
            Statement::Node(statement) => statement,
            _ => unreachable!("registered statement index points at a node"),
        }
    }
}

/// A registered type alias.
#[derive(Clone, Debug)]
pub struct TypeAliasDefinition {
    name: String,
    tree: Rc<SyntaxTree>,
    index: usize,
}

impl TypeAliasDefinition {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn tree(&self) -> &Rc<SyntaxTree> {
        &self.tree
    }

    #[must_use]
    pub fn statement(&self) -> &TypeAliasStatement {
        match &self.tree.statements[self.index] {
            Statement::TypeAlias(statement) => statement,
            _ => unreachable!("registered statement index points at a type alias"),
        }
    }
}

/// The compiler registry.
#[derive(Debug, Default)]
pub struct Registry {
    classes: HashMap<String, ClassDefinition>,
    defined_types: HashMap<String, DefinedTypeDefinition>,
    nodes: Vec<NodeDefinition>,
    named_nodes: HashMap<String, usize>,
    regex_nodes: Vec<(ValueRegex, usize)>,
    default_node_index: Option<usize>,
    aliases: HashMap<String, TypeAliasDefinition>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Registry::default()
    }

    /// Find a class by fully-qualified name (lowercased).
    #[must_use]
    pub fn find_class(&self, name: &str) -> Option<&ClassDefinition> {
        self.classes.get(&name.to_lowercase())
    }

    /// Register the class defined at `index` within the tree.
    pub fn register_class(&mut self, tree: &Rc<SyntaxTree>, index: usize) -> Result<()> {
        let statement = match &tree.statements[index] {
            Statement::Class(statement) => statement,
            _ => return Err(Error::internal("statement index does not name a class")),
        };
        let name = statement.name.to_lowercase();
        if !is_valid_class_name(&name) {
            return Err(Error::declaration(format!(
                "'{}' is not a valid class name",
                statement.name
            )));
        }
        if self.classes.contains_key(&name) {
            return Err(Error::declaration(format!(
                "class '{name}' is already defined"
            )));
        }
        debug!(class = %name, "registering class");
        self.classes.insert(
            name.clone(),
            ClassDefinition {
                name,
                tree: Rc::clone(tree),
                index,
            },
        );
        Ok(())
    }

    /// Find a defined type by fully-qualified name (lowercased).
    #[must_use]
    pub fn find_defined_type(&self, name: &str) -> Option<&DefinedTypeDefinition> {
        self.defined_types.get(&name.to_lowercase())
    }

    /// Register the defined type at `index` within the tree.
    pub fn register_defined_type(&mut self, tree: &Rc<SyntaxTree>, index: usize) -> Result<()> {
        let statement = match &tree.statements[index] {
            Statement::DefinedType(statement) => statement,
            _ => {
                return Err(Error::internal(
                    "statement index does not name a defined type",
                ))
            }
        };
        let name = statement.name.to_lowercase();
        if !is_valid_class_name(&name) {
            return Err(Error::declaration(format!(
                "'{}' is not a valid defined type name",
                statement.name
            )));
        }
        if self.defined_types.contains_key(&name) {
            return Err(Error::declaration(format!(
                "defined type '{name}' is already defined"
            )));
        }
        debug!(defined_type = %name, "registering defined type");
        self.defined_types.insert(
            name.clone(),
            DefinedTypeDefinition {
                name,
                tree: Rc::clone(tree),
                index,
            },
        );
        Ok(())
    }

    /// Register the node definition at `index` within the tree.
    ///
    /// Returns the previous definition when one of the hostnames (or the
    /// default marker) is already taken; the caller reports the conflict.
    pub fn register_node(
        &mut self,
        tree: &Rc<SyntaxTree>,
        index: usize,
    ) -> Result<Option<&NodeDefinition>> {
        let statement = match &tree.statements[index] {
            Statement::Node(statement) => statement,
            _ => return Err(Error::internal("statement index does not name a node")),
        };

        // Check for conflicts before mutating anything.
        let mut conflict = None;
        for hostname in &statement.hostnames {
            match hostname {
                Hostname::Literal(name) => {
                    if let Some(&existing) = self.named_nodes.get(&name.to_lowercase()) {
                        conflict = Some(existing);
                    }
                }
                Hostname::Regex(_) => {}
                Hostname::Default => {
                    if let Some(existing) = self.default_node_index {
                        conflict = Some(existing);
                    }
                }
            }
        }
        if let Some(existing) = conflict {
            return Ok(Some(&self.nodes[existing]));
        }

        let node_index = self.nodes.len();
        for hostname in &statement.hostnames {
            match hostname {
                Hostname::Literal(name) => {
                    self.named_nodes.insert(name.to_lowercase(), node_index);
                }
                Hostname::Regex(pattern) => {
                    let regex = ValueRegex::new(pattern).map_err(|e| {
                        Error::declaration(format!("invalid node pattern /{pattern}/: {e}"))
                    })?;
                    self.regex_nodes.push((regex, node_index));
                }
                Hostname::Default => {
                    self.default_node_index = Some(node_index);
                }
            }
        }
        debug!(index = node_index, "registering node definition");
        self.nodes.push(NodeDefinition {
            tree: Rc::clone(tree),
            index,
        });
        Ok(None)
    }

    /// True when any node definitions are registered.
    #[must_use]
    pub fn has_nodes(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Find the node definition matching a hostname: literal names first,
    /// then regex patterns in registration order, then the default node.
    #[must_use]
    pub fn find_node(&self, hostname: &str) -> Option<&NodeDefinition> {
        if let Some(&index) = self.named_nodes.get(&hostname.to_lowercase()) {
            return Some(&self.nodes[index]);
        }
        for (regex, index) in &self.regex_nodes {
            if regex.regex().is_match(hostname) {
                return Some(&self.nodes[*index]);
            }
        }
        self.default_node_index.map(|index| &self.nodes[index])
    }

    /// Find a type alias by name.
    #[must_use]
    pub fn find_type_alias(&self, name: &str) -> Option<&TypeAliasDefinition> {
        self.aliases.get(name)
    }

    /// Register the type alias at `index` within the tree.
    pub fn register_type_alias(&mut self, tree: &Rc<SyntaxTree>, index: usize) -> Result<()> {
        let statement = match &tree.statements[index] {
            Statement::TypeAlias(statement) => statement,
            _ => {
                return Err(Error::internal(
                    "statement index does not name a type alias",
                ))
            }
        };
        if !is_valid_alias_name(&statement.name) {
            return Err(Error::declaration(format!(
                "'{}' is not a valid type alias name",
                statement.name
            )));
        }
        if self.aliases.contains_key(&statement.name) {
            return Err(Error::declaration(format!(
                "type alias '{}' is already defined",
                statement.name
            )));
        }
        debug!(alias = %statement.name, "registering type alias");
        self.aliases.insert(
            statement.name.clone(),
            TypeAliasDefinition {
                name: statement.name.clone(),
                tree: Rc::clone(tree),
                index,
            },
        );
        Ok(())
    }
}
