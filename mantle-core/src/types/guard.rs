// mantle-core - Recursion guard for type queries
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Per-query recursion guard for traversing cyclic alias graphs.
//!
//! Both `is_instance` and `is_assignable` resolve aliases as they recurse.
//! Alias graphs may be cyclic (`type Foo = Array[Foo]`), so each query
//! carries a guard holding the set of (alias, other operand) pairs already
//! being evaluated. Re-entering a visited pair returns true: assignability
//! is assumed to hold until contradicted elsewhere in the traversal.

use std::collections::HashSet;

use crate::types::AliasType;

/// Scratch state for one type query; create on the stack per query.
#[derive(Debug, Default)]
pub struct RecursionGuard {
    seen: HashSet<(usize, usize)>,
}

impl RecursionGuard {
    #[must_use]
    pub fn new() -> Self {
        RecursionGuard::default()
    }

    /// Record that the alias is being evaluated against the operand at the
    /// given address. Returns true when this pair was already entered, in
    /// which case the caller must not recurse again.
    pub fn enter(&mut self, alias: &AliasType, other: *const ()) -> bool {
        !self.seen.insert((alias.guard_key(), other as usize))
    }
}
