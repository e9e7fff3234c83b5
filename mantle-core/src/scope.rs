// mantle-core - Variable scopes
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Lexical scopes for variable bindings.
//!
//! Scopes form a chain through parent references. Variables are written
//! once: a second `set` of the same name fails and the evaluator reports
//! the error. On top of a scope's own bindings sits a stack of ephemeral
//! frames of two kinds: parameter frames, pushed per lambda invocation so
//! block-local bindings are released when the call returns, and match
//! frames holding the match variables (`$0`, `$1`, ...) produced by `=~`
//! and regex case options. Frames are pushed and popped around the
//! construct that introduces them, on every exit path.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::values::Value;

/// A scope in the variable binding chain.
#[derive(Clone, Debug)]
pub struct Scope {
    inner: Rc<RefCell<ScopeInner>>,
}

#[derive(Debug)]
struct ScopeInner {
    variables: HashMap<String, Value>,
    ephemeral: Vec<EphemeralFrame>,
    parent: Option<Scope>,
}

#[derive(Debug)]
struct EphemeralFrame {
    variables: HashMap<String, Value>,
    kind: FrameKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    /// Lambda parameters and block-local bindings.
    Parameters,
    /// Match variables.
    Matches,
}

impl Scope {
    /// Create a root scope with no parent.
    #[must_use]
    pub fn new() -> Self {
        Scope {
            inner: Rc::new(RefCell::new(ScopeInner {
                variables: HashMap::new(),
                ephemeral: Vec::new(),
                parent: None,
            })),
        }
    }

    /// Create a child scope with this scope as parent.
    #[must_use]
    pub fn child(&self) -> Self {
        Scope {
            inner: Rc::new(RefCell::new(ScopeInner {
                variables: HashMap::new(),
                ephemeral: Vec::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    /// True when the two handles refer to the same scope.
    #[must_use]
    pub fn ptr_eq(&self, other: &Scope) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Look up a variable, searching ephemeral frames innermost first, then
    /// this scope's bindings, then the parent chain.
    ///
    /// Match variables (all-digit names) never cross a scope boundary.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let inner = self.inner.borrow();
        for frame in inner.ephemeral.iter().rev() {
            if let Some(value) = frame.variables.get(name) {
                return Some(value.clone());
            }
        }
        if is_match_name(name) {
            return None;
        }
        if let Some(value) = inner.variables.get(name) {
            return Some(value.clone());
        }
        inner.parent.as_ref().and_then(|p| p.lookup(name))
    }

    /// Bind a variable. Bindings land in the innermost parameter frame when
    /// one is active (block-local), otherwise in the scope itself. Returns
    /// false without rebinding when the name is already bound there.
    pub fn set(&self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        let mut inner = self.inner.borrow_mut();
        if let Some(frame) = inner
            .ephemeral
            .iter_mut()
            .rev()
            .find(|f| f.kind == FrameKind::Parameters)
        {
            if frame.variables.contains_key(&name) {
                return false;
            }
            frame.variables.insert(name, value);
            return true;
        }
        if inner.variables.contains_key(&name) {
            return false;
        }
        inner.variables.insert(name, value);
        true
    }

    /// Push a parameter frame for a lambda invocation; the returned guard
    /// pops it when dropped, so the frame is released on every exit path
    /// including errors.
    #[must_use]
    pub fn parameter_frame(&self) -> EphemeralGuard {
        self.push(FrameKind::Parameters)
    }

    /// Push a match frame scoping match variables to a construct such as a
    /// case proposition.
    #[must_use]
    pub fn match_frame(&self) -> EphemeralGuard {
        self.push(FrameKind::Matches)
    }

    fn push(&self, kind: FrameKind) -> EphemeralGuard {
        self.inner.borrow_mut().ephemeral.push(EphemeralFrame {
            variables: HashMap::new(),
            kind,
        });
        EphemeralGuard {
            scope: self.clone(),
        }
    }

    /// Store match variables (`$0`, `$1`, ...) into the innermost match
    /// frame, replacing any previous match data there. Without an active
    /// match frame a persistent one is created, so a later successful match
    /// in the same scope overwrites the variables.
    ///
    /// Unmatched capture groups are left unset so they read as undef.
    pub fn set_match_variables(&self, captures: &[Option<String>]) {
        let mut inner = self.inner.borrow_mut();
        if !inner
            .ephemeral
            .iter()
            .any(|f| f.kind == FrameKind::Matches)
        {
            inner.ephemeral.push(EphemeralFrame {
                variables: HashMap::new(),
                kind: FrameKind::Matches,
            });
        }
        let frame = inner
            .ephemeral
            .iter_mut()
            .rev()
            .find(|f| f.kind == FrameKind::Matches)
            .expect("a match frame exists");
        frame.variables.retain(|name, _| !is_match_name(name));
        for (i, capture) in captures.iter().enumerate() {
            if let Some(text) = capture {
                frame
                    .variables
                    .insert(i.to_string(), Value::string(text.as_str()));
            }
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::new()
    }
}

/// Pops the ephemeral frame pushed by [`Scope::parameter_frame`] or
/// [`Scope::match_frame`] on drop.
pub struct EphemeralGuard {
    scope: Scope,
}

impl Drop for EphemeralGuard {
    fn drop(&mut self) {
        self.scope.inner.borrow_mut().ephemeral.pop();
    }
}

/// True for match variable names: `0`, `1`, ...
#[must_use]
pub fn is_match_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variables_are_written_once() {
        let scope = Scope::new();
        assert!(scope.set("x", Value::Integer(1)));
        assert!(!scope.set("x", Value::Integer(2)));
        assert_eq!(scope.lookup("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn child_scopes_shadow_parents() {
        let parent = Scope::new();
        parent.set("x", Value::Integer(1));
        let child = parent.child();
        assert_eq!(child.lookup("x"), Some(Value::Integer(1)));
        child.set("x", Value::Integer(2));
        assert_eq!(child.lookup("x"), Some(Value::Integer(2)));
        assert_eq!(parent.lookup("x"), Some(Value::Integer(1)));
    }

    #[test]
    fn parameter_frames_pop_on_drop() {
        let scope = Scope::new();
        {
            let _guard = scope.parameter_frame();
            scope.set("p", Value::Integer(3));
            assert_eq!(scope.lookup("p"), Some(Value::Integer(3)));
        }
        assert_eq!(scope.lookup("p"), None);
    }

    #[test]
    fn bindings_outside_frames_persist() {
        let scope = Scope::new();
        {
            let _guard = scope.match_frame();
            scope.set_match_variables(&[Some("m".into())]);
            // A regular assignment during an active match frame still lands
            // in the scope itself.
            assert!(scope.set("y", Value::Integer(1)));
        }
        assert_eq!(scope.lookup("y"), Some(Value::Integer(1)));
        assert_eq!(scope.lookup("0"), None);
    }

    #[test]
    fn match_variables_stay_local_to_the_scope() {
        let parent = Scope::new();
        let _guard = parent.match_frame();
        parent.set_match_variables(&[Some("all".into()), None, Some("two".into())]);
        assert_eq!(parent.lookup("0"), Some(Value::string("all")));
        assert_eq!(parent.lookup("1"), None);
        assert_eq!(parent.lookup("2"), Some(Value::string("two")));

        let child = parent.child();
        assert_eq!(child.lookup("0"), None);
    }
}
