//! Lexical scopes stored in an arena.
//!
//! Scopes are pushed and popped in strict stack order. A child holds its
//! parent's [`ScopeId`], never a reference, so lookups walk ids up the chain.

use std::collections::HashMap;

use super::value::{ElementRef, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// What a name is bound to.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// Introduced by `let` or a loop variable.
    Variable(Value),
    /// Introduced by an element declaration; assignment writes element data.
    Element(ElementRef),
}

impl Binding {
    pub fn value(&self) -> Value {
        match self {
            Binding::Variable(v) => v.clone(),
            Binding::Element(r) => Value::Element(r.clone()),
        }
    }
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: HashMap<String, Binding>,
}

#[derive(Debug)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    /// Create an arena holding only the root scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                parent: None,
                bindings: HashMap::new(),
            }],
        }
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    /// Open a child scope of `parent`.
    pub fn push(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            bindings: HashMap::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    /// Discard `scope` and anything opened after it.
    pub fn pop(&mut self, scope: ScopeId) {
        if scope.0 > 0 {
            self.scopes.truncate(scope.0);
        }
    }

    /// Number of live scopes, root included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bind `name` in `scope`, shadowing any outer binding.
    pub fn declare(&mut self, scope: ScopeId, name: &str, binding: Binding) {
        if let Some(s) = self.scopes.get_mut(scope.0) {
            s.bindings.insert(name.to_string(), binding);
        }
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        let owner = self.owner_of(scope, name)?;
        self.scopes.get(owner.0)?.bindings.get(name)
    }

    /// Nearest scope, starting at `scope`, that binds `name`.
    pub fn owner_of(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = self.scopes.get(id.0)?;
            if s.bindings.contains_key(name) {
                return Some(id);
            }
            current = s.parent;
        }
        None
    }

    pub fn lookup_mut(&mut self, scope: ScopeId, name: &str) -> Option<&mut Binding> {
        let owner = self.owner_of(scope, name)?;
        self.scopes.get_mut(owner.0)?.bindings.get_mut(name)
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}
