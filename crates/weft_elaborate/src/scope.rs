//! Lexical scopes and the single-binding rule.

use crate::value::Value;
use std::collections::HashMap;
use weft_diagnostics::{CompileError, CompileResult};
use weft_source::Span;

/// Index of a scope in [`Scopes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

/// What opened a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Top-level bindings.
    Global,
    /// A context body.
    Context,
    /// An inlined function body. Constructor-like functions may rebind.
    Function {
        /// Rebinding permitted.
        constructor: bool,
    },
    /// One iteration of an unrolled loop or comprehension.
    Iteration,
    /// One branch of a runtime conditional or a suspending loop body.
    Branch,
}

#[derive(Debug)]
struct Binding {
    value: Value,
    span: Span,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    parent: Option<ScopeId>,
    bindings: HashMap<String, Binding>,
}

/// All scopes of one elaboration. Scopes are never freed; IDs stay valid.
#[derive(Debug)]
pub struct Scopes {
    scopes: Vec<Scope>,
}

impl Scopes {
    /// The global scope, created with the arena.
    pub const GLOBAL: ScopeId = ScopeId(0);

    /// Creates the arena with an empty global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::Global,
                parent: None,
                bindings: HashMap::new(),
            }],
        }
    }

    /// Opens a scope nested in `parent`.
    pub fn child(&mut self, parent: ScopeId, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            bindings: HashMap::new(),
        });
        id
    }

    /// Binds `name` in `scope`.
    ///
    /// A second binding of the same name in the same scope is a
    /// [`Redefinition`](weft_diagnostics::ErrorKind::Redefinition), except in
    /// constructor-like function scopes.
    pub fn define(&mut self, scope: ScopeId, name: &str, value: Value, span: Span) -> CompileResult<()> {
        let s = &mut self.scopes[scope.0];
        if let Some(existing) = s.bindings.get(name) {
            if s.kind != (ScopeKind::Function { constructor: true }) {
                return Err(CompileError::redefinition(name, span, existing.span));
            }
        }
        s.bindings.insert(name.to_string(), Binding { value, span });
        Ok(())
    }

    /// Finds `name` in `scope` or its ancestors.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Value> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.0];
            if let Some(b) = s.bindings.get(name) {
                return Some(&b.value);
            }
            current = s.parent;
        }
        None
    }

    /// Kind of a scope.
    pub fn kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope.0].kind
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_diagnostics::ErrorKind;

    #[test]
    fn lookup_walks_parents() {
        let mut scopes = Scopes::new();
        scopes.define(Scopes::GLOBAL, "WIDTH", Value::int(8), Span::DUMMY).unwrap();
        let ctx = scopes.child(Scopes::GLOBAL, ScopeKind::Context);
        assert_eq!(scopes.lookup(ctx, "WIDTH"), Some(&Value::int(8)));
        assert!(scopes.lookup(ctx, "missing").is_none());
    }

    #[test]
    fn rebinding_same_scope_fails() {
        let mut scopes = Scopes::new();
        let ctx = scopes.child(Scopes::GLOBAL, ScopeKind::Context);
        scopes.define(ctx, "x", Value::int(1), Span::at(1, 1)).unwrap();
        let err = scopes.define(ctx, "x", Value::int(2), Span::at(2, 1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Redefinition);
        assert_eq!(err.related[0].0, Span::at(1, 1));
    }

    #[test]
    fn shadowing_in_child_is_allowed() {
        let mut scopes = Scopes::new();
        scopes.define(Scopes::GLOBAL, "i", Value::int(0), Span::DUMMY).unwrap();
        let it = scopes.child(Scopes::GLOBAL, ScopeKind::Iteration);
        scopes.define(it, "i", Value::int(1), Span::DUMMY).unwrap();
        assert_eq!(scopes.lookup(it, "i"), Some(&Value::int(1)));
        assert_eq!(scopes.kind(it), ScopeKind::Iteration);
    }

    #[test]
    fn constructor_scope_allows_rebinding() {
        let mut scopes = Scopes::new();
        let f = scopes.child(Scopes::GLOBAL, ScopeKind::Function { constructor: true });
        scopes.define(f, "acc", Value::int(0), Span::DUMMY).unwrap();
        scopes.define(f, "acc", Value::int(1), Span::DUMMY).unwrap();
        assert_eq!(scopes.lookup(f, "acc"), Some(&Value::int(1)));
    }
}
