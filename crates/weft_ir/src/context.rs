//! Contexts, the units of translation.

use crate::arena::Arena;
use crate::expr::Expr;
use crate::ids::{ContextId, ObjectId, TempId};
use crate::state::StateGraph;
use crate::stmt::Stmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use weft_common::{Frequency, Ident};
use weft_source::Span;

/// Active clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// Rising edge.
    #[default]
    Rising,
    /// Falling edge.
    Falling,
}

/// Clock of a sequential context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clock {
    /// Clock signal.
    pub signal: ObjectId,
    /// Active edge.
    pub edge: Edge,
    /// Nominal frequency, carried through as metadata.
    #[serde(default)]
    pub frequency: Option<Frequency>,
}

/// Reset of a sequential context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reset {
    /// Reset signal.
    pub signal: ObjectId,
    /// Asserted when high.
    pub active_high: bool,
    /// Acts outside the clock edge.
    pub asynchronous: bool,
}

/// Concurrent or sequential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextKind {
    /// Unconditional signal-driving statements.
    Concurrent,
    /// A clocked process.
    Sequential {
        /// Clock.
        clock: Option<Clock>,
        /// Reset.
        reset: Option<Reset>,
    },
}

/// An immutable value computed from storage objects and bound to a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temporary {
    /// Name the value was bound to, unique within its context.
    pub name: Ident,
    /// Defining expression.
    pub value: Expr,
    /// Definition site.
    pub span: Span,
}

/// A normalized context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// This context's ID.
    pub id: ContextId,
    /// Context name.
    pub name: Ident,
    /// Concurrent or sequential.
    pub kind: ContextKind,
    /// Normalized body. Empty if the context failed.
    pub body: Vec<Stmt>,
    /// Temporaries defined by the body.
    pub temps: Arena<TempId, Temporary>,
    /// Objects assigned by the body.
    pub driven: BTreeSet<ObjectId>,
    /// State graph, once synthesized.
    pub fsm: Option<StateGraph>,
    /// Set when compiling this context reported an error.
    pub failed: bool,
    /// Declaration site.
    pub span: Span,
}

impl Context {
    /// Creates an empty context.
    pub fn new(id: ContextId, name: Ident, kind: ContextKind, span: Span) -> Self {
        Self {
            id,
            name,
            kind,
            body: Vec::new(),
            temps: Arena::new(),
            driven: BTreeSet::new(),
            fsm: None,
            failed: false,
            span,
        }
    }

    /// Returns `true` for sequential contexts.
    pub fn is_sequential(&self) -> bool {
        matches!(self.kind, ContextKind::Sequential { .. })
    }

    /// Returns the clock of a sequential context.
    pub fn clock(&self) -> Option<&Clock> {
        match &self.kind {
            ContextKind::Sequential { clock, .. } => clock.as_ref(),
            ContextKind::Concurrent => None,
        }
    }

    /// Returns the reset of a sequential context.
    pub fn reset(&self) -> Option<&Reset> {
        match &self.kind {
            ContextKind::Sequential { reset, .. } => reset.as_ref(),
            ContextKind::Concurrent => None,
        }
    }

    /// Marks the context failed and drops its output.
    pub fn fail(&mut self) {
        self.failed = true;
        self.body.clear();
        self.temps = Arena::new();
        self.driven.clear();
        self.fsm = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::AssignMode;
    use crate::stmt::Target;

    #[test]
    fn fail_clears_output() {
        let mut ctx = Context::new(
            ContextId::from_raw(0),
            Ident::from_raw(0),
            ContextKind::Concurrent,
            Span::DUMMY,
        );
        ctx.body.push(Stmt::Assign {
            target: Target::whole(ObjectId::from_raw(0)),
            value: Expr::bool(true),
            mode: AssignMode::Next,
            span: Span::DUMMY,
        });
        ctx.driven.insert(ObjectId::from_raw(0));
        ctx.fail();
        assert!(ctx.failed);
        assert!(ctx.body.is_empty());
        assert!(ctx.driven.is_empty());
    }

    #[test]
    fn clock_accessors() {
        let ctx = Context::new(
            ContextId::from_raw(1),
            Ident::from_raw(0),
            ContextKind::Sequential {
                clock: Some(Clock {
                    signal: ObjectId::from_raw(3),
                    edge: Edge::Falling,
                    frequency: None,
                }),
                reset: None,
            },
            Span::DUMMY,
        );
        assert!(ctx.is_sequential());
        assert_eq!(ctx.clock().map(|c| c.edge), Some(Edge::Falling));
        assert!(ctx.reset().is_none());
    }
}
