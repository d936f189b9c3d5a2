//! Normalized statements.
//!
//! This is the runtime residue of a context after the normalizer ran: only
//! runtime conditions, suspending loops and awaits are left as control flow.

use crate::expr::Expr;
use crate::ids::{ObjectId, TempId};
use crate::object::AssignMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use weft_common::Ident;
use weft_source::Span;

/// Part of an object selected by an assignment target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Select {
    /// A single bit.
    Bit(Expr),
    /// Bits `start` (inclusive) to `stop` (exclusive).
    Range {
        /// Lowest bit.
        start: u32,
        /// One past the highest bit.
        stop: u32,
    },
}

/// Left-hand side of an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Assigned object.
    pub object: ObjectId,
    /// Assigned part, or the whole object.
    #[serde(default)]
    pub select: Option<Select>,
}

impl Target {
    /// The whole object.
    pub fn whole(object: ObjectId) -> Self {
        Self {
            object,
            select: None,
        }
    }
}

/// A normalized statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    /// Assigns a storage object.
    Assign {
        /// Target.
        target: Target,
        /// Value.
        value: Expr,
        /// Operator.
        mode: AssignMode,
        /// Host location.
        span: Span,
    },
    /// Defines a temporary from its stored expression.
    Temp {
        /// The temporary.
        id: TempId,
        /// Host location.
        span: Span,
    },
    /// A runtime conditional.
    If {
        /// Condition.
        cond: Expr,
        /// Taken when true.
        then_body: Vec<Stmt>,
        /// Taken when false.
        else_body: Vec<Stmt>,
        /// Host location.
        span: Span,
    },
    /// A suspending loop.
    While {
        /// Guard.
        cond: Expr,
        /// Body.
        body: Vec<Stmt>,
        /// Host location.
        span: Span,
    },
    /// Leaves the innermost suspending loop.
    Break {
        /// Host location.
        span: Span,
    },
    /// Restarts the innermost suspending loop.
    Continue {
        /// Host location.
        span: Span,
    },
    /// Waits for `cond`, at least one cycle.
    Await {
        /// Awaited condition.
        cond: Expr,
        /// Host location.
        span: Span,
    },
    /// An awaited coroutine, already inlined.
    Coroutine {
        /// Called function.
        name: Ident,
        /// Inlined body.
        body: Vec<Stmt>,
        /// Host location.
        span: Span,
    },
    /// A runtime assertion.
    Assert {
        /// Asserted condition.
        cond: Expr,
        /// Failure message.
        message: Option<String>,
        /// Host location.
        span: Span,
    },
}

impl Stmt {
    /// Host location.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Assign { span, .. }
            | Stmt::Temp { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Await { span, .. }
            | Stmt::Coroutine { span, .. }
            | Stmt::Assert { span, .. } => *span,
        }
    }

    /// Returns `true` if this statement or a nested one suspends or jumps.
    pub fn has_control(&self) -> bool {
        match self {
            Stmt::While { .. }
            | Stmt::Await { .. }
            | Stmt::Break { .. }
            | Stmt::Continue { .. } => true,
            Stmt::Coroutine { body, .. } => body.iter().any(Stmt::has_control),
            Stmt::If {
                then_body,
                else_body,
                ..
            } => then_body.iter().chain(else_body).any(Stmt::has_control),
            Stmt::Assign { .. } | Stmt::Temp { .. } | Stmt::Assert { .. } => false,
        }
    }

    /// Returns `true` if this statement or a nested one is a suspension
    /// point (`await` or `while`).
    pub fn has_suspension(&self) -> bool {
        match self {
            Stmt::While { .. } | Stmt::Await { .. } => true,
            Stmt::Coroutine { body, .. } => body.iter().any(Stmt::has_suspension),
            Stmt::If {
                then_body,
                else_body,
                ..
            } => then_body.iter().chain(else_body).any(Stmt::has_suspension),
            _ => false,
        }
    }

    /// Adds every object assigned here to `out`.
    pub fn collect_driven(&self, out: &mut BTreeSet<ObjectId>) {
        match self {
            Stmt::Assign { target, .. } => {
                out.insert(target.object);
            }
            Stmt::If {
                then_body,
                else_body,
                ..
            } => {
                for s in then_body.iter().chain(else_body) {
                    s.collect_driven(out);
                }
            }
            Stmt::While { body, .. } | Stmt::Coroutine { body, .. } => {
                for s in body {
                    s.collect_driven(out);
                }
            }
            _ => {}
        }
    }

    /// Adds every object read here to `out`. Assignment targets count only
    /// through their bit index.
    pub fn collect_reads(&self, out: &mut BTreeSet<ObjectId>) {
        match self {
            Stmt::Assign { target, value, .. } => {
                if let Some(Select::Bit(index)) = &target.select {
                    index.collect_objects(out);
                }
                value.collect_objects(out);
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                cond.collect_objects(out);
                for s in then_body.iter().chain(else_body) {
                    s.collect_reads(out);
                }
            }
            Stmt::While { cond, body, .. } => {
                cond.collect_objects(out);
                for s in body {
                    s.collect_reads(out);
                }
            }
            Stmt::Coroutine { body, .. } => {
                for s in body {
                    s.collect_reads(out);
                }
            }
            Stmt::Await { cond, .. } | Stmt::Assert { cond, .. } => cond.collect_objects(out),
            Stmt::Temp { .. } | Stmt::Break { .. } | Stmt::Continue { .. } => {}
        }
    }

    /// Rewrites every expression read by this statement. Assignment targets
    /// are left alone.
    pub fn rewrite_reads(&mut self, f: &mut impl FnMut(&Expr) -> Option<Expr>) {
        match self {
            Stmt::Assign { target, value, .. } => {
                if let Some(Select::Bit(index)) = &mut target.select {
                    *index = index.map_leaves(f);
                }
                *value = value.map_leaves(f);
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                *cond = cond.map_leaves(f);
                for s in then_body.iter_mut().chain(else_body.iter_mut()) {
                    s.rewrite_reads(f);
                }
            }
            Stmt::While { cond, body, .. } => {
                *cond = cond.map_leaves(f);
                for s in body {
                    s.rewrite_reads(f);
                }
            }
            Stmt::Coroutine { body, .. } => {
                for s in body {
                    s.rewrite_reads(f);
                }
            }
            Stmt::Await { cond, .. } | Stmt::Assert { cond, .. } => *cond = cond.map_leaves(f),
            Stmt::Temp { .. } | Stmt::Break { .. } | Stmt::Continue { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign(obj: u32) -> Stmt {
        Stmt::Assign {
            target: Target::whole(ObjectId::from_raw(obj)),
            value: Expr::bool(true),
            mode: AssignMode::Next,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn control_detection() {
        let plain = Stmt::If {
            cond: Expr::Object(ObjectId::from_raw(0)),
            then_body: vec![assign(1)],
            else_body: vec![],
            span: Span::DUMMY,
        };
        assert!(!plain.has_control());
        let nested = Stmt::If {
            cond: Expr::Object(ObjectId::from_raw(0)),
            then_body: vec![Stmt::Break { span: Span::DUMMY }],
            else_body: vec![],
            span: Span::DUMMY,
        };
        assert!(nested.has_control());
        assert!(!nested.has_suspension());
    }

    #[test]
    fn coroutine_suspends_only_through_body() {
        let empty = Stmt::Coroutine {
            name: Ident::from_raw(0),
            body: vec![assign(0)],
            span: Span::DUMMY,
        };
        assert!(!empty.has_suspension());
        let waiting = Stmt::Coroutine {
            name: Ident::from_raw(0),
            body: vec![Stmt::Await {
                cond: Expr::bool(true),
                span: Span::DUMMY,
            }],
            span: Span::DUMMY,
        };
        assert!(waiting.has_suspension());
    }

    #[test]
    fn driven_set() {
        let s = Stmt::While {
            cond: Expr::bool(true),
            body: vec![assign(2), assign(3)],
            span: Span::DUMMY,
        };
        let mut out = BTreeSet::new();
        s.collect_driven(&mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn reads_exclude_targets() {
        let s = Stmt::Assign {
            target: Target {
                object: ObjectId::from_raw(1),
                select: Some(Select::Bit(Expr::Object(ObjectId::from_raw(2)))),
            },
            value: Expr::Object(ObjectId::from_raw(3)),
            mode: AssignMode::Next,
            span: Span::DUMMY,
        };
        let mut out = BTreeSet::new();
        s.collect_reads(&mut out);
        assert_eq!(
            out.into_iter().collect::<Vec<_>>(),
            vec![ObjectId::from_raw(2), ObjectId::from_raw(3)]
        );
    }

    #[test]
    fn rewrite_reads_skips_targets() {
        let mut s = Stmt::Assign {
            target: Target::whole(ObjectId::from_raw(1)),
            value: Expr::Object(ObjectId::from_raw(1)),
            mode: AssignMode::Next,
            span: Span::DUMMY,
        };
        s.rewrite_reads(&mut |e| match e {
            Expr::Object(id) if id.as_raw() == 1 => Some(Expr::Object(ObjectId::from_raw(7))),
            _ => None,
        });
        let Stmt::Assign { target, value, .. } = s else {
            panic!("expected assign");
        };
        assert_eq!(target.object.as_raw(), 1);
        assert_eq!(value, Expr::Object(ObjectId::from_raw(7)));
    }
}
