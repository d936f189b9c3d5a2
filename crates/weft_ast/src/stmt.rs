//! Statements of the input tree.

use crate::expr::Expr;
use serde::{Deserialize, Serialize};
use std::fmt;
use weft_source::Span;

/// The assignment operator used on a storage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignMode {
    /// Signal update visible after the current cycle (`sig.next = v`).
    Next,
    /// Signal update that falls back to the default every cycle it is not
    /// assigned (`sig.push = v`).
    Push,
    /// Immediate variable update (`var.value = v`).
    Value,
}

impl fmt::Display for AssignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssignMode::Next => "NEXT",
            AssignMode::Push => "PUSH",
            AssignMode::Value => "VALUE",
        })
    }
}

/// A statement with its host location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    /// What the statement is.
    #[serde(flatten)]
    pub kind: StmtKind,
    /// Host location.
    #[serde(default)]
    pub span: Span,
}

/// Statement variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StmtKind {
    /// Binds names to a value. More than one name unpacks a sequence.
    Let {
        /// Bound names.
        names: Vec<String>,
        /// Bound value.
        value: Expr,
    },
    /// Assigns to a storage object, or to an index or slice of one.
    Assign {
        /// Target expression.
        target: Expr,
        /// Assignment operator.
        mode: AssignMode,
        /// Assigned value.
        value: Expr,
    },
    /// A conditional.
    If {
        /// Condition.
        cond: Expr,
        /// Taken when true.
        then_body: Vec<Stmt>,
        /// Taken when false.
        #[serde(default)]
        else_body: Vec<Stmt>,
    },
    /// A loop over a compile-time sequence.
    For {
        /// Loop names; more than one unpacks each element.
        targets: Vec<String>,
        /// Iterated value.
        iter: Expr,
        /// Loop body.
        body: Vec<Stmt>,
        /// Runs when the loop finishes without `break`.
        #[serde(default)]
        orelse: Vec<Stmt>,
    },
    /// A loop with a runtime guard.
    While {
        /// Guard.
        cond: Expr,
        /// Loop body.
        body: Vec<Stmt>,
    },
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// Suspends until a condition holds, or runs a coroutine.
    Await {
        /// A condition, or a call of an `async` function.
        target: Expr,
    },
    /// An assertion, checked at compile time when constant.
    Assert {
        /// Asserted condition.
        cond: Expr,
        /// Failure message.
        #[serde(default)]
        message: Option<String>,
    },
    /// An expression evaluated for its effects.
    Expr {
        /// The expression.
        expr: Expr,
    },
    /// Returns from the enclosing function.
    Return {
        /// Returned value.
        #[serde(default)]
        value: Option<Expr>,
    },
    /// Does nothing.
    Pass,
}

impl Stmt {
    /// Wraps a kind with a span.
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Sets the span.
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// `name = value`
    pub fn let_(name: impl Into<String>, value: Expr) -> Self {
        Self::new(
            StmtKind::Let {
                names: vec![name.into()],
                value,
            },
            Span::DUMMY,
        )
    }

    /// `a, b = value`
    pub fn let_many(names: Vec<&str>, value: Expr) -> Self {
        Self::new(
            StmtKind::Let {
                names: names.into_iter().map(String::from).collect(),
                value,
            },
            Span::DUMMY,
        )
    }

    /// An assignment with an explicit mode.
    pub fn assign(target: Expr, mode: AssignMode, value: Expr) -> Self {
        Self::new(
            StmtKind::Assign {
                target,
                mode,
                value,
            },
            Span::DUMMY,
        )
    }

    /// `name.next = value`
    pub fn next(name: &str, value: Expr) -> Self {
        Self::assign(Expr::name(name), AssignMode::Next, value)
    }

    /// `name.push = value`
    pub fn push(name: &str, value: Expr) -> Self {
        Self::assign(Expr::name(name), AssignMode::Push, value)
    }

    /// `name.value = value`
    pub fn value(name: &str, value: Expr) -> Self {
        Self::assign(Expr::name(name), AssignMode::Value, value)
    }

    /// `if cond: then_body else: else_body`
    pub fn if_(cond: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt>) -> Self {
        Self::new(
            StmtKind::If {
                cond,
                then_body,
                else_body,
            },
            Span::DUMMY,
        )
    }

    /// `for target in iter: body`
    pub fn for_(target: &str, iter: Expr, body: Vec<Stmt>) -> Self {
        Self::for_else(vec![target], iter, body, Vec::new())
    }

    /// `for targets in iter: body else: orelse`
    pub fn for_else(targets: Vec<&str>, iter: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>) -> Self {
        Self::new(
            StmtKind::For {
                targets: targets.into_iter().map(String::from).collect(),
                iter,
                body,
                orelse,
            },
            Span::DUMMY,
        )
    }

    /// `while cond: body`
    pub fn while_(cond: Expr, body: Vec<Stmt>) -> Self {
        Self::new(StmtKind::While { cond, body }, Span::DUMMY)
    }

    /// `break`
    pub fn break_() -> Self {
        Self::new(StmtKind::Break, Span::DUMMY)
    }

    /// `continue`
    pub fn continue_() -> Self {
        Self::new(StmtKind::Continue, Span::DUMMY)
    }

    /// `await target`
    pub fn await_(target: Expr) -> Self {
        Self::new(StmtKind::Await { target }, Span::DUMMY)
    }

    /// `assert cond, message`
    pub fn assert(cond: Expr, message: Option<&str>) -> Self {
        Self::new(
            StmtKind::Assert {
                cond,
                message: message.map(String::from),
            },
            Span::DUMMY,
        )
    }

    /// An expression statement.
    pub fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expr { expr }, Span::DUMMY)
    }

    /// `return value`
    pub fn return_(value: Option<Expr>) -> Self {
        Self::new(StmtKind::Return { value }, Span::DUMMY)
    }

    /// `pass`
    pub fn pass() -> Self {
        Self::new(StmtKind::Pass, Span::DUMMY)
    }

    /// Returns `true` if this statement or any nested one is a `while`,
    /// `await`, `break`, `continue` or `return`.
    pub fn has_control(&self) -> bool {
        match &self.kind {
            StmtKind::While { .. }
            | StmtKind::Await { .. }
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Return { .. } => true,
            StmtKind::If {
                then_body,
                else_body,
                ..
            } => then_body.iter().chain(else_body).any(Stmt::has_control),
            StmtKind::For { body, orelse, .. } => body.iter().chain(orelse).any(Stmt::has_control),
            _ => false,
        }
    }
}
