//! Continuations: what runs after the statement being synthesized.
//!
//! A continuation is a stack of frames, innermost last. `Seq` frames hold the
//! statements left in an enclosing block; `Loop` frames mark the body of a
//! loop whose end jumps back to the loop head. The context body itself is
//! the outermost loop, an implicit `while True` headed by the initial state.

use weft_ir::{Expr, Stmt};
use weft_source::Span;

/// A loop whose head a continuation may return to.
#[derive(Debug, Clone, Copy)]
pub enum LoopRef<'b> {
    /// The context body.
    Root(&'b [Stmt]),
    /// A suspending `while`.
    While {
        /// The `while` statement itself.
        stmt: &'b Stmt,
        /// Guard.
        cond: &'b Expr,
        /// Body.
        body: &'b [Stmt],
        /// Host location.
        span: Span,
    },
}

impl LoopRef<'_> {
    fn key(&self) -> LoopKey {
        match self {
            LoopRef::Root(body) => LoopKey::Root(body.as_ptr() as usize),
            LoopRef::While { stmt, .. } => LoopKey::While(*stmt as *const Stmt as usize),
        }
    }
}

/// One level of a continuation.
#[derive(Debug, Clone)]
pub enum Frame<'b> {
    /// Statements left in an enclosing block.
    Seq(&'b [Stmt]),
    /// Inside a loop body.
    Loop {
        /// The loop.
        head: LoopRef<'b>,
        /// A state boundary lies between the loop head and this point.
        crossed: bool,
    },
}

/// A continuation, innermost frame last.
pub type Cont<'b> = Vec<Frame<'b>>;

/// Returns `k` with `frame` pushed.
pub fn push<'b>(k: &[Frame<'b>], frame: Frame<'b>) -> Cont<'b> {
    let mut next = k.to_vec();
    next.push(frame);
    next
}

/// Marks every loop of `k` as crossed. Applied when a continuation starts a
/// new state.
pub fn crossed<'b>(k: &[Frame<'b>]) -> Cont<'b> {
    k.iter()
        .map(|f| match f {
            Frame::Loop { head, .. } => Frame::Loop {
                head: *head,
                crossed: true,
            },
            seq => seq.clone(),
        })
        .collect()
}

/// Index of the innermost `while` frame.
pub fn innermost_while(k: &[Frame<'_>]) -> Option<usize> {
    k.iter().rposition(|f| {
        matches!(
            f,
            Frame::Loop {
                head: LoopRef::While { .. },
                ..
            }
        )
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LoopKey {
    Root(usize),
    While(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum FrameKey {
    Seq(usize, usize),
    Loop(LoopKey, bool),
}

/// Identity of a state: the code it starts with and its continuation.
/// Statements are compared by address; the body is not mutated during
/// synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    start: StartKey,
    cont: Vec<FrameKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum StartKey {
    Head(LoopKey),
    Await(usize),
}

impl StateKey {
    /// Key of the head state of `head` continuing with `k`.
    pub fn head(head: &LoopRef<'_>, k: &[Frame<'_>]) -> Self {
        Self {
            start: StartKey::Head(head.key()),
            cont: cont_key(k),
        }
    }

    /// Key of the wait state of the `await` statement `stmt`.
    pub fn wait(stmt: &Stmt, k: &[Frame<'_>]) -> Self {
        Self {
            start: StartKey::Await(stmt as *const Stmt as usize),
            cont: cont_key(k),
        }
    }
}

fn cont_key(k: &[Frame<'_>]) -> Vec<FrameKey> {
    k.iter()
        .map(|f| match f {
            Frame::Seq(rest) => FrameKey::Seq(rest.as_ptr() as usize, rest.len()),
            Frame::Loop { head, crossed } => FrameKey::Loop(head.key(), *crossed),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn while_stmt() -> Stmt {
        Stmt::While {
            cond: Expr::bool(true),
            body: vec![],
            span: Span::DUMMY,
        }
    }

    fn head(stmt: &Stmt) -> LoopRef<'_> {
        let Stmt::While { cond, body, span } = stmt else {
            panic!("expected while");
        };
        LoopRef::While {
            stmt,
            cond,
            body,
            span: *span,
        }
    }

    #[test]
    fn crossed_marks_every_loop() {
        let body = vec![while_stmt()];
        let k = vec![
            Frame::Loop {
                head: LoopRef::Root(&body),
                crossed: false,
            },
            Frame::Seq(&body[1..]),
        ];
        let c = crossed(&k);
        assert!(matches!(c[0], Frame::Loop { crossed: true, .. }));
        assert!(matches!(c[1], Frame::Seq(_)));
    }

    #[test]
    fn innermost_while_skips_root() {
        let body = vec![while_stmt()];
        let root_only = vec![Frame::Loop {
            head: LoopRef::Root(&body),
            crossed: false,
        }];
        assert_eq!(innermost_while(&root_only), None);
        let nested = push(
            &root_only,
            Frame::Loop {
                head: head(&body[0]),
                crossed: false,
            },
        );
        assert_eq!(innermost_while(&nested), Some(1));
    }

    #[test]
    fn root_and_first_while_keys_differ() {
        // The root body and its first statement share an address.
        let body = vec![while_stmt()];
        let root = StateKey::head(&LoopRef::Root(&body), &[]);
        let first = StateKey::head(&head(&body[0]), &[]);
        assert_ne!(root, first);
    }

    #[test]
    fn keys_depend_on_continuation() {
        let body = vec![while_stmt()];
        let w = head(&body[0]);
        let a = StateKey::head(&w, &[]);
        let b = StateKey::head(&w, &[Frame::Seq(&body[..])]);
        assert_ne!(a, b);
        assert_eq!(a, StateKey::head(&w, &[]));
    }
}
