//! Continuation-driven state synthesis.
//!
//! Every state starts either at a loop head or right after an `await`, and
//! is identified by that start point plus its continuation. Emitting a state
//! walks its statements until a suspension point, which becomes a `Goto` to
//! the state starting there. States are allocated on first reference and
//! filled breadth-first, so numbering follows discovery order.

use crate::continuation::{crossed, innermost_while, push, Cont, Frame, LoopRef, StateKey};
use std::collections::{HashMap, VecDeque};
use weft_diagnostics::{CompileError, CompileResult, ErrorKind};
use weft_ir::{ConstValue, Expr, StateGraph, StateId, StateStmt, Stmt};
use weft_source::Span;

/// Statements emitted per allowed state before synthesis gives up.
const NODES_PER_STATE: usize = 256;

enum Job<'b> {
    Head(LoopRef<'b>, Cont<'b>),
    Wait {
        cond: &'b Expr,
        span: Span,
        cont: Cont<'b>,
    },
}

struct Synth<'b> {
    graph: StateGraph,
    memo: HashMap<StateKey, StateId>,
    queue: VecDeque<(StateId, Job<'b>)>,
    root_span: Span,
    max_states: usize,
    nodes: usize,
}

/// Builds the state graph of a sequential context body.
///
/// `span` locates the context; it is attached to the initial state.
pub fn synthesize(body: &[Stmt], span: Span, max_states: usize) -> CompileResult<StateGraph> {
    let mut synth = Synth {
        graph: StateGraph::new(),
        memo: HashMap::new(),
        queue: VecDeque::new(),
        root_span: span,
        max_states,
        nodes: 0,
    };
    synth.head_state(LoopRef::Root(body), &[])?;

    while let Some((id, job)) = synth.queue.pop_front() {
        let body = match job {
            Job::Head(head, outer) => synth.emit_head(head, &outer)?,
            Job::Wait { cond, span, cont } => synth.emit_wait(id, cond, span, &cont)?,
        };
        log::trace!("{id}: {} statement(s)", body.len());
        synth.graph.states[id].body = body;
    }
    Ok(synth.graph)
}

impl<'b> Synth<'b> {
    fn tick(&mut self, span: Span) -> CompileResult<()> {
        self.nodes += 1;
        if self.nodes > self.max_states.saturating_mul(NODES_PER_STATE) {
            return Err(CompileError::new(
                ErrorKind::UnboundedDuplication,
                "state machine code grows without bound",
                span,
            )
            .with_note("every path through a branch containing `break`, `continue` or `await` duplicates the code after it"));
        }
        Ok(())
    }

    /// The state headed by `head`, entered with the loop's outer
    /// continuation.
    fn head_state(&mut self, head: LoopRef<'b>, outer: &[Frame<'b>]) -> CompileResult<StateId> {
        let outer = crossed(outer);
        let key = StateKey::head(&head, &outer);
        let (label, span) = match head {
            LoopRef::Root(_) => ("entry", self.root_span),
            LoopRef::While { span, .. } => ("while", span),
        };
        self.state(key, label, span, || Job::Head(head, outer))
    }

    fn wait_state(
        &mut self,
        stmt: &'b Stmt,
        cond: &'b Expr,
        span: Span,
        cont: &[Frame<'b>],
    ) -> CompileResult<StateId> {
        let cont = crossed(cont);
        let key = StateKey::wait(stmt, &cont);
        self.state(key, "await", span, || Job::Wait { cond, span, cont })
    }

    fn state(
        &mut self,
        key: StateKey,
        label: &str,
        span: Span,
        job: impl FnOnce() -> Job<'b>,
    ) -> CompileResult<StateId> {
        if let Some(&id) = self.memo.get(&key) {
            return Ok(id);
        }
        if self.graph.len() >= self.max_states {
            return Err(CompileError::unsupported(
                format!("state machine needs more than {} states", self.max_states),
                span,
            )
            .with_note("raise `compile.max_states` in weft.toml to allow larger machines"));
        }
        let id = self.graph.add_state(label, span);
        self.memo.insert(key, id);
        self.queue.push_back((id, job()));
        log::debug!("discovered {id} ({label})");
        Ok(id)
    }

    /// Emits `stmts` followed by the continuation `k`.
    fn emit(&mut self, stmts: &'b [Stmt], k: &[Frame<'b>]) -> CompileResult<Vec<StateStmt>> {
        let mut out = Vec::new();
        for (i, stmt) in stmts.iter().enumerate() {
            self.tick(stmt.span())?;
            if !stmt.has_control() {
                plain(stmt, &mut out);
                continue;
            }
            let rest = push(k, Frame::Seq(&stmts[i + 1..]));
            match stmt {
                Stmt::If {
                    cond,
                    then_body,
                    else_body,
                    span,
                } => {
                    let then_body = self.emit(then_body, &rest)?;
                    let else_body = self.emit(else_body, &rest)?;
                    out.push(StateStmt::If {
                        cond: cond.clone(),
                        then_body,
                        else_body,
                        span: *span,
                    });
                }
                Stmt::Coroutine { body, .. } => out.extend(self.emit(body, &rest)?),
                Stmt::Await { cond, span } => {
                    let next = self.wait_state(stmt, cond, *span, &rest)?;
                    out.push(StateStmt::Goto(next));
                }
                Stmt::While { cond, body, span } => {
                    let head = LoopRef::While {
                        stmt,
                        cond,
                        body,
                        span: *span,
                    };
                    let next = self.head_state(head, &rest)?;
                    out.push(StateStmt::Goto(next));
                }
                Stmt::Break { span } => {
                    let j = innermost_while(k).ok_or_else(|| outside_loop("break", *span))?;
                    out.extend(self.emit_cont(&k[..j])?);
                }
                Stmt::Continue { span } => {
                    let j = innermost_while(k).ok_or_else(|| outside_loop("continue", *span))?;
                    match &k[j] {
                        Frame::Loop {
                            head,
                            crossed: true,
                        } => out.extend(self.emit_head(*head, &k[..j])?),
                        _ => return Err(continue_without_transition(*span, &k[j])),
                    }
                }
                Stmt::Assign { .. } | Stmt::Temp { .. } | Stmt::Assert { .. } => {
                    plain(stmt, &mut out);
                    continue;
                }
            }
            return Ok(out);
        }
        out.extend(self.emit_cont(k)?);
        Ok(out)
    }

    /// Emits what runs once the innermost frame of `k` is exhausted.
    fn emit_cont(&mut self, k: &[Frame<'b>]) -> CompileResult<Vec<StateStmt>> {
        match k.split_last() {
            None => Ok(Vec::new()),
            Some((Frame::Seq(rest), outer)) => self.emit(rest, outer),
            Some((Frame::Loop { head, .. }, outer)) => {
                let target = self.head_state(*head, outer)?;
                Ok(vec![StateStmt::Goto(target)])
            }
        }
    }

    /// Emits a loop head: the guard, the body on true and the code after the
    /// loop on false.
    fn emit_head(&mut self, head: LoopRef<'b>, outer: &[Frame<'b>]) -> CompileResult<Vec<StateStmt>> {
        let inner = push(
            outer,
            Frame::Loop {
                head,
                crossed: false,
            },
        );
        match head {
            LoopRef::Root(body) => self.emit(body, &inner),
            LoopRef::While {
                cond, body, span, ..
            } => match cond.as_const().map(ConstValue::truthy) {
                Some(true) => self.emit(body, &inner),
                Some(false) => self.emit_cont(outer),
                None => Ok(vec![StateStmt::If {
                    cond: cond.clone(),
                    then_body: self.emit(body, &inner)?,
                    else_body: self.emit_cont(outer)?,
                    span,
                }]),
            },
        }
    }

    /// Emits a wait state: proceed when `cond` holds, otherwise stay.
    fn emit_wait(
        &mut self,
        id: StateId,
        cond: &Expr,
        span: Span,
        cont: &[Frame<'b>],
    ) -> CompileResult<Vec<StateStmt>> {
        let stay = vec![StateStmt::Goto(id)];
        match cond.as_const().map(ConstValue::truthy) {
            Some(true) => self.emit_cont(cont),
            Some(false) => Ok(stay),
            None => Ok(vec![StateStmt::If {
                cond: cond.clone(),
                then_body: self.emit_cont(cont)?,
                else_body: stay,
                span,
            }]),
        }
    }
}

/// Copies a statement without control flow.
fn plain(stmt: &Stmt, out: &mut Vec<StateStmt>) {
    match stmt {
        Stmt::Assign {
            target,
            value,
            mode,
            span,
        } => out.push(StateStmt::Assign {
            target: target.clone(),
            value: value.clone(),
            mode: *mode,
            span: *span,
        }),
        Stmt::Temp { id, span } => out.push(StateStmt::Temp {
            id: *id,
            span: *span,
        }),
        Stmt::Assert {
            cond,
            message,
            span,
        } => out.push(StateStmt::Assert {
            cond: cond.clone(),
            message: message.clone(),
            span: *span,
        }),
        Stmt::If {
            cond,
            then_body,
            else_body,
            span,
        } => {
            let mut then_out = Vec::new();
            let mut else_out = Vec::new();
            then_body.iter().for_each(|s| plain(s, &mut then_out));
            else_body.iter().for_each(|s| plain(s, &mut else_out));
            out.push(StateStmt::If {
                cond: cond.clone(),
                then_body: then_out,
                else_body: else_out,
                span: *span,
            });
        }
        Stmt::Coroutine { body, .. } => body.iter().for_each(|s| plain(s, out)),
        Stmt::While { .. } | Stmt::Await { .. } | Stmt::Break { .. } | Stmt::Continue { .. } => {}
    }
}

fn outside_loop(what: &str, span: Span) -> CompileError {
    CompileError::unsupported(format!("`{what}` outside a suspending loop"), span)
}

fn continue_without_transition(span: Span, frame: &Frame<'_>) -> CompileError {
    let err = CompileError::new(
        ErrorKind::UnboundedDuplication,
        "`continue` reaches the loop head without a state transition",
        span,
    )
    .with_note("add an `await` between the loop head and the `continue`");
    match frame {
        Frame::Loop {
            head: LoopRef::While { span: head, .. },
            ..
        } => err.with_related(*head, "loop head"),
        _ => err,
    }
}
