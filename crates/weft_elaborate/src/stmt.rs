//! Statement normalization.
//!
//! Runs a statement list at compile time and emits the runtime residue:
//! constant branches and `for` loops disappear, runtime conditions become
//! [`Stmt::If`], `while` loops and awaits are kept for the state-machine
//! synthesizer.
//!
//! A `for` loop whose body is a single `if` ending in `break` is a
//! first-match search. It is expanded into an `if`/`else` chain instead of
//! a sequence of guarded blocks so that a runtime condition needs no
//! `break` at runtime.

use crate::context::{Elaborator, Flow, LoopFrame, LoopKind};
use crate::errors;
use crate::scope::{ScopeId, ScopeKind};
use crate::value::{FunctionRef, ItemsError, Value};
use weft_ast::{ExprKind, StmtKind};
use weft_diagnostics::{CompileError, CompileResult};
use weft_ir::{AssignMode, Expr, Select, Stmt, Target};
use weft_source::Span;

/// The parts of a first-match loop body: the condition and the statements
/// run before the `break`.
struct FirstMatch<'s> {
    cond: &'s weft_ast::Expr,
    then: &'s [weft_ast::Stmt],
}

fn first_match(body: &[weft_ast::Stmt]) -> Option<FirstMatch<'_>> {
    let [stmt] = body else {
        return None;
    };
    let StmtKind::If {
        cond,
        then_body,
        else_body,
    } = &stmt.kind
    else {
        return None;
    };
    match then_body.split_last() {
        Some((last, rest)) if else_body.is_empty() && matches!(last.kind, StmtKind::Break) => {
            Some(FirstMatch { cond, then: rest })
        }
        _ => None,
    }
}

fn ir_mode(mode: weft_ast::AssignMode) -> AssignMode {
    match mode {
        weft_ast::AssignMode::Next => AssignMode::Next,
        weft_ast::AssignMode::Push => AssignMode::Push,
        weft_ast::AssignMode::Value => AssignMode::Value,
    }
}

impl<'a> Elaborator<'a> {
    /// Runs `body` in `scope`, stopping at the first statement that leaves
    /// the block.
    pub fn exec_block(&mut self, body: &[weft_ast::Stmt], scope: ScopeId, out: &mut Vec<Stmt>) -> CompileResult<Flow> {
        for stmt in body {
            let flow = self.exec(stmt, scope, out)?;
            if flow != Flow::Normal {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    /// Runs one statement.
    pub fn exec(&mut self, stmt: &weft_ast::Stmt, scope: ScopeId, out: &mut Vec<Stmt>) -> CompileResult<Flow> {
        let span = stmt.span;
        match &stmt.kind {
            StmtKind::Let { names, value } => {
                self.exec_let(names, value, scope, out, span)?;
                Ok(Flow::Normal)
            }
            StmtKind::Assign { target, mode, value } => {
                let target = self.assign_target(target, scope, out)?;
                let value = self.eval(value, scope, out)?.expect_expr(span)?;
                let mode = ir_mode(*mode);
                self.check_assignment(target.object, mode, span)?;
                out.push(Stmt::Assign {
                    target,
                    value,
                    mode,
                    span,
                });
                Ok(Flow::Normal)
            }
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => {
                let c = self.eval(cond, scope, out)?;
                if let Some(taken) = c.truthiness() {
                    let body = if taken { then_body } else { else_body };
                    return self.exec_block(body, scope, out);
                }
                let cond = c.expect_expr(span)?;
                if !self.is_sequential() {
                    return Err(errors::runtime_branch(span));
                }
                let (then_out, else_out) = self.in_runtime(|this| -> CompileResult<_> {
                    let mut then_out = Vec::new();
                    let s = this.scopes.child(scope, ScopeKind::Branch);
                    this.exec_block(then_body, s, &mut then_out)?;
                    let mut else_out = Vec::new();
                    let s = this.scopes.child(scope, ScopeKind::Branch);
                    this.exec_block(else_body, s, &mut else_out)?;
                    Ok((then_out, else_out))
                })?;
                out.push(Stmt::If {
                    cond,
                    then_body: then_out,
                    else_body: else_out,
                    span,
                });
                Ok(Flow::Normal)
            }
            StmtKind::For {
                targets,
                iter,
                body,
                orelse,
            } => self.exec_for(targets, iter, body, orelse, scope, out, span),
            StmtKind::While { cond, body } => {
                self.require_sequential("while", span)?;
                if cond.contains_call() {
                    return Err(CompileError::unsupported(
                        "a `while` condition cannot call functions",
                        cond.span,
                    ));
                }
                let c = self.eval(cond, scope, out)?;
                let cond = match c.truthiness() {
                    Some(false) => return Ok(Flow::Normal),
                    Some(true) => Expr::bool(true),
                    None => c.expect_expr(span)?,
                };
                let mut body_out = Vec::new();
                self.in_runtime(|this| {
                    this.frame.loops.push(LoopFrame {
                        kind: LoopKind::Suspending,
                        runtime_depth: this.frame.runtime_depth,
                    });
                    let s = this.scopes.child(scope, ScopeKind::Branch);
                    let result = this.exec_block(body, s, &mut body_out);
                    this.frame.loops.pop();
                    result
                })?;
                out.push(Stmt::While {
                    cond,
                    body: body_out,
                    span,
                });
                Ok(Flow::Normal)
            }
            StmtKind::Break | StmtKind::Continue => {
                let is_break = matches!(stmt.kind, StmtKind::Break);
                let word = if is_break { "break" } else { "continue" };
                let Some(lp) = self.frame.loops.last().copied() else {
                    return Err(CompileError::unsupported(format!("`{word}` outside a loop"), span));
                };
                match lp.kind {
                    LoopKind::Unrolled if self.frame.runtime_depth > lp.runtime_depth => {
                        Err(CompileError::unsupported(
                            format!("`{word}` under a runtime condition cannot leave an unrolled `for` loop"),
                            span,
                        )
                        .with_note("use a `while` loop for runtime iteration"))
                    }
                    LoopKind::Unrolled => Ok(if is_break { Flow::Break } else { Flow::Continue }),
                    LoopKind::Suspending => {
                        out.push(if is_break {
                            Stmt::Break { span }
                        } else {
                            Stmt::Continue { span }
                        });
                        Ok(Flow::Jumped)
                    }
                }
            }
            StmtKind::Await { target } => {
                self.require_sequential("await", span)?;
                if let ExprKind::Call { func, args } = &target.kind {
                    if let Value::Function(FunctionRef::User(index)) = self.eval(func, scope, out)? {
                        if self.source.functions[index].is_async {
                            let args = self.eval_args(args, scope, out, span)?;
                            let coroutine = self.inline_coroutine(index, args, span)?;
                            out.push(coroutine);
                            return Ok(Flow::Normal);
                        }
                    }
                }
                let v = self.eval(target, scope, out)?;
                let cond = match v.truthiness() {
                    Some(true) => Expr::bool(true),
                    Some(false) => {
                        let mut warning = errors::never_resumes(span);
                        if let Some(name) = self.context_name() {
                            warning = warning.in_context(name);
                        }
                        self.sink.emit(warning);
                        Expr::bool(false)
                    }
                    None => v.expect_expr(span)?,
                };
                out.push(Stmt::Await { cond, span });
                Ok(Flow::Normal)
            }
            StmtKind::Assert { cond, message } => {
                let v = self.eval(cond, scope, out)?;
                match v.truthiness() {
                    Some(true) => Ok(Flow::Normal),
                    Some(false) => Err(errors::assertion_failed(message.as_deref(), span)),
                    None => {
                        let cond = v.expect_expr(span)?;
                        if self.cx.is_none() {
                            return Err(errors::not_constant("a global assertion", span));
                        }
                        out.push(Stmt::Assert {
                            cond,
                            message: message.clone(),
                            span,
                        });
                        Ok(Flow::Normal)
                    }
                }
            }
            StmtKind::Expr { expr } => {
                self.eval(expr, scope, out)?;
                Ok(Flow::Normal)
            }
            StmtKind::Return { value } => {
                if self.frame.function.is_none() {
                    return Err(CompileError::unsupported("`return` outside a function", span));
                }
                if self.frame.runtime_depth > 0 {
                    return Err(CompileError::unsupported(
                        "`return` under a runtime condition or loop",
                        span,
                    ));
                }
                let value = match value {
                    Some(v) => self.eval(v, scope, out)?,
                    None => Value::none(),
                };
                Ok(Flow::Return(value))
            }
            StmtKind::Pass => Ok(Flow::Normal),
        }
    }

    fn exec_let(
        &mut self,
        names: &[String],
        value: &weft_ast::Expr,
        scope: ScopeId,
        out: &mut Vec<Stmt>,
        span: Span,
    ) -> CompileResult<()> {
        // `x = Signal(...)` names the object after the binding.
        if let (
            [name],
            ExprKind::Declare {
                class,
                ty,
                default,
                name: None,
            },
        ) = (names, &value.kind)
        {
            let v = self.eval_declare(*class, *ty, default.as_deref(), Some(name), scope, out, value.span)?;
            return self.scopes.define(scope, name, v, span);
        }

        let v = self.eval(value, scope, out)?;
        if let [name] = names {
            let v = self.materialize(name, v, span, out)?;
            return self.scopes.define(scope, name, v, span);
        }
        let parts = match v.items(names.len()) {
            Ok(parts) if parts.len() == names.len() => parts,
            _ => {
                return Err(CompileError::unsupported(
                    format!("cannot unpack a {} into {} names", v.kind_name(), names.len()),
                    span,
                ))
            }
        };
        for (name, part) in names.iter().zip(parts) {
            let part = self.materialize(name, part, span, out)?;
            self.scopes.define(scope, name, part, span)?;
        }
        Ok(())
    }

    /// Binds unnamed runtime expressions to temporaries.
    fn materialize(&mut self, name: &str, v: Value, span: Span, out: &mut Vec<Stmt>) -> CompileResult<Value> {
        match v {
            Value::Runtime(e) => self.make_temp(name, e, span, out),
            other => Ok(other),
        }
    }

    fn assign_target(&mut self, target: &weft_ast::Expr, scope: ScopeId, out: &mut Vec<Stmt>) -> CompileResult<Target> {
        let span = target.span;
        match &target.kind {
            ExprKind::Index { base, index } => {
                let object = self.target_object(base, scope, out)?;
                let i = self.eval(index, scope, out)?;
                if i.as_int().is_some_and(|i| i < 0) {
                    return Err(CompileError::unsupported("negative bit index", span));
                }
                Ok(Target {
                    object,
                    select: Some(Select::Bit(i.expect_expr(span)?)),
                })
            }
            ExprKind::Slice { base, start, stop } => {
                let object = self.target_object(base, scope, out)?;
                let (start, stop) =
                    self.bit_range(&Value::Object(object), start.as_deref(), stop.as_deref(), scope, out, span)?;
                Ok(Target {
                    object,
                    select: Some(Select::Range { start, stop }),
                })
            }
            _ => Ok(Target::whole(self.target_object(target, scope, out)?)),
        }
    }

    fn target_object(
        &mut self,
        expr: &weft_ast::Expr,
        scope: ScopeId,
        out: &mut Vec<Stmt>,
    ) -> CompileResult<weft_ir::ObjectId> {
        match self.eval(expr, scope, out)? {
            Value::Object(id) => Ok(id),
            Value::Temp(_) | Value::Runtime(_) => Err(CompileError::assignment_mode(
                "cannot assign to a temporary; only signals, ports and variables are assignable",
                expr.span,
            )),
            other => Err(CompileError::assignment_mode(
                format!("cannot assign to a {}", other.kind_name()),
                expr.span,
            )),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn exec_for(
        &mut self,
        targets: &[String],
        iter: &weft_ast::Expr,
        body: &[weft_ast::Stmt],
        orelse: &[weft_ast::Stmt],
        scope: ScopeId,
        out: &mut Vec<Stmt>,
        span: Span,
    ) -> CompileResult<Flow> {
        let iterable = self.eval(iter, scope, out)?;
        let limit = self.config.max_unroll;
        let items = iterable.items(limit).map_err(|err| match err {
            ItemsError::TooLong(count) => errors::too_many_iterations(count, limit, span),
            ItemsError::NotSequence => CompileError::unsupported(
                format!("a {} is not a compile-time iterable", iterable.kind_name()),
                iter.span,
            )
            .with_note("`for` loops are unrolled; use `while` for runtime iteration"),
        })?;

        if let Some(m) = first_match(body) {
            return self.first_match_chain(targets, &items, &m, orelse, scope, scope, out, span);
        }

        self.frame.loops.push(LoopFrame {
            kind: LoopKind::Unrolled,
            runtime_depth: self.frame.runtime_depth,
        });
        let result = self.unroll(targets, items, body, scope, out, span);
        self.frame.loops.pop();
        match result? {
            Flow::Break => Ok(Flow::Normal),
            Flow::Normal => self.exec_block(orelse, scope, out),
            other => Ok(other),
        }
    }

    /// Runs every iteration; returns [`Flow::Break`] if the loop was left
    /// early.
    fn unroll(
        &mut self,
        targets: &[String],
        items: Vec<Value>,
        body: &[weft_ast::Stmt],
        scope: ScopeId,
        out: &mut Vec<Stmt>,
        span: Span,
    ) -> CompileResult<Flow> {
        for item in items {
            let it = self.scopes.child(scope, ScopeKind::Iteration);
            self.bind_targets(it, targets, item, span)?;
            match self.exec_block(body, it, out)? {
                Flow::Normal | Flow::Continue => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    /// Expands a first-match loop over `items` into nested conditionals.
    /// Constant conditions are resolved here; the `else` of the innermost
    /// runtime test runs the loop's `else` clause.
    #[allow(clippy::too_many_arguments)]
    fn first_match_chain(
        &mut self,
        targets: &[String],
        items: &[Value],
        m: &FirstMatch<'_>,
        orelse: &[weft_ast::Stmt],
        scope: ScopeId,
        orelse_scope: ScopeId,
        out: &mut Vec<Stmt>,
        span: Span,
    ) -> CompileResult<Flow> {
        let Some((item, rest)) = items.split_first() else {
            return self.exec_block(orelse, orelse_scope, out);
        };
        let it = self.scopes.child(scope, ScopeKind::Iteration);
        self.bind_targets(it, targets, item.clone(), span)?;
        let c = self.eval(m.cond, it, out)?;
        match c.truthiness() {
            Some(true) => return self.match_body(m, it, out),
            Some(false) => {
                return self.first_match_chain(targets, rest, m, orelse, scope, orelse_scope, out, span)
            }
            None => {}
        }
        let cond = c.expect_expr(m.cond.span)?;
        if !self.is_sequential() {
            return Err(errors::runtime_branch(m.cond.span));
        }
        let (then_out, else_out) = self.in_runtime(|this| -> CompileResult<_> {
            let mut then_out = Vec::new();
            let s = this.scopes.child(it, ScopeKind::Branch);
            this.match_body(m, s, &mut then_out)?;
            let mut else_out = Vec::new();
            let orelse_scope = this.scopes.child(scope, ScopeKind::Branch);
            this.first_match_chain(targets, rest, m, orelse, scope, orelse_scope, &mut else_out, span)?;
            Ok((then_out, else_out))
        })?;
        out.push(Stmt::If {
            cond,
            then_body: then_out,
            else_body: else_out,
            span: m.cond.span,
        });
        Ok(Flow::Normal)
    }

    /// Runs the statements before the `break` of a matched element.
    fn match_body(&mut self, m: &FirstMatch<'_>, scope: ScopeId, out: &mut Vec<Stmt>) -> CompileResult<Flow> {
        self.frame.loops.push(LoopFrame {
            kind: LoopKind::Unrolled,
            runtime_depth: self.frame.runtime_depth,
        });
        let result = self.exec_block(m.then, scope, out);
        self.frame.loops.pop();
        match result? {
            Flow::Break | Flow::Normal => Ok(Flow::Normal),
            Flow::Continue => Err(CompileError::unsupported(
                "`continue` before the `break` of a first-match loop",
                m.cond.span,
            )),
            other => Ok(other),
        }
    }
}
