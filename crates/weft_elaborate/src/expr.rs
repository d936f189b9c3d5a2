//! Expression evaluation.
//!
//! Every expression is evaluated at compile time as far as its operands
//! allow. Operands that are storage objects, temporaries or runtime
//! expressions turn the result into a [`Value::Runtime`] IR expression.

use crate::const_eval::{self, ir_binary, ir_unary};
use crate::context::Elaborator;
use crate::errors;
use crate::scope::{ScopeId, ScopeKind};
use crate::value::{Builtin, FunctionRef, ItemsError, Value};
use weft_ast::{BinaryOp, DeclClass, ExprKind, Literal, UnaryOp};
use weft_diagnostics::{CompileError, CompileResult};
use weft_ir::{ConstValue, Expr, Stmt};
use weft_source::Span;

impl<'a> Elaborator<'a> {
    /// Evaluates `expr` in `scope`. Statements produced by inlined calls and
    /// temporaries are appended to `out`.
    pub fn eval(&mut self, expr: &weft_ast::Expr, scope: ScopeId, out: &mut Vec<Stmt>) -> CompileResult<Value> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Name { id } => self.lookup(id, scope, span),
            ExprKind::Literal { value } => literal(value, span),
            ExprKind::Unary { op, operand } => {
                let v = self.eval(operand, scope, out)?;
                self.unary(*op, v, span)
            }
            ExprKind::Binary { op, lhs, rhs } if matches!(op, BinaryOp::And | BinaryOp::Or) => {
                let a = self.eval(lhs, scope, out)?;
                if let Some(truthy) = a.truthiness() {
                    // Host short-circuit: the result is one of the operands.
                    let taken_lhs = if *op == BinaryOp::And { !truthy } else { truthy };
                    return if taken_lhs { Ok(a) } else { self.eval(rhs, scope, out) };
                }
                let b = self.eval(rhs, scope, out)?;
                let lhs = a.expect_expr(span)?;
                let rhs = b.expect_expr(span)?;
                Ok(Value::Runtime(Expr::binary(ir_binary(*op), lhs, rhs)))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let a = self.eval(lhs, scope, out)?;
                let b = self.eval(rhs, scope, out)?;
                self.binary(*op, a, b, span)
            }
            ExprKind::Conditional { cond, then, otherwise } => {
                let c = self.eval(cond, scope, out)?;
                match c.truthiness() {
                    Some(true) => self.eval(then, scope, out),
                    Some(false) => self.eval(otherwise, scope, out),
                    None => {
                        let cond = c.expect_expr(span)?;
                        let then = self.eval(then, scope, out)?.expect_expr(span)?;
                        let otherwise = self.eval(otherwise, scope, out)?.expect_expr(span)?;
                        Ok(Value::Runtime(Expr::Select {
                            cond: Box::new(cond),
                            then: Box::new(then),
                            otherwise: Box::new(otherwise),
                        }))
                    }
                }
            }
            ExprKind::Call { func, args } => {
                let callee = self.eval(func, scope, out)?;
                let Value::Function(f) = callee else {
                    return Err(CompileError::unsupported(
                        format!("a {} is not callable", callee.kind_name()),
                        span,
                    ));
                };
                self.call(f, args, scope, out, span)
            }
            ExprKind::Index { base, index } => {
                let b = self.eval(base, scope, out)?;
                let i = self.eval(index, scope, out)?;
                if !b.is_runtime() {
                    return const_eval::index(&b, &i, span);
                }
                if i.as_int().is_some_and(|i| i < 0) {
                    return Err(CompileError::unsupported(
                        "negative bit index on a runtime value",
                        span,
                    ));
                }
                let base = b.expect_expr(span)?;
                let index = i.expect_expr(span)?;
                Ok(Value::Runtime(Expr::Index {
                    base: Box::new(base),
                    index: Box::new(index),
                }))
            }
            ExprKind::Slice { base, start, stop } => {
                let b = self.eval(base, scope, out)?;
                if b.is_runtime() {
                    let (start, stop) = self.bit_range(&b, start.as_deref(), stop.as_deref(), scope, out, span)?;
                    return Ok(Value::Runtime(Expr::Slice {
                        base: Box::new(b.expect_expr(span)?),
                        start,
                        stop,
                    }));
                }
                let start = self.optional_int(start.as_deref(), "a slice bound", scope, out)?;
                let stop = self.optional_int(stop.as_deref(), "a slice bound", scope, out)?;
                const_eval::slice(&b, start, stop, self.config.max_unroll, span)
            }
            ExprKind::Tuple { items } => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, scope, out)?);
                }
                Ok(Value::Tuple(values))
            }
            ExprKind::Dict { entries } => {
                let mut values: Vec<(ConstValue, Value)> = Vec::with_capacity(entries.len());
                for (k, v) in entries {
                    let key = match self.eval(k, scope, out)? {
                        Value::Const(c) => c,
                        _ => return Err(errors::not_constant("a dictionary key", k.span)),
                    };
                    let value = self.eval(v, scope, out)?;
                    match values.iter_mut().find(|(existing, _)| *existing == key) {
                        Some(slot) => slot.1 = value,
                        None => values.push((key, value)),
                    }
                }
                Ok(Value::Dict(values))
            }
            ExprKind::Concat { items } => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(self.eval(item, scope, out)?);
                }
                let constant: Option<String> = parts
                    .iter()
                    .map(|p| match p {
                        Value::Const(ConstValue::Bits(b)) => Some(b.as_str()),
                        _ => None,
                    })
                    .collect();
                if let Some(bits) = constant {
                    return Ok(Value::Const(ConstValue::Bits(bits)));
                }
                let exprs = parts
                    .iter()
                    .map(|p| p.expect_expr(span))
                    .collect::<CompileResult<Vec<_>>>()?;
                Ok(Value::Runtime(Expr::Concat(exprs)))
            }
            ExprKind::Comprehension {
                element,
                targets,
                iter,
                condition,
            } => {
                let iterable = self.eval(iter, scope, out)?;
                let limit = self.config.max_unroll;
                let items = iterable.items(limit).map_err(|err| match err {
                    ItemsError::TooLong(count) => errors::too_many_iterations(count, limit, span),
                    ItemsError::NotSequence => CompileError::unsupported(
                        format!("a {} is not a compile-time iterable", iterable.kind_name()),
                        iter.span,
                    ),
                })?;
                let mut produced = Vec::new();
                for item in items {
                    let it = self.scopes.child(scope, ScopeKind::Iteration);
                    self.bind_targets(it, targets, item, span)?;
                    if let Some(cond) = condition {
                        let keep = self.eval(cond, it, out)?;
                        match keep.truthiness() {
                            Some(false) => continue,
                            Some(true) => {}
                            None => return Err(errors::not_constant("a comprehension filter", cond.span)),
                        }
                    }
                    produced.push(self.eval(element, it, out)?);
                }
                Ok(Value::Tuple(produced))
            }
            ExprKind::Declare {
                class,
                ty,
                default,
                name,
            } => self.eval_declare(*class, *ty, default.as_deref(), name.as_deref(), scope, out, span),
        }
    }

    /// Evaluates a declaration, naming the object `name` unless the
    /// expression carries its own name.
    #[allow(clippy::too_many_arguments)]
    pub fn eval_declare(
        &mut self,
        class: DeclClass,
        ty: weft_ast::TypeSpec,
        default: Option<&weft_ast::Expr>,
        name: Option<&str>,
        scope: ScopeId,
        out: &mut Vec<Stmt>,
        span: Span,
    ) -> CompileResult<Value> {
        let default = match default {
            Some(d) => Some(self.eval(d, scope, out)?),
            None => None,
        };
        let fallback = match class {
            DeclClass::Signal => "sig",
            DeclClass::Variable => "var",
            DeclClass::Port(_) => "port",
        };
        self.declare(class, ty, default, name.unwrap_or(fallback), span)
    }

    fn lookup(&self, name: &str, scope: ScopeId, span: Span) -> CompileResult<Value> {
        if let Some(v) = self.scopes.lookup(scope, name) {
            return Ok(v.clone());
        }
        Builtin::lookup(name)
            .map(|b| Value::Function(FunctionRef::Builtin(b)))
            .ok_or_else(|| CompileError::unknown("name", name, span))
    }

    fn unary(&mut self, op: UnaryOp, v: Value, span: Span) -> CompileResult<Value> {
        if let Value::Const(c) = &v {
            return const_eval::unary(op, c, span).map(Value::Const);
        }
        if v.is_runtime() {
            let operand = v.expect_expr(span)?;
            return Ok(Value::Runtime(Expr::unary(ir_unary(op), operand)));
        }
        match (op, v.truthiness()) {
            (UnaryOp::Not, Some(t)) => Ok(Value::bool(!t)),
            _ => Err(CompileError::unsupported(
                format!("bad operand type for unary `{}`: {}", unary_symbol(op), v.kind_name()),
                span,
            )),
        }
    }

    /// Applies a non-short-circuit binary operator.
    pub fn binary(&mut self, op: BinaryOp, a: Value, b: Value, span: Span) -> CompileResult<Value> {
        if let Some(result) = const_eval::sequence_binary(op, &a, &b, self.config.max_unroll, span) {
            return result;
        }
        if let (Value::Const(x), Value::Const(y)) = (&a, &b) {
            return const_eval::binary(op, x, y, span).map(Value::Const);
        }
        let lhs = a.expect_expr(span)?;
        let rhs = b.expect_expr(span)?;
        Ok(Value::Runtime(Expr::binary(ir_binary(op), lhs, rhs)))
    }

    /// Evaluates an optional expression that must be a constant integer.
    pub fn optional_int(
        &mut self,
        expr: Option<&weft_ast::Expr>,
        what: &str,
        scope: ScopeId,
        out: &mut Vec<Stmt>,
    ) -> CompileResult<Option<i64>> {
        let Some(expr) = expr else {
            return Ok(None);
        };
        self.eval(expr, scope, out)?
            .as_int()
            .map(Some)
            .ok_or_else(|| errors::not_constant(what, expr.span))
    }

    /// Resolves the bounds of a slice of runtime storage. A missing stop
    /// means the full width of the sliced object.
    pub fn bit_range(
        &mut self,
        base: &Value,
        start: Option<&weft_ast::Expr>,
        stop: Option<&weft_ast::Expr>,
        scope: ScopeId,
        out: &mut Vec<Stmt>,
        span: Span,
    ) -> CompileResult<(u32, u32)> {
        let start = self.optional_int(start, "a bit slice bound", scope, out)?.unwrap_or(0);
        let width = match base {
            Value::Object(id) => Some(i64::from(self.design.object_type(*id).width())),
            _ => None,
        };
        let stop = match (self.optional_int(stop, "a bit slice bound", scope, out)?, width) {
            (Some(stop), _) => stop,
            (None, Some(width)) => width,
            (None, None) => {
                return Err(CompileError::unsupported(
                    "slicing a runtime expression needs an explicit stop",
                    span,
                ))
            }
        };
        if start < 0 || stop <= start || stop > i64::from(u32::MAX) {
            return Err(CompileError::unsupported(
                format!("invalid bit slice [{start}:{stop}]"),
                span,
            ));
        }
        if let Some(width) = width.filter(|&w| stop > w) {
            return Err(CompileError::unsupported(
                format!("bit slice [{start}:{stop}] exceeds the {width}-bit width of its object"),
                span,
            ));
        }
        Ok((start as u32, stop as u32))
    }

    /// Binds loop or comprehension names to one element.
    pub fn bind_targets(&mut self, scope: ScopeId, targets: &[String], item: Value, span: Span) -> CompileResult<()> {
        if let [single] = targets {
            return self.scopes.define(scope, single, item, span);
        }
        let parts = match item.items(targets.len()) {
            Ok(parts) if parts.len() == targets.len() => parts,
            _ => {
                return Err(CompileError::unsupported(
                    format!("cannot unpack a {} into {} names", item.kind_name(), targets.len()),
                    span,
                ))
            }
        };
        for (name, part) in targets.iter().zip(parts) {
            self.scopes.define(scope, name, part, span)?;
        }
        Ok(())
    }
}

fn unary_symbol(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Not => "not",
        UnaryOp::Neg => "-",
        UnaryOp::Invert => "~",
    }
}

fn literal(value: &Literal, span: Span) -> CompileResult<Value> {
    Ok(Value::Const(match value {
        Literal::Int(i) => ConstValue::Int(*i),
        Literal::Bool(b) => ConstValue::Bool(*b),
        Literal::Bits(bits) => {
            if bits.is_empty() || !bits.chars().all(|c| c == '0' || c == '1') {
                return Err(CompileError::unsupported(
                    format!("invalid bit string \"{bits}\""),
                    span,
                ));
            }
            ConstValue::Bits(bits.clone())
        }
        Literal::Str(s) => ConstValue::Str(s.clone()),
        Literal::None => ConstValue::None,
    }))
}
