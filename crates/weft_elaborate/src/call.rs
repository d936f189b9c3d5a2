//! Call evaluation and function inlining.
//!
//! User functions are never emitted as subprograms. Each call binds its
//! arguments in a fresh function scope and runs the body in place, so every
//! statement it produces lands in the caller's output.

use crate::const_eval;
use crate::context::{Elaborator, Flow, Frame};
use crate::errors;
use crate::scope::{ScopeId, ScopeKind, Scopes};
use crate::value::{FunctionRef, Value};
use std::iter;
use weft_ast::{Arg, FunctionDef, ParamKind};
use weft_diagnostics::{CompileError, CompileResult};
use weft_ir::{ConstValue, Stmt};
use weft_source::Span;

/// Evaluated call arguments.
#[derive(Debug, Default)]
pub struct CallArgs {
    /// Positional arguments, `*` expansions flattened in.
    pub positional: Vec<Value>,
    /// Keyword arguments, `**` expansions flattened in.
    pub keywords: Vec<(String, Value)>,
}

impl<'a> Elaborator<'a> {
    /// Calls `func` with the unevaluated `args`.
    pub fn call(
        &mut self,
        func: FunctionRef,
        args: &[Arg],
        scope: ScopeId,
        out: &mut Vec<Stmt>,
        span: Span,
    ) -> CompileResult<Value> {
        let args = self.eval_args(args, scope, out, span)?;
        match func {
            FunctionRef::Builtin(b) => {
                const_eval::call_builtin(b, args.positional, args.keywords, self.config.max_unroll, span)
            }
            FunctionRef::User(index) => {
                let def = &self.source.functions[index];
                if def.is_async {
                    return Err(CompileError::unsupported(
                        format!("coroutine `{}` must be awaited", def.name),
                        span,
                    ));
                }
                self.inline(index, args, out, span)
            }
        }
    }

    /// Evaluates call arguments in source order.
    pub fn eval_args(&mut self, args: &[Arg], scope: ScopeId, out: &mut Vec<Stmt>, span: Span) -> CompileResult<CallArgs> {
        let mut result = CallArgs::default();
        for arg in args {
            match arg {
                Arg::Positional(e) => {
                    let v = self.eval(e, scope, out)?;
                    result.positional.push(v);
                }
                Arg::Star(e) => {
                    let v = self.eval(e, scope, out)?;
                    let limit = self.config.max_unroll;
                    let items = v.items(limit).map_err(|err| {
                        errors::expansion(err, limit, e.span, || {
                            CompileError::unsupported(
                                format!("cannot expand a {} with `*`", v.kind_name()),
                                e.span,
                            )
                        })
                    })?;
                    result.positional.extend(items);
                }
                Arg::Keyword { name, value } => {
                    let v = self.eval(value, scope, out)?;
                    result.keywords.push((name.clone(), v));
                }
                Arg::DoubleStar(e) => {
                    let Value::Dict(entries) = self.eval(e, scope, out)? else {
                        return Err(CompileError::unsupported("`**` needs a dictionary", e.span));
                    };
                    for (key, value) in entries {
                        let ConstValue::Str(name) = key else {
                            return Err(CompileError::unsupported(
                                format!("keyword names must be strings, got {key}"),
                                span,
                            ));
                        };
                        result.keywords.push((name, value));
                    }
                }
            }
        }
        Ok(result)
    }

    /// Inlines a user function and returns its value. A runtime return value
    /// is bound to a temporary named after the function.
    pub fn inline(&mut self, index: usize, args: CallArgs, out: &mut Vec<Stmt>, span: Span) -> CompileResult<Value> {
        let source = self.source;
        let def = &source.functions[index];
        let bound = self.bind_params(def, args, out, span)?;

        let active = self
            .callers
            .iter()
            .chain(iter::once(&self.frame))
            .any(|f| f.function == Some(index) && f.args == bound);
        if active {
            return Err(errors::recursive_call(&def.name, span));
        }
        if self.callers.len() >= self.config.max_inline_depth {
            return Err(errors::inline_depth(&def.name, self.config.max_inline_depth, span));
        }

        let fscope = self.scopes.child(
            Scopes::GLOBAL,
            ScopeKind::Function {
                constructor: def.constructor,
            },
        );
        for (name, value) in &bound {
            self.scopes.define(fscope, name, value.clone(), def.span)?;
        }

        log::debug!("inlining `{}` at depth {}", def.name, self.callers.len() + 1);
        let callee = Frame {
            function: Some(index),
            args: bound,
            ..Frame::default()
        };
        let caller = std::mem::replace(&mut self.frame, callee);
        self.callers.push(caller);
        let result = self.exec_block(&def.body, fscope, out);
        self.frame = self.callers.pop().unwrap_or_default();

        let value = match result.map_err(|e| e.with_related(span, format!("in call to `{}`", def.name)))? {
            Flow::Return(v) => v,
            _ => Value::none(),
        };
        match value {
            Value::Runtime(e) => self.make_temp(&def.name, e, span, out),
            other => Ok(other),
        }
    }

    /// Matches arguments to parameters with host calling rules. Defaults
    /// are evaluated in the global scope at call time.
    fn bind_params(
        &mut self,
        def: &FunctionDef,
        args: CallArgs,
        out: &mut Vec<Stmt>,
        span: Span,
    ) -> CompileResult<Vec<(String, Value)>> {
        let CallArgs {
            positional,
            mut keywords,
        } = args;
        for (i, (name, _)) in keywords.iter().enumerate() {
            if keywords[..i].iter().any(|(n, _)| n == name) {
                return Err(errors::bad_arguments(
                    &def.name,
                    format_args!("keyword argument `{name}` repeated"),
                    span,
                ));
            }
        }

        let given = positional.len();
        let mut positional = positional.into_iter();
        let mut keyword_only = false;
        let mut bound = Vec::with_capacity(def.params.len());
        for param in &def.params {
            let value = match param.kind {
                ParamKind::Normal => {
                    let from_position = if keyword_only { None } else { positional.next() };
                    let from_keyword = keywords
                        .iter()
                        .position(|(n, _)| *n == param.name)
                        .map(|i| keywords.remove(i).1);
                    match (from_position, from_keyword, &param.default) {
                        (Some(_), Some(_), _) => {
                            return Err(errors::bad_arguments(
                                &def.name,
                                format_args!("multiple values for argument `{}`", param.name),
                                span,
                            ))
                        }
                        (Some(v), None, _) | (None, Some(v), _) => v,
                        (None, None, Some(default)) => self.eval(default, Scopes::GLOBAL, out)?,
                        (None, None, None) => {
                            return Err(errors::bad_arguments(
                                &def.name,
                                format_args!("missing required argument `{}`", param.name),
                                span,
                            ))
                        }
                    }
                }
                ParamKind::VarArgs => {
                    keyword_only = true;
                    Value::Tuple(positional.by_ref().collect())
                }
                ParamKind::KwArgs => Value::Dict(
                    keywords
                        .drain(..)
                        .map(|(k, v)| (ConstValue::Str(k), v))
                        .collect(),
                ),
            };
            bound.push((param.name.clone(), value));
        }

        let extra = positional.count();
        if extra > 0 {
            return Err(errors::bad_arguments(
                &def.name,
                format_args!(
                    "takes {} positional arguments but {given} were given",
                    given - extra
                ),
                span,
            ));
        }
        if let Some((name, _)) = keywords.first() {
            return Err(errors::bad_arguments(
                &def.name,
                format_args!("unexpected keyword argument `{name}`"),
                span,
            ));
        }
        Ok(bound)
    }

    /// Inlines an awaited coroutine into a [`Stmt::Coroutine`].
    pub fn inline_coroutine(&mut self, index: usize, args: CallArgs, span: Span) -> CompileResult<Stmt> {
        let source = self.source;
        let def = &source.functions[index];
        let mut body = Vec::new();
        self.inline(index, args, &mut body, span)?;
        Ok(Stmt::Coroutine {
            name: self.interner.get_or_intern(&def.name),
            body,
            span,
        })
    }
}
