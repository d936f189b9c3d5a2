//! Object model resolution and control-flow normalization.
//!
//! Runs the global bindings and every context body of a [`SourceDesign`] at
//! compile time. Storage objects are created as declarations are evaluated,
//! user functions are inlined, `for` loops are unrolled and constant
//! branches dropped. What remains per context is a normalized statement list
//! over storage objects and temporaries, ready for state-machine synthesis.
//!
//! # Usage
//!
//! ```ignore
//! let design = elaborate(&source, &config.compile, &clocks, &interner, &sink)?;
//! ```

#![warn(missing_docs)]

pub mod call;
pub mod const_eval;
pub mod context;
pub mod errors;
pub mod expr;
pub mod registry;
pub mod scope;
pub mod stmt;
pub mod value;

use context::{ContextState, Elaborator, Flow, Frame};
use registry::PendingContext;
use scope::{ScopeKind, Scopes};
use std::collections::HashMap;
use value::{FunctionRef, Value};
use weft_ast::{ContextDecl, SourceDesign};
use weft_common::{Frequency, Interner, WeftResult};
use weft_config::{CompileConfig, ResolvedClock};
use weft_diagnostics::{CompileError, CompileResult, DiagnosticSink};
use weft_ir::{Clock, Context, ContextId, ContextKind, Design, Edge, ObjectId, Reset};
use weft_source::Span;

/// Elaborates `source` into a normalized [`Design`].
///
/// User-facing errors are emitted to `sink`. An error in the global bindings
/// stops elaboration before any context; an error in a context fails only
/// that context. Only internal compiler bugs return `Err`.
pub fn elaborate(
    source: &SourceDesign,
    config: &CompileConfig,
    clocks: &[ResolvedClock],
    interner: &Interner,
    sink: &DiagnosticSink,
) -> WeftResult<Design> {
    let mut el = Elaborator::new(source, config, interner, sink);

    for (i, f) in source.functions.iter().enumerate() {
        let bound = el
            .scopes
            .define(Scopes::GLOBAL, &f.name, Value::Function(FunctionRef::User(i)), f.span);
        if let Err(err) = bound {
            sink.emit(err.to_diagnostic());
            return Ok(el.design);
        }
    }

    let mut globals = Vec::new();
    if let Err(err) = el.exec_block(&source.globals, Scopes::GLOBAL, &mut globals) {
        sink.emit(err.to_diagnostic());
        return Ok(el.design);
    }
    log::debug!(
        "global bindings created {} storage object(s)",
        el.design.objects.len()
    );

    let mut seen: HashMap<&str, Span> = HashMap::new();
    let mut pending = Vec::with_capacity(source.contexts.len());
    for (i, decl) in source.contexts.iter().enumerate() {
        let id = ContextId::from_raw(i as u32);
        let mut p = compile_context(&mut el, id, decl, clocks);
        if let Some(first) = seen.insert(decl.name.as_str(), decl.span) {
            p.errors
                .push(CompileError::redefinition(&decl.name, decl.span, first));
        }
        pending.push(p);
    }

    let mut design = el.design;
    registry::commit(&mut design, pending, interner, sink)?;
    log::info!(
        "elaborated `{}`: {} object(s), {} context(s), {} failed",
        interner.resolve(design.name),
        design.objects.len(),
        design.contexts.len(),
        design.contexts.values().filter(|c| c.failed).count()
    );
    Ok(design)
}

fn compile_context(
    el: &mut Elaborator<'_>,
    id: ContextId,
    decl: &ContextDecl,
    clocks: &[ResolvedClock],
) -> PendingContext {
    log::info!("normalizing context `{}`", decl.name);
    let name = el.interner.get_or_intern(&decl.name);
    let (kind, kind_error) = match resolve_kind(el, decl, clocks) {
        Ok(kind) => (kind, None),
        Err(err) => (fallback_kind(decl), Some(err)),
    };
    let context = Context::new(id, name, kind, decl.span);
    let Some(err) = kind_error else {
        return run_body(el, context, decl);
    };
    PendingContext {
        context,
        modes: HashMap::new(),
        errors: vec![err],
    }
}

fn run_body(el: &mut Elaborator<'_>, mut context: Context, decl: &ContextDecl) -> PendingContext {
    el.cx = Some(ContextState::new(context.id, &decl.name, decl.is_sequential()));
    el.frame = Frame::default();
    el.callers.clear();
    let scope = el.scopes.child(Scopes::GLOBAL, ScopeKind::Context);

    let mut body = Vec::new();
    let result = el.exec_block(&decl.body, scope, &mut body).and_then(|flow| match flow {
        Flow::Normal | Flow::Jumped => Ok(()),
        other => Err(CompileError::unsupported(
            format!("unexpected {other:?} at the top of context `{}`", decl.name),
            decl.span,
        )),
    });
    let state = el.cx.take();

    let mut errors = Vec::new();
    let mut modes = HashMap::new();
    match (result, state) {
        (Ok(()), Some(state)) => {
            for stmt in &body {
                stmt.collect_driven(&mut context.driven);
            }
            context.body = body;
            context.temps = state.temps;
            modes = state.modes;
            log::debug!(
                "context `{}`: {} statement(s), {} temporaries",
                decl.name,
                context.body.len(),
                context.temps.len()
            );
        }
        (Err(err), _) => errors.push(err),
        (Ok(()), None) => errors.push(CompileError::unsupported(
            format!("context `{}` lost its state", decl.name),
            decl.span,
        )),
    }
    PendingContext {
        context,
        modes,
        errors,
    }
}

fn fallback_kind(decl: &ContextDecl) -> ContextKind {
    if decl.is_sequential() {
        ContextKind::Sequential {
            clock: None,
            reset: None,
        }
    } else {
        ContextKind::Concurrent
    }
}

fn resolve_kind(el: &Elaborator<'_>, decl: &ContextDecl, clocks: &[ResolvedClock]) -> CompileResult<ContextKind> {
    let weft_ast::ContextKind::Sequential { clock, reset } = &decl.kind else {
        return Ok(ContextKind::Concurrent);
    };
    let clock = match clock {
        Some(spec) => {
            let signal = global_object(el, &spec.signal, "clock signal", decl.span)?;
            let frequency = match &spec.frequency {
                Some(text) => Some(text.parse::<Frequency>().map_err(|e| {
                    CompileError::unsupported(format!("clock frequency \"{text}\": {e}"), decl.span)
                })?),
                None => clocks
                    .iter()
                    .find(|c| c.signal == spec.signal)
                    .map(|c| c.frequency),
            };
            Some(Clock {
                signal,
                edge: match spec.edge {
                    weft_ast::Edge::Rising => Edge::Rising,
                    weft_ast::Edge::Falling => Edge::Falling,
                },
                frequency,
            })
        }
        None => None,
    };
    let reset = match reset {
        Some(spec) => Some(Reset {
            signal: global_object(el, &spec.signal, "reset signal", decl.span)?,
            active_high: spec.active_high,
            asynchronous: spec.asynchronous,
        }),
        None => None,
    };
    Ok(ContextKind::Sequential { clock, reset })
}

fn global_object(el: &Elaborator<'_>, name: &str, what: &str, span: Span) -> CompileResult<ObjectId> {
    match el.scopes.lookup(Scopes::GLOBAL, name) {
        Some(Value::Object(id)) => Ok(*id),
        Some(other) => Err(CompileError::unsupported(
            format!("{what} `{name}` is a {}, not a storage object", other.kind_name()),
            span,
        )),
        None => Err(CompileError::unknown(what, name, span)),
    }
}
