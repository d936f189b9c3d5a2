//! State-machine synthesis.
//!
//! Turns the normalized body of every sequential context into a
//! [`StateGraph`]. Each `await` and each suspending `while` opens a state
//! boundary; `break` duplicates the code after its loop and `continue`
//! duplicates the loop head. The body as a whole repeats forever from the
//! initial state.
//!
//! # Usage
//!
//! ```ignore
//! weft_fsm::synthesize_all(&mut design, &config.compile, &interner, &sink)?;
//! let fsm = design.contexts[id].fsm.as_ref();
//! ```

#![warn(missing_docs)]

pub mod continuation;
pub mod synth;

pub use synth::synthesize;

use weft_common::{InternalError, Interner, WeftResult};
use weft_config::CompileConfig;
use weft_diagnostics::{CompileError, DiagnosticSink};
use weft_ir::{Context, Design, Stmt};

/// Synthesizes the state graph of every sequential context in `design`.
///
/// Failed contexts are skipped. A context that cannot be synthesized is
/// failed and its error emitted to `sink`; the others are unaffected.
pub fn synthesize_all(
    design: &mut Design,
    config: &CompileConfig,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> WeftResult<()> {
    for (_, context) in design.contexts.iter_mut() {
        if context.failed {
            continue;
        }
        let name = interner.resolve(context.name).to_string();
        if let Err(err) = synthesize_context(context, config) {
            log::debug!("synthesis of `{name}` failed: {err}");
            context.fail();
            sink.emit(err.to_diagnostic().in_context(name));
            continue;
        }
        if let Some(fsm) = &context.fsm {
            let unreachable = fsm.unreachable();
            if !unreachable.is_empty() {
                return Err(InternalError::new(format!(
                    "context `{name}` has unreachable states {unreachable:?}"
                )));
            }
            log::info!("context `{name}`: {} state(s)", fsm.len());
        }
    }
    Ok(())
}

fn synthesize_context(context: &mut Context, config: &CompileConfig) -> Result<(), CompileError> {
    if !context.is_sequential() {
        return match first_suspension(&context.body) {
            Some(Stmt::While { span, .. }) => Err(CompileError::suspension_context("while", *span)),
            Some(stmt) => Err(CompileError::suspension_context("await", stmt.span())),
            None => Ok(()),
        };
    }
    let fsm = synthesize(&context.body, context.span, config.max_states)?;
    context.fsm = Some(fsm);
    Ok(())
}

fn first_suspension(body: &[Stmt]) -> Option<&Stmt> {
    body.iter().find_map(|stmt| match stmt {
        Stmt::While { .. } | Stmt::Await { .. } => Some(stmt),
        Stmt::If {
            then_body,
            else_body,
            ..
        } => first_suspension(then_body).or_else(|| first_suspension(else_body)),
        Stmt::Coroutine { body, .. } => first_suspension(body),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_diagnostics::code;
    use weft_ir::{
        AssignMode, ContextId, ContextKind, Expr, ObjectId, ObjectKind, StateStmt, Target, Type,
    };
    use weft_source::Span;

    fn design_with(interner: &Interner, kind: ContextKind, body: Vec<Stmt>) -> (Design, ContextId) {
        let mut design = Design::new(interner.get_or_intern("top"));
        let q = design.add_object(
            interner.get_or_intern("q"),
            ObjectKind::Signal,
            Type::Bit,
            None,
            Span::DUMMY,
        );
        assert_eq!(q, ObjectId::from_raw(0));
        let id = design.contexts.next_id();
        let mut context = Context::new(id, interner.get_or_intern("proc"), kind, Span::DUMMY);
        context.body = body;
        design.contexts.alloc(context);
        (design, id)
    }

    fn sequential() -> ContextKind {
        ContextKind::Sequential {
            clock: None,
            reset: None,
        }
    }

    fn toggle() -> Stmt {
        Stmt::Assign {
            target: Target::whole(ObjectId::from_raw(0)),
            value: Expr::unary(weft_ir::UnaryOp::Not, Expr::Object(ObjectId::from_raw(0))),
            mode: AssignMode::Next,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn sequential_context_gets_a_graph() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let (mut design, id) = design_with(&interner, sequential(), vec![toggle()]);
        synthesize_all(&mut design, &CompileConfig::default(), &interner, &sink).unwrap();
        let fsm = design.contexts[id].fsm.as_ref().expect("fsm");
        assert!(fsm.is_single_state());
        assert_eq!(fsm.states.values().next().map(|s| s.body.len()), Some(2));
        assert!(matches!(
            fsm.states.values().next().and_then(|s| s.body.last()),
            Some(StateStmt::Goto(_))
        ));
    }

    #[test]
    fn concurrent_context_has_no_graph() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let (mut design, id) = design_with(&interner, ContextKind::Concurrent, vec![toggle()]);
        synthesize_all(&mut design, &CompileConfig::default(), &interner, &sink).unwrap();
        assert!(design.contexts[id].fsm.is_none());
        assert!(!sink.has_errors());
    }

    #[test]
    fn concurrent_suspension_is_rejected() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let body = vec![Stmt::If {
            cond: Expr::Object(ObjectId::from_raw(0)),
            then_body: vec![Stmt::Await {
                cond: Expr::bool(true),
                span: Span::DUMMY,
            }],
            else_body: vec![],
            span: Span::DUMMY,
        }];
        let (mut design, id) = design_with(&interner, ContextKind::Concurrent, body);
        synthesize_all(&mut design, &CompileConfig::default(), &interner, &sink).unwrap();
        assert!(design.contexts[id].failed);
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, code::E305);
        assert_eq!(diags[0].context.as_deref(), Some("proc"));
    }

    #[test]
    fn state_limit_fails_only_that_context() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let body = (0..4)
            .map(|_| Stmt::Await {
                cond: Expr::Object(ObjectId::from_raw(0)),
                span: Span::DUMMY,
            })
            .collect();
        let (mut design, id) = design_with(&interner, sequential(), body);
        let config = CompileConfig {
            max_states: 2,
            ..CompileConfig::default()
        };
        synthesize_all(&mut design, &config, &interner, &sink).unwrap();
        assert!(design.contexts[id].failed);
        assert_eq!(sink.diagnostics()[0].code, code::E303);
    }

    #[test]
    fn failed_contexts_are_skipped() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let (mut design, id) = design_with(&interner, sequential(), vec![toggle()]);
        design.contexts[id].fail();
        synthesize_all(&mut design, &CompileConfig::default(), &interner, &sink).unwrap();
        assert!(design.contexts[id].fsm.is_none());
    }
}
