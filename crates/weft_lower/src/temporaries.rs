//! Temporaries read outside the state that computed them.
//!
//! A temporary lives for one clock edge. When a state reads a temporary
//! defined only in another state, the process variable that carries it holds
//! its value across the edge and infers storage the source never declared.

use weft_common::Interner;
use weft_config::CrossingPolicy;
use weft_diagnostics::{code, CompileError, Diagnostic, DiagnosticSink, Label};
use weft_ir::{Context, StateId, TempId};

/// A temporary read in a state that does not compute it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    /// The temporary.
    pub temp: TempId,
    /// The reading state.
    pub state: StateId,
}

/// Lists crossings in state order, then temporary order.
pub fn find_crossings(context: &Context) -> Vec<Crossing> {
    let Some(fsm) = &context.fsm else {
        return Vec::new();
    };
    let value = |t: TempId| context.temps.try_get(t).map(|temp| temp.value.clone());
    fsm.states
        .values()
        .flat_map(|state| {
            state
                .foreign_temps(&value)
                .into_iter()
                .map(move |temp| Crossing {
                    temp,
                    state: state.id,
                })
        })
        .collect()
}

/// Reports the crossings of `context` according to `policy`.
///
/// Under [`CrossingPolicy::Deny`] the first crossing is returned as an error
/// and nothing is emitted.
pub fn check_crossings(
    context: &Context,
    policy: CrossingPolicy,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> Result<(), CompileError> {
    if policy == CrossingPolicy::Allow {
        return Ok(());
    }
    let crossings = find_crossings(context);
    let context_name = interner.resolve(context.name);
    for crossing in &crossings {
        let Some(temp) = context.temps.try_get(crossing.temp) else {
            continue;
        };
        let name = interner.resolve(temp.name);
        let state_span = context
            .fsm
            .as_ref()
            .and_then(|fsm| fsm.states.try_get(crossing.state))
            .map(|s| s.span)
            .unwrap_or(context.span);
        let message = format!(
            "temporary `{name}` is read in state {} but computed in another state",
            crossing.state
        );
        if policy == CrossingPolicy::Deny {
            return Err(CompileError::unsupported(message, temp.span)
                .with_related(state_span, "state boundary crossed here")
                .with_note("`compile.temporary_crossing` is set to \"deny\""));
        }
        sink.emit(
            Diagnostic::warning(code::W300, message, temp.span)
                .in_context(context_name)
                .with_label(Label::secondary(state_span, "state boundary crossed here"))
                .with_help("assign the value to a variable to make the storage explicit"),
        );
    }
    if !crossings.is_empty() {
        log::debug!(
            "context `{context_name}`: {} temporary crossing(s)",
            crossings.len()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_diagnostics::Severity;
    use weft_ir::{
        AssignMode, ContextId, ContextKind, Expr, ObjectId, StateGraph, StateStmt, Target,
        Temporary,
    };
    use weft_source::Span;

    /// S0 computes `t` and waits; S1 reads `t`.
    fn crossing_context(interner: &Interner) -> Context {
        let mut ctx = Context::new(
            ContextId::from_raw(0),
            interner.get_or_intern("proc"),
            ContextKind::Sequential {
                clock: None,
                reset: None,
            },
            Span::DUMMY,
        );
        let t = ctx.temps.alloc(Temporary {
            name: interner.get_or_intern("t"),
            value: Expr::Object(ObjectId::from_raw(0)),
            span: Span::at(3, 5),
        });
        let mut g = StateGraph::new();
        let s0 = g.add_state("entry", Span::DUMMY);
        let s1 = g.add_state("await", Span::at(4, 5));
        g.states[s0].body = vec![
            StateStmt::Temp {
                id: t,
                span: Span::DUMMY,
            },
            StateStmt::Goto(s1),
        ];
        g.states[s1].body = vec![
            StateStmt::Assign {
                target: Target::whole(ObjectId::from_raw(1)),
                value: Expr::Temp(t),
                mode: AssignMode::Next,
                span: Span::DUMMY,
            },
            StateStmt::Goto(s0),
        ];
        ctx.fsm = Some(g);
        ctx
    }

    #[test]
    fn finds_crossing() {
        let interner = Interner::new();
        let ctx = crossing_context(&interner);
        let found = find_crossings(&ctx);
        assert_eq!(
            found,
            vec![Crossing {
                temp: TempId::from_raw(0),
                state: StateId::from_raw(1),
            }]
        );
    }

    #[test]
    fn warn_policy_emits_w300() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let ctx = crossing_context(&interner);
        check_crossings(&ctx, CrossingPolicy::Warn, &interner, &sink).unwrap();
        let diags = sink.diagnostics();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, code::W300);
        assert_eq!(diags[0].severity, Severity::Warning);
        assert_eq!(diags[0].primary_span, Span::at(3, 5));
        assert!(diags[0].message.contains("`t`"));
    }

    #[test]
    fn deny_policy_fails() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let ctx = crossing_context(&interner);
        let err = check_crossings(&ctx, CrossingPolicy::Deny, &interner, &sink).unwrap_err();
        assert_eq!(err.kind, weft_diagnostics::ErrorKind::UnsupportedConstruct);
        assert!(sink.diagnostics().is_empty());
    }

    #[test]
    fn allow_policy_is_silent() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let ctx = crossing_context(&interner);
        check_crossings(&ctx, CrossingPolicy::Allow, &interner, &sink).unwrap();
        assert!(sink.diagnostics().is_empty());
    }
}
