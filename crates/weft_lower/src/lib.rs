//! Backend lowering.
//!
//! Converts a synthesized [`Design`] into a [`LoweredDesign`]: concurrent
//! contexts become ordered driving statements, sequential contexts become
//! clocked processes with an optional state register and dispatch. Any
//! [`Backend`] can then render the result; [`TextBackend`] produces a neutral
//! listing and [`to_json`] serializes the model itself.
//!
//! # Usage
//!
//! ```ignore
//! let lowered = weft_lower::lower(&design, &config.compile, &interner, &sink)?;
//! println!("{}", weft_lower::to_text(&lowered));
//! ```

#![warn(missing_docs)]

pub mod backend;
pub mod lower;
pub mod model;
pub mod temporaries;
pub mod text;

pub use backend::{drive, emit_stmts, Backend};
pub use lower::Lowerer;
pub use model::*;
pub use temporaries::{check_crossings, find_crossings, Crossing};
pub use text::{to_text, TextBackend};

use weft_common::{Interner, WeftResult};
use weft_config::CompileConfig;
use weft_diagnostics::DiagnosticSink;
use weft_ir::Design;

/// Lowers every compiled context of `design`.
///
/// Failed contexts are left out. A context whose temporaries cross a state
/// boundary under [`CrossingPolicy::Deny`](weft_config::CrossingPolicy) is
/// reported to `sink` and left out as well.
pub fn lower(
    design: &Design,
    config: &CompileConfig,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> WeftResult<LoweredDesign> {
    let lowerer = Lowerer::new(design, interner);
    let mut blocks = Vec::new();
    for context in design.contexts.values().filter(|c| !c.failed) {
        let name = interner.resolve(context.name);
        if !context.is_sequential() {
            blocks.push(Block::Concurrent(lowerer.concurrent(context)));
            continue;
        }
        if let Err(err) = check_crossings(context, config.temporary_crossing, interner, sink) {
            sink.emit(err.to_diagnostic().in_context(name));
            continue;
        }
        let process = lowerer.process(context)?;
        log::debug!(
            "lowered `{name}`: {} variable(s), {}",
            process.variables.len(),
            match &process.body {
                ProcessBody::Single(_) => "single state".to_string(),
                ProcessBody::Dispatch(arms) => format!("{} states", arms.len()),
            }
        );
        blocks.push(Block::Process(process));
    }

    let lowered = LoweredDesign {
        name: interner.resolve(design.name).to_string(),
        ports: lowerer.ports(),
        signals: lowerer.signals(),
        blocks,
        mirrors: lowerer.mirrors(),
    };
    log::info!(
        "lowered `{}`: {} block(s), {} buffer mirror(s)",
        lowered.name,
        lowered.blocks.len(),
        lowered.mirrors.len()
    );
    Ok(lowered)
}

/// Serializes the lowered model as pretty-printed JSON.
pub fn to_json(design: &LoweredDesign) -> serde_json::Result<String> {
    serde_json::to_string_pretty(design)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_config::CrossingPolicy;
    use weft_diagnostics::code;
    use weft_ir::{
        AssignMode, Clock, Context, ContextKind, Edge, Expr, ObjectKind, PortDirection, StateGraph,
        StateStmt, Target, Temporary, Type,
    };
    use weft_source::Span;

    /// A design whose sequential context reads a temporary one state late.
    fn crossing_design(interner: &Interner) -> Design {
        let mut design = Design::new(interner.get_or_intern("top"));
        let clk = design.add_object(
            interner.get_or_intern("clk"),
            ObjectKind::Port(PortDirection::In),
            Type::Bit,
            None,
            Span::DUMMY,
        );
        let q = design.add_object(
            interner.get_or_intern("q"),
            ObjectKind::Signal,
            Type::Bit,
            None,
            Span::DUMMY,
        );
        let mut ctx = Context::new(
            design.contexts.next_id(),
            interner.get_or_intern("p"),
            ContextKind::Sequential {
                clock: Some(Clock {
                    signal: clk,
                    edge: Edge::Rising,
                    frequency: None,
                }),
                reset: None,
            },
            Span::DUMMY,
        );
        let t = ctx.temps.alloc(Temporary {
            name: interner.get_or_intern("t"),
            value: Expr::Object(q),
            span: Span::DUMMY,
        });
        let mut g = StateGraph::new();
        let s0 = g.add_state("entry", Span::DUMMY);
        let s1 = g.add_state("await", Span::DUMMY);
        g.states[s0].body = vec![
            StateStmt::Temp {
                id: t,
                span: Span::DUMMY,
            },
            StateStmt::Goto(s1),
        ];
        g.states[s1].body = vec![
            StateStmt::Assign {
                target: Target::whole(q),
                value: Expr::unary(weft_ir::UnaryOp::Not, Expr::Temp(t)),
                mode: AssignMode::Next,
                span: Span::DUMMY,
            },
            StateStmt::Goto(s0),
        ];
        ctx.fsm = Some(g);
        design.objects[q].driver = Some(ctx.id);
        design.objects[q].mode = Some(AssignMode::Next);
        design.contexts.alloc(ctx);
        design
    }

    #[test]
    fn crossing_warns_by_default() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let design = crossing_design(&interner);
        let lowered = lower(&design, &CompileConfig::default(), &interner, &sink).unwrap();
        assert_eq!(lowered.blocks.len(), 1);
        assert_eq!(sink.diagnostics()[0].code, code::W300);
        assert!(!sink.has_errors());
    }

    #[test]
    fn crossing_denied_drops_block() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let design = crossing_design(&interner);
        let config = CompileConfig {
            temporary_crossing: CrossingPolicy::Deny,
            ..CompileConfig::default()
        };
        let lowered = lower(&design, &config, &interner, &sink).unwrap();
        assert!(lowered.blocks.is_empty());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics()[0].context.as_deref(), Some("p"));
    }

    #[test]
    fn failed_contexts_are_left_out() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let mut design = crossing_design(&interner);
        for (_, ctx) in design.contexts.iter_mut() {
            ctx.fail();
        }
        let lowered = lower(&design, &CompileConfig::default(), &interner, &sink).unwrap();
        assert!(lowered.blocks.is_empty());
        assert_eq!(lowered.ports.len(), 1);
    }

    #[test]
    fn json_round_trip() {
        let interner = Interner::new();
        let sink = DiagnosticSink::new();
        let design = crossing_design(&interner);
        let lowered = lower(&design, &CompileConfig::default(), &interner, &sink).unwrap();
        let json = to_json(&lowered).unwrap();
        let back: LoweredDesign = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lowered);
        assert!(to_text(&lowered).contains("case p_state:"));
    }
}
