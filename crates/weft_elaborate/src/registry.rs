//! Cross-context checks and the commit of per-context results.
//!
//! Contexts are normalized independently. Once all of them ran, the
//! registry decides which objects each successful context owns, fails every
//! context involved in a driver conflict, records assignment modes and
//! drivers on the objects, and inserts buffer signals for output ports that
//! are read back inside the design.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use weft_common::{InternalError, Interner, WeftResult};
use weft_diagnostics::{CompileError, DiagnosticSink, ErrorKind};
use weft_ir::{AssignMode, Context, Design, Expr, ObjectId, ObjectKind, PortDirection};

/// A normalized context waiting for the commit.
#[derive(Debug)]
pub struct PendingContext {
    /// The context with its body and temporaries.
    pub context: Context,
    /// Assignment modes the body used.
    pub modes: HashMap<ObjectId, AssignMode>,
    /// Errors raised for this context. Non-empty means failed.
    pub errors: Vec<CompileError>,
}

impl PendingContext {
    fn ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Objects this context drives or, for variables, uses at all.
    fn claims(&self, design: &Design) -> BTreeSet<ObjectId> {
        let mut claims = self.context.driven.clone();
        claims.extend(self.reads().into_iter().filter(|o| design.object(*o).is_variable()));
        claims
    }

    fn reads(&self) -> BTreeSet<ObjectId> {
        let mut reads = BTreeSet::new();
        for stmt in &self.context.body {
            stmt.collect_reads(&mut reads);
        }
        for temp in self.context.temps.values() {
            temp.value.collect_objects(&mut reads);
        }
        reads
    }
}

/// Runs the cross-context checks and moves every context into `design`.
///
/// Context IDs must follow declaration order; anything else is an internal
/// error.
pub fn commit(
    design: &mut Design,
    mut pending: Vec<PendingContext>,
    interner: &Interner,
    sink: &DiagnosticSink,
) -> WeftResult<()> {
    for (i, p) in pending.iter().enumerate() {
        if p.context.id.as_raw() as usize != i {
            return Err(InternalError::new(format!(
                "context `{}` has id {} at position {i}",
                interner.resolve(p.context.name),
                p.context.id
            )));
        }
    }

    check_ownership(design, &mut pending, interner);

    for p in pending.iter().filter(|p| p.ok()) {
        for (&obj, &mode) in &p.modes {
            design.objects[obj].mode = Some(mode);
        }
        for obj in p.claims(design) {
            design.objects[obj].driver = Some(p.context.id);
        }
    }

    insert_buffers(design, &mut pending, interner);

    for mut p in pending {
        let name = interner.resolve(p.context.name).to_string();
        if !p.ok() {
            log::debug!("context `{name}` failed with {} error(s)", p.errors.len());
            p.context.fail();
        }
        for err in &p.errors {
            sink.emit(err.to_diagnostic().in_context(name.clone()));
        }
        design.contexts.alloc(p.context);
    }
    Ok(())
}

/// Fails contexts that share an object or use variables concurrently.
fn check_ownership(design: &Design, pending: &mut [PendingContext], interner: &Interner) {
    let mut users: BTreeMap<ObjectId, Vec<usize>> = BTreeMap::new();
    for (i, p) in pending.iter().enumerate().filter(|(_, p)| p.ok()) {
        for obj in p.claims(design) {
            users.entry(obj).or_default().push(i);
        }
    }

    let mut raised: Vec<(usize, CompileError)> = Vec::new();
    for (obj, contexts) in &users {
        let object = design.object(*obj);
        let name = interner.resolve(object.name);
        if contexts.len() > 1 {
            let owners: Vec<String> = contexts
                .iter()
                .map(|&i| format!("`{}`", interner.resolve(pending[i].context.name)))
                .collect();
            for &i in contexts {
                let mut err = CompileError::new(
                    ErrorKind::MultipleDriver,
                    format!("`{name}` is driven by more than one context: {}", owners.join(", ")),
                    pending[i].context.span,
                )
                .with_related(object.span, "declared here");
                for &other in contexts.iter().filter(|&&o| o != i) {
                    err = err.with_related(pending[other].context.span, "also driven here");
                }
                raised.push((i, err));
            }
        } else if object.is_variable() && !pending[contexts[0]].context.is_sequential() {
            raised.push((
                contexts[0],
                CompileError::assignment_mode(
                    format!("variable `{name}` used in a concurrent context"),
                    pending[contexts[0]].context.span,
                ),
            ));
        }
    }
    for (i, err) in raised {
        pending[i].errors.push(err);
    }
}

/// Gives every output port that a context reads a `<port>_buf` signal and
/// redirects the reads to it.
fn insert_buffers(design: &mut Design, pending: &mut [PendingContext], interner: &Interner) {
    let read_ports: BTreeSet<ObjectId> = pending
        .iter()
        .filter(|p| p.ok())
        .flat_map(|p| p.reads())
        .filter(|o| design.object(*o).port_direction() == Some(PortDirection::Out))
        .collect();

    let mut redirect: HashMap<ObjectId, ObjectId> = HashMap::new();
    for port in read_ports {
        let p = design.object(port).clone();
        let name = design.unique_name(&format!("{}_buf", interner.resolve(p.name)), interner);
        let ty = design.object_type(port);
        let buf = design.add_object(name, ObjectKind::Signal, ty, p.default.clone(), p.span);
        let b = &mut design.objects[buf];
        b.buffer_of = Some(port);
        b.mode = p.mode;
        b.driver = p.driver;
        design.objects[port].buffer = Some(buf);
        log::debug!(
            "output port `{}` is read back; buffered through `{}`",
            interner.resolve(p.name),
            interner.resolve(name)
        );
        redirect.insert(port, buf);
    }
    if redirect.is_empty() {
        return;
    }

    let mut rewrite = |e: &Expr| match e {
        Expr::Object(id) => redirect.get(id).map(|b| Expr::Object(*b)),
        _ => None,
    };
    for p in pending.iter_mut().filter(|p| p.errors.is_empty()) {
        for stmt in &mut p.context.body {
            stmt.rewrite_reads(&mut rewrite);
        }
        for (_, temp) in p.context.temps.iter_mut() {
            temp.value = temp.value.map_leaves(&mut rewrite);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_common::Ident;
    use weft_ir::{ContextId, ContextKind, Stmt, Target, Type};
    use weft_source::Span;

    fn setup() -> (Design, Interner) {
        let interner = Interner::new();
        let design = Design::new(interner.get_or_intern("top"));
        (design, interner)
    }

    fn object(design: &mut Design, interner: &Interner, name: &str, kind: ObjectKind) -> ObjectId {
        let ident = design.unique_name(name, interner);
        design.add_object(ident, kind, Type::Bit, None, Span::DUMMY)
    }

    fn pending(id: u32, name: Ident, sequential: bool, body: Vec<Stmt>) -> PendingContext {
        let kind = if sequential {
            ContextKind::Sequential {
                clock: None,
                reset: None,
            }
        } else {
            ContextKind::Concurrent
        };
        let mut context = Context::new(ContextId::from_raw(id), name, kind, Span::DUMMY);
        for s in &body {
            s.collect_driven(&mut context.driven);
        }
        let mut modes = HashMap::new();
        for obj in &context.driven {
            modes.insert(*obj, AssignMode::Next);
        }
        context.body = body;
        PendingContext {
            context,
            modes,
            errors: Vec::new(),
        }
    }

    fn drive(obj: ObjectId, value: Expr) -> Stmt {
        Stmt::Assign {
            target: Target::whole(obj),
            value,
            mode: AssignMode::Next,
            span: Span::DUMMY,
        }
    }

    #[test]
    fn shared_driver_fails_both_contexts() {
        let (mut design, interner) = setup();
        let sink = DiagnosticSink::new();
        let q = object(&mut design, &interner, "q", ObjectKind::Signal);
        let a = pending(0, interner.get_or_intern("a"), true, vec![drive(q, Expr::bool(true))]);
        let b = pending(1, interner.get_or_intern("b"), true, vec![drive(q, Expr::bool(false))]);
        commit(&mut design, vec![a, b], &interner, &sink).unwrap();
        assert!(design.contexts.values().all(|c| c.failed));
        assert_eq!(sink.error_count(), 2);
        assert!(design.object(q).driver.is_none());
    }

    #[test]
    fn commit_records_mode_and_driver() {
        let (mut design, interner) = setup();
        let sink = DiagnosticSink::new();
        let q = object(&mut design, &interner, "q", ObjectKind::Signal);
        let a = pending(0, interner.get_or_intern("a"), true, vec![drive(q, Expr::bool(true))]);
        commit(&mut design, vec![a], &interner, &sink).unwrap();
        assert_eq!(design.object(q).mode, Some(AssignMode::Next));
        assert_eq!(design.object(q).driver, Some(ContextId::from_raw(0)));
        assert!(!sink.has_errors());
    }

    #[test]
    fn read_output_port_gets_buffer() {
        let (mut design, interner) = setup();
        let sink = DiagnosticSink::new();
        let count = object(&mut design, &interner, "count", ObjectKind::Port(PortDirection::Out));
        let a = pending(
            0,
            interner.get_or_intern("a"),
            true,
            vec![drive(
                count,
                Expr::unary(weft_ir::UnaryOp::Not, Expr::Object(count)),
            )],
        );
        commit(&mut design, vec![a], &interner, &sink).unwrap();
        let buf = design.object(count).buffer.expect("buffer");
        assert_eq!(interner.resolve(design.object(buf).name), "count_buf");
        assert_eq!(design.object(buf).buffer_of, Some(count));
        let ctx = &design.contexts[ContextId::from_raw(0)];
        let Stmt::Assign { target, value, .. } = &ctx.body[0] else {
            panic!("expected assign");
        };
        assert_eq!(target.object, count);
        assert_eq!(*value, Expr::unary(weft_ir::UnaryOp::Not, Expr::Object(buf)));
    }

    #[test]
    fn unread_output_port_has_no_buffer() {
        let (mut design, interner) = setup();
        let sink = DiagnosticSink::new();
        let out = object(&mut design, &interner, "y", ObjectKind::Port(PortDirection::Out));
        let a = pending(0, interner.get_or_intern("a"), false, vec![drive(out, Expr::bool(true))]);
        commit(&mut design, vec![a], &interner, &sink).unwrap();
        assert!(design.object(out).buffer.is_none());
        assert_eq!(design.objects.len(), 1);
    }

    #[test]
    fn failed_context_keeps_other_contexts() {
        let (mut design, interner) = setup();
        let sink = DiagnosticSink::new();
        let q = object(&mut design, &interner, "q", ObjectKind::Signal);
        let mut a = pending(0, interner.get_or_intern("a"), true, vec![]);
        a.errors.push(CompileError::unsupported("bad", Span::DUMMY));
        let b = pending(1, interner.get_or_intern("b"), true, vec![drive(q, Expr::bool(true))]);
        commit(&mut design, vec![a, b], &interner, &sink).unwrap();
        assert!(design.contexts[ContextId::from_raw(0)].failed);
        assert!(!design.contexts[ContextId::from_raw(1)].failed);
        let diags = sink.diagnostics();
        assert_eq!(diags[0].context.as_deref(), Some("a"));
    }

    #[test]
    fn out_of_order_ids_are_internal_errors() {
        let (mut design, interner) = setup();
        let sink = DiagnosticSink::new();
        let a = pending(3, interner.get_or_intern("a"), true, vec![]);
        assert!(commit(&mut design, vec![a], &interner, &sink).is_err());
    }
}
