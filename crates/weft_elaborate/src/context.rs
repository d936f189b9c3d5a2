//! Mutable elaboration state.
//!
//! [`Elaborator`] owns the [`Design`] under construction, the scope arena and
//! the inlining call stack. While a context body is normalized it also holds
//! a [`ContextState`] collecting that context's temporaries and assignment
//! modes, which are committed to the design only if the context succeeds.

use crate::scope::Scopes;
use crate::value::Value;
use std::collections::HashMap;
use weft_ast::{DeclClass, SourceDesign, TypeSpec};
use weft_common::Interner;
use weft_config::CompileConfig;
use weft_diagnostics::{CompileError, CompileResult, DiagnosticSink};
use weft_ir::{
    Arena, AssignMode, ConstValue, ContextId, Design, Expr, ObjectId, ObjectKind, PortDirection,
    Stmt, TempId, Temporary, Type,
};
use weft_source::Span;

/// How a statement block ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Fell off the end.
    Normal,
    /// A compile-time `break` of the innermost unrolled loop.
    Break,
    /// A compile-time `continue` of the innermost unrolled loop.
    Continue,
    /// A `return` on a constant path.
    Return(Value),
    /// A runtime `break`/`continue` was emitted; the rest of the block is
    /// unreachable.
    Jumped,
}

/// Kind of an enclosing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    /// A `for` expanded at compile time.
    Unrolled,
    /// A `while` kept as a runtime loop.
    Suspending,
}

/// An enclosing loop.
#[derive(Debug, Clone, Copy)]
pub struct LoopFrame {
    /// Unrolled or suspending.
    pub kind: LoopKind,
    /// Runtime nesting depth at loop entry.
    pub runtime_depth: usize,
}

/// One level of inlining. The context body itself is the root frame.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Inlined user function, or `None` for the root.
    pub function: Option<usize>,
    /// Bound arguments, compared to detect unbounded recursion.
    pub args: Vec<(String, Value)>,
    /// Loops open in this frame.
    pub loops: Vec<LoopFrame>,
    /// Number of enclosing runtime branches and suspending loops.
    pub runtime_depth: usize,
}

/// Per-context output collected during normalization.
#[derive(Debug)]
pub struct ContextState {
    /// ID the context will have in the design.
    pub id: ContextId,
    /// Context name.
    pub name: String,
    /// Sequential or concurrent.
    pub sequential: bool,
    /// Temporaries defined so far.
    pub temps: Arena<TempId, Temporary>,
    /// Assignment modes used by this context.
    pub modes: HashMap<ObjectId, AssignMode>,
    temp_names: HashMap<String, usize>,
}

impl ContextState {
    /// Starts collecting for a context.
    pub fn new(id: ContextId, name: &str, sequential: bool) -> Self {
        Self {
            id,
            name: name.to_string(),
            sequential,
            temps: Arena::new(),
            modes: HashMap::new(),
            temp_names: HashMap::new(),
        }
    }

    fn temp_name(&mut self, base: &str) -> String {
        let n = self.temp_names.entry(base.to_string()).or_insert(0);
        let name = if *n == 0 {
            base.to_string()
        } else {
            format!("{base}_{n}")
        };
        *n += 1;
        name
    }
}

/// Elaboration state for one design.
pub struct Elaborator<'a> {
    /// Input tree.
    pub source: &'a SourceDesign,
    /// Compile limits.
    pub config: &'a CompileConfig,
    /// Shared interner.
    pub interner: &'a Interner,
    /// Warning sink. Errors travel as [`CompileError`] values.
    pub sink: &'a DiagnosticSink,
    /// The design being built.
    pub design: Design,
    /// All scopes.
    pub scopes: Scopes,
    /// Innermost inlining frame.
    pub frame: Frame,
    /// Frames of the callers of [`frame`](Self::frame), outermost first.
    pub callers: Vec<Frame>,
    /// The context being normalized, or `None` for global bindings.
    pub cx: Option<ContextState>,
}

impl<'a> Elaborator<'a> {
    /// Creates the state for elaborating `source`.
    pub fn new(
        source: &'a SourceDesign,
        config: &'a CompileConfig,
        interner: &'a Interner,
        sink: &'a DiagnosticSink,
    ) -> Self {
        Self {
            source,
            config,
            interner,
            sink,
            design: Design::new(interner.get_or_intern(&source.name)),
            scopes: Scopes::new(),
            frame: Frame::default(),
            callers: Vec::new(),
            cx: None,
        }
    }

    /// Returns `true` when normalizing a sequential context body.
    pub fn is_sequential(&self) -> bool {
        self.cx.as_ref().is_some_and(|c| c.sequential)
    }

    /// Name of the current context, for diagnostics.
    pub fn context_name(&self) -> Option<&str> {
        self.cx.as_ref().map(|c| c.name.as_str())
    }

    /// Rejects runtime control flow outside sequential contexts.
    pub fn require_sequential(&self, what: &str, span: Span) -> CompileResult<()> {
        if self.is_sequential() {
            Ok(())
        } else {
            Err(CompileError::suspension_context(what, span))
        }
    }

    /// Binds a runtime expression to a fresh temporary, emitting its
    /// definition into `out`.
    pub fn make_temp(&mut self, base: &str, value: Expr, span: Span, out: &mut Vec<Stmt>) -> CompileResult<Value> {
        let interner = self.interner;
        let Some(cx) = self.cx.as_mut() else {
            return Err(CompileError::unsupported(
                "runtime expressions are only allowed inside a context",
                span,
            ));
        };
        let name = interner.get_or_intern(&cx.temp_name(base));
        let id = cx.temps.alloc(Temporary { name, value, span });
        out.push(Stmt::Temp { id, span });
        Ok(Value::Temp(id))
    }

    /// Creates a storage object from a declaration.
    pub fn declare(
        &mut self,
        class: DeclClass,
        ty: TypeSpec,
        default: Option<Value>,
        name: &str,
        span: Span,
    ) -> CompileResult<Value> {
        let default = match default {
            None => None,
            Some(Value::Const(c)) => Some(c),
            Some(other) => {
                return Err(CompileError::unsupported(
                    format!(
                        "the default of `{name}` must be a compile-time constant, not a {}",
                        other.kind_name()
                    ),
                    span,
                ))
            }
        };
        let default = default.filter(|c| *c != ConstValue::None);
        let kind = match class {
            DeclClass::Signal => ObjectKind::Signal,
            DeclClass::Variable => ObjectKind::Variable,
            DeclClass::Port(dir) => ObjectKind::Port(match dir {
                weft_ast::PortDirection::In => PortDirection::In,
                weft_ast::PortDirection::Out => PortDirection::Out,
                weft_ast::PortDirection::Inout => PortDirection::InOut,
            }),
        };
        let ty = match ty {
            TypeSpec::Bit => Type::Bit,
            TypeSpec::Bool => Type::Bool,
            TypeSpec::BitVector { width } => Type::Bits { width },
            TypeSpec::Unsigned { width } => Type::Unsigned { width },
            TypeSpec::Signed { width } => Type::Signed { width },
        };
        let ident = self.design.unique_name(name, self.interner);
        let id = self.design.add_object(ident, kind, ty, default, span);
        log::debug!("declared {kind:?} `{}`", self.interner.resolve(ident));
        Ok(Value::Object(id))
    }

    /// Checks that `mode` may be applied to `obj` here and records it.
    pub fn check_assignment(&mut self, obj: ObjectId, mode: AssignMode, span: Span) -> CompileResult<()> {
        let object = self.design.object(obj);
        let name = self.interner.resolve(object.name).to_string();
        let Some(cx) = self.cx.as_mut() else {
            return Err(CompileError::unsupported(
                "assignments are only allowed inside a context",
                span,
            ));
        };
        if object.is_input() {
            return Err(CompileError::assignment_mode(
                format!("cannot assign to input port `{name}`"),
                span,
            ));
        }
        if object.is_variable() {
            if mode != AssignMode::Value {
                return Err(CompileError::assignment_mode(
                    format!("variable `{name}` must be assigned with VALUE, not {mode}"),
                    span,
                ));
            }
            if !cx.sequential {
                return Err(CompileError::assignment_mode(
                    format!("variable `{name}` assigned outside a sequential context"),
                    span,
                ));
            }
        } else {
            if mode == AssignMode::Value {
                return Err(CompileError::assignment_mode(
                    format!("signal `{name}` must be assigned with NEXT or PUSH, not VALUE"),
                    span,
                ));
            }
            if mode == AssignMode::Push {
                if object.default.is_none() {
                    return Err(CompileError::assignment_mode(
                        format!("PUSH on `{name}` requires a default value"),
                        span,
                    )
                    .with_related(object.span, "declared here"));
                }
                if !cx.sequential {
                    return Err(CompileError::assignment_mode(
                        format!("PUSH on `{name}` is not allowed in a concurrent context"),
                        span,
                    ));
                }
            }
        }
        let previous = cx.modes.get(&obj).copied().or(object.mode);
        if let Some(previous) = previous {
            if previous != mode {
                return Err(CompileError::assignment_mode(
                    format!("`{name}` is assigned with both {previous} and {mode}"),
                    span,
                ));
            }
        }
        cx.modes.insert(obj, mode);
        Ok(())
    }

    /// Runs `f` one runtime nesting level deeper.
    pub fn in_runtime<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.frame.runtime_depth += 1;
        let result = f(self);
        self.frame.runtime_depth -= 1;
        result
    }
}
