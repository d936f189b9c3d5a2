//! Top-level input: global bindings, functions and contexts.

use crate::expr::Expr;
use crate::stmt::Stmt;
use serde::{Deserialize, Serialize};
use weft_source::Span;

/// Everything the tracer recorded for one design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDesign {
    /// Entity name.
    pub name: String,
    /// Host file paths; a span's file id indexes this list.
    #[serde(default)]
    pub files: Vec<String>,
    /// Global statements, run once before any context. They declare the
    /// design's storage objects and constants.
    #[serde(default)]
    pub globals: Vec<Stmt>,
    /// Functions available for inlining.
    #[serde(default)]
    pub functions: Vec<FunctionDef>,
    /// Contexts, compiled in order.
    #[serde(default)]
    pub contexts: Vec<ContextDecl>,
}

impl SourceDesign {
    /// Creates an empty design.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            globals: Vec::new(),
            functions: Vec::new(),
            contexts: Vec::new(),
        }
    }

    /// Appends a global statement.
    pub fn global(mut self, stmt: Stmt) -> Self {
        self.globals.push(stmt);
        self
    }

    /// Appends a function.
    pub fn function(mut self, func: FunctionDef) -> Self {
        self.functions.push(func);
        self
    }

    /// Appends a context.
    pub fn context(mut self, ctx: ContextDecl) -> Self {
        self.contexts.push(ctx);
        self
    }
}

/// Kind of a function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Positional-or-keyword parameter.
    #[default]
    Normal,
    /// `*rest`: collects surplus positional arguments.
    VarArgs,
    /// `**rest`: collects surplus keyword arguments.
    KwArgs,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Parameter kind.
    #[serde(default)]
    pub kind: ParamKind,
    /// Default value, evaluated in the global scope at each call.
    #[serde(default)]
    pub default: Option<Expr>,
}

impl Param {
    /// A required positional-or-keyword parameter.
    pub fn required(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Normal,
            default: None,
        }
    }

    /// A parameter with a default.
    pub fn with_default(name: &str, default: Expr) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Normal,
            default: Some(default),
        }
    }

    /// `*name`
    pub fn var_args(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::VarArgs,
            default: None,
        }
    }

    /// `**name`
    pub fn kw_args(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::KwArgs,
            default: None,
        }
    }
}

/// A host function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Function name, bound in the global scope.
    pub name: String,
    /// Parameters in declaration order.
    #[serde(default)]
    pub params: Vec<Param>,
    /// Body.
    pub body: Vec<Stmt>,
    /// `async` functions are coroutines and may only be awaited.
    #[serde(default)]
    pub is_async: bool,
    /// Constructor-like functions may rebind local names.
    #[serde(default)]
    pub constructor: bool,
    /// Host location of the definition.
    #[serde(default)]
    pub span: Span,
}

impl FunctionDef {
    /// A plain function.
    pub fn new(name: &str, params: Vec<Param>, body: Vec<Stmt>) -> Self {
        Self {
            name: name.to_string(),
            params,
            body,
            is_async: false,
            constructor: false,
            span: Span::DUMMY,
        }
    }

    /// Marks the function `async`.
    pub fn coroutine(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Marks the function as a constructor scope.
    pub fn constructor(mut self) -> Self {
        self.constructor = true;
        self
    }
}

/// Active clock edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// Rising edge.
    #[default]
    Rising,
    /// Falling edge.
    Falling,
}

/// Clock of a sequential context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockSpec {
    /// Global name bound to the clock signal.
    pub signal: String,
    /// Active edge.
    #[serde(default)]
    pub edge: Edge,
    /// Frequency metadata such as `"50MHz"`.
    #[serde(default)]
    pub frequency: Option<String>,
}

/// Reset of a sequential context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetSpec {
    /// Global name bound to the reset signal.
    pub signal: String,
    /// Reset is asserted when the signal is high.
    #[serde(default = "default_true")]
    pub active_high: bool,
    /// Reset acts without waiting for the clock edge.
    #[serde(default)]
    pub asynchronous: bool,
}

fn default_true() -> bool {
    true
}

/// Kind of a context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextKind {
    /// Unconditional driving statements.
    Concurrent,
    /// A clocked process.
    Sequential {
        /// Clock.
        #[serde(default)]
        clock: Option<ClockSpec>,
        /// Reset.
        #[serde(default)]
        reset: Option<ResetSpec>,
    },
}

/// A unit of translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextDecl {
    /// Context name.
    pub name: String,
    /// Concurrent or sequential.
    pub kind: ContextKind,
    /// Body.
    pub body: Vec<Stmt>,
    /// Host location.
    #[serde(default)]
    pub span: Span,
}

impl ContextDecl {
    /// A concurrent context.
    pub fn concurrent(name: &str, body: Vec<Stmt>) -> Self {
        Self {
            name: name.to_string(),
            kind: ContextKind::Concurrent,
            body,
            span: Span::DUMMY,
        }
    }

    /// A sequential context clocked on the rising edge of `clock`.
    pub fn sequential(name: &str, clock: &str, body: Vec<Stmt>) -> Self {
        Self {
            name: name.to_string(),
            kind: ContextKind::Sequential {
                clock: Some(ClockSpec {
                    signal: clock.to_string(),
                    edge: Edge::Rising,
                    frequency: None,
                }),
                reset: None,
            },
            body,
            span: Span::DUMMY,
        }
    }

    /// Adds a synchronous reset to a sequential context.
    pub fn with_reset(mut self, signal: &str, active_high: bool, asynchronous: bool) -> Self {
        if let ContextKind::Sequential { reset, .. } = &mut self.kind {
            *reset = Some(ResetSpec {
                signal: signal.to_string(),
                active_high,
                asynchronous,
            });
        }
        self
    }

    /// Returns `true` for sequential contexts.
    pub fn is_sequential(&self) -> bool {
        matches!(self.kind, ContextKind::Sequential { .. })
    }
}
