//! Diagnostics and the compile error taxonomy.
//!
//! Every pass of weft reports user-facing failures as a [`CompileError`],
//! whose [`ErrorKind`] names one of the fixed error categories (redefinition,
//! invalid assignment mode, multiple drivers, ...). The pipeline converts them
//! into [`Diagnostic`]s, collects them in a thread-safe [`DiagnosticSink`],
//! and a [`DiagnosticRenderer`] prints them for a terminal or as JSON.

#![warn(missing_docs)]

pub mod code;
pub mod compile_error;
pub mod diagnostic;
pub mod label;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use compile_error::{CompileError, CompileResult, ErrorKind};
pub use diagnostic::Diagnostic;
pub use label::{Label, LabelStyle};
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
