//! The fatal error taxonomy shared by every compiler pass.

use crate::code::{self, DiagnosticCode};
use crate::diagnostic::Diagnostic;
use crate::label::Label;
use serde::{Deserialize, Serialize};
use std::fmt;
use weft_source::Span;

/// Category of a fatal compile error.
///
/// Each kind fails the context it was raised in; other contexts keep
/// compiling. Runtime assertions are not errors and have no kind here.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A name was bound twice in one scope outside loop iterations and
    /// constructor scopes.
    Redefinition,
    /// An assignment mode is not allowed for the target or conflicts with a
    /// mode used earlier.
    InvalidAssignmentMode,
    /// An object has more than one driving context.
    MultipleDriver,
    /// A construct cannot be classified or is not allowed in this position.
    UnsupportedConstruct,
    /// Inlining recursion does not terminate.
    UnboundedRecursion,
    /// A suspension point appears in a concurrent context.
    InvalidSuspensionContext,
    /// A `continue` would duplicate code without ever crossing a state
    /// boundary.
    UnboundedDuplication,
    /// A compile-time assertion evaluated to false.
    CompileTimeAssertion,
    /// The input refers to something that does not exist.
    UnknownReference,
}

impl ErrorKind {
    /// Returns the diagnostic code for this kind.
    pub fn code(self) -> DiagnosticCode {
        match self {
            ErrorKind::Redefinition => code::E300,
            ErrorKind::InvalidAssignmentMode => code::E301,
            ErrorKind::MultipleDriver => code::E302,
            ErrorKind::UnsupportedConstruct => code::E303,
            ErrorKind::UnboundedRecursion => code::E304,
            ErrorKind::InvalidSuspensionContext => code::E305,
            ErrorKind::UnboundedDuplication => code::E306,
            ErrorKind::CompileTimeAssertion => code::E307,
            ErrorKind::UnknownReference => code::E101,
        }
    }

    /// Returns the stable error name.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Redefinition => "RedefinitionError",
            ErrorKind::InvalidAssignmentMode => "InvalidAssignmentModeError",
            ErrorKind::MultipleDriver => "MultipleDriverError",
            ErrorKind::UnsupportedConstruct => "UnsupportedConstructError",
            ErrorKind::UnboundedRecursion => "UnboundedRecursionError",
            ErrorKind::InvalidSuspensionContext => "InvalidSuspensionContextError",
            ErrorKind::UnboundedDuplication => "UnboundedDuplicationError",
            ErrorKind::CompileTimeAssertion => "CompileTimeAssertionError",
            ErrorKind::UnknownReference => "UnknownReferenceError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fatal error raised while compiling one context.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct CompileError {
    /// Error category.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Host location of the offending node.
    pub span: Span,
    /// Related locations.
    pub related: Vec<(Span, String)>,
    /// Extra notes.
    pub notes: Vec<String>,
}

impl CompileError {
    /// Creates an error.
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            related: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Adds a related location.
    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.related.push((span, message.into()));
        self
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Fills in the span if the error was raised without one.
    pub fn at(mut self, span: Span) -> Self {
        self.span = self.span.or(span);
        self
    }

    /// Shorthand for [`ErrorKind::Redefinition`].
    pub fn redefinition(name: &str, span: Span, first: Span) -> Self {
        Self::new(
            ErrorKind::Redefinition,
            format!("`{name}` is already bound in this scope"),
            span,
        )
        .with_related(first, "first bound here")
    }

    /// Shorthand for [`ErrorKind::InvalidAssignmentMode`].
    pub fn assignment_mode(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::InvalidAssignmentMode, message, span)
    }

    /// Shorthand for [`ErrorKind::UnsupportedConstruct`].
    pub fn unsupported(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::UnsupportedConstruct, message, span)
    }

    /// Shorthand for [`ErrorKind::InvalidSuspensionContext`].
    pub fn suspension_context(what: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::InvalidSuspensionContext,
            format!("`{what}` is not allowed in a concurrent context"),
            span,
        )
        .with_note("concurrent contexts cannot suspend; use a sequential context")
    }

    /// Shorthand for [`ErrorKind::UnknownReference`].
    pub fn unknown(what: &str, name: &str, span: Span) -> Self {
        Self::new(
            ErrorKind::UnknownReference,
            format!("unknown {what} `{name}`"),
            span,
        )
    }

    /// Converts into a diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = Diagnostic::error(self.kind.code(), self.to_string(), self.span);
        for (span, message) in &self.related {
            diag = diag.with_label(Label::secondary(*span, message.clone()));
        }
        for note in &self.notes {
            diag = diag.with_note(note.clone());
        }
        diag
    }
}

/// Result of a pass that can fail with a [`CompileError`].
pub type CompileResult<T> = Result<T, CompileError>;
