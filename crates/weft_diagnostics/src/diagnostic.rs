//! Structured diagnostic messages.

use crate::code::DiagnosticCode;
use crate::label::Label;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};
use weft_source::Span;

/// A message for the user with a code, a location, and optional context.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: Severity,
    /// Stable code identifying the kind of problem.
    pub code: DiagnosticCode,
    /// Main message.
    pub message: String,
    /// Host location the message refers to.
    pub primary_span: Span,
    /// Name of the context being compiled when the diagnostic was raised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Related locations.
    pub labels: Vec<Label>,
    /// Explanatory notes.
    pub notes: Vec<String>,
    /// Suggestions.
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_severity(
        severity: Severity,
        code: DiagnosticCode,
        message: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            primary_span: span,
            context: None,
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Error, code, message, span)
    }

    /// Creates a warning diagnostic.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self::with_severity(Severity::Warning, code, message, span)
    }

    /// Records the context the diagnostic belongs to.
    pub fn in_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Adds a label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Adds a help message.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{E301, W300};

    #[test]
    fn create_error() {
        let diag = Diagnostic::error(E301, "cannot PUSH to `q`", Span::at(3, 5));
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code.to_string(), "E301");
        assert!(diag.context.is_none());
    }

    #[test]
    fn builder_methods() {
        let diag = Diagnostic::warning(W300, "temporary crosses a state", Span::DUMMY)
            .in_context("main")
            .with_label(Label::secondary(Span::at(1, 1), "computed here"))
            .with_note("the value is recomputed in the later state")
            .with_help("store it in a variable");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.context.as_deref(), Some("main"));
        assert_eq!(diag.labels.len(), 1);
        assert_eq!(diag.notes.len(), 1);
        assert_eq!(diag.help.len(), 1);
    }
}
