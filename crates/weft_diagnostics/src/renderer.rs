//! Terminal and JSON rendering of diagnostics.

use crate::diagnostic::Diagnostic;
use crate::label::LabelStyle;
use crate::severity::Severity;
use weft_source::SourceDb;

/// Formats a diagnostic for output.
pub trait DiagnosticRenderer {
    /// Renders one diagnostic.
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String;

    /// Renders a batch of diagnostics. The default joins single renders.
    fn render_all(&self, diags: &[Diagnostic], source_db: &SourceDb) -> String {
        diags.iter().map(|d| self.render(d, source_db)).collect()
    }
}

/// rustc-style terminal output.
///
/// ```text
/// error[E301]: InvalidAssignmentModeError: `q` was assigned with NEXT before
///   --> blink.py:12:9
///    |
/// 12 |         q.push = 1
///    |         ^
///    = note: in context `main`
/// ```
pub struct TerminalRenderer {
    /// Whether to use ANSI colors.
    pub color: bool,
}

impl TerminalRenderer {
    /// Creates a terminal renderer.
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, text: &str, ansi: &str) -> String {
        if self.color {
            format!("\x1b[{ansi}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn severity_color(severity: Severity) -> &'static str {
        match severity {
            Severity::Error => "1;31",
            Severity::Warning => "1;33",
            Severity::Note => "1;36",
        }
    }
}

impl DiagnosticRenderer for TerminalRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let mut out = String::new();
        let head = format!("{}[{}]", diag.severity, diag.code);
        out.push_str(&format!(
            "{}: {}\n",
            self.paint(&head, Self::severity_color(diag.severity)),
            diag.message
        ));

        if !diag.primary_span.is_dummy() {
            let span = diag.primary_span;
            out.push_str(&format!("  --> {}\n", source_db.resolve_span(span)));
            if let Some(text) = source_db.line_text(span) {
                let line_num = span.line.to_string();
                let pad = " ".repeat(line_num.len());
                let col_pad = " ".repeat((span.col as usize).saturating_sub(1));
                let primary = diag
                    .labels
                    .iter()
                    .find(|l| l.style == LabelStyle::Primary)
                    .map(|l| format!(" {}", l.message))
                    .unwrap_or_default();
                out.push_str(&format!("{pad} |\n"));
                out.push_str(&format!("{line_num} | {text}\n"));
                out.push_str(&format!("{pad} | {col_pad}^{primary}\n"));
            }
        }

        for label in diag.labels.iter().filter(|l| l.style == LabelStyle::Secondary) {
            if label.span.is_dummy() {
                out.push_str(&format!("   = note: {}\n", label.message));
            } else {
                out.push_str(&format!(
                    "   = note: {} at {}\n",
                    label.message,
                    source_db.resolve_span(label.span)
                ));
            }
        }
        if let Some(ctx) = &diag.context {
            out.push_str(&format!("   = note: in context `{ctx}`\n"));
        }
        for note in &diag.notes {
            out.push_str(&format!("   = note: {note}\n"));
        }
        for help in &diag.help {
            out.push_str(&format!("   = help: {help}\n"));
        }
        out
    }
}

/// One JSON object per line, suitable for editor integrations.
pub struct JsonRenderer;

impl DiagnosticRenderer for JsonRenderer {
    fn render(&self, diag: &Diagnostic, source_db: &SourceDb) -> String {
        let resolved = (!diag.primary_span.is_dummy())
            .then(|| source_db.resolve_span(diag.primary_span).to_string());
        let value = serde_json::json!({
            "severity": diag.severity,
            "code": diag.code.to_string(),
            "message": diag.message,
            "location": resolved,
            "context": diag.context,
            "notes": diag.notes,
            "help": diag.help,
        });
        format!("{value}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{E301, W300};
    use crate::label::Label;
    use weft_source::Span;

    #[test]
    fn render_error_with_source_line() {
        let mut db = SourceDb::new();
        let id = db.add_source("blink.py", "def main():\n    q.push = 1\n".to_string());
        let span = Span::new(id, 2, 5);
        let diag = Diagnostic::error(E301, "bad mode", span)
            .with_label(Label::primary(span, "PUSH here"))
            .in_context("main");

        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(out.contains("error[E301]: bad mode"));
        assert!(out.contains("--> blink.py:2:5"));
        assert!(out.contains("2 |     q.push = 1"));
        assert!(out.contains("  |     ^ PUSH here"));
        assert!(out.contains("= note: in context `main`"));
    }

    #[test]
    fn render_without_text_still_shows_location() {
        let mut db = SourceDb::new();
        db.register_path(std::path::Path::new("/nonexistent/host.py"));
        let diag = Diagnostic::warning(W300, "crossing", Span::at(7, 3));
        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(out.contains("warning[W300]: crossing"));
        assert!(out.contains("host.py:7:3"));
        assert!(!out.contains(" | "));
    }

    #[test]
    fn render_dummy_span_omits_location() {
        let db = SourceDb::new();
        let diag = Diagnostic::error(E301, "general", Span::DUMMY);
        let out = TerminalRenderer::new(false).render(&diag, &db);
        assert!(!out.contains("-->"));
    }

    #[test]
    fn color_wraps_header() {
        let db = SourceDb::new();
        let diag = Diagnostic::error(E301, "x", Span::DUMMY);
        let out = TerminalRenderer::new(true).render(&diag, &db);
        assert!(out.starts_with("\x1b[1;31merror[E301]"));
    }

    #[test]
    fn json_is_one_object_per_line() {
        let db = SourceDb::new();
        let diags = vec![
            Diagnostic::error(E301, "a", Span::DUMMY),
            Diagnostic::warning(W300, "b", Span::at(1, 2)),
        ];
        let out = JsonRenderer.render_all(&diags, &db);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["code"], "E301");
        assert_eq!(first["severity"], "error");
        assert!(first["location"].is_null());
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["location"], "<unknown>:1:2");
    }
}
