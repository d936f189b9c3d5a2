//! Helper constructors for elaboration errors and warnings.
//!
//! Fatal errors are [`CompileError`] values that fail the current context;
//! warnings go straight to the sink through [`Diagnostic`]s.

use crate::value::ItemsError;
use weft_diagnostics::code::W301;
use weft_diagnostics::{CompileError, Diagnostic, ErrorKind};
use weft_source::Span;

/// A value that must be known at compile time was not.
pub fn not_constant(what: &str, span: Span) -> CompileError {
    CompileError::unsupported(format!("{what} must be a compile-time constant"), span)
}

/// A `for` would unroll more iterations than allowed.
pub fn too_many_iterations(count: usize, limit: usize, span: Span) -> CompileError {
    CompileError::unsupported(
        format!("loop unrolls {count} iterations, more than the limit of {limit}"),
        span,
    )
    .with_note("raise `compile.max_unroll` in weft.toml if this is intended")
}

/// A constant sequence has more elements than the unroll limit allows.
pub fn too_many_elements(count: usize, limit: usize, span: Span) -> CompileError {
    CompileError::unsupported(
        format!("sequence of {count} elements is longer than the limit of {limit}"),
        span,
    )
    .with_note("raise `compile.max_unroll` in weft.toml if this is intended")
}

/// Reports a failed [`Value::items`](crate::value::Value::items).
/// `not_sequence` builds the error for values that are not sequences.
pub fn expansion(
    err: ItemsError,
    limit: usize,
    span: Span,
    not_sequence: impl FnOnce() -> CompileError,
) -> CompileError {
    match err {
        ItemsError::NotSequence => not_sequence(),
        ItemsError::TooLong(count) => too_many_elements(count, limit, span),
    }
}

/// Runtime branching where the context cannot branch.
pub fn runtime_branch(span: Span) -> CompileError {
    CompileError::unsupported(
        "a runtime condition is only allowed inside a sequential context",
        span,
    )
}

/// A call that repeats an active call with the same arguments.
pub fn recursive_call(function: &str, span: Span) -> CompileError {
    CompileError::new(
        ErrorKind::UnboundedRecursion,
        format!("call of `{function}` repeats an active call with the same arguments"),
        span,
    )
}

/// Inlining went deeper than the configured limit.
pub fn inline_depth(function: &str, limit: usize, span: Span) -> CompileError {
    CompileError::new(
        ErrorKind::UnboundedRecursion,
        format!("inlining `{function}` exceeds the depth limit of {limit}"),
        span,
    )
    .with_note("raise `compile.max_inline_depth` in weft.toml if this is intended")
}

/// Arguments do not fit the callee's parameters.
pub fn bad_arguments(function: &str, message: impl std::fmt::Display, span: Span) -> CompileError {
    CompileError::unsupported(format!("`{function}`: {message}"), span)
}

/// A failed compile-time assertion.
pub fn assertion_failed(message: Option<&str>, span: Span) -> CompileError {
    CompileError::new(
        ErrorKind::CompileTimeAssertion,
        message.unwrap_or("assertion failed at compile time"),
        span,
    )
}

/// Warning for `await` on a condition that never holds.
pub fn never_resumes(span: Span) -> Diagnostic {
    Diagnostic::warning(
        W301,
        "awaited condition is always false; the context never resumes",
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_diagnostics::Severity;

    #[test]
    fn kinds() {
        assert_eq!(
            recursive_call("f", Span::DUMMY).kind,
            ErrorKind::UnboundedRecursion
        );
        assert_eq!(
            assertion_failed(None, Span::DUMMY).kind,
            ErrorKind::CompileTimeAssertion
        );
        assert_eq!(
            too_many_iterations(10, 5, Span::DUMMY).kind,
            ErrorKind::UnsupportedConstruct
        );
    }

    #[test]
    fn assertion_message_is_kept() {
        let err = assertion_failed(Some("WIDTH must be even"), Span::DUMMY);
        assert_eq!(err.message, "WIDTH must be even");
    }

    #[test]
    fn never_resumes_is_a_warning() {
        assert_eq!(never_resumes(Span::DUMMY).severity, Severity::Warning);
    }
}
