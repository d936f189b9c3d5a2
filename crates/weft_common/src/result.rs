//! Result type for internal compiler failures.

/// Result of an operation that can only fail because of a compiler bug.
///
/// User-facing problems (bad assignments, unbounded recursion, ...) are never
/// reported through this type; they travel as diagnostics.
pub type WeftResult<T> = Result<T, InternalError>;

/// A broken internal invariant inside weft.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("internal compiler error: {message}")]
pub struct InternalError {
    /// What went wrong.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for InternalError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let err = InternalError::new("dangling state id");
        assert_eq!(format!("{err}"), "internal compiler error: dangling state id");
    }

    #[test]
    fn question_mark_conversion() {
        fn fails() -> WeftResult<()> {
            Err("bad arena index")?
        }
        assert_eq!(fails().unwrap_err().message, "bad arena index");
    }

    #[test]
    fn from_string() {
        let err: InternalError = String::from("oops").into();
        assert_eq!(err.message, "oops");
    }
}
