//! Source locations resolved to a printable path.

use std::fmt;
use std::path::PathBuf;

/// A [`Span`](crate::Span) paired with the path of its host file.
///
/// Produced by [`SourceDb::resolve_span`](crate::SourceDb::resolve_span).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// Path of the host file, or `<unknown>` when the file was never registered.
    pub file_path: PathBuf,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column.
    pub col: u32,
}

impl fmt::Display for ResolvedSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file_path.display(), self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let r = ResolvedSpan {
            file_path: PathBuf::from("blink.py"),
            line: 14,
            col: 9,
        };
        assert_eq!(r.to_string(), "blink.py:14:9");
    }
}
