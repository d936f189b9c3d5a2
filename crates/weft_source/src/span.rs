//! Tracer-supplied source positions.

use crate::file_id::FileId;
use serde::{Deserialize, Serialize};

/// A line/column position in a host source file.
///
/// Lines and columns are 1-indexed as reported by the tracer. Nodes created by
/// the compiler itself (buffers, state registers, defaults) use [`Span::DUMMY`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Span {
    /// The host file.
    #[serde(default)]
    pub file: FileId,
    /// 1-indexed line number, 0 when unknown.
    #[serde(default)]
    pub line: u32,
    /// 1-indexed column number, 0 when unknown.
    #[serde(default)]
    pub col: u32,
}

impl Span {
    /// Span for nodes with no host location.
    pub const DUMMY: Span = Span {
        file: FileId::DUMMY,
        line: 0,
        col: 0,
    };

    /// Creates a span at the given position.
    pub fn new(file: FileId, line: u32, col: u32) -> Self {
        Self { file, line, col }
    }

    /// Shorthand for a position in file 0, used heavily by tests and by
    /// single-file tracer output.
    pub fn at(line: u32, col: u32) -> Self {
        Self::new(FileId::from_raw(0), line, col)
    }

    /// Returns `true` if this is the dummy span.
    pub fn is_dummy(&self) -> bool {
        self.file == FileId::DUMMY
    }

    /// Returns `self` unless it is dummy, in which case `fallback`.
    pub fn or(self, fallback: Span) -> Span {
        if self.is_dummy() {
            fallback
        } else {
            self
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::DUMMY
    }
}
