//! Opaque identifier for host source files.

use serde::{Deserialize, Serialize};

/// Index of a host source file in the [`SourceDb`](crate::SourceDb).
///
/// The tracer numbers host files in the order it registers them; the same
/// numbers appear in every [`Span`](crate::Span) of the input tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(u32);

impl FileId {
    /// File id for compiler-generated nodes with no host location.
    pub const DUMMY: FileId = FileId(u32::MAX);

    /// Creates a `FileId` from a raw index.
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::DUMMY
    }
}
