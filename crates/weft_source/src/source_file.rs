//! A registered host source file.

use crate::file_id::FileId;
use weft_common::ContentHash;
use std::path::PathBuf;

/// A host file known to the session.
///
/// The text is optional: tracer output may reference files that are not
/// available where the compiler runs, in which case diagnostics print the
/// location without a snippet.
pub struct SourceFile {
    /// Identifier used by spans.
    pub id: FileId,
    /// Path as reported by the tracer.
    pub path: PathBuf,
    /// File text, if it could be loaded.
    pub content: Option<String>,
    /// Digest of `content`, if present.
    pub content_hash: Option<ContentHash>,
    line_starts: Vec<usize>,
}

impl SourceFile {
    /// Creates a file entry, indexing line starts when text is available.
    pub fn new(id: FileId, path: PathBuf, content: Option<String>) -> Self {
        let line_starts = content
            .as_deref()
            .map(compute_line_starts)
            .unwrap_or_default();
        let content_hash = content.as_deref().map(ContentHash::from_str_content);
        Self {
            id,
            path,
            content,
            content_hash,
            line_starts,
        }
    }

    /// Returns the text of the 1-indexed `line`, without its newline.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let content = self.content.as_deref()?;
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(content.len(), |next| next - 1);
        Some(content[start..end].trim_end_matches('\r'))
    }

    /// Number of lines, or 0 when the text is unavailable.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

fn compute_line_starts(content: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(content.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}
