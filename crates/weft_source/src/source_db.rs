//! Registry of host source files referenced by the input tree.

use crate::file_id::FileId;
use crate::resolved_span::ResolvedSpan;
use crate::source_file::SourceFile;
use crate::span::Span;
use std::path::{Path, PathBuf};

/// All host files of a compilation session, indexed by [`FileId`].
pub struct SourceDb {
    files: Vec<SourceFile>,
}

impl SourceDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self { files: Vec::new() }
    }

    /// Registers a host file, reading its text if the path is readable.
    ///
    /// Unreadable files are still registered so that their spans resolve to
    /// a path.
    pub fn register_path(&mut self, path: &Path) -> FileId {
        let content = std::fs::read_to_string(path).ok();
        self.push(path.to_path_buf(), content)
    }

    /// Registers a file from an in-memory string.
    pub fn add_source(&mut self, name: impl Into<PathBuf>, content: String) -> FileId {
        self.push(name.into(), Some(content))
    }

    fn push(&mut self, path: PathBuf, content: Option<String>) -> FileId {
        let id = FileId::from_raw(self.files.len() as u32);
        self.files.push(SourceFile::new(id, path, content));
        id
    }

    /// Returns the file for `id`, if registered.
    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.as_raw() as usize)
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no file is registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Attaches a path to a span for display.
    pub fn resolve_span(&self, span: Span) -> ResolvedSpan {
        let file_path = self
            .get_file(span.file)
            .map(|f| f.path.clone())
            .unwrap_or_else(|| PathBuf::from("<unknown>"));
        ResolvedSpan {
            file_path,
            line: span.line,
            col: span.col,
        }
    }

    /// Returns the host line a span points into, if the text is available.
    pub fn line_text(&self, span: Span) -> Option<&str> {
        self.get_file(span.file)?.line_text(span.line)
    }
}

impl Default for SourceDb {
    fn default() -> Self {
        Self::new()
    }
}
