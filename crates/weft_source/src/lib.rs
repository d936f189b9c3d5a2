//! Host source locations for diagnostics.
//!
//! The tracer that produces weft's input tree records, for every node, the
//! file, line and column of the host statement it came from. This crate keeps
//! those locations as [`Span`]s and offers a [`SourceDb`] that maps
//! [`FileId`]s back to paths and, when the host file is readable, to the text
//! of the offending line.

#![warn(missing_docs)]

pub mod file_id;
pub mod resolved_span;
pub mod source_db;
pub mod source_file;
pub mod span;

pub use file_id::FileId;
pub use resolved_span::ResolvedSpan;
pub use source_db::SourceDb;
pub use source_file::SourceFile;
pub use span::Span;
