//! Reading tracer output from disk.

use crate::design::SourceDesign;
use std::path::Path;
use weft_common::ContentHash;

/// Failure to read or decode a tracer output file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read input tree: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON is not a valid design tree.
    #[error("invalid input tree at line {line}, column {column}: {message}")]
    Json {
        /// Decoder message.
        message: String,
        /// 1-indexed line in the JSON text.
        line: usize,
        /// 1-indexed column in the JSON text.
        column: usize,
    },
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Json {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

impl SourceDesign {
    /// Decodes a design from tracer JSON.
    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encodes the design as pretty JSON.
    pub fn to_json(&self) -> String {
        // Serializing plain data with string keys cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Reads a design file, returning it with the digest of its bytes.
pub fn load_design(path: &Path) -> Result<(SourceDesign, ContentHash), LoadError> {
    let text = std::fs::read_to_string(path)?;
    let hash = ContentHash::from_str_content(&text);
    Ok((SourceDesign::from_json(&text)?, hash))
}
