//! Parsing and validation of `weft.toml` project files.
//!
//! The project file names the design, points at the tracer output to compile,
//! sets the compile limits used by inlining, unrolling and state synthesis,
//! and carries clock frequency metadata for the backend.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve_clocks, ResolvedClock};
pub use types::*;
