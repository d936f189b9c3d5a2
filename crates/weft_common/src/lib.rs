//! Shared foundational types used across the weft compiler.
//!
//! This crate provides interned identifiers for design names, content hashing
//! of tracer input, clock frequency metadata, and the internal result type.

#![warn(missing_docs)]

pub mod frequency;
pub mod hash;
pub mod ident;
pub mod result;

pub use frequency::{Frequency, ParseFrequencyError};
pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{InternalError, WeftResult};
