//! Declared element types and storage classes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type written in a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeSpec {
    /// A single bit.
    Bit,
    /// A boolean.
    Bool,
    /// An uninterpreted bit vector.
    BitVector {
        /// Number of bits.
        width: u32,
    },
    /// An unsigned number.
    Unsigned {
        /// Number of bits.
        width: u32,
    },
    /// A two's complement number.
    Signed {
        /// Number of bits.
        width: u32,
    },
}

impl TypeSpec {
    /// Width in bits.
    pub fn width(self) -> u32 {
        match self {
            TypeSpec::Bit | TypeSpec::Bool => 1,
            TypeSpec::BitVector { width }
            | TypeSpec::Unsigned { width }
            | TypeSpec::Signed { width } => width,
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Bit => f.write_str("bit"),
            TypeSpec::Bool => f.write_str("bool"),
            TypeSpec::BitVector { width } => write!(f, "bits[{width}]"),
            TypeSpec::Unsigned { width } => write!(f, "unsigned[{width}]"),
            TypeSpec::Signed { width } => write!(f, "signed[{width}]"),
        }
    }
}

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// Driven from outside, read inside.
    In,
    /// Driven inside.
    Out,
    /// Bidirectional.
    Inout,
}

/// Storage class requested by a declaration expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclClass {
    /// An internal signal.
    Signal,
    /// A signal on the entity boundary.
    Port(PortDirection),
    /// A sequential-context variable.
    Variable,
}
