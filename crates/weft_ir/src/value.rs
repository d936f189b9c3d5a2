//! Constant scalars that survive into the IR.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A compile-time scalar embedded in a runtime expression or used as an
/// object's default.
///
/// Containers (tuples, dictionaries, ranges) never reach the IR; they are
/// resolved away during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstValue {
    /// An integer.
    Int(i64),
    /// A boolean.
    Bool(bool),
    /// A bit string, most significant bit first.
    Bits(String),
    /// Text. Only legal as an assertion message or compile-time key.
    Str(String),
    /// The absent value.
    None,
}

impl ConstValue {
    /// Host truthiness: zero, `False`, empty strings and `None` are false.
    pub fn truthy(&self) -> bool {
        match self {
            ConstValue::Int(v) => *v != 0,
            ConstValue::Bool(b) => *b,
            ConstValue::Bits(s) => s.contains('1'),
            ConstValue::Str(s) => !s.is_empty(),
            ConstValue::None => false,
        }
    }

    /// Returns the integer value of ints, booleans and bit strings.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConstValue::Int(v) => Some(*v),
            ConstValue::Bool(b) => Some(i64::from(*b)),
            ConstValue::Bits(s) if s.len() < 64 => i64::from_str_radix(s, 2).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Int(v) => write!(f, "{v}"),
            ConstValue::Bool(true) => f.write_str("true"),
            ConstValue::Bool(false) => f.write_str("false"),
            ConstValue::Bits(s) => write!(f, "\"{s}\""),
            ConstValue::Str(s) => write!(f, "{s:?}"),
            ConstValue::None => f.write_str("none"),
        }
    }
}
