//! Element types of storage objects.

use crate::ids::TypeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Element type of a storage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Type {
    /// A single bit.
    Bit,
    /// A boolean.
    Bool,
    /// An uninterpreted bit vector.
    Bits {
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

impl Type {
    /// Width in bits.
    pub fn width(self) -> u32 {
        match self {
            Type::Bit | Type::Bool => 1,
            Type::Bits { width } | Type::Unsigned { width } | Type::Signed { width } => width,
        }
    }

    /// Returns `true` for the single-bit scalar types.
    pub fn is_scalar(self) -> bool {
        matches!(self, Type::Bit | Type::Bool)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bit => f.write_str("bit"),
            Type::Bool => f.write_str("boolean"),
            Type::Bits { width } => write!(f, "bits({width})"),
            Type::Unsigned { width } => write!(f, "unsigned({width})"),
            Type::Signed { width } => write!(f, "signed({width})"),
        }
    }
}

/// Deduplicating store of [`Type`]s.
///
/// Objects refer to their element type by [`TypeId`], so two objects share an
/// ID exactly when their types are equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDb {
    types: Vec<Type>,
}

impl TypeDb {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `ty`, returning the existing ID for an equal type.
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(i) = self.types.iter().position(|t| *t == ty) {
            return TypeId::from_raw(i as u32);
        }
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Returns the type for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not interned here.
    pub fn get(&self, id: TypeId) -> Type {
        self.types[id.as_raw() as usize]
    }

    /// Width in bits of the type for `id`.
    pub fn bit_width(&self, id: TypeId) -> u32 {
        self.get(id).width()
    }

    /// Number of interned types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if nothing was interned.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_dedups() {
        let mut db = TypeDb::new();
        let a = db.intern(Type::Unsigned { width: 8 });
        let b = db.intern(Type::Unsigned { width: 8 });
        let c = db.intern(Type::Signed { width: 8 });
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(db.len(), 2);
    }

    #[test]
    fn widths() {
        let mut db = TypeDb::new();
        let bit = db.intern(Type::Bit);
        let word = db.intern(Type::Bits { width: 16 });
        assert_eq!(db.bit_width(bit), 1);
        assert_eq!(db.bit_width(word), 16);
        assert!(Type::Bool.is_scalar());
        assert!(!Type::Bits { width: 1 }.is_scalar());
    }

    #[test]
    fn display() {
        assert_eq!(Type::Unsigned { width: 4 }.to_string(), "unsigned(4)");
        assert_eq!(Type::Bool.to_string(), "boolean");
    }
}
