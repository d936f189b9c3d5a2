//! Opaque `u32` IDs for IR entities.
//!
//! IDs are handed out by [`Arena::alloc`](crate::arena::Arena::alloc) and are
//! stable for the lifetime of their arena.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// A storage object (signal, port or variable) of the design.
    ObjectId,
    "obj"
);

define_id!(
    /// A temporary within one context.
    TempId,
    "t"
);

define_id!(
    /// A state of a synthesized state machine. State 0 is always initial.
    StateId,
    "S"
);

define_id!(
    /// A context of the design.
    ContextId,
    "ctx"
);

define_id!(
    /// An interned type in the [`TypeDb`](crate::types::TypeDb).
    TypeId,
    "ty"
);

impl StateId {
    /// The initial state of every state graph.
    pub const INITIAL: StateId = StateId(0);
}
