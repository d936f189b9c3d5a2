//! The weft intermediate representation.
//!
//! After resolution and normalization every context of a design is a flat
//! list of [`Stmt`]s over [`StorageObject`]s and per-context
//! [`Temporary`]s: all compile-time constructs (constant branches, unrolled
//! loops, inlined calls) are gone. Sequential contexts additionally carry the
//! [`StateGraph`] produced by state synthesis.

#![warn(missing_docs)]

pub mod arena;
pub mod context;
pub mod design;
pub mod expr;
pub mod ids;
pub mod object;
pub mod state;
pub mod stmt;
pub mod types;
pub mod value;

pub use arena::{Arena, ArenaId};
pub use context::{Clock, Context, ContextKind, Edge, Reset, Temporary};
pub use design::{Design, DesignNames};
pub use expr::{BinaryOp, Expr, NameSource, RawNames, UnaryOp};
pub use ids::{ContextId, ObjectId, StateId, TempId, TypeId};
pub use object::{AssignMode, ObjectKind, PortDirection, StorageObject};
pub use state::{Guard, State, StateGraph, StateStmt, Transition};
pub use stmt::{Select, Stmt, Target};
pub use types::{Type, TypeDb};
pub use value::ConstValue;
