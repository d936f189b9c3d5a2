//! The untyped statement tree consumed by weft.
//!
//! An external tracer walks the host procedures once and records them as a
//! [`SourceDesign`]: global bindings, function definitions and one statement
//! list per context. Nothing in this tree is classified yet: whether `x` is a
//! signal, a constant or a function is decided by the resolver. Trees are
//! usually read from the tracer's JSON with [`SourceDesign::from_json`], or
//! built directly with the constructors on [`Expr`] and [`Stmt`].

#![warn(missing_docs)]

pub mod design;
pub mod expr;
pub mod load;
pub mod stmt;
pub mod types;

pub use design::{
    ClockSpec, ContextDecl, ContextKind, Edge, FunctionDef, Param, ParamKind, ResetSpec,
    SourceDesign,
};
pub use expr::{Arg, BinaryOp, Expr, ExprKind, Literal, UnaryOp};
pub use load::{load_design, LoadError};
pub use stmt::{AssignMode, Stmt, StmtKind};
pub use types::{DeclClass, PortDirection, TypeSpec};
