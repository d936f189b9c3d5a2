//! Storage objects: the only mutable, synthesizable entities.

use crate::ids::{ContextId, ObjectId, TypeId};
use crate::value::ConstValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use weft_common::Ident;
use weft_source::Span;

/// Direction of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// Input.
    In,
    /// Output.
    Out,
    /// Bidirectional.
    InOut,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PortDirection::In => "in",
            PortDirection::Out => "out",
            PortDirection::InOut => "inout",
        })
    }
}

/// Storage class of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// An internal signal.
    Signal,
    /// A signal on the entity boundary.
    Port(PortDirection),
    /// A variable local to one sequential context.
    Variable,
}

/// Assignment operator applied to an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignMode {
    /// Signal update visible after the current cycle; holds its value otherwise.
    Next,
    /// Signal update that falls back to the default in every cycle it is
    /// not written.
    Push,
    /// Immediate variable update.
    Value,
}

impl fmt::Display for AssignMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssignMode::Next => "NEXT",
            AssignMode::Push => "PUSH",
            AssignMode::Value => "VALUE",
        })
    }
}

/// A signal, port or variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageObject {
    /// This object's ID.
    pub id: ObjectId,
    /// Unique name within the design.
    pub name: Ident,
    /// Storage class.
    pub kind: ObjectKind,
    /// Element type.
    pub ty: TypeId,
    /// Default (reset) value.
    pub default: Option<ConstValue>,
    /// Assignment mode, fixed by the first successful assignment.
    pub mode: Option<AssignMode>,
    /// The context driving this object, once one has been committed.
    pub driver: Option<ContextId>,
    /// Buffer signal mirroring this output port, when the port is read.
    pub buffer: Option<ObjectId>,
    /// The port this object buffers.
    pub buffer_of: Option<ObjectId>,
    /// Declaration site.
    pub span: Span,
}

impl StorageObject {
    /// Returns `true` for signals and ports.
    pub fn is_signal(&self) -> bool {
        !self.is_variable()
    }

    /// Returns `true` for variables.
    pub fn is_variable(&self) -> bool {
        self.kind == ObjectKind::Variable
    }

    /// Returns the direction if this is a port.
    pub fn port_direction(&self) -> Option<PortDirection> {
        match self.kind {
            ObjectKind::Port(dir) => Some(dir),
            _ => None,
        }
    }

    /// Returns `true` for input ports.
    pub fn is_input(&self) -> bool {
        self.port_direction() == Some(PortDirection::In)
    }

    /// Returns `true` for `out` ports, which cannot be read back directly.
    pub fn is_output(&self) -> bool {
        self.port_direction() == Some(PortDirection::Out)
    }
}
