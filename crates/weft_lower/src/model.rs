//! The lowered design: structured blocks with every name resolved.
//!
//! Nothing here refers back to arena IDs, so a backend needs no access to the
//! IR or the interner. The whole model serializes with `serde`.

use serde::{Deserialize, Serialize};
use std::fmt;
use weft_common::Frequency;
use weft_ir::{AssignMode, BinaryOp, ConstValue, Edge, PortDirection, Type, UnaryOp};

/// A design ready for a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoweredDesign {
    /// Entity name.
    pub name: String,
    /// Entity ports in declaration order.
    pub ports: Vec<LPort>,
    /// Internal signals, buffers included.
    pub signals: Vec<LSignal>,
    /// One block per successfully compiled context.
    pub blocks: Vec<Block>,
    /// `port <= buffer` for every buffered output port.
    pub mirrors: Vec<Mirror>,
}

impl LoweredDesign {
    /// Finds the block lowered from the context `name`.
    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.context() == name)
    }
}

/// An entity port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LPort {
    /// Port name.
    pub name: String,
    /// Direction.
    pub direction: PortDirection,
    /// Element type.
    pub ty: Type,
    /// Initial value.
    #[serde(default)]
    pub default: Option<ConstValue>,
}

/// An internal signal or a process variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LSignal {
    /// Name.
    pub name: String,
    /// Element type; `None` when it could not be inferred.
    pub ty: Option<Type>,
    /// Initial value.
    #[serde(default)]
    pub default: Option<ConstValue>,
}

/// Continuous assignment of an output port from its buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mirror {
    /// Output port.
    pub port: String,
    /// Buffer signal read inside the design.
    pub buffer: String,
}

/// Output of one context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// Unconditional driving statements.
    Concurrent(ConcurrentBlock),
    /// A clocked process.
    Process(Process),
}

impl Block {
    /// Name of the originating context.
    pub fn context(&self) -> &str {
        match self {
            Block::Concurrent(c) => &c.context,
            Block::Process(p) => &p.context,
        }
    }
}

/// Lowered concurrent context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcurrentBlock {
    /// Context name.
    pub context: String,
    /// Statements in source order.
    pub body: Vec<LStmt>,
}

/// Clock of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LClock {
    /// Clock signal.
    pub signal: String,
    /// Active edge.
    pub edge: Edge,
    /// Nominal frequency.
    #[serde(default)]
    pub frequency: Option<Frequency>,
}

/// Reset of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LReset {
    /// Reset signal.
    pub signal: String,
    /// Asserted when high.
    pub active_high: bool,
    /// Acts outside the clock edge.
    pub asynchronous: bool,
}

/// State register of a multi-state process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRegister {
    /// Register name.
    pub name: String,
    /// State labels, indexed by state number.
    pub states: Vec<String>,
}

/// Lowered sequential context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    /// Context name.
    pub context: String,
    /// Clock.
    pub clock: Option<LClock>,
    /// Reset.
    pub reset: Option<LReset>,
    /// Process variables, temporaries included.
    pub variables: Vec<LSignal>,
    /// State register when the process has more than one state.
    pub state: Option<StateRegister>,
    /// Executed while reset is asserted.
    pub reset_body: Vec<LStmt>,
    /// `PUSH` defaults executed first on every clock edge.
    pub defaults: Vec<LStmt>,
    /// Per-edge behavior.
    pub body: ProcessBody,
}

/// Per-edge behavior of a process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessBody {
    /// One state: the statements run on every edge.
    Single(Vec<LStmt>),
    /// A dispatch over the state register.
    Dispatch(Vec<StateArm>),
}

/// One arm of a state dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateArm {
    /// State number.
    pub state: u32,
    /// Why the state exists.
    pub label: String,
    /// Statements, ending in state transitions.
    pub body: Vec<LStmt>,
}

/// A lowered statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LStmt {
    /// Assignment.
    Assign {
        /// Target.
        target: LTarget,
        /// Value.
        value: LExpr,
        /// Operator.
        mode: AssignMode,
    },
    /// Conditional.
    If {
        /// Condition.
        cond: LExpr,
        /// Taken when true.
        then_body: Vec<LStmt>,
        /// Taken when false.
        else_body: Vec<LStmt>,
    },
    /// Runtime assertion.
    Assert {
        /// Asserted condition.
        cond: LExpr,
        /// Failure message.
        message: Option<String>,
    },
    /// Sets the state register for the next edge.
    NextState(u32),
}

/// Left-hand side of a lowered assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LTarget {
    /// Assigned name.
    pub name: String,
    /// Assigned part.
    #[serde(default)]
    pub select: Option<LSelect>,
}

impl LTarget {
    /// The whole object.
    pub fn whole(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            select: None,
        }
    }
}

impl fmt::Display for LTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.select {
            None => f.write_str(&self.name),
            Some(LSelect::Bit(index)) => write!(f, "{}[{index}]", self.name),
            Some(LSelect::Range { start, stop }) => write!(f, "{}[{start}:{stop}]", self.name),
        }
    }
}

/// Part of a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LSelect {
    /// One bit.
    Bit(LExpr),
    /// Bits `start` (inclusive) to `stop` (exclusive).
    Range {
        /// Lowest bit.
        start: u32,
        /// One past the highest bit.
        stop: u32,
    },
}

/// A lowered expression over names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LExpr {
    /// Constant.
    Const(ConstValue),
    /// Reads a signal, port or variable.
    Name(String),
    /// Unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<LExpr>,
    },
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<LExpr>,
        /// Right operand.
        rhs: Box<LExpr>,
    },
    /// Single bit.
    Index {
        /// Indexed value.
        base: Box<LExpr>,
        /// Bit index.
        index: Box<LExpr>,
    },
    /// Bit range.
    Slice {
        /// Sliced value.
        base: Box<LExpr>,
        /// Lowest bit.
        start: u32,
        /// One past the highest bit.
        stop: u32,
    },
    /// Concatenation, most significant first.
    Concat(Vec<LExpr>),
    /// Two-way selection.
    Select {
        /// Condition.
        cond: Box<LExpr>,
        /// Value when true.
        then: Box<LExpr>,
        /// Value when false.
        otherwise: Box<LExpr>,
    },
}

impl fmt::Display for LExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LExpr::Const(c) => write!(f, "{c}"),
            LExpr::Name(name) => f.write_str(name),
            LExpr::Unary { op, operand } => write!(f, "{}{operand}", op.symbol()),
            LExpr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            LExpr::Index { base, index } => write!(f, "{base}[{index}]"),
            LExpr::Slice { base, start, stop } => write!(f, "{base}[{start}:{stop}]"),
            LExpr::Concat(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            LExpr::Select {
                cond,
                then,
                otherwise,
            } => write!(f, "({then} if {cond} else {otherwise})"),
        }
    }
}
