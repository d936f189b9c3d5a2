//! Runtime expressions.
//!
//! Everything compile-time has already been folded into [`Expr::Const`]; the
//! remaining tree only reads storage objects and temporaries.

use crate::ids::{ObjectId, TempId};
use crate::value::ConstValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Logical negation.
    Not,
    /// Arithmetic negation.
    Neg,
    /// Bitwise inversion.
    Invert,
}

impl UnaryOp {
    /// Printed form.
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "not ",
            UnaryOp::Neg => "-",
            UnaryOp::Invert => "~",
        }
    }
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Remainder.
    Mod,
    /// Shift left.
    Shl,
    /// Shift right.
    Shr,
    /// Bitwise and.
    BitAnd,
    /// Bitwise or.
    BitOr,
    /// Bitwise xor.
    BitXor,
    /// Logical and.
    And,
    /// Logical or.
    Or,
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Less than.
    Lt,
    /// Less or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater or equal.
    Ge,
}

impl BinaryOp {
    /// Printed form.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "mod",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

/// A runtime expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    /// A folded constant.
    Const(ConstValue),
    /// Reads a storage object.
    Object(ObjectId),
    /// Reads a temporary of the enclosing context.
    Temp(TempId),
    /// A unary operation.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// A single bit.
    Index {
        /// Indexed value.
        base: Box<Expr>,
        /// Bit index, possibly runtime.
        index: Box<Expr>,
    },
    /// Bits `start` (inclusive) to `stop` (exclusive).
    Slice {
        /// Sliced value.
        base: Box<Expr>,
        /// Lowest bit.
        start: u32,
        /// One past the highest bit.
        stop: u32,
    },
    /// Concatenation, most significant part first.
    Concat(Vec<Expr>),
    /// `then` when `cond` holds, else `otherwise`.
    Select {
        /// Condition.
        cond: Box<Expr>,
        /// Value when true.
        then: Box<Expr>,
        /// Value when false.
        otherwise: Box<Expr>,
    },
}

impl Expr {
    /// A boolean constant.
    pub fn bool(value: bool) -> Self {
        Expr::Const(ConstValue::Bool(value))
    }

    /// A unary operation.
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// A binary operation.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Logical negation, folding constants and double negation.
    pub fn negate(self) -> Self {
        match self {
            Expr::Const(c) => Expr::bool(!c.truthy()),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
            } => *operand,
            other => Expr::unary(UnaryOp::Not, other),
        }
    }

    /// Returns the constant if this expression is one.
    pub fn as_const(&self) -> Option<&ConstValue> {
        match self {
            Expr::Const(c) => Some(c),
            _ => None,
        }
    }

    fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Const(_) | Expr::Object(_) | Expr::Temp(_) => Vec::new(),
            Expr::Unary { operand, .. } => vec![operand.as_ref()],
            Expr::Binary { lhs, rhs, .. } => vec![lhs.as_ref(), rhs.as_ref()],
            Expr::Index { base, index } => vec![base.as_ref(), index.as_ref()],
            Expr::Slice { base, .. } => vec![base.as_ref()],
            Expr::Concat(items) => items.iter().collect(),
            Expr::Select {
                cond,
                then,
                otherwise,
            } => vec![cond.as_ref(), then.as_ref(), otherwise.as_ref()],
        }
    }

    /// Adds every object read by this expression to `out`.
    pub fn collect_objects(&self, out: &mut BTreeSet<ObjectId>) {
        if let Expr::Object(id) = self {
            out.insert(*id);
        }
        for child in self.children() {
            child.collect_objects(out);
        }
    }

    /// Adds every temporary read by this expression to `out`.
    pub fn collect_temps(&self, out: &mut BTreeSet<TempId>) {
        if let Expr::Temp(id) = self {
            out.insert(*id);
        }
        for child in self.children() {
            child.collect_temps(out);
        }
    }

    /// Rebuilds the expression, replacing leaves with `f`'s result where it
    /// returns `Some`.
    pub fn map_leaves(&self, f: &mut impl FnMut(&Expr) -> Option<Expr>) -> Expr {
        if let Some(replaced) = f(self) {
            return replaced;
        }
        match self {
            Expr::Const(_) | Expr::Object(_) | Expr::Temp(_) => self.clone(),
            Expr::Unary { op, operand } => Expr::unary(*op, operand.map_leaves(f)),
            Expr::Binary { op, lhs, rhs } => Expr::binary(*op, lhs.map_leaves(f), rhs.map_leaves(f)),
            Expr::Index { base, index } => Expr::Index {
                base: Box::new(base.map_leaves(f)),
                index: Box::new(index.map_leaves(f)),
            },
            Expr::Slice { base, start, stop } => Expr::Slice {
                base: Box::new(base.map_leaves(f)),
                start: *start,
                stop: *stop,
            },
            Expr::Concat(items) => Expr::Concat(items.iter().map(|e| e.map_leaves(f)).collect()),
            Expr::Select {
                cond,
                then,
                otherwise,
            } => Expr::Select {
                cond: Box::new(cond.map_leaves(f)),
                then: Box::new(then.map_leaves(f)),
                otherwise: Box::new(otherwise.map_leaves(f)),
            },
        }
    }

    /// Renders the expression with names from `names`.
    pub fn display<'a, N: NameSource>(&'a self, names: &'a N) -> ExprDisplay<'a, N> {
        ExprDisplay { expr: self, names }
    }
}

/// Supplies printable names for objects and temporaries.
pub trait NameSource {
    /// Name of a storage object.
    fn object_name(&self, id: ObjectId) -> String;

    /// Name of a temporary.
    fn temp_name(&self, id: TempId) -> String;

    /// Defining expression of a temporary, when known.
    fn temp_value(&self, _id: TempId) -> Option<&Expr> {
        None
    }
}

/// Names objects and temporaries by their raw IDs.
pub struct RawNames;

impl NameSource for RawNames {
    fn object_name(&self, id: ObjectId) -> String {
        id.to_string()
    }

    fn temp_name(&self, id: TempId) -> String {
        id.to_string()
    }
}

/// [`Display`](fmt::Display) adapter returned by [`Expr::display`].
pub struct ExprDisplay<'a, N> {
    expr: &'a Expr,
    names: &'a N,
}

impl<N: NameSource> ExprDisplay<'_, N> {
    fn child<'b>(&'b self, expr: &'b Expr) -> ExprDisplay<'b, N> {
        ExprDisplay {
            expr,
            names: self.names,
        }
    }
}

impl<N: NameSource> fmt::Display for ExprDisplay<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expr {
            Expr::Const(c) => write!(f, "{c}"),
            Expr::Object(id) => f.write_str(&self.names.object_name(*id)),
            Expr::Temp(id) => f.write_str(&self.names.temp_name(*id)),
            Expr::Unary { op, operand } => write!(f, "{}{}", op.symbol(), self.child(operand)),
            Expr::Binary { op, lhs, rhs } => write!(
                f,
                "({} {} {})",
                self.child(lhs),
                op.symbol(),
                self.child(rhs)
            ),
            Expr::Index { base, index } => {
                write!(f, "{}[{}]", self.child(base), self.child(index))
            }
            Expr::Slice { base, start, stop } => {
                write!(f, "{}[{start}:{stop}]", self.child(base))
            }
            Expr::Concat(items) => {
                let parts: Vec<String> = items.iter().map(|e| self.child(e).to_string()).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Expr::Select {
                cond,
                then,
                otherwise,
            } => write!(
                f,
                "({} if {} else {})",
                self.child(then),
                self.child(cond),
                self.child(otherwise)
            ),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display(&RawNames).fmt(f)
    }
}
