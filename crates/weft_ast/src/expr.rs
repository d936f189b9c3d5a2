//! Expressions of the input tree.

use crate::types::{DeclClass, TypeSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use weft_source::Span;

/// A literal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    /// Integer.
    Int(i64),
    /// Boolean.
    Bool(bool),
    /// Bit string, most significant bit first (`"0101"`).
    Bits(String),
    /// Text.
    Str(String),
    /// The absent value.
    None,
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    /// Logical negation (`not`).
    Not,
    /// Arithmetic negation (`-`).
    Neg,
    /// Bitwise inversion (`~`).
    Invert,
}

/// A binary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// Short-circuit `and`.
    And,
    /// Short-circuit `or`.
    Or,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl BinaryOp {
    /// Returns `true` for comparisons, whose result is boolean.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Host-language spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
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

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A call argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arg {
    /// `f(x)`
    Positional(Expr),
    /// `f(name=x)`
    Keyword {
        /// Parameter name.
        name: String,
        /// Argument value.
        value: Expr,
    },
    /// `f(*xs)`
    Star(Expr),
    /// `f(**kw)`
    DoubleStar(Expr),
}

/// An expression node with its host location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    /// What the expression is.
    #[serde(flatten)]
    pub kind: ExprKind,
    /// Host location.
    #[serde(default)]
    pub span: Span,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprKind {
    /// A name lookup.
    Name {
        /// The name.
        id: String,
    },
    /// A literal.
    Literal {
        /// The value.
        value: Literal,
    },
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
    /// `then if cond else otherwise`
    Conditional {
        /// Condition.
        cond: Box<Expr>,
        /// Value when true.
        then: Box<Expr>,
        /// Value when false.
        otherwise: Box<Expr>,
    },
    /// A call.
    Call {
        /// Callee.
        func: Box<Expr>,
        /// Arguments in source order.
        #[serde(default)]
        args: Vec<Arg>,
    },
    /// `base[index]`
    Index {
        /// Indexed value.
        base: Box<Expr>,
        /// Index.
        index: Box<Expr>,
    },
    /// `base[start:stop]`
    Slice {
        /// Sliced value.
        base: Box<Expr>,
        /// Inclusive start, or the beginning.
        #[serde(default)]
        start: Option<Box<Expr>>,
        /// Exclusive stop, or the end.
        #[serde(default)]
        stop: Option<Box<Expr>>,
    },
    /// A tuple display.
    Tuple {
        /// Elements.
        items: Vec<Expr>,
    },
    /// A dictionary display.
    Dict {
        /// Key/value pairs in source order.
        entries: Vec<(Expr, Expr)>,
    },
    /// Bit concatenation, most significant part first.
    Concat {
        /// Parts.
        items: Vec<Expr>,
    },
    /// Tuple comprehension `(element for targets in iter if condition)`,
    /// expanded at compile time.
    Comprehension {
        /// Produced element.
        element: Box<Expr>,
        /// Names bound per element; more than one unpacks.
        targets: Vec<String>,
        /// Constant iterable.
        iter: Box<Expr>,
        /// Optional filter.
        #[serde(default)]
        condition: Option<Box<Expr>>,
    },
    /// Declaration of a new storage object.
    Declare {
        /// Storage class.
        class: DeclClass,
        /// Element type.
        ty: TypeSpec,
        /// Default (reset) value.
        #[serde(default)]
        default: Option<Box<Expr>>,
        /// Explicit object name. Otherwise named after the binding.
        #[serde(default)]
        name: Option<String>,
    },
}

impl Expr {
    /// Wraps a kind with a span.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Sets the span.
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// A name lookup.
    pub fn name(id: impl Into<String>) -> Self {
        Self::new(ExprKind::Name { id: id.into() }, Span::DUMMY)
    }

    /// An integer literal.
    pub fn int(value: i64) -> Self {
        Self::lit(Literal::Int(value))
    }

    /// A boolean literal.
    pub fn bool(value: bool) -> Self {
        Self::lit(Literal::Bool(value))
    }

    /// A bit-string literal, most significant bit first.
    pub fn bits(value: impl Into<String>) -> Self {
        Self::lit(Literal::Bits(value.into()))
    }

    /// A string literal.
    pub fn str(value: impl Into<String>) -> Self {
        Self::lit(Literal::Str(value.into()))
    }

    /// The `None` literal.
    pub fn none() -> Self {
        Self::lit(Literal::None)
    }

    fn lit(value: Literal) -> Self {
        Self::new(ExprKind::Literal { value }, Span::DUMMY)
    }

    /// A unary operation.
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Self::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            Span::DUMMY,
        )
    }

    /// `not operand`
    pub fn not(operand: Expr) -> Self {
        Self::unary(UnaryOp::Not, operand)
    }

    /// A binary operation.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Span::DUMMY,
        )
    }

    /// `then if cond else otherwise`
    pub fn conditional(cond: Expr, then: Expr, otherwise: Expr) -> Self {
        Self::new(
            ExprKind::Conditional {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            },
            Span::DUMMY,
        )
    }

    /// A call with arbitrary arguments.
    pub fn call_with(func: Expr, args: Vec<Arg>) -> Self {
        Self::new(
            ExprKind::Call {
                func: Box::new(func),
                args,
            },
            Span::DUMMY,
        )
    }

    /// A call of a named function with positional arguments.
    pub fn call(func: &str, args: Vec<Expr>) -> Self {
        Self::call_with(
            Self::name(func),
            args.into_iter().map(Arg::Positional).collect(),
        )
    }

    /// `base[index]`
    pub fn index(base: Expr, index: Expr) -> Self {
        Self::new(
            ExprKind::Index {
                base: Box::new(base),
                index: Box::new(index),
            },
            Span::DUMMY,
        )
    }

    /// `base[start:stop]`
    pub fn slice(base: Expr, start: Option<Expr>, stop: Option<Expr>) -> Self {
        Self::new(
            ExprKind::Slice {
                base: Box::new(base),
                start: start.map(Box::new),
                stop: stop.map(Box::new),
            },
            Span::DUMMY,
        )
    }

    /// A tuple display.
    pub fn tuple(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::Tuple { items }, Span::DUMMY)
    }

    /// A dictionary display.
    pub fn dict(entries: Vec<(Expr, Expr)>) -> Self {
        Self::new(ExprKind::Dict { entries }, Span::DUMMY)
    }

    /// Bit concatenation.
    pub fn concat(items: Vec<Expr>) -> Self {
        Self::new(ExprKind::Concat { items }, Span::DUMMY)
    }

    /// A storage declaration.
    pub fn declare(class: DeclClass, ty: TypeSpec, default: Option<Expr>) -> Self {
        Self::new(
            ExprKind::Declare {
                class,
                ty,
                default: default.map(Box::new),
                name: None,
            },
            Span::DUMMY,
        )
    }

    /// `Signal(ty, default)`
    pub fn signal(ty: TypeSpec, default: Option<Expr>) -> Self {
        Self::declare(DeclClass::Signal, ty, default)
    }

    /// `Variable(ty, default)`
    pub fn variable(ty: TypeSpec, default: Option<Expr>) -> Self {
        Self::declare(DeclClass::Variable, ty, default)
    }

    /// `(element for targets in iter if condition)`
    pub fn comprehension(
        element: Expr,
        targets: &[&str],
        iter: Expr,
        condition: Option<Expr>,
    ) -> Self {
        Self::new(
            ExprKind::Comprehension {
                element: Box::new(element),
                targets: targets.iter().map(|t| t.to_string()).collect(),
                iter: Box::new(iter),
                condition: condition.map(Box::new),
            },
            Span::DUMMY,
        )
    }

    /// Returns the name if this is a bare name lookup.
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name { id } => Some(id),
            _ => None,
        }
    }

    /// Returns `true` if evaluating this expression might suspend or call
    /// into user code. Used to reject side effects in loop guards.
    pub fn contains_call(&self) -> bool {
        match &self.kind {
            ExprKind::Call { .. } => true,
            ExprKind::Name { .. } | ExprKind::Literal { .. } | ExprKind::Declare { .. } => false,
            ExprKind::Unary { operand, .. } => operand.contains_call(),
            ExprKind::Binary { lhs, rhs, .. } => lhs.contains_call() || rhs.contains_call(),
            ExprKind::Conditional {
                cond,
                then,
                otherwise,
            } => cond.contains_call() || then.contains_call() || otherwise.contains_call(),
            ExprKind::Index { base, index } => base.contains_call() || index.contains_call(),
            ExprKind::Slice { base, start, stop } => {
                base.contains_call()
                    || start.as_deref().is_some_and(Expr::contains_call)
                    || stop.as_deref().is_some_and(Expr::contains_call)
            }
            ExprKind::Tuple { items } | ExprKind::Concat { items } => {
                items.iter().any(Expr::contains_call)
            }
            ExprKind::Dict { entries } => entries
                .iter()
                .any(|(k, v)| k.contains_call() || v.contains_call()),
            ExprKind::Comprehension {
                element,
                iter,
                condition,
                ..
            } => {
                element.contains_call()
                    || iter.contains_call()
                    || condition.as_deref().is_some_and(Expr::contains_call)
            }
        }
    }
}
