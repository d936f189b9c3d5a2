//! Values produced by evaluating the input tree.
//!
//! A [`Value`] is either a compile-time constant (scalars, containers,
//! ranges, functions) or a reference to runtime storage. Containers may hold
//! object references; binding never copies, so two bindings of the same
//! object are aliases.

use weft_diagnostics::{CompileError, CompileResult};
use weft_ir::{ConstValue, Expr, ObjectId, TempId};
use weft_source::Span;

/// Functions built into the compile-time evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `range(stop)`, `range(start, stop[, step])`
    Range,
    /// `len(x)`
    Len,
    /// `zip(a, b, ...)`
    Zip,
    /// `enumerate(x, start=0)`
    Enumerate,
    /// `min(...)`
    Min,
    /// `max(...)`
    Max,
    /// `abs(x)`
    Abs,
}

impl Builtin {
    /// Looks up a builtin by its host name.
    pub fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "range" => Builtin::Range,
            "len" => Builtin::Len,
            "zip" => Builtin::Zip,
            "enumerate" => Builtin::Enumerate,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "abs" => Builtin::Abs,
            _ => return None,
        })
    }

    /// Host name.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Range => "range",
            Builtin::Len => "len",
            Builtin::Zip => "zip",
            Builtin::Enumerate => "enumerate",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Abs => "abs",
        }
    }
}

/// A callable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionRef {
    /// A user function, by index into the design's function list.
    User(usize),
    /// A builtin.
    Builtin(Builtin),
}

/// The result of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A constant scalar.
    Const(ConstValue),
    /// A storage object.
    Object(ObjectId),
    /// A temporary of the current context.
    Temp(TempId),
    /// An unnamed runtime expression.
    Runtime(Expr),
    /// A tuple.
    Tuple(Vec<Value>),
    /// A dictionary with constant keys, in insertion order.
    Dict(Vec<(ConstValue, Value)>),
    /// An integer range.
    Range {
        /// First element.
        start: i64,
        /// Exclusive bound.
        stop: i64,
        /// Non-zero step.
        step: i64,
    },
    /// A function.
    Function(FunctionRef),
}

impl Value {
    /// The `None` constant.
    pub fn none() -> Self {
        Value::Const(ConstValue::None)
    }

    /// An integer constant.
    pub fn int(v: i64) -> Self {
        Value::Const(ConstValue::Int(v))
    }

    /// A boolean constant.
    pub fn bool(v: bool) -> Self {
        Value::Const(ConstValue::Bool(v))
    }

    /// Returns the scalar constant, if this is one.
    pub fn as_const(&self) -> Option<&ConstValue> {
        match self {
            Value::Const(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the integer value of an integer-like constant.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Const(ConstValue::Bits(_)) => None,
            Value::Const(c) => c.as_int(),
            _ => None,
        }
    }

    /// Host truthiness of a compile-time value, or `None` for runtime values.
    pub fn truthiness(&self) -> Option<bool> {
        match self {
            Value::Const(c) => Some(c.truthy()),
            Value::Object(_) | Value::Temp(_) | Value::Runtime(_) => None,
            Value::Function(_) => Some(true),
            other => other.len().map(|n| n > 0),
        }
    }

    /// Returns `true` for values that exist only at runtime.
    pub fn is_runtime(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Temp(_) | Value::Runtime(_))
    }

    /// Returns `true` if the value, including container contents, involves no
    /// runtime storage.
    pub fn is_fully_constant(&self) -> bool {
        match self {
            Value::Const(_) | Value::Range { .. } | Value::Function(_) => true,
            Value::Object(_) | Value::Temp(_) | Value::Runtime(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_fully_constant),
            Value::Dict(entries) => entries.iter().all(|(_, v)| v.is_fully_constant()),
        }
    }

    /// Converts a scalar or runtime value into an IR expression. Containers
    /// and functions have no runtime representation.
    pub fn to_expr(&self) -> Option<Expr> {
        match self {
            Value::Const(c) => Some(Expr::Const(c.clone())),
            Value::Object(id) => Some(Expr::Object(*id)),
            Value::Temp(id) => Some(Expr::Temp(*id)),
            Value::Runtime(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Like [`to_expr`](Self::to_expr), reporting containers as unsupported.
    pub fn expect_expr(&self, span: Span) -> CompileResult<Expr> {
        self.to_expr().ok_or_else(|| {
            CompileError::unsupported(
                format!("a {} cannot be used as a runtime value", self.kind_name()),
                span,
            )
        })
    }

    /// Short description for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Const(ConstValue::Int(_)) => "integer",
            Value::Const(ConstValue::Bool(_)) => "boolean",
            Value::Const(ConstValue::Bits(_)) => "bit string",
            Value::Const(ConstValue::Str(_)) => "string",
            Value::Const(ConstValue::None) => "None",
            Value::Object(_) => "storage object",
            Value::Temp(_) => "temporary",
            Value::Runtime(_) => "runtime expression",
            Value::Tuple(_) => "tuple",
            Value::Dict(_) => "dictionary",
            Value::Range { .. } => "range",
            Value::Function(_) => "function",
        }
    }

    /// Number of elements of a constant sequence.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Tuple(items) => Some(items.len()),
            Value::Dict(entries) => Some(entries.len()),
            Value::Const(ConstValue::Str(s)) => Some(s.chars().count()),
            Value::Range { start, stop, step } => Some(range_len(*start, *stop, *step)),
            _ => None,
        }
    }

    /// Elements of a constant sequence: tuple items, string characters,
    /// dictionary keys or range values.
    ///
    /// Sequences longer than `limit` are refused before any element is
    /// built.
    pub fn items(&self, limit: usize) -> Result<Vec<Value>, ItemsError> {
        let len = self.len().ok_or(ItemsError::NotSequence)?;
        if len > limit {
            return Err(ItemsError::TooLong(len));
        }
        Ok(match self {
            Value::Tuple(items) => items.clone(),
            Value::Dict(entries) => entries.iter().map(|(k, _)| Value::Const(k.clone())).collect(),
            Value::Const(ConstValue::Str(s)) => s
                .chars()
                .map(|c| Value::Const(ConstValue::Str(c.to_string())))
                .collect(),
            Value::Range { .. } => (0..len).filter_map(|i| self.range_at(i)).map(Value::int).collect(),
            _ => return Err(ItemsError::NotSequence),
        })
    }

    /// The `i`-th element of a constant sequence, without expanding it.
    pub fn item_at(&self, i: usize) -> Option<Value> {
        match self {
            Value::Tuple(items) => items.get(i).cloned(),
            Value::Dict(entries) => entries.get(i).map(|(k, _)| Value::Const(k.clone())),
            Value::Const(ConstValue::Str(s)) => s
                .chars()
                .nth(i)
                .map(|c| Value::Const(ConstValue::Str(c.to_string()))),
            Value::Range { .. } if i < self.len()? => self.range_at(i).map(Value::int),
            _ => None,
        }
    }

    /// The `i`-th element of a range, computed without expanding it.
    pub fn range_at(&self, i: usize) -> Option<i64> {
        let Value::Range { start, step, .. } = self else {
            return None;
        };
        let at = i128::from(*start) + i128::try_from(i).ok()? * i128::from(*step);
        i64::try_from(at).ok()
    }
}

/// Why [`Value::items`] produced no elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemsError {
    /// The value is not a constant sequence.
    NotSequence,
    /// The sequence has this many elements, more than the limit.
    TooLong(usize),
}

fn range_len(start: i64, stop: i64, step: i64) -> usize {
    let span = if step > 0 {
        i128::from(stop) - i128::from(start)
    } else {
        i128::from(start) - i128::from(stop)
    };
    if span <= 0 {
        return 0;
    }
    let count = span.unsigned_abs().div_ceil(u128::from(step.unsigned_abs()));
    usize::try_from(count).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_items() {
        let r = Value::Range {
            start: 0,
            stop: 10,
            step: 3,
        };
        assert_eq!(r.len(), Some(4));
        assert_eq!(
            r.items(16).unwrap(),
            vec![Value::int(0), Value::int(3), Value::int(6), Value::int(9)]
        );
    }

    #[test]
    fn descending_and_empty_ranges() {
        let down = Value::Range {
            start: 3,
            stop: 0,
            step: -1,
        };
        assert_eq!(down.items(16).unwrap(), vec![Value::int(3), Value::int(2), Value::int(1)]);
        let empty = Value::Range {
            start: 5,
            stop: 2,
            step: 1,
        };
        assert_eq!(empty.len(), Some(0));
    }

    #[test]
    fn dict_iterates_keys() {
        let d = Value::Dict(vec![
            (ConstValue::Str("a".into()), Value::int(1)),
            (ConstValue::Str("b".into()), Value::int(2)),
        ]);
        assert_eq!(
            d.items(16).unwrap(),
            vec![
                Value::Const(ConstValue::Str("a".into())),
                Value::Const(ConstValue::Str("b".into()))
            ]
        );
    }

    #[test]
    fn constness() {
        let obj = Value::Object(ObjectId::from_raw(0));
        assert!(obj.is_runtime());
        assert!(!Value::Tuple(vec![Value::int(1), obj]).is_fully_constant());
        assert!(Value::Tuple(vec![Value::int(1)]).is_fully_constant());
    }

    #[test]
    fn containers_have_no_runtime_form() {
        let t = Value::Tuple(vec![]);
        assert!(t.to_expr().is_none());
        let err = t.expect_expr(Span::DUMMY).unwrap_err();
        assert_eq!(err.kind, weft_diagnostics::ErrorKind::UnsupportedConstruct);
    }

    #[test]
    fn truthiness() {
        assert_eq!(Value::int(0).truthiness(), Some(false));
        assert_eq!(Value::Tuple(vec![Value::none()]).truthiness(), Some(true));
        assert_eq!(Value::Object(ObjectId::from_raw(1)).truthiness(), None);
    }

    #[test]
    fn builtin_lookup() {
        assert_eq!(Builtin::lookup("zip"), Some(Builtin::Zip));
        assert_eq!(Builtin::lookup("print"), None);
        assert_eq!(Builtin::Enumerate.name(), "enumerate");
    }

    #[test]
    fn long_range_is_refused_before_expansion() {
        let r = Value::Range {
            start: 0,
            stop: 1 << 40,
            step: 1,
        };
        assert_eq!(r.len(), Some(1 << 40));
        assert_eq!(r.items(65_536), Err(ItemsError::TooLong(1 << 40)));
        assert_eq!(r.range_at((1 << 40) - 1), Some((1 << 40) - 1));
        assert_eq!(Value::int(3).items(16), Err(ItemsError::NotSequence));
    }

    #[test]
    fn extreme_range_bounds_do_not_saturate() {
        let r = Value::Range {
            start: i64::MIN,
            stop: i64::MAX,
            step: i64::MAX,
        };
        assert_eq!(r.len(), Some(3));
        assert_eq!(
            r.items(16).unwrap(),
            vec![Value::int(i64::MIN), Value::int(-1), Value::int(i64::MAX - 1)]
        );
        let down = Value::Range {
            start: i64::MAX,
            stop: i64::MIN,
            step: i64::MIN,
        };
        assert_eq!(down.len(), Some(2));
    }
}
