//! Compile-time evaluation of operators, indexing and builtins.
//!
//! Integer arithmetic follows host semantics: floor division and modulo
//! round toward negative infinity, and overflow is an error rather than a
//! wraparound.

use crate::errors;
use crate::value::{Builtin, Value};
use weft_ast::{BinaryOp, UnaryOp};
use weft_diagnostics::{CompileError, CompileResult};
use weft_ir::ConstValue;
use weft_source::Span;

/// Maps an input-tree unary operator onto the IR's.
pub fn ir_unary(op: UnaryOp) -> weft_ir::UnaryOp {
    match op {
        UnaryOp::Not => weft_ir::UnaryOp::Not,
        UnaryOp::Neg => weft_ir::UnaryOp::Neg,
        UnaryOp::Invert => weft_ir::UnaryOp::Invert,
    }
}

/// Maps an input-tree binary operator onto the IR's.
pub fn ir_binary(op: BinaryOp) -> weft_ir::BinaryOp {
    use weft_ir::BinaryOp as Ir;
    match op {
        BinaryOp::Add => Ir::Add,
        BinaryOp::Sub => Ir::Sub,
        BinaryOp::Mul => Ir::Mul,
        BinaryOp::FloorDiv => Ir::Div,
        BinaryOp::Mod => Ir::Mod,
        BinaryOp::Shl => Ir::Shl,
        BinaryOp::Shr => Ir::Shr,
        BinaryOp::BitAnd => Ir::BitAnd,
        BinaryOp::BitOr => Ir::BitOr,
        BinaryOp::BitXor => Ir::BitXor,
        BinaryOp::And => Ir::And,
        BinaryOp::Or => Ir::Or,
        BinaryOp::Eq => Ir::Eq,
        BinaryOp::Ne => Ir::Ne,
        BinaryOp::Lt => Ir::Lt,
        BinaryOp::Le => Ir::Le,
        BinaryOp::Gt => Ir::Gt,
        BinaryOp::Ge => Ir::Ge,
    }
}

fn overflow(span: Span) -> CompileError {
    CompileError::unsupported("integer overflow in constant expression", span)
}

fn bad_operands(op: &str, a: &ConstValue, b: &ConstValue, span: Span) -> CompileError {
    CompileError::unsupported(
        format!("unsupported operand types for `{op}`: {a} and {b}"),
        span,
    )
}

/// Folds a unary operator over a constant.
pub fn unary(op: UnaryOp, v: &ConstValue, span: Span) -> CompileResult<ConstValue> {
    match op {
        UnaryOp::Not => Ok(ConstValue::Bool(!v.truthy())),
        UnaryOp::Neg => match v {
            ConstValue::Int(_) | ConstValue::Bool(_) => v
                .as_int()
                .and_then(i64::checked_neg)
                .map(ConstValue::Int)
                .ok_or_else(|| overflow(span)),
            _ => Err(CompileError::unsupported(
                format!("cannot negate {v}"),
                span,
            )),
        },
        UnaryOp::Invert => match v {
            ConstValue::Int(i) => Ok(ConstValue::Int(!i)),
            ConstValue::Bool(b) => Ok(ConstValue::Int(!i64::from(*b))),
            ConstValue::Bits(s) => Ok(ConstValue::Bits(
                s.chars().map(|c| if c == '1' { '0' } else { '1' }).collect(),
            )),
            _ => Err(CompileError::unsupported(
                format!("cannot invert {v}"),
                span,
            )),
        },
    }
}

fn floor_div(a: i64, b: i64, span: Span) -> CompileResult<i64> {
    if b == 0 {
        return Err(CompileError::unsupported("division by zero in constant expression", span));
    }
    let q = a.checked_div(b).ok_or_else(|| overflow(span))?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

fn floor_mod(a: i64, b: i64, span: Span) -> CompileResult<i64> {
    if b == 0 {
        return Err(CompileError::unsupported("modulo by zero in constant expression", span));
    }
    let r = a.checked_rem(b).ok_or_else(|| overflow(span))?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

fn shift(a: i64, b: i64, left: bool, span: Span) -> CompileResult<i64> {
    let amount = u32::try_from(b)
        .map_err(|_| CompileError::unsupported("negative shift count", span))?;
    if left {
        if amount >= 63 || a.checked_shl(amount).map(|r| r >> amount) != Some(a) {
            return Err(overflow(span));
        }
        Ok(a << amount)
    } else if amount >= 64 {
        Ok(if a < 0 { -1 } else { 0 })
    } else {
        Ok(a >> amount)
    }
}

/// Folds a binary operator over two constants.
pub fn binary(op: BinaryOp, a: &ConstValue, b: &ConstValue, span: Span) -> CompileResult<ConstValue> {
    match op {
        BinaryOp::And => return Ok(if a.truthy() { b.clone() } else { a.clone() }),
        BinaryOp::Or => return Ok(if a.truthy() { a.clone() } else { b.clone() }),
        BinaryOp::Eq => return Ok(ConstValue::Bool(const_eq(a, b))),
        BinaryOp::Ne => return Ok(ConstValue::Bool(!const_eq(a, b))),
        _ => {}
    }

    if let (ConstValue::Str(x), ConstValue::Str(y)) = (a, b) {
        return match op {
            BinaryOp::Add => Ok(ConstValue::Str(format!("{x}{y}"))),
            BinaryOp::Lt => Ok(ConstValue::Bool(x < y)),
            BinaryOp::Le => Ok(ConstValue::Bool(x <= y)),
            BinaryOp::Gt => Ok(ConstValue::Bool(x > y)),
            BinaryOp::Ge => Ok(ConstValue::Bool(x >= y)),
            _ => Err(bad_operands(op.symbol(), a, b, span)),
        };
    }
    if let (ConstValue::Str(s), BinaryOp::Mul) = (a, op) {
        if let ConstValue::Int(n) = b {
            return Ok(ConstValue::Str(s.repeat(usize::try_from(*n).unwrap_or(0))));
        }
    }

    let (Some(x), Some(y)) = (int_operand(a), int_operand(b)) else {
        return Err(bad_operands(op.symbol(), a, b, span));
    };
    let int = |v: Option<i64>| v.map(ConstValue::Int).ok_or_else(|| overflow(span));
    match op {
        BinaryOp::Add => int(x.checked_add(y)),
        BinaryOp::Sub => int(x.checked_sub(y)),
        BinaryOp::Mul => int(x.checked_mul(y)),
        BinaryOp::FloorDiv => floor_div(x, y, span).map(ConstValue::Int),
        BinaryOp::Mod => floor_mod(x, y, span).map(ConstValue::Int),
        BinaryOp::Shl => shift(x, y, true, span).map(ConstValue::Int),
        BinaryOp::Shr => shift(x, y, false, span).map(ConstValue::Int),
        BinaryOp::BitAnd => Ok(bitwise(a, b, x & y)),
        BinaryOp::BitOr => Ok(bitwise(a, b, x | y)),
        BinaryOp::BitXor => Ok(bitwise(a, b, x ^ y)),
        BinaryOp::Lt => Ok(ConstValue::Bool(x < y)),
        BinaryOp::Le => Ok(ConstValue::Bool(x <= y)),
        BinaryOp::Gt => Ok(ConstValue::Bool(x > y)),
        BinaryOp::Ge => Ok(ConstValue::Bool(x >= y)),
        BinaryOp::And | BinaryOp::Or | BinaryOp::Eq | BinaryOp::Ne => {
            Err(bad_operands(op.symbol(), a, b, span))
        }
    }
}

fn int_operand(v: &ConstValue) -> Option<i64> {
    match v {
        ConstValue::Int(_) | ConstValue::Bool(_) => v.as_int(),
        _ => None,
    }
}

fn bitwise(a: &ConstValue, b: &ConstValue, result: i64) -> ConstValue {
    match (a, b) {
        (ConstValue::Bool(_), ConstValue::Bool(_)) => ConstValue::Bool(result != 0),
        _ => ConstValue::Int(result),
    }
}

fn const_eq(a: &ConstValue, b: &ConstValue) -> bool {
    match (int_operand(a), int_operand(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Applies a sequence operator to constant containers: `+` concatenates
/// tuples, `*` repeats them up to `limit` elements, `==`/`!=` compare fully constant values.
/// Returns `None` if the operands are not handled here.
pub fn sequence_binary(
    op: BinaryOp,
    a: &Value,
    b: &Value,
    limit: usize,
    span: Span,
) -> Option<CompileResult<Value>> {
    match (op, a, b) {
        (BinaryOp::Add, Value::Tuple(x), Value::Tuple(y)) => {
            Some(Ok(Value::Tuple(x.iter().chain(y).cloned().collect())))
        }
        (BinaryOp::Mul, Value::Tuple(items), n) | (BinaryOp::Mul, n, Value::Tuple(items)) => {
            let Some(n) = n.as_int() else {
                return Some(Err(CompileError::unsupported(
                    "a tuple can only be repeated by an integer",
                    span,
                )));
            };
            let count = usize::try_from(n).unwrap_or(0);
            let total = items.len().saturating_mul(count);
            if total > limit {
                return Some(Err(errors::too_many_elements(total, limit, span)));
            }
            let mut out = Vec::with_capacity(total);
            for _ in 0..count {
                out.extend(items.iter().cloned());
            }
            Some(Ok(Value::Tuple(out)))
        }
        (BinaryOp::Eq | BinaryOp::Ne, _, _)
            if !matches!((a, b), (Value::Const(_), Value::Const(_)))
                && a.is_fully_constant()
                && b.is_fully_constant() =>
        {
            let equal = a == b;
            Some(Ok(Value::bool(if op == BinaryOp::Eq { equal } else { !equal })))
        }
        _ => None,
    }
}

/// Python-style index normalization.
fn normalize_index(index: i64, len: usize, span: Span) -> CompileResult<usize> {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let i = if index < 0 { index + len_i } else { index };
    if i < 0 || i >= len_i {
        return Err(CompileError::unsupported(
            format!("index {index} out of range for length {len}"),
            span,
        ));
    }
    Ok(i as usize)
}

/// Indexes a constant container.
pub fn index(base: &Value, index: &Value, span: Span) -> CompileResult<Value> {
    if let Value::Dict(entries) = base {
        let Some(key) = index.as_const() else {
            return Err(CompileError::unsupported("dictionary keys must be constants", span));
        };
        return entries
            .iter()
            .find(|(k, _)| const_eq(k, key))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| CompileError::unsupported(format!("key {key} not found"), span));
    }
    let Some(i) = index.as_int() else {
        return Err(CompileError::unsupported(
            format!("a {} cannot index a {}", index.kind_name(), base.kind_name()),
            span,
        ));
    };
    let not_indexable =
        || CompileError::unsupported(format!("a {} cannot be indexed", base.kind_name()), span);
    let len = base.len().ok_or_else(not_indexable)?;
    let at = normalize_index(i, len, span)?;
    base.item_at(at).ok_or_else(not_indexable)
}

/// Slices a constant sequence with host clamping rules. A slice of a range
/// longer than `limit` is refused.
pub fn slice(
    base: &Value,
    start: Option<i64>,
    stop: Option<i64>,
    limit: usize,
    span: Span,
) -> CompileResult<Value> {
    let len = match base {
        Value::Tuple(_) | Value::Const(ConstValue::Str(_)) | Value::Range { .. } => {
            base.len().unwrap_or(0)
        }
        _ => {
            return Err(CompileError::unsupported(
                format!("a {} cannot be sliced", base.kind_name()),
                span,
            ))
        }
    };
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |v: i64| {
        let v = if v < 0 { v.saturating_add(len_i) } else { v };
        usize::try_from(v.clamp(0, len_i)).unwrap_or(0)
    };
    let lo = start.map_or(0, clamp);
    let hi = stop.map_or(len, clamp).max(lo);
    if matches!(base, Value::Range { .. }) && hi - lo > limit {
        return Err(errors::too_many_elements(hi - lo, limit, span));
    }
    Ok(match base {
        Value::Const(ConstValue::Str(s)) => {
            Value::Const(ConstValue::Str(s.chars().skip(lo).take(hi - lo).collect()))
        }
        _ => Value::Tuple((lo..hi).filter_map(|i| base.item_at(i)).collect()),
    })
}

fn int_arg(builtin: Builtin, v: &Value, span: Span) -> CompileResult<i64> {
    v.as_int().ok_or_else(|| {
        CompileError::unsupported(
            format!("`{}` expects integer arguments, got a {}", builtin.name(), v.kind_name()),
            span,
        )
    })
}

fn not_sequence(builtin: Builtin, v: &Value, span: Span) -> CompileError {
    CompileError::unsupported(
        format!("`{}` expects a compile-time sequence, got a {}", builtin.name(), v.kind_name()),
        span,
    )
}

fn sequence_arg(builtin: Builtin, v: &Value, limit: usize, span: Span) -> CompileResult<Vec<Value>> {
    v.items(limit)
        .map_err(|err| errors::expansion(err, limit, span, || not_sequence(builtin, v, span)))
}

fn arity(builtin: Builtin, got: usize, min: usize, max: usize, span: Span) -> CompileResult<()> {
    if got < min || got > max {
        return Err(CompileError::unsupported(
            format!(
                "`{}` expects {min} to {max} arguments, got {got}",
                builtin.name()
            ),
            span,
        ));
    }
    Ok(())
}

/// Calls a builtin with evaluated arguments. Sequences it expands are
/// bounded by `limit` elements.
pub fn call_builtin(
    builtin: Builtin,
    args: Vec<Value>,
    kwargs: Vec<(String, Value)>,
    limit: usize,
    span: Span,
) -> CompileResult<Value> {
    let mut args = args;
    if let Some((name, value)) = kwargs.into_iter().next() {
        if builtin == Builtin::Enumerate && name == "start" && args.len() == 1 {
            args.push(value);
        } else {
            return Err(CompileError::unsupported(
                format!("`{}` got an unexpected keyword argument `{name}`", builtin.name()),
                span,
            ));
        }
    }

    match builtin {
        Builtin::Range => {
            arity(builtin, args.len(), 1, 3, span)?;
            let ints = args
                .iter()
                .map(|a| int_arg(builtin, a, span))
                .collect::<CompileResult<Vec<_>>>()?;
            let (start, stop, step) = match ints.as_slice() {
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step] => (*start, *stop, *step),
                _ => return Err(CompileError::unsupported("`range` expects 1 to 3 arguments", span)),
            };
            if step == 0 {
                return Err(CompileError::unsupported("`range` step must not be zero", span));
            }
            Ok(Value::Range { start, stop, step })
        }
        Builtin::Len => {
            arity(builtin, args.len(), 1, 1, span)?;
            let n = args[0].len().ok_or_else(|| {
                CompileError::unsupported(
                    format!("a {} has no compile-time length", args[0].kind_name()),
                    span,
                )
            })?;
            Ok(Value::int(n as i64))
        }
        Builtin::Zip => {
            let lens = args
                .iter()
                .map(|a| a.len().ok_or_else(|| not_sequence(builtin, a, span)))
                .collect::<CompileResult<Vec<_>>>()?;
            let len = lens.into_iter().min().unwrap_or(0);
            if len > limit {
                return Err(errors::too_many_elements(len, limit, span));
            }
            Ok(Value::Tuple(
                (0..len)
                    .map(|i| Value::Tuple(args.iter().filter_map(|a| a.item_at(i)).collect()))
                    .collect(),
            ))
        }
        Builtin::Enumerate => {
            arity(builtin, args.len(), 1, 2, span)?;
            let start = match args.get(1) {
                Some(v) => int_arg(builtin, v, span)?,
                None => 0,
            };
            let items = sequence_arg(builtin, &args[0], limit, span)?;
            Ok(Value::Tuple(
                items
                    .into_iter()
                    .zip(start..)
                    .map(|(v, i)| Value::Tuple(vec![Value::int(i), v]))
                    .collect(),
            ))
        }
        Builtin::Min | Builtin::Max => {
            let candidates = if args.len() == 1 {
                sequence_arg(builtin, &args[0], limit, span)?
            } else {
                args
            };
            let ints = candidates
                .iter()
                .map(|a| int_arg(builtin, a, span))
                .collect::<CompileResult<Vec<_>>>()?;
            let picked = if builtin == Builtin::Min {
                ints.into_iter().min()
            } else {
                ints.into_iter().max()
            };
            picked.map(Value::int).ok_or_else(|| {
                CompileError::unsupported(format!("`{}` of an empty sequence", builtin.name()), span)
            })
        }
        Builtin::Abs => {
            arity(builtin, args.len(), 1, 1, span)?;
            int_arg(builtin, &args[0], span)?
                .checked_abs()
                .map(Value::int)
                .ok_or_else(|| overflow(span))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_diagnostics::ErrorKind;

    fn int(v: i64) -> ConstValue {
        ConstValue::Int(v)
    }

    fn fold(op: BinaryOp, a: i64, b: i64) -> ConstValue {
        binary(op, &int(a), &int(b), Span::DUMMY).unwrap()
    }

    #[test]
    fn floor_semantics() {
        assert_eq!(fold(BinaryOp::FloorDiv, 7, 2), int(3));
        assert_eq!(fold(BinaryOp::FloorDiv, -7, 2), int(-4));
        assert_eq!(fold(BinaryOp::Mod, -7, 2), int(1));
        assert_eq!(fold(BinaryOp::Mod, 7, -2), int(-1));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let err = binary(BinaryOp::FloorDiv, &int(1), &int(0), Span::DUMMY).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedConstruct);
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(binary(BinaryOp::Mul, &int(i64::MAX), &int(2), Span::DUMMY).is_err());
        assert!(binary(BinaryOp::Shl, &int(1), &int(70), Span::DUMMY).is_err());
        assert_eq!(fold(BinaryOp::Shl, 1, 4), int(16));
    }

    #[test]
    fn short_circuit_values() {
        let r = binary(BinaryOp::And, &int(0), &int(5), Span::DUMMY).unwrap();
        assert_eq!(r, int(0));
        let r = binary(BinaryOp::Or, &int(0), &int(5), Span::DUMMY).unwrap();
        assert_eq!(r, int(5));
    }

    #[test]
    fn bool_and_int_compare_equal() {
        let r = binary(BinaryOp::Eq, &ConstValue::Bool(true), &int(1), Span::DUMMY).unwrap();
        assert_eq!(r, ConstValue::Bool(true));
    }

    #[test]
    fn string_ops() {
        let a = ConstValue::Str("ab".into());
        let b = ConstValue::Str("c".into());
        assert_eq!(
            binary(BinaryOp::Add, &a, &b, Span::DUMMY).unwrap(),
            ConstValue::Str("abc".into())
        );
        assert!(binary(BinaryOp::Sub, &a, &b, Span::DUMMY).is_err());
    }

    #[test]
    fn invert_bits() {
        let r = unary(UnaryOp::Invert, &ConstValue::Bits("0110".into()), Span::DUMMY).unwrap();
        assert_eq!(r, ConstValue::Bits("1001".into()));
        assert_eq!(
            unary(UnaryOp::Not, &int(0), Span::DUMMY).unwrap(),
            ConstValue::Bool(true)
        );
    }

    #[test]
    fn tuple_concat_and_repeat() {
        let t = Value::Tuple(vec![Value::int(1)]);
        let joined = sequence_binary(BinaryOp::Add, &t, &t, 16, Span::DUMMY).unwrap().unwrap();
        assert_eq!(joined.len(), Some(2));
        let repeated = sequence_binary(BinaryOp::Mul, &t, &Value::int(3), 16, Span::DUMMY)
            .unwrap()
            .unwrap();
        assert_eq!(repeated.len(), Some(3));
    }

    #[test]
    fn negative_index_and_slice() {
        let t = Value::Tuple(vec![Value::int(1), Value::int(2), Value::int(3)]);
        assert_eq!(index(&t, &Value::int(-1), Span::DUMMY).unwrap(), Value::int(3));
        assert!(index(&t, &Value::int(3), Span::DUMMY).is_err());
        let s = slice(&t, Some(1), None, 16, Span::DUMMY).unwrap();
        assert_eq!(s, Value::Tuple(vec![Value::int(2), Value::int(3)]));
    }

    #[test]
    fn dict_lookup() {
        let d = Value::Dict(vec![(ConstValue::Str("k".into()), Value::int(4))]);
        let key = Value::Const(ConstValue::Str("k".into()));
        assert_eq!(index(&d, &key, Span::DUMMY).unwrap(), Value::int(4));
    }

    #[test]
    fn builtins() {
        let r = call_builtin(Builtin::Range, vec![Value::int(2), Value::int(5)], vec![], 16, Span::DUMMY)
            .unwrap();
        assert_eq!(r.len(), Some(3));
        let e = call_builtin(
            Builtin::Enumerate,
            vec![Value::Tuple(vec![Value::int(9)])],
            vec![("start".into(), Value::int(1))],
            16,
            Span::DUMMY,
        )
        .unwrap();
        assert_eq!(e, Value::Tuple(vec![Value::Tuple(vec![Value::int(1), Value::int(9)])]));
        let m = call_builtin(
            Builtin::Max,
            vec![Value::int(3), Value::int(7), Value::int(5)],
            vec![],
            16,
            Span::DUMMY,
        )
        .unwrap();
        assert_eq!(m, Value::int(7));
        let z = call_builtin(
            Builtin::Zip,
            vec![
                Value::Tuple(vec![Value::int(1), Value::int(2)]),
                Value::Range {
                    start: 0,
                    stop: 5,
                    step: 1,
                },
            ],
            vec![],
            16,
            Span::DUMMY,
        )
        .unwrap();
        assert_eq!(z.len(), Some(2));
        let zero_step = call_builtin(
            Builtin::Range,
            vec![Value::int(1), Value::int(2), Value::int(0)],
            vec![],
            16,
            Span::DUMMY,
        );
        assert!(zero_step.is_err());
    }

    fn huge() -> Value {
        Value::Range {
            start: 0,
            stop: 1 << 40,
            step: 1,
        }
    }

    #[test]
    fn long_ranges_are_indexed_without_expansion() {
        assert_eq!(index(&huge(), &Value::int(-1), Span::DUMMY).unwrap(), Value::int((1 << 40) - 1));
        let s = slice(&huge(), Some(-2), None, 16, Span::DUMMY).unwrap();
        assert_eq!(s, Value::Tuple(vec![Value::int((1 << 40) - 2), Value::int((1 << 40) - 1)]));
        let err = slice(&huge(), None, None, 16, Span::DUMMY).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedConstruct);
    }

    #[test]
    fn expansion_is_bounded() {
        let zipped = call_builtin(
            Builtin::Zip,
            vec![huge(), Value::Tuple(vec![Value::int(7)])],
            vec![],
            16,
            Span::DUMMY,
        )
        .unwrap();
        assert_eq!(zipped, Value::Tuple(vec![Value::Tuple(vec![Value::int(0), Value::int(7)])]));
        for builtin in [Builtin::Enumerate, Builtin::Max] {
            let err = call_builtin(builtin, vec![huge()], vec![], 16, Span::DUMMY).unwrap_err();
            assert_eq!(err.kind, ErrorKind::UnsupportedConstruct);
            assert!(err.message.contains("longer than the limit of 16"), "{}", err.message);
        }
        let t = Value::Tuple(vec![Value::int(1), Value::int(2)]);
        let repeated = sequence_binary(BinaryOp::Mul, &t, &Value::int(1 << 40), 16, Span::DUMMY).unwrap();
        assert!(repeated.is_err());
    }
}
