//! Expression evaluation for `$( … )` fragments
//!
//! Evaluates parsed fragments against a [`Scope`].

use std::cmp::Ordering;

use crate::error::{EvalError, EvalResult};
use crate::expr::ast::*;
use crate::expr::parser::parse_expression;
use crate::scope::{Resolution, Scope};
use crate::value::Value;

/// Longest string (in bytes) or list that repetition or `range` may build
pub const MAX_SEQUENCE_LEN: usize = 1 << 20;

/// Parse and evaluate an expression in the given scope.
///
/// Unlike template substitution this reports every failure to the caller.
///
/// # Examples
/// ```
/// use taql_subst::{evaluate_expression, Scope, Value};
/// let scope = Scope::new().with("a", 2).with("b", 3);
/// assert_eq!(evaluate_expression("(a+b)*(a+b)", &scope).unwrap(), Value::Int(25));
/// assert!(evaluate_expression("a +", &scope).is_err());
/// ```
pub fn evaluate_expression(expr: &str, scope: &Scope) -> EvalResult<Value> {
    let ast = parse_expression(expr)?;
    Evaluator::new(scope).evaluate(&ast)
}

/// Evaluator for fragment expressions
pub struct Evaluator<'a> {
    scope: &'a Scope,
}

/// Numeric view of a value; booleans act as integers
#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Number> {
        match value {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(x) => Some(Number::Float(*x)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(x) => x,
        }
    }
}

impl<'a> Evaluator<'a> {
    /// Create a new evaluator
    pub fn new(scope: &'a Scope) -> Self {
        Self { scope }
    }

    /// Evaluate an expression to a value
    pub fn evaluate(&self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal)),

            Expr::Name(name) => match self.scope.resolve(name) {
                Resolution::Resolved(v) => Ok(v),
                Resolution::Unresolved => Err(EvalError::UnknownName(name.clone())),
            },

            Expr::List(items) => items
                .iter()
                .map(|item| self.evaluate(item))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::List),

            Expr::Unary(op, inner) => unary(*op, self.evaluate(inner)?),

            Expr::Binary(first, rest) => rest
                .iter()
                .try_fold(self.evaluate(first)?, |acc, (op, rhs)| {
                    binary(*op, acc, self.evaluate(rhs)?)
                }),

            Expr::Compare(lhs, op, rhs) => {
                let lhs = self.evaluate(lhs)?;
                let rhs = self.evaluate(rhs)?;
                compare(*op, &lhs, &rhs).map(Value::Bool)
            }

            Expr::And(operands) => {
                for operand in operands {
                    if !self.evaluate(operand)?.is_truthy() {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }

            Expr::Or(operands) => {
                for operand in operands {
                    if self.evaluate(operand)?.is_truthy() {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }

            Expr::Not(inner) => Ok(Value::Bool(!self.evaluate(inner)?.is_truthy())),

            Expr::Index(target, index) => {
                let target = self.evaluate(target)?;
                let index = self.evaluate(index)?;
                subscript(&target, &index)
            }

            Expr::Call(call) => {
                let args = call
                    .args
                    .iter()
                    .map(|arg| self.evaluate(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                call_builtin(&call.name, args)
            }
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::None => Value::None,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int(i) => Value::Int(*i),
        Literal::Float(x) => Value::Float(*x),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

fn type_error(op: &str, lhs: &Value, rhs: &Value) -> EvalError {
    EvalError::TypeError(format!(
        "unsupported operand types for {}: '{}' and '{}'",
        op,
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn unary(op: UnaryOp, value: Value) -> EvalResult<Value> {
    match (op, Number::of(&value)) {
        (UnaryOp::Neg, Some(Number::Int(i))) => Ok(i
            .checked_neg()
            .map(Value::Int)
            .unwrap_or(Value::Float(-(i as f64)))),
        (UnaryOp::Neg, Some(Number::Float(x))) => Ok(Value::Float(-x)),
        (UnaryOp::Pos, Some(Number::Int(i))) => Ok(Value::Int(i)),
        (UnaryOp::Pos, Some(Number::Float(x))) => Ok(Value::Float(x)),
        (_, None) => Err(EvalError::TypeError(format!(
            "bad operand type for unary {}: '{}'",
            if op == UnaryOp::Neg { "-" } else { "+" },
            value.type_name()
        ))),
    }
}

/// Repetition count for a sequence of `unit` elements; negative counts
/// give an empty result
fn repeat_count(unit: usize, count: i64) -> EvalResult<usize> {
    let count = usize::try_from(count).unwrap_or(0);
    if unit == 0 {
        return Ok(0);
    }
    match unit.checked_mul(count) {
        Some(len) if len <= MAX_SEQUENCE_LEN => Ok(count),
        _ => Err(EvalError::TooLarge(MAX_SEQUENCE_LEN)),
    }
}

fn repeat(items: &[Value], count: i64) -> EvalResult<Vec<Value>> {
    let count = repeat_count(items.len(), count)?;
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend_from_slice(items);
    }
    Ok(out)
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> EvalResult<Value> {
    match (op, &lhs, &rhs) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{a}{b}"))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            let mut joined = a.clone();
            joined.extend_from_slice(b);
            return Ok(Value::List(joined));
        }
        (BinaryOp::Mul, Value::Str(s), Value::Int(n)) | (BinaryOp::Mul, Value::Int(n), Value::Str(s)) => {
            return Ok(Value::Str(s.repeat(repeat_count(s.len(), *n)?)));
        }
        (BinaryOp::Mul, Value::List(items), Value::Int(n))
        | (BinaryOp::Mul, Value::Int(n), Value::List(items)) => {
            return repeat(items, *n).map(Value::List);
        }
        _ => {}
    }

    match (Number::of(&lhs), Number::of(&rhs)) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => int_arithmetic(op, a, b),
        (Some(a), Some(b)) => float_arithmetic(op, a.as_f64(), b.as_f64()),
        _ => Err(type_error(op.as_str(), &lhs, &rhs)),
    }
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> EvalResult<Value> {
    // Overflow falls back to floating point instead of failing
    let checked = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => return float_arithmetic(op, a as f64, b as f64),
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_div(b).map(|q| {
                if a % b != 0 && ((a < 0) != (b < 0)) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            a.checked_rem(b).map(|r| {
                if r != 0 && ((r < 0) != (b < 0)) {
                    r + b
                } else {
                    r
                }
            })
        }
        BinaryOp::Pow => {
            if b < 0 {
                return float_arithmetic(op, a as f64, b as f64);
            }
            u32::try_from(b).ok().and_then(|e| a.checked_pow(e))
        }
    };

    match checked {
        Some(v) => Ok(Value::Int(v)),
        None => float_arithmetic(op, a as f64, b as f64),
    }
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> EvalResult<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        BinaryOp::Pow => a.powf(b),
    };
    Ok(Value::Float(result))
}

/// Equality across numeric types (`1 == 1.0 == True`), structural otherwise
fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (Number::of(lhs), Number::of(rhs)) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => a == b,
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        _ => match (lhs, rhs) {
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
            }
            _ => lhs == rhs,
        },
    }
}

fn ordering(lhs: &Value, rhs: &Value) -> EvalResult<Ordering> {
    match (Number::of(lhs), Number::of(rhs)) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => Ok(a.cmp(&b)),
        (Some(a), Some(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .ok_or_else(|| EvalError::TypeError("cannot order NaN".to_string())),
        _ => match (lhs, rhs) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    let ord = ordering(x, y)?;
                    if ord != Ordering::Equal {
                        return Ok(ord);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(type_error("<", lhs, rhs)),
        },
    }
}

fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match (container, item) {
        (Value::List(items), _) => Ok(items.iter().any(|x| values_equal(x, item))),
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_str())),
        _ => Err(type_error("in", item, container)),
    }
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> EvalResult<bool> {
    match op {
        CompareOp::Eq => Ok(values_equal(lhs, rhs)),
        CompareOp::Ne => Ok(!values_equal(lhs, rhs)),
        CompareOp::Lt => Ok(ordering(lhs, rhs)? == Ordering::Less),
        CompareOp::Le => Ok(ordering(lhs, rhs)? != Ordering::Greater),
        CompareOp::Gt => Ok(ordering(lhs, rhs)? == Ordering::Greater),
        CompareOp::Ge => Ok(ordering(lhs, rhs)? != Ordering::Less),
        CompareOp::In => contains(rhs, lhs),
        CompareOp::NotIn => contains(rhs, lhs).map(|found| !found),
    }
}

/// Resolve a possibly negative index against a length
fn position(index: i64, len: usize) -> EvalResult<usize> {
    let len = len as i64;
    let resolved = if index < 0 { index + len } else { index };
    if resolved < 0 || resolved >= len {
        return Err(EvalError::IndexOutOfRange(index));
    }
    Ok(resolved as usize)
}

fn subscript(target: &Value, index: &Value) -> EvalResult<Value> {
    let i = match Number::of(index) {
        Some(Number::Int(i)) => i,
        _ => {
            return Err(EvalError::TypeError(format!(
                "indices must be integers, not '{}'",
                index.type_name()
            )))
        }
    };

    match target {
        Value::List(items) => Ok(items[position(i, items.len())?].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(chars[position(i, chars.len())?].to_string()))
        }
        other => Err(EvalError::TypeError(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

fn expect_arity(name: &str, args: &[Value], min: usize, max: usize) -> EvalResult<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(EvalError::InvalidArguments(format!(
            "{} expects {} argument(s), got {}",
            name,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn numeric_arg(name: &str, value: &Value) -> EvalResult<Number> {
    Number::of(value).ok_or_else(|| {
        EvalError::InvalidArguments(format!(
            "{} requires a number, got '{}'",
            name,
            value.type_name()
        ))
    })
}

fn int_arg(name: &str, value: &Value) -> EvalResult<i64> {
    match numeric_arg(name, value)? {
        Number::Int(i) => Ok(i),
        Number::Float(_) => Err(EvalError::InvalidArguments(format!(
            "{} requires an integer",
            name
        ))),
    }
}

/// Either a single list argument or the arguments themselves
fn candidates(name: &str, args: Vec<Value>) -> EvalResult<Vec<Value>> {
    let items = match <[Value; 1]>::try_from(args) {
        Ok([Value::List(items)]) => items,
        Ok([single]) => vec![single],
        Err(args) => args,
    };
    if items.is_empty() {
        return Err(EvalError::InvalidArguments(format!(
            "{} of an empty sequence",
            name
        )));
    }
    Ok(items)
}

fn extreme(name: &str, args: Vec<Value>, wanted: Ordering) -> EvalResult<Value> {
    let mut items = candidates(name, args)?.into_iter();
    let mut best = match items.next() {
        Some(first) => first,
        None => return Err(EvalError::InvalidArguments(format!("{} of nothing", name))),
    };
    for item in items {
        if ordering(&item, &best)? == wanted {
            best = item;
        }
    }
    Ok(best)
}

fn round_to(x: f64, digits: i64) -> f64 {
    let digits = digits.clamp(-308, 308) as i32;
    let scale = 10f64.powi(digits);
    (x * scale).round_ties_even() / scale
}

fn call_builtin(name: &str, args: Vec<Value>) -> EvalResult<Value> {
    match name {
        "len" => {
            expect_arity(name, &args, 1, 1)?;
            match &args[0] {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::List(items) => Ok(Value::Int(items.len() as i64)),
                other => Err(EvalError::TypeError(format!(
                    "object of type '{}' has no len()",
                    other.type_name()
                ))),
            }
        }

        "abs" => {
            expect_arity(name, &args, 1, 1)?;
            match numeric_arg(name, &args[0])? {
                Number::Int(i) => Ok(i
                    .checked_abs()
                    .map(Value::Int)
                    .unwrap_or(Value::Float((i as f64).abs()))),
                Number::Float(x) => Ok(Value::Float(x.abs())),
            }
        }

        "min" => extreme(name, args, Ordering::Less),

        "max" => extreme(name, args, Ordering::Greater),

        "sum" => {
            expect_arity(name, &args, 1, 2)?;
            let start = args.get(1).cloned().unwrap_or(Value::Int(0));
            match &args[0] {
                Value::List(items) => items
                    .iter()
                    .try_fold(start, |acc, item| binary(BinaryOp::Add, acc, item.clone())),
                other => Err(EvalError::TypeError(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                ))),
            }
        }

        "round" => {
            expect_arity(name, &args, 1, 2)?;
            let x = numeric_arg(name, &args[0])?;
            match args.get(1) {
                None => match x {
                    Number::Int(i) => Ok(Value::Int(i)),
                    Number::Float(x) if x.is_finite() => {
                        Ok(Value::Int(x.round_ties_even() as i64))
                    }
                    Number::Float(_) => Err(EvalError::InvalidArguments(
                        "cannot round a non-finite float to an integer".to_string(),
                    )),
                },
                Some(digits) => {
                    let digits = int_arg(name, digits)?;
                    match x {
                        Number::Int(i) if digits >= 0 => Ok(Value::Int(i)),
                        other => Ok(Value::Float(round_to(other.as_f64(), digits))),
                    }
                }
            }
        }

        "int" => {
            expect_arity(name, &args, 1, 1)?;
            match &args[0] {
                Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
                    EvalError::InvalidArguments(format!("invalid literal for int(): '{}'", s))
                }),
                other => match numeric_arg(name, other)? {
                    Number::Int(i) => Ok(Value::Int(i)),
                    Number::Float(x) if x.is_finite() => Ok(Value::Int(x.trunc() as i64)),
                    Number::Float(_) => Err(EvalError::InvalidArguments(
                        "cannot convert a non-finite float to int".to_string(),
                    )),
                },
            }
        }

        "float" => {
            expect_arity(name, &args, 1, 1)?;
            match &args[0] {
                Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
                    EvalError::InvalidArguments(format!(
                        "could not convert string to float: '{}'",
                        s
                    ))
                }),
                other => Ok(Value::Float(numeric_arg(name, other)?.as_f64())),
            }
        }

        "str" => {
            expect_arity(name, &args, 1, 1)?;
            Ok(Value::Str(args[0].to_string()))
        }

        "bool" => {
            expect_arity(name, &args, 1, 1)?;
            Ok(Value::Bool(args[0].is_truthy()))
        }

        "sqrt" => {
            expect_arity(name, &args, 1, 1)?;
            let x = numeric_arg(name, &args[0])?.as_f64();
            if x < 0.0 {
                return Err(EvalError::InvalidArguments(
                    "sqrt of a negative number".to_string(),
                ));
            }
            Ok(Value::Float(x.sqrt()))
        }

        "range" => {
            expect_arity(name, &args, 1, 3)?;
            let bounds = args
                .iter()
                .map(|arg| int_arg(name, arg))
                .collect::<EvalResult<Vec<_>>>()?;
            let (start, stop, step) = match bounds.as_slice() {
                [stop] => (0, *stop, 1),
                [start, stop] => (*start, *stop, 1),
                [start, stop, step] => (*start, *stop, *step),
                _ => {
                    return Err(EvalError::InvalidArguments(
                        "range expects 1 to 3 arguments".to_string(),
                    ))
                }
            };
            if step == 0 {
                return Err(EvalError::InvalidArguments(
                    "range step must not be zero".to_string(),
                ));
            }
            // Sized up front in i128 so no bound can overflow
            let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
            let span = if step > 0 { stop - start } else { start - stop };
            let len = if span <= 0 {
                0
            } else {
                (span + step.abs() - 1) / step.abs()
            };
            if len > MAX_SEQUENCE_LEN as i128 {
                return Err(EvalError::TooLarge(MAX_SEQUENCE_LEN));
            }
            let items = (0..len)
                .map(|k| Value::Int((start + k * step) as i64))
                .collect();
            Ok(Value::List(items))
        }

        _ => Err(EvalError::UnknownFunction(name.to_string())),
    }
}
