//! Evaluator for parsed expressions.

use std::collections::HashMap;

use ordered_float::OrderedFloat;

use super::parser::{BinaryOp, Expr, UnaryOp};
use crate::error::EngineError;
use crate::model::value::IoValue;

/// Evaluate one expression against a positional-argument environment.
pub fn evaluate(expr: &Expr, env: &HashMap<String, IoValue>) -> Result<IoValue, EngineError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Var(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::script(format!("Unknown identifier '{}'", name))),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, env)?;
            apply_unary(*op, value)
        }
        Expr::Binary { op, lhs, rhs } => {
            // Short-circuit logical operators before evaluating the right side.
            match op {
                BinaryOp::And => {
                    let left = evaluate(lhs, env)?;
                    if !left.truthy() {
                        return Ok(IoValue::Boolean(false));
                    }
                    Ok(IoValue::Boolean(evaluate(rhs, env)?.truthy()))
                }
                BinaryOp::Or => {
                    let left = evaluate(lhs, env)?;
                    if left.truthy() {
                        return Ok(IoValue::Boolean(true));
                    }
                    Ok(IoValue::Boolean(evaluate(rhs, env)?.truthy()))
                }
                _ => {
                    let left = evaluate(lhs, env)?;
                    let right = evaluate(rhs, env)?;
                    apply_binary(*op, left, right)
                }
            }
        }
        Expr::Call { name, args } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(evaluate(arg, env)?);
            }
            call_builtin(name, &values)
        }
        Expr::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(evaluate(item, env)?);
            }
            Ok(IoValue::Array(values))
        }
    }
}

fn apply_unary(op: UnaryOp, value: IoValue) -> Result<IoValue, EngineError> {
    match op {
        UnaryOp::Not => Ok(IoValue::Boolean(!value.truthy())),
        UnaryOp::Neg => match value {
            IoValue::Integer(i) => i
                .checked_neg()
                .map(IoValue::Integer)
                .ok_or_else(|| EngineError::script("Integer overflow in negation")),
            IoValue::Number(n) => Ok(IoValue::Number(-n)),
            other => Err(EngineError::script(format!(
                "Cannot negate {:?}",
                other
            ))),
        },
    }
}

fn apply_binary(op: BinaryOp, left: IoValue, right: IoValue) -> Result<IoValue, EngineError> {
    match op {
        BinaryOp::Add => match (&left, &right) {
            (IoValue::String(a), IoValue::String(b)) => {
                Ok(IoValue::String(format!("{}{}", a, b)))
            }
            _ => numeric_op(op, &left, &right),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            numeric_op(op, &left, &right)
        }
        BinaryOp::Eq => Ok(IoValue::Boolean(loose_eq(&left, &right))),
        BinaryOp::Ne => Ok(IoValue::Boolean(!loose_eq(&left, &right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(&left, &right)?;
            let result = match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(IoValue::Boolean(result))
        }
        BinaryOp::And | BinaryOp::Or => unreachable!("handled with short-circuit"),
    }
}

/// Integer arithmetic stays integral except division, which always yields a
/// float. Overflow is a script error confined to the calling element, not a
/// panic.
fn numeric_op(op: BinaryOp, left: &IoValue, right: &IoValue) -> Result<IoValue, EngineError> {
    if let (IoValue::Integer(a), IoValue::Integer(b)) = (left, right) {
        let checked = match op {
            BinaryOp::Add => Some(a.checked_add(*b)),
            BinaryOp::Sub => Some(a.checked_sub(*b)),
            BinaryOp::Mul => Some(a.checked_mul(*b)),
            BinaryOp::Rem => {
                if *b == 0 {
                    return Err(EngineError::script("Modulo by zero"));
                }
                Some(a.checked_rem(*b))
            }
            _ => None,
        };
        if let Some(result) = checked {
            return result.map(IoValue::Integer).ok_or_else(|| {
                EngineError::script(format!(
                    "Integer overflow evaluating {} {:?} {}",
                    a, op, b
                ))
            });
        }
    }

    let (a, b) = match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(EngineError::script(format!(
                "Arithmetic on non-numeric operands: {:?} and {:?}",
                left, right
            )));
        }
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EngineError::script("Division by zero"));
            }
            a / b
        }
        BinaryOp::Rem => {
            if b == 0.0 {
                return Err(EngineError::script("Modulo by zero"));
            }
            a % b
        }
        _ => unreachable!(),
    };
    Ok(IoValue::Number(OrderedFloat(result)))
}

/// Equality that treats `1` and `1.0` as equal; everything else is strict.
fn loose_eq(left: &IoValue, right: &IoValue) -> bool {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => left == right,
    }
}

fn compare(left: &IoValue, right: &IoValue) -> Result<std::cmp::Ordering, EngineError> {
    if let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) {
        return a.partial_cmp(&b).ok_or_else(|| {
            EngineError::script("Cannot order NaN")
        });
    }
    if let (IoValue::String(a), IoValue::String(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    Err(EngineError::script(format!(
        "Cannot compare {:?} with {:?}",
        left, right
    )))
}

fn call_builtin(name: &str, args: &[IoValue]) -> Result<IoValue, EngineError> {
    match name {
        "abs" => {
            let [value] = expect_args::<1>(name, args)?;
            match value {
                IoValue::Integer(i) => i
                    .checked_abs()
                    .map(IoValue::Integer)
                    .ok_or_else(|| EngineError::script("Integer overflow in abs()")),
                _ => Ok(IoValue::from(numeric(name, value)?.abs())),
            }
        }
        "min" | "max" => {
            if args.is_empty() {
                return Err(EngineError::script(format!("{}() needs arguments", name)));
            }
            // All-integer arguments stay integral; any float promotes the
            // whole result (and skips lossy i64-through-f64 round trips).
            if args.iter().all(|arg| matches!(arg, IoValue::Integer(_))) {
                let mut best = args[0].as_i64().unwrap_or_default();
                for arg in &args[1..] {
                    let i = arg.as_i64().unwrap_or_default();
                    best = if name == "min" { best.min(i) } else { best.max(i) };
                }
                return Ok(IoValue::Integer(best));
            }
            let mut best = numeric(name, &args[0])?;
            for arg in &args[1..] {
                let n = numeric(name, arg)?;
                best = if name == "min" { best.min(n) } else { best.max(n) };
            }
            Ok(IoValue::from(best))
        }
        "floor" => Ok(IoValue::from(numeric(name, one_arg(name, args)?)?.floor())),
        "ceil" => Ok(IoValue::from(numeric(name, one_arg(name, args)?)?.ceil())),
        "round" => Ok(IoValue::from(numeric(name, one_arg(name, args)?)?.round())),
        "sqrt" => {
            let n = numeric(name, one_arg(name, args)?)?;
            if n < 0.0 {
                return Err(EngineError::script("sqrt() of a negative number"));
            }
            Ok(IoValue::from(n.sqrt()))
        }
        "pow" => {
            let [base, exponent] = expect_args::<2>(name, args)?;
            Ok(IoValue::from(
                numeric(name, base)?.powf(numeric(name, exponent)?),
            ))
        }
        "len" => {
            let value = one_arg(name, args)?;
            let length = match value {
                IoValue::String(s) => s.chars().count(),
                IoValue::Array(a) => a.len(),
                IoValue::Map(m) => m.len(),
                other => {
                    return Err(EngineError::script(format!(
                        "len() of unsupported value {:?}",
                        other
                    )));
                }
            };
            Ok(IoValue::Integer(length as i64))
        }
        "if" => {
            let [condition, then_value, else_value] = expect_args::<3>(name, args)?;
            if condition.truthy() {
                Ok(then_value.clone())
            } else {
                Ok(else_value.clone())
            }
        }
        other => Err(EngineError::script(format!(
            "Unknown function '{}'",
            other
        ))),
    }
}

fn one_arg<'a>(name: &str, args: &'a [IoValue]) -> Result<&'a IoValue, EngineError> {
    if args.len() != 1 {
        return Err(EngineError::script(format!(
            "{}() takes 1 argument, got {}",
            name,
            args.len()
        )));
    }
    Ok(&args[0])
}

fn expect_args<'a, const N: usize>(
    name: &str,
    args: &'a [IoValue],
) -> Result<[&'a IoValue; N], EngineError> {
    if args.len() != N {
        return Err(EngineError::script(format!(
            "{}() takes {} arguments, got {}",
            name,
            N,
            args.len()
        )));
    }
    let mut refs = [&args[0]; N];
    for (slot, value) in refs.iter_mut().zip(args.iter()) {
        *slot = value;
    }
    Ok(refs)
}

fn numeric(context: &str, value: &IoValue) -> Result<f64, EngineError> {
    value.as_f64().ok_or_else(|| {
        EngineError::script(format!("{}() expects a number, got {:?}", context, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::expr::parser::parse_source;

    fn eval_one(source: &str, env: &[(&str, IoValue)]) -> Result<IoValue, EngineError> {
        let defs = parse_source(source).unwrap();
        let env: HashMap<String, IoValue> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        evaluate(&defs[0].body[0], &env)
    }

    #[test]
    fn test_integer_arithmetic_stays_integral() {
        let result = eval_one("f(x) = x * 2 + 1", &[("x", IoValue::Integer(3))]).unwrap();
        assert_eq!(result, IoValue::Integer(7));
    }

    #[test]
    fn test_division_yields_float() {
        let result = eval_one("f(x) = x / 2", &[("x", IoValue::Integer(7))]).unwrap();
        assert_eq!(result, IoValue::from(3.5));
    }

    #[test]
    fn test_string_concat_and_comparison() {
        let result = eval_one("f(a) = a + '!'", &[("a", IoValue::from("hi"))]).unwrap();
        assert_eq!(result, IoValue::from("hi!"));

        let result = eval_one("f(a) = a < 'z'", &[("a", IoValue::from("hi"))]).unwrap();
        assert_eq!(result, IoValue::Boolean(true));
    }

    #[test]
    fn test_builtins() {
        assert_eq!(
            eval_one("f(x) = min(x, 2, 8)", &[("x", IoValue::Integer(5))]).unwrap(),
            IoValue::Integer(2)
        );
        assert_eq!(
            eval_one("f(x) = max(x, 2.5)", &[("x", IoValue::Integer(5))]).unwrap(),
            IoValue::from(5.0)
        );
        assert_eq!(
            eval_one("f(x) = if(x > 3, 'big', 'small')", &[("x", IoValue::Integer(5))]).unwrap(),
            IoValue::from("big")
        );
        assert_eq!(
            eval_one("f(x) = len(x)", &[("x", IoValue::from("abc"))]).unwrap(),
            IoValue::Integer(3)
        );
        assert_eq!(
            eval_one("f(x) = pow(x, 2)", &[("x", IoValue::Integer(3))]).unwrap(),
            IoValue::from(9.0)
        );
    }

    #[test]
    fn test_short_circuit() {
        // The right side would fail on a non-numeric operand if evaluated.
        let result = eval_one(
            "f(a) = false && (a / 0 > 1)",
            &[("a", IoValue::Integer(1))],
        )
        .unwrap();
        assert_eq!(result, IoValue::Boolean(false));
    }

    #[test]
    fn test_unknown_identifier() {
        let err = eval_one("f(x) = y + 1", &[("x", IoValue::Integer(1))]).unwrap_err();
        assert!(err.to_string().contains("Unknown identifier 'y'"));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(eval_one("f(x) = x / 0", &[("x", IoValue::Integer(1))]).is_err());
    }

    // Overflow must surface as a script error, not a panic, so the engine can
    // confine it to the failing element.
    #[test]
    fn test_integer_overflow_is_an_error() {
        let max = IoValue::Integer(i64::MAX);
        let err = eval_one("inc(x) = x + 1", &[("x", max.clone())]).unwrap_err();
        assert!(err.to_string().contains("overflow"));

        assert!(eval_one("f(x) = x * 2", &[("x", max)]).is_err());

        let min = IoValue::Integer(i64::MIN);
        assert!(eval_one("f(x) = 0 - x", &[("x", min.clone())]).is_err());
        assert!(eval_one("f(x) = -x", &[("x", min.clone())]).is_err());
        assert!(eval_one("f(x) = abs(x)", &[("x", min.clone())]).is_err());
        assert!(eval_one("f(x) = x % -1", &[("x", min)]).is_err());
    }
}
