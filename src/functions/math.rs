//! Arithmetic operators.

use crate::expression::evaluation::{
    apply, apply_sequence, verify_number, verify_number_or_numeric_list,
    verify_number_or_string_or_null,
};
use crate::expression::validation::{
    validate_arity_and_any_type, validate_binary_number, validate_order,
    validate_two_or_more_numbers, validate_unary_number, validate_unary_or_binary_number,
};
use crate::expression::{Expression, OperatorDefinition};
use crate::{EvalError, EvalResult, ReturnType, Value};

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        OperatorDefinition::new(
            "+",
            ReturnType::STRING | ReturnType::NUMBER,
            apply_sequence(add, Some(verify_number_or_string_or_null)),
            |e: &Expression| {
                validate_arity_and_any_type(
                    e,
                    2,
                    usize::MAX,
                    ReturnType::STRING | ReturnType::NUMBER,
                )
            },
        ),
        numeric("-", |a, b| a.checked_sub(b), |a, b| Ok(a - b)),
        numeric("*", |a, b| a.checked_mul(b), |a, b| Ok(a * b)),
        numeric(
            "/",
            |a, b| if b == 0 { None } else { a.checked_div(b) },
            |a, b| {
                if b == 0.0 {
                    Err(EvalError::invalid("Cannot divide by 0."))
                } else {
                    Ok(a / b)
                }
            },
        ),
        OperatorDefinition::new(
            "%",
            ReturnType::NUMBER,
            apply(|args| modulo(&args[0], &args[1]), Some(verify_number)),
            validate_binary_number,
        ),
        OperatorDefinition::new(
            "^",
            ReturnType::NUMBER,
            apply(|args| power(&args[0], &args[1]), Some(verify_number)),
            validate_binary_number,
        ),
        OperatorDefinition::new(
            "unaryMinus",
            ReturnType::NUMBER,
            apply(
                |args| match &args[0] {
                    Value::Integer(i) => Ok(i
                        .checked_neg()
                        .map(Value::Integer)
                        .unwrap_or(Value::Float(-(*i as f64)))),
                    other => Ok(Value::Float(-as_f64(other))),
                },
                Some(verify_number),
            ),
            validate_unary_number,
        ),
        OperatorDefinition::new(
            "unaryPlus",
            ReturnType::NUMBER,
            apply(|args| Ok(args[0].clone()), Some(verify_number)),
            validate_unary_number,
        ),
        OperatorDefinition::new(
            "min",
            ReturnType::NUMBER,
            apply(
                |args| extreme(args, std::cmp::Ordering::Less),
                Some(verify_number_or_numeric_list),
            ),
            validate_at_least_one_numeric,
        ),
        OperatorDefinition::new(
            "max",
            ReturnType::NUMBER,
            apply(
                |args| extreme(args, std::cmp::Ordering::Greater),
                Some(verify_number_or_numeric_list),
            ),
            validate_at_least_one_numeric,
        ),
        OperatorDefinition::new(
            "sum",
            ReturnType::NUMBER,
            apply(
                |args| sum(numbers(&args[0])?),
                Some(verify_number_or_numeric_list),
            ),
            |e: &Expression| validate_order(e, &[], &[ReturnType::ARRAY]),
        ),
        OperatorDefinition::new(
            "average",
            ReturnType::NUMBER,
            apply(
                |args| {
                    let items = numbers(&args[0])?;
                    if items.is_empty() {
                        return Err(EvalError::invalid("average requires a non-empty list."));
                    }
                    let count = items.len() as f64;
                    Ok(Value::Float(as_f64(&sum(items)?) / count))
                },
                Some(verify_number_or_numeric_list),
            ),
            |e: &Expression| validate_order(e, &[], &[ReturnType::ARRAY]),
        ),
        OperatorDefinition::new(
            "floor",
            ReturnType::NUMBER,
            apply(|args| Ok(integral(as_f64(&args[0]).floor())), Some(verify_number)),
            validate_unary_number,
        ),
        OperatorDefinition::new(
            "ceiling",
            ReturnType::NUMBER,
            apply(|args| Ok(integral(as_f64(&args[0]).ceil())), Some(verify_number)),
            validate_unary_number,
        ),
        OperatorDefinition::new(
            "round",
            ReturnType::NUMBER,
            apply(round, Some(verify_number)),
            validate_unary_or_binary_number,
        ),
        OperatorDefinition::new(
            "abs",
            ReturnType::NUMBER,
            apply(
                |args| match &args[0] {
                    Value::Integer(i) => Ok(i
                        .checked_abs()
                        .map(Value::Integer)
                        .unwrap_or(Value::Float((*i as f64).abs()))),
                    other => Ok(Value::Float(as_f64(other).abs())),
                },
                Some(verify_number),
            ),
            validate_unary_number,
        ),
        OperatorDefinition::new(
            "range",
            ReturnType::ARRAY,
            apply(range, Some(verify_number)),
            validate_binary_number,
        ),
    ]
}

fn validate_at_least_one_numeric(expression: &Expression) -> crate::BindResult<()> {
    validate_arity_and_any_type(
        expression,
        1,
        usize::MAX,
        ReturnType::NUMBER | ReturnType::ARRAY,
    )
}

/// Binary numeric operator folded over two or more operands.
///
/// Integer operands stay integers unless the checked operation overflows,
/// in which case the float operation is used.
fn numeric(
    name: &'static str,
    integer: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> EvalResult<f64>,
) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::NUMBER,
        apply_sequence(
            move |a, b| match (a, b) {
                (Value::Integer(x), Value::Integer(y)) => match integer(*x, *y) {
                    Some(result) => Ok(Value::Integer(result)),
                    None => float(*x as f64, *y as f64).map(Value::Float),
                },
                _ => float(as_f64(a), as_f64(b)).map(Value::Float),
            },
            Some(verify_number),
        ),
        validate_two_or_more_numbers,
    )
}

fn as_f64(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

/// A float with no fractional part as an integer value when it fits.
pub(crate) fn integral(x: f64) -> Value {
    Value::Float(x).as_integer().map(Value::Integer).unwrap_or(Value::Float(x))
}

fn add(a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Ok(x
            .checked_add(*y)
            .map(Value::Integer)
            .unwrap_or(Value::Float(*x as f64 + *y as f64))),
        (x, y) if x.is_number() && y.is_number() => Ok(Value::Float(as_f64(x) + as_f64(y))),
        (Value::String(_), _) | (_, Value::String(_)) => {
            let text = |v: &Value| if v.is_null() { String::new() } else { v.to_string() };
            Ok(Value::String(format!("{}{}", text(a), text(b))))
        }
        _ => Err(EvalError::invalid(format!(
            "Operator '+' or add cannot be applied to operands of type '{}' and '{}'.",
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn modulo(a: &Value, b: &Value) -> EvalResult<Value> {
    match (a, b) {
        (_, b) if as_f64(b) == 0.0 => Err(EvalError::invalid("Cannot mod by 0.")),
        (Value::Integer(x), Value::Integer(y)) => Ok(Value::Integer(x.wrapping_rem(*y))),
        (x, y) => Ok(Value::Float(as_f64(x) % as_f64(y))),
    }
}

fn power(base: &Value, exponent: &Value) -> EvalResult<Value> {
    if let (Value::Integer(b), Value::Integer(e)) = (base, exponent) {
        if let Some(result) = u32::try_from(*e).ok().and_then(|e| b.checked_pow(e)) {
            return Ok(Value::Integer(result));
        }
    }
    Ok(Value::Float(as_f64(base).powf(as_f64(exponent))))
}

fn numbers(value: &Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items.clone()),
        v if v.is_number() => Ok(vec![v.clone()]),
        other => Err(EvalError::invalid(format!("{} is not a list of numbers.", other))),
    }
}

fn sum(items: Vec<Value>) -> EvalResult<Value> {
    items
        .iter()
        .try_fold(Value::Integer(0), |acc, item| add(&acc, item))
}

fn extreme(args: &[Value], wanted: std::cmp::Ordering) -> EvalResult<Value> {
    let mut best: Option<Value> = None;
    for item in args.iter().map(numbers).collect::<EvalResult<Vec<_>>>()?.into_iter().flatten() {
        best = match best {
            Some(current) if item.compare(&current) != Some(wanted) => Some(current),
            _ => Some(item),
        };
    }
    best.ok_or_else(|| EvalError::invalid("Cannot find the extreme of an empty list."))
}

fn round(args: &[Value]) -> EvalResult<Value> {
    let x = as_f64(&args[0]);
    let Some(digits) = args.get(1) else {
        return Ok(integral(x.round()));
    };
    match digits.as_integer() {
        Some(d @ 0..=15) => {
            let scale = 10f64.powi(d as i32);
            let rounded = (x * scale).round() / scale;
            Ok(if d == 0 { integral(rounded) } else { Value::Float(rounded) })
        }
        _ => Err(EvalError::invalid(format!(
            "The second parameter {} must be an integer between 0 and 15.",
            digits
        ))),
    }
}

fn range(args: &[Value]) -> EvalResult<Value> {
    let (Some(start), Some(count)) = (args[0].as_integer(), args[1].as_integer()) else {
        return Err(EvalError::invalid("range requires integer arguments."));
    };
    if count <= 0 {
        return Err(EvalError::invalid(format!(
            "The second parameter {} should be more than zero.",
            count
        )));
    }
    let items = (0..count)
        .map(|i| {
            start
                .checked_add(i)
                .map(Value::Integer)
                .ok_or_else(|| EvalError::invalid("range overflows the integer bounds."))
        })
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(Value::Array(items))
}
