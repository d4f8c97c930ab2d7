//! Evaluation building blocks shared by the operator families.

use crate::{EvalError, EvalResult, EvaluationOptions, Memory, Value};

use super::Expression;

/// Checks one evaluated child; `Some(message)` fails the call with that message.
pub type VerifyFn = fn(&Value, &Expression) -> Option<String>;

/// Evaluate every child left to right.
///
/// The first failing child, or the first value rejected by `verify`, ends
/// the walk: its error is returned unchanged and children to its right are
/// never evaluated.
pub fn evaluate_children(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
    verify: Option<VerifyFn>,
) -> EvalResult<Vec<Value>> {
    let children = expression.children();
    let mut args = Vec::with_capacity(children.len());
    for child in children {
        let value = child.evaluate(memory, options)?;
        if let Some(message) = verify.and_then(|verify| verify(&value, child)) {
            return Err(EvalError::invalid(message));
        }
        args.push(value);
    }
    Ok(args)
}

/// Evaluator over the fully evaluated argument list.
pub fn apply<F>(
    f: F,
    verify: Option<VerifyFn>,
) -> impl Fn(&Expression, &dyn Memory, &EvaluationOptions) -> EvalResult<Value>
       + Send
       + Sync
       + 'static
where
    F: Fn(&[Value]) -> EvalResult<Value> + Send + Sync + 'static,
{
    move |expression: &Expression, memory: &dyn Memory, options: &EvaluationOptions| {
        let args = evaluate_children(expression, memory, options, verify)?;
        f(&args)
    }
}

/// Like [`apply`], for operators that read the evaluation options.
pub fn apply_with_options<F>(
    f: F,
    verify: Option<VerifyFn>,
) -> impl Fn(&Expression, &dyn Memory, &EvaluationOptions) -> EvalResult<Value>
       + Send
       + Sync
       + 'static
where
    F: Fn(&[Value], &EvaluationOptions) -> EvalResult<Value> + Send + Sync + 'static,
{
    move |expression: &Expression, memory: &dyn Memory, options: &EvaluationOptions| {
        let args = evaluate_children(expression, memory, options, verify)?;
        f(&args, options)
    }
}

/// Left fold of a binary operation over two or more arguments.
pub fn apply_sequence<F>(
    f: F,
    verify: Option<VerifyFn>,
) -> impl Fn(&Expression, &dyn Memory, &EvaluationOptions) -> EvalResult<Value>
       + Send
       + Sync
       + 'static
where
    F: Fn(&Value, &Value) -> EvalResult<Value> + Send + Sync + 'static,
{
    apply(
        move |args: &[Value]| {
            let Some((first, rest)) = args.split_first() else {
                return Ok(Value::Null);
            };
            rest.iter()
                .try_fold(first.clone(), |acc, next| f(&acc, next))
        },
        verify,
    )
}

pub fn verify_number(value: &Value, expression: &Expression) -> Option<String> {
    (!value.is_number()).then(|| format!("{} is not a number.", expression))
}

pub fn verify_integer(value: &Value, expression: &Expression) -> Option<String> {
    match value {
        Value::Integer(_) => None,
        _ => Some(format!("{} is not an integer.", expression)),
    }
}

pub fn verify_number_or_numeric_list(value: &Value, expression: &Expression) -> Option<String> {
    match value {
        v if v.is_number() => None,
        Value::Array(items) if items.iter().all(Value::is_number) => None,
        _ => Some(format!("{} is neither a number nor a list of numbers.", expression)),
    }
}

pub fn verify_string(value: &Value, expression: &Expression) -> Option<String> {
    match value {
        Value::String(_) => None,
        _ => Some(format!("{} is not a string.", expression)),
    }
}

pub fn verify_string_or_null(value: &Value, expression: &Expression) -> Option<String> {
    match value {
        Value::String(_) | Value::Null => None,
        _ => Some(format!("{} is neither a string nor a null object.", expression)),
    }
}

pub fn verify_number_or_string(value: &Value, expression: &Expression) -> Option<String> {
    match value {
        Value::String(_) => None,
        v if v.is_number() => None,
        _ => Some(format!("{} is not string or number.", expression)),
    }
}

pub fn verify_number_or_string_or_null(value: &Value, expression: &Expression) -> Option<String> {
    match value {
        Value::String(_) | Value::Null => None,
        v if v.is_number() => None,
        _ => Some(format!("{} is neither a number nor string.", expression)),
    }
}

pub fn verify_boolean(value: &Value, expression: &Expression) -> Option<String> {
    match value {
        Value::Boolean(_) => None,
        _ => Some(format!("{} is not a boolean.", expression)),
    }
}

pub fn verify_list(value: &Value, expression: &Expression) -> Option<String> {
    match value {
        Value::Array(_) => None,
        _ => Some(format!("{} is not a list.", expression)),
    }
}

pub fn verify_object(value: &Value, expression: &Expression) -> Option<String> {
    match value {
        Value::Object(_) => None,
        _ => Some(format!("{} is not an object.", expression)),
    }
}

pub fn verify_container(value: &Value, expression: &Expression) -> Option<String> {
    match value {
        Value::String(_) | Value::Array(_) | Value::Object(_) => None,
        _ => Some(format!("{} must be a string, list or object.", expression)),
    }
}

pub fn verify_not_null(value: &Value, expression: &Expression) -> Option<String> {
    value.is_null().then(|| format!("{} is null.", expression))
}

/// Integer argument at `index`, accepting floats without a fractional part.
pub fn integer_arg(args: &[Value], index: usize, expression: &str) -> EvalResult<i64> {
    args.get(index)
        .and_then(Value::as_integer)
        .ok_or_else(|| EvalError::invalid(format!("{} is not an integer.", expression)))
}

/// String argument at `index`; a null argument reads as the empty string.
pub fn string_or_empty(args: &[Value], index: usize) -> String {
    match args.get(index) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
