//! Equality and ordering.

use std::cmp::Ordering;

use crate::expression::evaluation::{apply, verify_not_null, verify_number_or_string};
use crate::expression::validation::{validate_binary, validate_order};
use crate::expression::{Expression, OperatorDefinition};
use crate::{EvalError, EvalResult, ReturnType, Value};

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        OperatorDefinition::new(
            "==",
            ReturnType::BOOLEAN,
            apply(|args| Ok(Value::Boolean(args[0] == args[1])), None),
            validate_binary,
        ),
        OperatorDefinition::new(
            "!=",
            ReturnType::BOOLEAN,
            apply(|args| Ok(Value::Boolean(args[0] != args[1])), None),
            validate_binary,
        ),
        ordering("<", |o| o == Ordering::Less),
        ordering("<=", |o| o != Ordering::Greater),
        ordering(">", |o| o == Ordering::Greater),
        ordering(">=", |o| o != Ordering::Less),
    ]
}

fn ordering(name: &'static str, accept: fn(Ordering) -> bool) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::BOOLEAN,
        apply(
            move |args| compare(&args[0], &args[1]).map(|o| Value::Boolean(accept(o))),
            Some(verify_comparable),
        ),
        |e: &Expression| {
            let operand = ReturnType::NUMBER | ReturnType::STRING;
            validate_order(e, &[], &[operand, operand])
        },
    )
}

fn verify_comparable(value: &Value, expression: &Expression) -> Option<String> {
    verify_not_null(value, expression).or_else(|| verify_number_or_string(value, expression))
}

fn compare(a: &Value, b: &Value) -> EvalResult<Ordering> {
    a.compare(b).ok_or_else(|| {
        EvalError::invalid(format!(
            "{} and {} are not comparable.",
            a.type_name(),
            b.type_name()
        ))
    })
}
