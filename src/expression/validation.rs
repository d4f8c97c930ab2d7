//! Bind-time checks over the static return types of a node's children.

use crate::{BindError, BindResult, ReturnType};

use super::Expression;

fn arity_error(expression: &Expression, min: usize, max: usize) -> BindError {
    let expected = if min == max {
        min.to_string()
    } else if max == usize::MAX {
        format!("at least {}", min)
    } else {
        format!("between {} and {}", min, max)
    };
    BindError::Arity {
        expression: expression.to_string(),
        expected,
        found: expression.children().len(),
    }
}

fn check_child(expression: &Expression, position: usize, required: ReturnType) -> BindResult<()> {
    let child = &expression.children()[position];
    let found = child.return_type();
    if required.accepts(found) {
        Ok(())
    } else {
        Err(BindError::TypeMismatch {
            expression: expression.to_string(),
            position,
            expected: required,
            found,
        })
    }
}

pub fn validate_arity(expression: &Expression, min: usize, max: usize) -> BindResult<()> {
    let count = expression.children().len();
    if count < min || count > max {
        return Err(arity_error(expression, min, max));
    }
    Ok(())
}

/// Between `min` and `max` children, each of type `required`.
pub fn validate_arity_and_any_type(
    expression: &Expression,
    min: usize,
    max: usize,
    required: ReturnType,
) -> BindResult<()> {
    validate_arity(expression, min, max)?;
    (0..expression.children().len()).try_for_each(|i| check_child(expression, i, required))
}

/// Positional types: every type in `expected` is required, followed by any
/// prefix of `optional`.
pub fn validate_order(
    expression: &Expression,
    optional: &[ReturnType],
    expected: &[ReturnType],
) -> BindResult<()> {
    validate_arity(expression, expected.len(), expected.len() + optional.len())?;
    expected
        .iter()
        .chain(optional)
        .take(expression.children().len())
        .enumerate()
        .try_for_each(|(i, required)| check_child(expression, i, *required))
}

pub fn validate_at_least_one(expression: &Expression) -> BindResult<()> {
    validate_arity_and_any_type(expression, 1, usize::MAX, ReturnType::ANY)
}

pub fn validate_number(expression: &Expression) -> BindResult<()> {
    validate_arity_and_any_type(expression, 1, usize::MAX, ReturnType::NUMBER)
}

pub fn validate_two_or_more_numbers(expression: &Expression) -> BindResult<()> {
    validate_arity_and_any_type(expression, 2, usize::MAX, ReturnType::NUMBER)
}

pub fn validate_no_children(expression: &Expression) -> BindResult<()> {
    validate_arity(expression, 0, 0)
}

pub fn validate_unary(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[], &[ReturnType::ANY])
}

pub fn validate_unary_number(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[], &[ReturnType::NUMBER])
}

pub fn validate_unary_string(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[], &[ReturnType::STRING])
}

pub fn validate_unary_boolean(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[], &[ReturnType::BOOLEAN])
}

pub fn validate_unary_or_binary_string(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[ReturnType::STRING], &[ReturnType::STRING])
}

pub fn validate_unary_or_binary_number(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[ReturnType::NUMBER], &[ReturnType::NUMBER])
}

pub fn validate_binary(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[], &[ReturnType::ANY, ReturnType::ANY])
}

pub fn validate_binary_number(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[], &[ReturnType::NUMBER, ReturnType::NUMBER])
}

pub fn validate_binary_string(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[], &[ReturnType::STRING, ReturnType::STRING])
}
