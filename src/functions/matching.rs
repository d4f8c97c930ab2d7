//! `isMatch(input, pattern)`.

use dashmap::DashMap;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

use crate::expression::evaluation::{apply, string_or_empty, verify_string_or_null};
use crate::expression::validation::validate_order;
use crate::expression::{Expression, OperatorDefinition};
use crate::{BindError, BindResult, EvalError, EvalResult, ReturnType, Value};

lazy_static! {
    static ref CACHE: DashMap<String, Regex> = DashMap::new();
}

/// Compiled pattern, shared across threads and evaluations.
pub fn compile(pattern: &str) -> EvalResult<Regex> {
    if pattern.is_empty() {
        return Err(EvalError::invalid("regular expression is empty."));
    }
    if let Some(regex) = CACHE.get(pattern) {
        return Ok(regex.clone());
    }
    let regex = Regex::new(pattern).map_err(|e| {
        EvalError::invalid(format!("{} is not a valid regular expression: {}", pattern, e))
    })?;
    trace!("caching regular expression {}", pattern);
    CACHE.insert(pattern.to_string(), regex.clone());
    Ok(regex)
}

fn validate_is_match(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[], &[ReturnType::STRING, ReturnType::STRING])?;
    match expression.child(1).and_then(Expression::as_constant) {
        Some(Value::String(pattern)) if !pattern.is_empty() => compile(pattern)
            .map(|_| ())
            .map_err(|e| BindError::invalid(expression, e.message())),
        _ => Ok(()),
    }
}

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![OperatorDefinition::new(
        "isMatch",
        ReturnType::BOOLEAN,
        apply(
            |args| {
                let regex = compile(&string_or_empty(args, 1))?;
                Ok(Value::Boolean(regex.is_match(&string_or_empty(args, 0))))
            },
            Some(verify_string_or_null),
        ),
        validate_is_match,
    )]
}
