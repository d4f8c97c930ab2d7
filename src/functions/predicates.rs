use crate::expression::evaluation::apply;
use crate::expression::validation::validate_unary;
use crate::expression::OperatorDefinition;
use crate::{ReturnType, Value};

use super::datetime::parse_timestamp;

fn predicate(name: &'static str, test: fn(&Value) -> bool) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::BOOLEAN,
        apply(move |args| Ok(Value::Boolean(test(&args[0]))), None),
        validate_unary,
    )
}

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        predicate("isString", |v| matches!(v, Value::String(_))),
        predicate("isInteger", |v| match v {
            Value::Integer(_) => true,
            Value::Float(f) => f.is_finite() && f.fract() == 0.0,
            _ => false,
        }),
        predicate("isFloat", |v| matches!(v, Value::Float(f) if f.fract() != 0.0)),
        predicate("isArray", |v| matches!(v, Value::Array(_))),
        predicate("isObject", |v| matches!(v, Value::Object(_))),
        predicate("isBoolean", |v| matches!(v, Value::Boolean(_))),
        predicate("isDateTime", |v| {
            v.as_str().is_some_and(|s| parse_timestamp(s).is_ok())
        }),
    ]
}
