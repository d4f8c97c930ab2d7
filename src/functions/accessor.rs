//! Memory and property access.

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::expression::evaluation::{apply, evaluate_children};
use crate::expression::validation::{validate_arity, validate_order, validate_unary};
use crate::expression::{Expression, OperatorDefinition};
use crate::memory::{get_path, parse_path};
use crate::{
    BindError, BindResult, EvalError, EvalResult, EvaluationOptions, Memory, ReturnType, Value,
};

pub const ACCESSOR: &str = "accessor";
pub const ELEMENT: &str = "element";

lazy_static! {
    static ref ACCESSOR_DEFINITION: Arc<OperatorDefinition> = Arc::new(OperatorDefinition::new(
        ACCESSOR,
        ReturnType::OBJECT,
        evaluate_accessor,
        validate_accessor,
    ));
}

pub(crate) fn accessor_definition() -> Arc<OperatorDefinition> {
    ACCESSOR_DEFINITION.clone()
}

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        OperatorDefinition::new(ELEMENT, ReturnType::OBJECT, evaluate_element, |e: &Expression| {
            validate_order(e, &[], &[ReturnType::ANY, ReturnType::NUMBER | ReturnType::STRING])
        }),
        OperatorDefinition::new(
            "getProperty",
            ReturnType::OBJECT,
            evaluate_get_property,
            |e: &Expression| validate_order(e, &[ReturnType::STRING], &[ReturnType::ANY]),
        ),
        OperatorDefinition::new(
            "setPathToValue",
            ReturnType::OBJECT,
            evaluate_set_path_to_value,
            validate_set_path_to_value,
        ),
        OperatorDefinition::new(
            "exists",
            ReturnType::BOOLEAN,
            apply(|args| Ok(Value::Boolean(!args[0].is_null())), None),
            validate_unary,
        ),
    ]
}

fn constant_path(expression: &Expression) -> Option<&str> {
    expression
        .child(0)
        .and_then(Expression::as_constant)
        .and_then(Value::as_str)
}

fn validate_accessor(expression: &Expression) -> BindResult<()> {
    validate_arity(expression, 1, 2)?;
    match constant_path(expression) {
        Some(path) if parse_path(path).is_ok() => Ok(()),
        _ => Err(BindError::invalid(
            expression,
            "the first child must be a constant property path",
        )),
    }
}

fn evaluate_accessor(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
) -> EvalResult<Value> {
    let path = constant_path(expression)
        .ok_or_else(|| EvalError::invalid(format!("{} has no property path.", expression)))?;
    match expression.child(1) {
        None => Ok(memory.get_value(path).unwrap_or_default()),
        Some(instance) => {
            let instance = instance.evaluate(memory, options)?;
            let segments = parse_path(path)?;
            Ok(get_path(&instance, &segments).unwrap_or_default())
        }
    }
}

fn evaluate_element(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
) -> EvalResult<Value> {
    let instance = expression.children()[0].evaluate(memory, options)?;
    let index = expression.children()[1].evaluate(memory, options)?;
    match (&instance, &index) {
        (Value::Null, _) => Ok(Value::Null),
        (Value::Array(items), index) => {
            let i = index.as_integer().ok_or_else(|| {
                EvalError::invalid(format!("{} is not an integer.", expression.children()[1]))
            })?;
            Ok(usize::try_from(i)
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default())
        }
        (Value::Object(obj), Value::String(key)) => Ok(obj.get(key).unwrap_or_default()),
        (Value::Object(_), _) => Err(EvalError::invalid(format!(
            "{} is not a string.",
            expression.children()[1]
        ))),
        _ => Err(EvalError::invalid(format!(
            "{} is not a collection.",
            expression.children()[0]
        ))),
    }
}

fn evaluate_get_property(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
) -> EvalResult<Value> {
    let args = evaluate_children(expression, memory, options, None)?;
    match args.as_slice() {
        [Value::String(name)] => Ok(memory.get_value(name).unwrap_or_default()),
        [other] => Err(EvalError::invalid(format!("{} is not a string.", other))),
        [Value::Null, _] => Ok(Value::Null),
        [Value::Object(obj), Value::String(name)] => Ok(obj.get(name).unwrap_or_default()),
        [Value::Object(_), other] => Err(EvalError::invalid(format!(
            "{} is not a string.",
            other
        ))),
        [other, _] => Err(EvalError::invalid(format!("{} is not an object.", other))),
        _ => Ok(Value::Null),
    }
}

/// Memory path denoted by an accessor or element chain.
///
/// Element indexes are evaluated; everything else must be static.
fn accumulate_path(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
) -> EvalResult<Option<String>> {
    match expression.name() {
        ACCESSOR => {
            let Some(path) = constant_path(expression) else {
                return Ok(None);
            };
            match expression.child(1) {
                None => Ok(Some(path.to_string())),
                Some(instance) => Ok(accumulate_path(instance, memory, options)?
                    .map(|prefix| format!("{}.{}", prefix, path))),
            }
        }
        ELEMENT => {
            let Some(prefix) = accumulate_path(&expression.children()[0], memory, options)? else {
                return Ok(None);
            };
            let index = expression.children()[1].evaluate(memory, options)?;
            Ok(match index {
                Value::String(key) => Some(format!("{}['{}']", prefix, key)),
                other => other.as_integer().map(|i| format!("{}[{}]", prefix, i)),
            })
        }
        _ => Ok(None),
    }
}

fn validate_set_path_to_value(expression: &Expression) -> BindResult<()> {
    validate_order(expression, &[], &[ReturnType::ANY, ReturnType::ANY])?;
    match expression.children()[0].name() {
        ACCESSOR | ELEMENT => Ok(()),
        _ => Err(BindError::invalid(
            expression,
            "the first child must be a property path",
        )),
    }
}

fn evaluate_set_path_to_value(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
) -> EvalResult<Value> {
    let target = &expression.children()[0];
    let path = accumulate_path(target, memory, options)?
        .ok_or_else(|| EvalError::invalid(format!("{} is not a valid path.", target)))?;
    let value = expression.children()[1].evaluate(memory, options)?;
    memory.set_value(&path, value.clone())?;
    Ok(value)
}
