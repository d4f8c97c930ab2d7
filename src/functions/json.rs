//! JSON parsing, JSON path queries and object property mutation.
//!
//! `setProperty`, `removeProperty` and `addProperty` write into the object
//! they are given and return that same object, so a host holding the
//! object observes the change. Callers evaluating concurrently over one
//! object graph must serialize these operators themselves.

use crate::expression::evaluation::{apply, verify_object};
use crate::expression::validation::{
    validate_arity_and_any_type, validate_order, validate_unary_string,
};
use crate::expression::{Expression, OperatorDefinition};
use crate::value::ObjectRef;
use crate::{EvalError, EvalResult, ReturnType, Value};

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        OperatorDefinition::new(
            "json",
            ReturnType::OBJECT,
            apply(parse_json, None),
            validate_unary_string,
        ),
        OperatorDefinition::new(
            "jPath",
            ReturnType::OBJECT,
            apply(json_path, None),
            |e: &Expression| validate_order(e, &[], &[ReturnType::OBJECT, ReturnType::STRING]),
        ),
        OperatorDefinition::new(
            "merge",
            ReturnType::OBJECT,
            apply(merge, Some(verify_object)),
            |e: &Expression| validate_arity_and_any_type(e, 2, usize::MAX, ReturnType::OBJECT),
        ),
        OperatorDefinition::new(
            "addProperty",
            ReturnType::OBJECT,
            apply(
                |args| {
                    let (obj, name) = object_and_name(args)?;
                    if obj.contains_key(name) {
                        return Err(EvalError::invalid(format!("{} already exists", name)));
                    }
                    obj.set(name, args[2].clone())?;
                    Ok(args[0].clone())
                },
                None,
            ),
            validate_property_setter,
        ),
        OperatorDefinition::new(
            "setProperty",
            ReturnType::OBJECT,
            apply(
                |args| {
                    let (obj, name) = object_and_name(args)?;
                    obj.set(name, args[2].clone())?;
                    Ok(args[0].clone())
                },
                None,
            ),
            validate_property_setter,
        ),
        OperatorDefinition::new(
            "removeProperty",
            ReturnType::OBJECT,
            apply(
                |args| {
                    let (obj, name) = object_and_name(args)?;
                    obj.remove(name);
                    Ok(args[0].clone())
                },
                None,
            ),
            |e: &Expression| validate_order(e, &[], &[ReturnType::OBJECT, ReturnType::STRING]),
        ),
    ]
}

fn validate_property_setter(expression: &Expression) -> crate::BindResult<()> {
    validate_order(
        expression,
        &[],
        &[ReturnType::OBJECT, ReturnType::STRING, ReturnType::ANY],
    )
}

fn object_and_name(args: &[Value]) -> EvalResult<(&ObjectRef, &str)> {
    let obj = args[0]
        .as_object()
        .ok_or_else(|| EvalError::invalid(format!("{} is not an object.", args[0])))?;
    let name = args[1]
        .as_str()
        .ok_or_else(|| EvalError::invalid(format!("{} is not a string.", args[1])))?;
    Ok((obj, name))
}

fn parse_json(args: &[Value]) -> EvalResult<Value> {
    let Value::String(text) = &args[0] else {
        return Err(EvalError::invalid(format!("{} is not a string.", args[0])));
    };
    serde_json::from_str::<serde_json::Value>(text.trim())
        .map(Value::from)
        .map_err(|e| EvalError::parse(format!("{} is not a valid json string: {}", text, e)))
}

/// Right-biased shallow merge into a new object.
fn merge(args: &[Value]) -> EvalResult<Value> {
    let merged = ObjectRef::new();
    for obj in args.iter().filter_map(Value::as_object) {
        for (key, value) in obj.entries() {
            merged.insert(key, value);
        }
    }
    Ok(Value::Object(merged))
}

#[derive(Debug, Clone)]
enum Step {
    Child(String),
    Index(usize),
    Wildcard,
    Descendant(String),
}

fn parse_json_path(path: &str) -> EvalResult<Vec<Step>> {
    let invalid = || EvalError::invalid(format!("{} is not a valid JSON path.", path));
    let chars: Vec<char> = path.trim().chars().collect();
    let mut i = match chars.first() {
        Some('$') => 1,
        _ => 0,
    };
    let mut steps = Vec::new();
    let read_name = |start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len() && chars[end] != '.' && chars[end] != '[' {
            end += 1;
        }
        (chars[start..end].iter().collect(), end)
    };
    if i == 0 && !chars.is_empty() && chars[0] != '.' && chars[0] != '[' {
        let (name, end) = read_name(0);
        steps.push(Step::Child(name));
        i = end;
    }
    while i < chars.len() {
        match chars[i] {
            '.' if chars.get(i + 1) == Some(&'.') => {
                let (name, end) = read_name(i + 2);
                if name.is_empty() {
                    return Err(invalid());
                }
                steps.push(Step::Descendant(name));
                i = end;
            }
            '.' if chars.get(i + 1) == Some(&'*') => {
                steps.push(Step::Wildcard);
                i += 2;
            }
            '.' => {
                let (name, end) = read_name(i + 1);
                if name.is_empty() {
                    return Err(invalid());
                }
                steps.push(Step::Child(name));
                i = end;
            }
            '[' => {
                let close = chars[i..].iter().position(|c| *c == ']').ok_or_else(invalid)? + i;
                let inner: String = chars[i + 1..close].iter().collect();
                let inner = inner.trim();
                let quoted =
                    |q: char| inner.len() >= 2 && inner.starts_with(q) && inner.ends_with(q);
                let step = if inner == "*" {
                    Step::Wildcard
                } else if quoted('\'') || quoted('"') {
                    Step::Child(inner[1..inner.len() - 1].to_string())
                } else {
                    Step::Index(inner.parse().map_err(|_| invalid())?)
                };
                steps.push(step);
                i = close + 1;
            }
            _ => return Err(invalid()),
        }
    }
    Ok(steps)
}

fn children_of(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(obj) => obj.entries().into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    }
}

fn descendants_named(value: &Value, name: &str, out: &mut Vec<Value>) {
    if let Some(found) = value.as_object().and_then(|obj| obj.get(name)) {
        out.push(found);
    }
    for child in children_of(value) {
        descendants_named(&child, name, out);
    }
}

fn json_path(args: &[Value]) -> EvalResult<Value> {
    let root = match &args[0] {
        Value::String(_) => parse_json(std::slice::from_ref(&args[0]))?,
        other => other.clone(),
    };
    let Value::String(path) = &args[1] else {
        return Err(EvalError::invalid(format!("{} is not a string.", args[1])));
    };
    let mut current = vec![root];
    for step in parse_json_path(path)? {
        current = current
            .iter()
            .flat_map(|node| match &step {
                Step::Child(name) => node
                    .as_object()
                    .and_then(|obj| obj.get(name))
                    .into_iter()
                    .collect(),
                Step::Index(i) => node
                    .as_array()
                    .and_then(|items| items.get(*i).cloned())
                    .into_iter()
                    .collect(),
                Step::Wildcard => children_of(node),
                Step::Descendant(name) => {
                    let mut found = Vec::new();
                    descendants_named(node, name, &mut found);
                    found
                }
            })
            .collect::<Vec<Value>>();
    }
    match current.len() {
        0 => Err(EvalError::invalid(format!(
            "there is no matching node for path: {} in the given JSON",
            path
        ))),
        1 => Ok(current.remove(0)),
        _ => Ok(Value::Array(current)),
    }
}
