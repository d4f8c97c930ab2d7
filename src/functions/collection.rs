//! Collection operators, including the three lambda operators.

use tracing::trace;

use crate::expression::evaluation::{apply, integer_arg, verify_list};
use crate::expression::validation::{
    validate_arity, validate_arity_and_any_type, validate_binary, validate_order, validate_unary,
};
use crate::expression::{Expression, OperatorDefinition};
use crate::memory::{get_path, parse_path, StackedMemory};
use crate::value::ObjectRef;
use crate::{
    BindError, BindResult, EvalError, EvalResult, EvaluationOptions, Memory, ReturnType, Value,
};

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        OperatorDefinition::new(
            "contains",
            ReturnType::BOOLEAN,
            apply(contains, None),
            validate_binary,
        ),
        OperatorDefinition::new(
            "count",
            ReturnType::NUMBER,
            apply(count, None),
            |e: &Expression| validate_order(e, &[], &[ReturnType::STRING | ReturnType::ARRAY]),
        ),
        OperatorDefinition::new(
            "empty",
            ReturnType::BOOLEAN,
            apply(empty, None),
            validate_unary,
        ),
        OperatorDefinition::new(
            "first",
            ReturnType::OBJECT,
            apply(|args| Ok(edge(&args[0], false)), None),
            validate_unary,
        ),
        OperatorDefinition::new(
            "last",
            ReturnType::OBJECT,
            apply(|args| Ok(edge(&args[0], true)), None),
            validate_unary,
        ),
        OperatorDefinition::new(
            "createArray",
            ReturnType::ARRAY,
            apply(|args| Ok(Value::Array(args.to_vec())), None),
            |e: &Expression| validate_arity_and_any_type(e, 0, usize::MAX, ReturnType::ANY),
        ),
        OperatorDefinition::new(
            "union",
            ReturnType::ARRAY,
            apply(
                |args| Ok(Value::Array(unique(lists(args).flatten().cloned()))),
                Some(verify_list),
            ),
            validate_lists,
        ),
        OperatorDefinition::new(
            "intersection",
            ReturnType::ARRAY,
            apply(intersection, Some(verify_list)),
            validate_lists,
        ),
        OperatorDefinition::new(
            "skip",
            ReturnType::ARRAY,
            apply(skip, None),
            |e: &Expression| validate_order(e, &[], &[ReturnType::ARRAY, ReturnType::NUMBER]),
        ),
        OperatorDefinition::new(
            "take",
            ReturnType::ARRAY | ReturnType::STRING,
            apply(take, None),
            |e: &Expression| {
                validate_order(
                    e,
                    &[],
                    &[ReturnType::ARRAY | ReturnType::STRING, ReturnType::NUMBER],
                )
            },
        ),
        OperatorDefinition::new(
            "subArray",
            ReturnType::ARRAY,
            apply(sub_array, None),
            |e: &Expression| {
                validate_order(
                    e,
                    &[ReturnType::NUMBER],
                    &[ReturnType::ARRAY, ReturnType::NUMBER],
                )
            },
        ),
        sort("sortBy", false),
        sort("sortByDescending", true),
        OperatorDefinition::new(
            "indicesAndValues",
            ReturnType::ARRAY,
            apply(indices_and_values, None),
            validate_unary,
        ),
        OperatorDefinition::new(
            "flatten",
            ReturnType::ARRAY,
            apply(
                |args| {
                    let depth = match args.get(1) {
                        Some(_) => integer_arg(args, 1, "depth")?,
                        None => 100,
                    };
                    Ok(Value::Array(flatten(list(&args[0])?, depth)))
                },
                None,
            ),
            |e: &Expression| validate_order(e, &[ReturnType::NUMBER], &[ReturnType::ARRAY]),
        ),
        OperatorDefinition::new(
            "unique",
            ReturnType::ARRAY,
            apply(|args| Ok(Value::Array(unique(list(&args[0])?.iter().cloned()))), None),
            |e: &Expression| validate_order(e, &[], &[ReturnType::ARRAY]),
        ),
        OperatorDefinition::new(
            "reverse",
            ReturnType::ARRAY | ReturnType::STRING,
            apply(reverse, None),
            |e: &Expression| validate_order(e, &[], &[ReturnType::ARRAY | ReturnType::STRING]),
        ),
        lambda("foreach", Lambda::Map),
        lambda("select", Lambda::Map),
        lambda("where", Lambda::Filter),
    ]
}

fn list(value: &Value) -> EvalResult<&Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| EvalError::invalid(format!("{} is not a list.", value)))
}

fn lists(args: &[Value]) -> impl Iterator<Item = &Vec<Value>> {
    args.iter().filter_map(Value::as_array)
}

fn validate_lists(expression: &Expression) -> BindResult<()> {
    validate_arity_and_any_type(expression, 1, usize::MAX, ReturnType::ARRAY)
}

/// Distinct values in first-seen order.
fn unique(items: impl Iterator<Item = Value>) -> Vec<Value> {
    let mut result: Vec<Value> = Vec::new();
    for item in items {
        if !result.contains(&item) {
            result.push(item);
        }
    }
    result
}

fn contains(args: &[Value]) -> EvalResult<Value> {
    let found = match (&args[0], &args[1]) {
        (Value::Null, _) => false,
        (Value::String(s), needle) => s.contains(&needle.to_string()),
        (Value::Array(items), needle) => items.contains(needle),
        (Value::Object(obj), Value::String(key)) => obj.contains_key(key),
        _ => false,
    };
    Ok(Value::Boolean(found))
}

fn count(args: &[Value]) -> EvalResult<Value> {
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(obj) => obj.len(),
        other => {
            return Err(EvalError::invalid(format!(
                "{} is not a string, list or object.",
                other
            )))
        }
    };
    Ok(Value::Integer(n as i64))
}

fn empty(args: &[Value]) -> EvalResult<Value> {
    let is_empty = match &args[0] {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(obj) => obj.is_empty(),
        Value::Binary(bytes) => bytes.is_empty(),
        _ => false,
    };
    Ok(Value::Boolean(is_empty))
}

fn edge(value: &Value, last: bool) -> Value {
    match value {
        Value::String(s) => {
            let c = if last { s.chars().last() } else { s.chars().next() };
            c.map(|c| Value::String(c.to_string())).unwrap_or_default()
        }
        Value::Array(items) => {
            let item = if last { items.last() } else { items.first() };
            item.cloned().unwrap_or_default()
        }
        _ => Value::Null,
    }
}

fn intersection(args: &[Value]) -> EvalResult<Value> {
    let mut all = lists(args);
    let Some(first) = all.next() else {
        return Ok(Value::Array(Vec::new()));
    };
    let rest: Vec<&Vec<Value>> = all.collect();
    let items = first
        .iter()
        .filter(|item| rest.iter().all(|other| other.contains(item)))
        .cloned();
    Ok(Value::Array(unique(items)))
}

fn skip(args: &[Value]) -> EvalResult<Value> {
    let items = list(&args[0])?;
    let n = integer_arg(args, 1, "skip count")?.max(0) as usize;
    Ok(Value::Array(items.iter().skip(n).cloned().collect()))
}

fn take(args: &[Value]) -> EvalResult<Value> {
    let n = integer_arg(args, 1, "take count")?;
    if n < 0 {
        return Err(EvalError::invalid(format!(
            "The second parameter {} should be a non-negative integer.",
            n
        )));
    }
    let n = n as usize;
    match &args[0] {
        Value::Array(items) => Ok(Value::Array(items.iter().take(n).cloned().collect())),
        Value::String(s) => Ok(Value::String(s.chars().take(n).collect())),
        other => Err(EvalError::invalid(format!(
            "{} is not a string or list.",
            other
        ))),
    }
}

fn sub_array(args: &[Value]) -> EvalResult<Value> {
    let items = list(&args[0])?;
    let start = integer_arg(args, 1, "start index")?;
    let end = match args.get(2) {
        Some(_) => integer_arg(args, 2, "end index")?,
        None => items.len() as i64,
    };
    if start < 0 || start as usize > items.len() {
        return Err(EvalError::invalid(format!(
            "{} is not a valid start index for a list of length {}.",
            start,
            items.len()
        )));
    }
    if end < start || end as usize > items.len() {
        return Err(EvalError::invalid(format!(
            "{} is not a valid end index for a list of length {}.",
            end,
            items.len()
        )));
    }
    Ok(Value::Array(items[start as usize..end as usize].to_vec()))
}

fn sort(name: &'static str, descending: bool) -> OperatorDefinition {
    OperatorDefinition::new(
        name,
        ReturnType::ARRAY,
        apply(
            move |args| {
                let mut items = list(&args[0])?.clone();
                let key = match args.get(1) {
                    Some(Value::String(property)) => Some(parse_path(property)?),
                    Some(other) => {
                        return Err(EvalError::invalid(format!("{} is not a string.", other)))
                    }
                    None => None,
                };
                let sort_key = |item: &Value| match &key {
                    Some(path) => get_path(item, path).unwrap_or_default(),
                    None => item.clone(),
                };
                items.sort_by(|a, b| {
                    let ordering = sort_key(a)
                        .compare(&sort_key(b))
                        .unwrap_or(std::cmp::Ordering::Equal);
                    if descending {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                });
                Ok(Value::Array(items))
            },
            None,
        ),
        |e: &Expression| validate_order(e, &[ReturnType::STRING], &[ReturnType::ARRAY]),
    )
}

fn indices_and_values(args: &[Value]) -> EvalResult<Value> {
    let pair = |index: Value, value: Value| Value::object([("index", index), ("value", value)]);
    match &args[0] {
        Value::Array(items) => Ok(Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| pair(Value::Integer(i as i64), item.clone()))
                .collect(),
        )),
        Value::Object(obj) => Ok(Value::Array(
            obj.entries()
                .into_iter()
                .map(|(key, value)| pair(Value::String(key), value))
                .collect(),
        )),
        other => Err(EvalError::invalid(format!(
            "{} is not a list or object.",
            other
        ))),
    }
}

fn flatten(items: &[Value], depth: i64) -> Vec<Value> {
    let mut result = Vec::new();
    for item in items {
        match item {
            Value::Array(inner) if depth > 0 => result.extend(flatten(inner, depth - 1)),
            other => result.push(other.clone()),
        }
    }
    result
}

fn reverse(args: &[Value]) -> EvalResult<Value> {
    match &args[0] {
        Value::Array(items) => Ok(Value::Array(items.iter().rev().cloned().collect())),
        Value::String(s) => Ok(Value::String(s.chars().rev().collect())),
        other => Err(EvalError::invalid(format!(
            "{} is not a string or list.",
            other
        ))),
    }
}

#[derive(Clone, Copy)]
enum Lambda {
    Map,
    Filter,
}

/// `name(collection, iterator, body[, index])`.
///
/// The body runs once per element in a fresh [`StackedMemory`] that binds
/// the iterator name (and the index name, if given). An object collection
/// is walked as `{key, value}` entries in key order.
fn lambda(name: &'static str, kind: Lambda) -> OperatorDefinition {
    let return_type = match kind {
        Lambda::Map => ReturnType::ARRAY,
        Lambda::Filter => ReturnType::ARRAY | ReturnType::OBJECT,
    };
    OperatorDefinition::new(
        name,
        return_type,
        move |expression: &Expression, memory: &dyn Memory, options: &EvaluationOptions| {
            evaluate_lambda(expression, memory, options, kind)
        },
        validate_lambda,
    )
}

fn variable_name(expression: &Expression) -> Option<&str> {
    expression
        .accessor_path()
        .filter(|path| !path.contains(['.', '[']))
        .or_else(|| expression.as_constant().and_then(Value::as_str))
}

fn validate_lambda(expression: &Expression) -> BindResult<()> {
    validate_arity(expression, 3, 4)?;
    let children = expression.children();
    let collection = children[0].return_type();
    if !(ReturnType::ARRAY | ReturnType::OBJECT).accepts(collection) {
        return Err(BindError::TypeMismatch {
            expression: expression.to_string(),
            position: 0,
            expected: ReturnType::ARRAY | ReturnType::OBJECT,
            found: collection,
        });
    }
    for position in [1, 3] {
        if let Some(child) = children.get(position) {
            if variable_name(child).is_none() {
                return Err(BindError::invalid(
                    expression,
                    format!("child {} must be a plain identifier, found {}", position, child),
                ));
            }
        }
    }
    Ok(())
}

fn evaluate_lambda(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
    kind: Lambda,
) -> EvalResult<Value> {
    let children = expression.children();
    let collection = children[0].evaluate(memory, options)?;
    let iterator = variable_name(&children[1]).unwrap_or_default();
    let index_name = children.get(3).and_then(variable_name);
    let body = &children[2];

    let elements: Vec<(Value, Option<String>)> = match &collection {
        Value::Array(items) => items.iter().map(|item| (item.clone(), None)).collect(),
        Value::Object(obj) => obj
            .entries()
            .into_iter()
            .map(|(key, value)| {
                let entry = Value::object([("key", Value::String(key.clone())), ("value", value)]);
                (entry, Some(key))
            })
            .collect(),
        other => {
            return Err(EvalError::invalid(format!(
                "{} is not a collection or structure object to run {}.",
                other,
                expression.name()
            )))
        }
    };

    let mut mapped = Vec::with_capacity(elements.len());
    let filtered = ObjectRef::new();
    for (i, (element, key)) in elements.into_iter().enumerate() {
        let mut scope = StackedMemory::new(memory).with_binding(iterator, element.clone());
        if let Some(index_name) = index_name {
            scope.bind(index_name, Value::Integer(i as i64));
        }
        let result = body.evaluate(&scope, options)?;
        match kind {
            Lambda::Map => mapped.push(result),
            Lambda::Filter if result.is_truthy() => match key {
                Some(key) => {
                    let value = element.as_object().and_then(|e| e.get("value"));
                    filtered.insert(key, value.unwrap_or_default());
                }
                None => mapped.push(element),
            },
            Lambda::Filter => {}
        }
    }
    trace!("{} ran its body over {} elements", expression.name(), collection_len(&collection));

    Ok(match (kind, collection) {
        (Lambda::Filter, Value::Object(_)) => Value::Object(filtered),
        _ => Value::Array(mapped),
    })
}

fn collection_len(value: &Value) -> usize {
    match value {
        Value::Array(items) => items.len(),
        Value::Object(obj) => obj.len(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SimpleObjectMemory;
    use crate::FunctionRegistry;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn call(name: &str, args: Vec<Value>) -> EvalResult<Value> {
        let children = args.into_iter().map(Expression::constant).collect();
        FunctionRegistry::standard()
            .make_expression(name, children)
            .unwrap()
            .evaluate(&SimpleObjectMemory::default(), &EvaluationOptions::default())
    }

    fn json(value: serde_json::Value) -> Value {
        Value::from(value)
    }

    #[test]
    fn test_contains_count_empty() {
        let contains = |args: Vec<Value>| call("contains", args).unwrap();
        assert_eq!(contains(vec!["abc".into(), "b".into()]), Value::Boolean(true));
        assert_eq!(contains(vec![json(json!([1, 2])), 3.into()]), Value::Boolean(false));
        assert_eq!(contains(vec![json(json!({"a": 1})), "a".into()]), Value::Boolean(true));
        assert_eq!(call("count", vec![json(json!([1, 2, 3]))]).unwrap(), Value::Integer(3));
        assert_eq!(call("empty", vec![Value::Null]).unwrap(), Value::Boolean(true));
        assert_eq!(call("empty", vec![json(json!({}))]).unwrap(), Value::Boolean(true));
        assert_eq!(call("empty", vec![0.into()]).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn test_first_last() {
        assert_eq!(call("first", vec!["abc".into()]).unwrap(), Value::from("a"));
        assert_eq!(call("last", vec![json(json!([1, 2]))]).unwrap(), Value::Integer(2));
        assert_eq!(call("first", vec![json(json!([]))]).unwrap(), Value::Null);
    }

    #[test]
    fn test_set_operations() {
        assert_eq!(
            call("union", vec![json(json!([1, 2])), json(json!([2, 3]))]).unwrap(),
            json(json!([1, 2, 3]))
        );
        assert_eq!(
            call("intersection", vec![json(json!([1, 2, 3])), json(json!([3, 2, 5]))]).unwrap(),
            json(json!([2, 3]))
        );
        assert_eq!(call("unique", vec![json(json!([1, 1, 2, 1]))]).unwrap(), json(json!([1, 2])));
    }

    #[test]
    fn test_slicing() {
        let list = json(json!([1, 2, 3, 4]));
        assert_eq!(call("skip", vec![list.clone(), 2.into()]).unwrap(), json(json!([3, 4])));
        assert_eq!(call("take", vec![list.clone(), 2.into()]).unwrap(), json(json!([1, 2])));
        assert_eq!(call("take", vec!["hello".into(), 2.into()]).unwrap(), Value::from("he"));
        assert!(call("take", vec![list.clone(), (-1).into()]).is_err());
        assert_eq!(
            call("subArray", vec![list.clone(), 1.into(), 3.into()]).unwrap(),
            json(json!([2, 3]))
        );
        assert!(call("subArray", vec![list, 3.into(), 1.into()]).is_err());
    }

    #[test]
    fn test_sorting() {
        let people = json(json!([{"n": "b", "a": 2}, {"n": "a", "a": 3}, {"n": "c", "a": 1}]));
        let sorted = call("sortBy", vec![people.clone(), "n".into()]).unwrap();
        assert_eq!(sorted.to_json()[0]["n"], json!("a"));
        let sorted = call("sortByDescending", vec![people, "a".into()]).unwrap();
        assert_eq!(sorted.to_json()[0]["a"], json!(3));
        assert_eq!(call("sortBy", vec![json(json!([3, 1, 2]))]).unwrap(), json(json!([1, 2, 3])));
    }

    #[test]
    fn test_shapes() {
        assert_eq!(
            call("indicesAndValues", vec![json(json!(["a"]))]).unwrap(),
            json(json!([{"index": 0, "value": "a"}]))
        );
        assert_eq!(
            call("flatten", vec![json(json!([1, [2, [3, [4]]]])), 1.into()]).unwrap(),
            json(json!([1, 2, [3, [4]]]))
        );
        assert_eq!(
            call("flatten", vec![json(json!([1, [2, [3]]]))]).unwrap(),
            json(json!([1, 2, 3]))
        );
        assert_eq!(call("reverse", vec!["abc".into()]).unwrap(), Value::from("cba"));
        assert_eq!(
            call("createArray", vec![1.into(), "a".into()]).unwrap(),
            json(json!([1, "a"]))
        );
    }

    #[test]
    fn test_lambda_with_index_over_object() {
        let registry = FunctionRegistry::standard();
        let memory = SimpleObjectMemory::from(json!({"o": {"a": 1, "b": 5}}));
        let body = registry
            .make_expression(
                ">",
                vec![Expression::accessor("e.value"), Expression::constant(2)],
            )
            .unwrap();
        let expr = registry
            .make_expression(
                "where",
                vec![Expression::accessor("o"), Expression::accessor("e"), body],
            )
            .unwrap();
        let result = expr.evaluate(&memory, &EvaluationOptions::default()).unwrap();
        assert_eq!(result, json(json!({"b": 5})));

        let expr = registry
            .make_expression(
                "select",
                vec![
                    Expression::accessor("o"),
                    Expression::accessor("e"),
                    Expression::accessor("i"),
                    Expression::accessor("i"),
                ],
            )
            .unwrap();
        let result = expr.evaluate(&memory, &EvaluationOptions::default()).unwrap();
        assert_eq!(result, json(json!([0, 1])));
    }

    #[test]
    fn test_lambda_rejects_complex_iterator() {
        let registry = FunctionRegistry::standard();
        let err = registry
            .make_expression(
                "foreach",
                vec![
                    Expression::accessor("list"),
                    Expression::accessor("x.y"),
                    Expression::accessor("x"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, BindError::Invalid { .. }));

        let err = registry
            .make_expression(
                "foreach",
                vec![
                    Expression::constant(1),
                    Expression::accessor("x"),
                    Expression::accessor("x"),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, BindError::TypeMismatch { position: 0, .. }));
    }
}
