use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use adaptive_expr::expression::validation::validate_unary;
use adaptive_expr::memory::SimpleObjectMemory;
use adaptive_expr::{
    EvalError, EvalResult, EvaluationOptions, Expression, FunctionRegistry, Memory,
    OperatorDefinition, ReturnType, Value,
};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{call, constant, eval, path};

/// Registry with `reject2(x)`: counts each call and fails when `x` is 2.
fn rejecting_registry() -> (FunctionRegistry, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let reject = OperatorDefinition::new(
        "reject2",
        ReturnType::BOOLEAN,
        move |e: &Expression, memory: &dyn Memory, options: &EvaluationOptions| {
            let value = e.children()[0].evaluate(memory, options)?;
            seen.fetch_add(1, Ordering::SeqCst);
            if value == Value::Integer(2) {
                return Err(EvalError::invalid("2 is rejected."));
            }
            Ok(Value::Boolean(true))
        },
        validate_unary,
    );
    let registry = FunctionRegistry::builder()
        .register(reject)
        .unwrap()
        .build();
    (registry, count)
}

fn memory() -> SimpleObjectMemory {
    SimpleObjectMemory::from(json!({
        "items": [1, 2, 3],
        "people": {"alice": 31, "bob": 17},
        "x": "outer"
    }))
}

#[test]
fn test_foreach_maps_items() {
    let body = call("mul", vec![path("x"), constant(2)]);
    let expr = call("foreach", vec![path("items"), path("x"), body]);
    assert_eq!(
        eval(&expr, &memory()).unwrap(),
        Value::from(json!([2, 4, 6]))
    );
}

#[test]
fn test_select_with_index() {
    let body = call("add", vec![path("x"), path("i")]);
    let expr = call("select", vec![path("items"), path("x"), body, path("i")]);
    assert_eq!(
        eval(&expr, &memory()).unwrap(),
        Value::from(json!([1, 3, 5]))
    );
}

#[test]
fn test_where_over_array_keeps_matching_items() {
    let memory = SimpleObjectMemory::from(json!({"list": [1, 2, 3, 4]}));
    let body = call(">", vec![path("x"), constant(2)]);
    let expr = call("where", vec![path("list"), path("x"), body]);
    assert_eq!(eval(&expr, &memory).unwrap(), Value::from(json!([3, 4])));
}

#[test]
fn test_lambda_body_error_stops_iteration() {
    for name in ["foreach", "select", "where"] {
        let (registry, count) = rejecting_registry();
        let body = registry.make_expression("reject2", vec![path("x")]).unwrap();
        let expr = registry
            .make_expression(name, vec![path("items"), path("x"), body])
            .unwrap();
        assert_eq!(eval(&expr, &memory()).unwrap_err().message(), "2 is rejected.");
        assert_eq!(count.load(Ordering::SeqCst), 2, "{}", name);
    }
}

#[test]
fn test_where_over_object_keeps_matching_entries() {
    let body = call(">=", vec![path("p.value"), constant(18)]);
    let expr = call("where", vec![path("people"), path("p"), body]);
    assert_eq!(
        eval(&expr, &memory()).unwrap(),
        Value::from(json!({"alice": 31}))
    );
}

#[test]
fn test_lambda_binding_does_not_leak() {
    let memory = memory();
    let expr = call("foreach", vec![path("items"), path("x"), path("x")]);
    eval(&expr, &memory).unwrap();
    assert_eq!(memory.get_value("x"), Some(Value::from("outer")));
}

#[test]
fn test_lambda_over_scalar_is_an_error() {
    let expr = call("foreach", vec![path("x"), path("y"), path("y")]);
    assert_eq!(
        eval(&expr, &memory()).unwrap_err().message(),
        "outer is not a collection or structure object to run foreach."
    );
}

#[test]
fn test_sort_and_slices() {
    let memory = SimpleObjectMemory::from(json!({
        "rows": [{"n": 3}, {"n": 1}, {"n": 2}],
        "list": [1, 2, 3, 4, 5]
    }));
    let sorted = call("sortBy", vec![path("rows"), constant("n")]);
    assert_eq!(
        eval(&sorted, &memory).unwrap(),
        Value::from(json!([{"n": 1}, {"n": 2}, {"n": 3}]))
    );
    let taken = call("take", vec![path("list"), constant(2)]);
    assert_eq!(eval(&taken, &memory).unwrap(), Value::from(json!([1, 2])));
    let skipped = call("skip", vec![path("list"), constant(-1)]);
    assert_eq!(
        eval(&skipped, &memory).unwrap(),
        Value::from(json!([1, 2, 3, 4, 5]))
    );
}
