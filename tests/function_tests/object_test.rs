use adaptive_expr::memory::SimpleObjectMemory;
use adaptive_expr::{Memory, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{call, constant, eval, path};

#[test]
fn test_add_property_on_existing_key_leaves_object_unchanged() {
    let memory = SimpleObjectMemory::from(json!({"user": {"name": "ann"}}));
    let expr = call(
        "addProperty",
        vec![path("user"), constant("name"), constant("bob")],
    );
    assert_eq!(eval(&expr, &memory).unwrap_err().message(), "name already exists");
    assert_eq!(
        memory.get_value("user"),
        Some(Value::from(json!({"name": "ann"})))
    );
}

#[test]
fn test_set_property_is_visible_through_memory() {
    let memory = SimpleObjectMemory::from(json!({"user": {"name": "ann"}}));
    let expr = call("setProperty", vec![path("user"), constant("age"), constant(40)]);
    eval(&expr, &memory).unwrap();
    assert_eq!(memory.get_value("user.age"), Some(Value::Integer(40)));
}

#[test]
fn test_set_path_to_value() {
    let memory = SimpleObjectMemory::from(json!({"order": {"lines": [{"qty": 1}]}}));
    let expr = call(
        "setPathToValue",
        vec![path("order.lines[0].qty"), constant(5)],
    );
    assert_eq!(eval(&expr, &memory).unwrap(), Value::Integer(5));
    assert_eq!(memory.get_value("order.lines[0].qty"), Some(Value::Integer(5)));
}

#[test]
fn test_merge_returns_fresh_object() {
    let memory = SimpleObjectMemory::from(json!({"a": {"x": 1}, "b": {"x": 2, "y": 3}}));
    let expr = call("merge", vec![path("a"), path("b")]);
    assert_eq!(
        eval(&expr, &memory).unwrap(),
        Value::from(json!({"x": 2, "y": 3}))
    );
    assert_eq!(memory.get_value("a"), Some(Value::from(json!({"x": 1}))));
}

#[test]
fn test_json_and_jpath() {
    let parsed = call("json", vec![constant(r#"{"a": {"b": [10, 20]}}"#)]);
    let expr = call("jPath", vec![parsed, constant("$.a.b[1]")]);
    assert_eq!(eval(&expr, &SimpleObjectMemory::default()).unwrap(), Value::Integer(20));
}

#[test]
fn test_storing_an_object_inside_itself_is_an_error() {
    let memory = SimpleObjectMemory::from(json!({"o": {"a": 1}}));
    let expr = call(
        "string",
        vec![call("setProperty", vec![path("o"), constant("self"), path("o")])],
    );
    assert_eq!(
        eval(&expr, &memory).unwrap_err().message(),
        "Cannot set self: the value contains the object itself."
    );
    assert_eq!(memory.get_value("o"), Some(Value::from(json!({"a": 1}))));

    let nested = call("setPathToValue", vec![path("o.inner.loop"), path("o")]);
    assert!(eval(&nested, &memory).is_err());
    let wrapped = call(
        "addProperty",
        vec![path("o"), constant("list"), call("createArray", vec![path("o")])],
    );
    assert!(eval(&wrapped, &memory).is_err());
}
