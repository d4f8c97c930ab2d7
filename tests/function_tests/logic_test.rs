use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use adaptive_expr::expression::validation::validate_no_children;
use adaptive_expr::{
    EvalResult, EvaluationOptions, Expression, FunctionRegistry, Memory, OperatorDefinition,
    ReturnType, Value,
};

use crate::{call, constant, eval_empty};

fn counting_registry() -> (FunctionRegistry, Arc<AtomicUsize>) {
    let count = Arc::new(AtomicUsize::new(0));
    let seen = count.clone();
    let tick = OperatorDefinition::new(
        "tick",
        ReturnType::BOOLEAN,
        move |_: &Expression, _: &dyn Memory, _: &EvaluationOptions| -> EvalResult<Value> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Boolean(true))
        },
        validate_no_children,
    );
    let registry = FunctionRegistry::builder().register(tick).unwrap().build();
    (registry, count)
}

#[test]
fn test_and_or_short_circuit() {
    let (registry, count) = counting_registry();
    let tick = || registry.make_expression("tick", vec![]).unwrap();

    let and = registry
        .make_expression("and", vec![constant(false), tick()])
        .unwrap();
    assert_eq!(eval_empty(&and).unwrap(), Value::Boolean(false));

    let or = registry
        .make_expression("||", vec![constant(true), tick()])
        .unwrap();
    assert_eq!(eval_empty(&or).unwrap(), Value::Boolean(true));
    assert_eq!(count.load(Ordering::SeqCst), 0);

    let and = registry
        .make_expression("&&", vec![constant(true), tick()])
        .unwrap();
    assert_eq!(eval_empty(&and).unwrap(), Value::Boolean(true));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_if_evaluates_selected_branch_only() {
    let (registry, count) = counting_registry();
    let tick = registry.make_expression("tick", vec![]).unwrap();
    let expr = registry
        .make_expression("if", vec![constant(true), constant(1), tick])
        .unwrap();
    assert_eq!(eval_empty(&expr).unwrap(), Value::Integer(1));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn test_error_in_right_operand_propagates() {
    let broken = call("json", vec![constant("{")]);
    let expr = call("&&", vec![constant(true), broken]);
    assert!(eval_empty(&expr).is_err());
}

#[test]
fn test_first_error_wins() {
    let expr = call(
        "concat",
        vec![
            call("div", vec![constant(1), constant(0)]),
            call("json", vec![constant("{")]),
        ],
    );
    assert_eq!(eval_empty(&expr).unwrap_err().message(), "Cannot divide by 0.");
}

#[test]
fn test_rand_bounds() {
    for _ in 0..50 {
        let n = eval_empty(&call("rand", vec![constant(1), constant(4)]))
            .unwrap()
            .as_integer()
            .unwrap();
        assert!((1..4).contains(&n));
    }
    assert_eq!(
        eval_empty(&call("rand", vec![constant(7), constant(7)])).unwrap(),
        Value::Integer(7)
    );
    assert!(eval_empty(&call("rand", vec![constant(7), constant(2)])).is_err());
}

#[test]
fn test_is_match() {
    let expr = call("isMatch", vec![constant("ab-12"), constant(r"^\w+-\d+$")]);
    assert_eq!(eval_empty(&expr).unwrap(), Value::Boolean(true));
    let expr = call("isMatch", vec![constant("ab"), constant(r"^\d+$")]);
    assert_eq!(eval_empty(&expr).unwrap(), Value::Boolean(false));
}
