//! Boolean operators and conditionals.
//!
//! `&&`, `||` and `if` evaluate their children themselves, left to right,
//! and stop as soon as the outcome is known. A failing child is never
//! recovered from: its error is the result of the whole call.

use tracing::trace;

use crate::expression::evaluation::apply;
use crate::expression::validation::{validate_at_least_one, validate_order, validate_unary};
use crate::expression::{Expression, OperatorDefinition};
use crate::{EvalResult, EvaluationOptions, Memory, ReturnType, Value};

pub(crate) fn definitions() -> Vec<OperatorDefinition> {
    vec![
        OperatorDefinition::new("&&", ReturnType::BOOLEAN, evaluate_and, validate_at_least_one),
        OperatorDefinition::new("||", ReturnType::BOOLEAN, evaluate_or, validate_at_least_one),
        OperatorDefinition::new(
            "!",
            ReturnType::BOOLEAN,
            apply(|args| Ok(Value::Boolean(!args[0].is_truthy())), None),
            validate_unary,
        ),
        OperatorDefinition::new("if", ReturnType::OBJECT, evaluate_if, |e: &Expression| {
            validate_order(e, &[], &[ReturnType::ANY, ReturnType::ANY, ReturnType::ANY])
        }),
        OperatorDefinition::new(
            "coalesce",
            ReturnType::OBJECT,
            apply(
                |args| Ok(args.iter().find(|v| !v.is_null()).cloned().unwrap_or_default()),
                None,
            ),
            validate_at_least_one,
        ),
    ]
}

/// Evaluate children until one has truthiness `stop_on`.
fn short_circuit(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
    stop_on: bool,
) -> EvalResult<bool> {
    for (i, child) in expression.children().iter().enumerate() {
        if child.evaluate(memory, options)?.is_truthy() == stop_on {
            trace!("{} decided by child {}", expression.name(), i);
            return Ok(true);
        }
    }
    Ok(false)
}

fn evaluate_and(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
) -> EvalResult<Value> {
    let stopped = short_circuit(expression, memory, options, false)?;
    Ok(Value::Boolean(!stopped))
}

fn evaluate_or(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
) -> EvalResult<Value> {
    let stopped = short_circuit(expression, memory, options, true)?;
    Ok(Value::Boolean(stopped))
}

fn evaluate_if(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
) -> EvalResult<Value> {
    let children = expression.children();
    let branch = if children[0].evaluate(memory, options)?.is_truthy() {
        &children[1]
    } else {
        &children[2]
    };
    branch.evaluate(memory, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::SimpleObjectMemory;
    use crate::FunctionRegistry;
    use serde_json::json;

    fn eval(name: &str, children: Vec<Expression>) -> EvalResult<Value> {
        let memory = SimpleObjectMemory::from(json!({"t": true, "f": false, "n": null}));
        FunctionRegistry::standard()
            .make_expression(name, children)
            .unwrap()
            .evaluate(&memory, &EvaluationOptions::default())
    }

    fn failing() -> Expression {
        FunctionRegistry::standard()
            .make_expression("json", vec![Expression::constant("{")])
            .unwrap()
    }

    #[test]
    fn test_and_or() {
        let t = || Expression::accessor("t");
        let f = || Expression::accessor("f");
        assert_eq!(eval("&&", vec![t(), t()]).unwrap(), Value::Boolean(true));
        assert_eq!(eval("&&", vec![t(), f()]).unwrap(), Value::Boolean(false));
        assert_eq!(
            eval("||", vec![f(), Expression::accessor("n")]).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(eval("||", vec![f(), Expression::constant(0)]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_short_circuit_skips_right_side() {
        assert_eq!(
            eval("&&", vec![Expression::accessor("f"), failing()]).unwrap(),
            Value::Boolean(false)
        );
        assert_eq!(
            eval("||", vec![Expression::accessor("t"), failing()]).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_left_error_propagates() {
        assert!(eval("&&", vec![failing(), Expression::accessor("t")]).is_err());
        let branches = vec![failing(), Expression::constant(1), Expression::constant(2)];
        assert!(eval("if", branches).is_err());
    }

    #[test]
    fn test_if_evaluates_selected_branch_only() {
        let value = eval(
            "if",
            vec![Expression::accessor("t"), Expression::constant("yes"), failing()],
        )
        .unwrap();
        assert_eq!(value, Value::from("yes"));
    }

    #[test]
    fn test_not_and_coalesce() {
        assert_eq!(eval("!", vec![Expression::accessor("n")]).unwrap(), Value::Boolean(true));
        assert_eq!(
            eval(
                "coalesce",
                vec![Expression::accessor("n"), Expression::accessor("f"), Expression::constant(1)]
            )
            .unwrap(),
            Value::Boolean(false)
        );
    }
}
