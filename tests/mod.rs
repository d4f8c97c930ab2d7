mod function_tests;

use adaptive_expr::memory::SimpleObjectMemory;
use adaptive_expr::{
    evaluate, EvalResult, EvaluationOptions, Expression, FunctionRegistry, Value,
};
use lazy_static::lazy_static;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

lazy_static! {
    pub static ref REGISTRY: FunctionRegistry = FunctionRegistry::standard();
}

/// Bind `name(children...)` against the standard registry.
pub fn call(name: &str, children: Vec<Expression>) -> Expression {
    REGISTRY
        .make_expression(name, children)
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", name, e))
}

pub fn constant<V: Into<Value>>(value: V) -> Expression {
    Expression::constant(value)
}

pub fn path(path: &str) -> Expression {
    Expression::accessor(path)
}

pub fn eval(expression: &Expression, memory: &SimpleObjectMemory) -> EvalResult<Value> {
    evaluate(expression, memory, &EvaluationOptions::default())
}

pub fn eval_empty(expression: &Expression) -> EvalResult<Value> {
    eval(expression, &SimpleObjectMemory::default())
}
