use core::fmt;
use std::sync::Arc;

use crate::{BindResult, EvalResult, EvaluationOptions, Memory, ReturnType, Value};

use super::Expression;

pub type EvaluateFn =
    Arc<dyn Fn(&Expression, &dyn Memory, &EvaluationOptions) -> EvalResult<Value> + Send + Sync>;

pub type ValidateFn = Arc<dyn Fn(&Expression) -> BindResult<()> + Send + Sync>;

/// Evaluator, validator and static return type of one operator.
///
/// The evaluator receives the unevaluated call node so that operators such
/// as `if` or `foreach` decide themselves which children run and in which
/// scope. Most operators go through [`apply`](super::evaluation::apply),
/// which evaluates every child left to right first.
pub struct OperatorDefinition {
    name: String,
    return_type: ReturnType,
    evaluator: EvaluateFn,
    validator: ValidateFn,
}

impl OperatorDefinition {
    pub fn new<S, E, V>(name: S, return_type: ReturnType, evaluator: E, validator: V) -> Self
    where
        S: Into<String>,
        E: Fn(&Expression, &dyn Memory, &EvaluationOptions) -> EvalResult<Value>
            + Send
            + Sync
            + 'static,
        V: Fn(&Expression) -> BindResult<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            return_type,
            evaluator: Arc::new(evaluator),
            validator: Arc::new(validator),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    pub fn evaluate(
        &self,
        expression: &Expression,
        memory: &dyn Memory,
        options: &EvaluationOptions,
    ) -> EvalResult<Value> {
        (self.evaluator)(expression, memory, options)
    }

    pub fn validate(&self, expression: &Expression) -> BindResult<()> {
        (self.validator)(expression)
    }
}

impl fmt::Debug for OperatorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorDefinition")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .finish()
    }
}
