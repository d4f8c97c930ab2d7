use core::fmt;
use std::sync::Arc;

use tracing::debug;

use super::OperatorDefinition;
use crate::functions::accessor;
use crate::{EvalResult, EvaluationOptions, Memory, ReturnType, Value};

const INFIX_OPERATORS: &[&str] = &[
    "+", "-", "*", "/", "%", "^", "==", "!=", "<", "<=", ">", ">=", "&&", "||", "&",
];

/// Immutable expression tree node.
///
/// Cloning is cheap: the node and its children are shared behind an `Arc`,
/// so one bound tree can be evaluated from many threads at once.
#[derive(Clone)]
pub struct Expression {
    inner: Arc<ExpressionKind>,
}

pub enum ExpressionKind {
    Constant(Value),
    Call {
        definition: Arc<OperatorDefinition>,
        children: Vec<Expression>,
    },
}

impl Expression {
    pub fn constant<V: Into<Value>>(value: V) -> Self {
        Self {
            inner: Arc::new(ExpressionKind::Constant(value.into())),
        }
    }

    /// Memory lookup of `path`, e.g. `user.addresses[0].city`.
    pub fn accessor<S: Into<String>>(path: S) -> Self {
        Self::call(
            accessor::accessor_definition(),
            vec![Expression::constant(path.into())],
        )
    }

    /// Build a call node without running the validator.
    pub(crate) fn call(definition: Arc<OperatorDefinition>, children: Vec<Expression>) -> Self {
        Self {
            inner: Arc::new(ExpressionKind::Call {
                definition,
                children,
            }),
        }
    }

    pub fn kind(&self) -> &ExpressionKind {
        &self.inner
    }

    /// Operator name, or `constant` for literals.
    pub fn name(&self) -> &str {
        match self.kind() {
            ExpressionKind::Constant(_) => "constant",
            ExpressionKind::Call { definition, .. } => definition.name(),
        }
    }

    pub fn definition(&self) -> Option<&Arc<OperatorDefinition>> {
        match self.kind() {
            ExpressionKind::Constant(_) => None,
            ExpressionKind::Call { definition, .. } => Some(definition),
        }
    }

    pub fn children(&self) -> &[Expression] {
        match self.kind() {
            ExpressionKind::Constant(_) => &[],
            ExpressionKind::Call { children, .. } => children,
        }
    }

    pub fn child(&self, index: usize) -> Option<&Expression> {
        self.children().get(index)
    }

    /// Static type used by the validator of the parent node.
    pub fn return_type(&self) -> ReturnType {
        match self.kind() {
            ExpressionKind::Constant(value) => value.return_type(),
            ExpressionKind::Call { definition, .. } => definition.return_type(),
        }
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self.kind() {
            ExpressionKind::Constant(value) => Some(value),
            ExpressionKind::Call { .. } => None,
        }
    }

    /// The path of a plain memory accessor (one without an instance child).
    pub fn accessor_path(&self) -> Option<&str> {
        match self.kind() {
            ExpressionKind::Call {
                definition,
                children,
            } if definition.name() == accessor::ACCESSOR && children.len() == 1 => {
                children[0].as_constant().and_then(Value::as_str)
            }
            _ => None,
        }
    }

    pub fn evaluate(&self, memory: &dyn Memory, options: &EvaluationOptions) -> EvalResult<Value> {
        match self.kind() {
            // Constants are handed out detached so a mutating operator can
            // never change the tree.
            ExpressionKind::Constant(value) => Ok(value.deep_clone()),
            ExpressionKind::Call { definition, .. } => definition.evaluate(self, memory, options),
        }
    }
}

/// Evaluate a bound tree against `memory`.
#[tracing::instrument(level = "debug", skip_all, fields(expression = %expression))]
pub fn evaluate(
    expression: &Expression,
    memory: &dyn Memory,
    options: &EvaluationOptions,
) -> EvalResult<Value> {
    let result = expression.evaluate(memory, options);
    if let Err(e) = &result {
        debug!("evaluation failed: {}", e);
    }
    result
}

fn write_constant(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(s) => write!(f, "'{}'", s.replace('\'', "\\'")),
        other => write!(f, "{}", other),
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, children: &[Expression]) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", child)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (definition, children) = match self.kind() {
            ExpressionKind::Constant(value) => return write_constant(f, value),
            ExpressionKind::Call {
                definition,
                children,
            } => (definition, children),
        };
        let name = definition.name();
        let path = children.first().and_then(|c| c.as_constant()).and_then(Value::as_str);
        match (name, children.as_slice(), path) {
            (accessor::ACCESSOR, [_], Some(path)) => write!(f, "{}", path),
            (accessor::ACCESSOR, [_, instance], Some(path)) => write!(f, "{}.{}", instance, path),
            (accessor::ELEMENT, [instance, index], _) => write!(f, "{}[{}]", instance, index),
            ("!", [operand], _) => write!(f, "!{}", operand),
            (op, [left, right], _) if INFIX_OPERATORS.contains(&op) => {
                write!(f, "({} {} {})", left, op, right)
            }
            _ => {
                write!(f, "{}(", name)?;
                write_list(f, children)?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression({})", self)
    }
}
