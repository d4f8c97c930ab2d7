use std::collections::HashMap;

use super::{get_path, parse_path, set_path, Memory, PathSegment};
use crate::{EvalError, EvalResult, Value};

/// Scope binding a few local names over a parent scope.
///
/// Created per element by the collection operators and dropped right after
/// the lambda body has been evaluated for that element. The parent is
/// borrowed, so a stacked scope cannot outlive it.
pub struct StackedMemory<'a> {
    parent: &'a dyn Memory,
    locals: HashMap<String, Value>,
}

impl<'a> StackedMemory<'a> {
    pub fn new(parent: &'a dyn Memory) -> Self {
        Self {
            parent,
            locals: HashMap::new(),
        }
    }

    pub fn with_binding<S: Into<String>>(mut self, name: S, value: Value) -> Self {
        self.locals.insert(name.into(), value);
        self
    }

    pub fn bind<S: Into<String>>(&mut self, name: S, value: Value) -> Option<Value> {
        self.locals.insert(name.into(), value)
    }

    fn local_for<'p>(&self, segments: &'p [PathSegment]) -> Option<(&Value, &'p [PathSegment])> {
        match segments.split_first() {
            Some((PathSegment::Property(name), rest)) => {
                self.locals.get(name).map(|value| (value, rest))
            }
            _ => None,
        }
    }
}

impl Memory for StackedMemory<'_> {
    fn get_value(&self, path: &str) -> Option<Value> {
        let segments = parse_path(path).ok()?;
        match self.local_for(&segments) {
            Some((local, rest)) => get_path(local, rest),
            None => self.parent.get_value(path),
        }
    }

    fn set_value(&self, path: &str, value: Value) -> EvalResult<()> {
        let segments = parse_path(path)?;
        match self.local_for(&segments) {
            Some((_, [])) => Err(EvalError::invalid(format!(
                "Cannot assign to local variable {}.",
                path
            ))),
            Some((local, rest)) => match set_path(local, rest, value)? {
                None => Ok(()),
                Some(_) => Err(EvalError::invalid(format!(
                    "Cannot set {}: local variable is not an object.",
                    path
                ))),
            },
            None => self.parent.set_value(path, value),
        }
    }
}
