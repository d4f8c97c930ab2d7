use tracing::trace;

use super::{get_path, parse_path, set_path, Memory};
use crate::{EvalError, EvalResult, Value};

/// Root scope over a host-supplied value.
///
/// The host keeps its own handle to the root object; property writes made
/// during evaluation land in that same object.
#[derive(Debug, Clone, Default)]
pub struct SimpleObjectMemory {
    root: Value,
}

impl SimpleObjectMemory {
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }
}

impl From<serde_json::Value> for SimpleObjectMemory {
    fn from(json: serde_json::Value) -> Self {
        Self::new(Value::from(json))
    }
}

impl Memory for SimpleObjectMemory {
    fn get_value(&self, path: &str) -> Option<Value> {
        let segments = parse_path(path).ok()?;
        get_path(&self.root, &segments)
    }

    fn set_value(&self, path: &str, value: Value) -> EvalResult<()> {
        let segments = parse_path(path)?;
        trace!("set_value: {}", path);
        match set_path(&self.root, &segments, value)? {
            None => Ok(()),
            Some(_) => Err(EvalError::invalid(format!(
                "Cannot set {}: the memory root is not an object.",
                path
            ))),
        }
    }
}
