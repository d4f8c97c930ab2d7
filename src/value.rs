use core::fmt;
use std::cmp::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Number};

use crate::types::ReturnType;
use crate::{EvalError, EvalResult};

/// Dynamic value produced by evaluation and stored in memory.
///
/// Objects are shared handles: cloning a `Value::Object` clones the handle,
/// not the map, so a property write through one clone is observed through
/// every other clone (including the one held by the host). Arrays, strings
/// and scalars are plain values.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Value>),
    Object(ObjectRef),
    Binary(Vec<u8>),
}

/// Shared, internally synchronized property map.
///
/// Writers never hold a shard guard across a call back into the engine, so
/// concurrent readers are safe. Concurrent *mutating* evaluations over the
/// same object graph must be serialized by the caller.
#[derive(Clone, Default)]
pub struct ObjectRef(Arc<DashMap<String, Value>>);

impl ObjectRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map = DashMap::new();
        for (key, value) in entries {
            map.insert(key.into(), value);
        }
        Self(Arc::new(map))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.get(key).map(|entry| entry.value().clone())
    }

    /// Raw insert. The caller guarantees `value` does not reach `self`;
    /// engine writes go through [`ObjectRef::set`].
    pub fn insert<K: Into<String>>(&self, key: K, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Insert `value` under `key` unless it would make `self` reachable from
    /// itself. Object graphs built by the engine stay acyclic.
    pub fn set<K: Into<String>>(&self, key: K, value: Value) -> EvalResult<Option<Value>> {
        let key = key.into();
        if value.references(self) {
            return Err(EvalError::invalid(format!(
                "Cannot set {}: the value contains the object itself.",
                key
            )));
        }
        Ok(self.0.insert(key, value))
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.remove(key).map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.iter().map(|entry| entry.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Snapshot of the entries, ordered by key.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = self
            .0
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Whether both handles point at the same underlying map.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A new map with no storage shared with `self` at any depth.
    pub fn deep_clone(&self) -> ObjectRef {
        ObjectRef::from_entries(
            self.entries()
                .into_iter()
                .map(|(key, value)| (key, value.deep_clone())),
        )
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.len() == other.len() && self.entries() == other.entries())
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

impl Value {
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(ObjectRef::from_entries(entries))
    }

    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::String(s.into())
    }

    /// The static kind this runtime value would have been typed as.
    pub fn return_type(&self) -> ReturnType {
        match self {
            Value::Boolean(_) => ReturnType::BOOLEAN,
            Value::Integer(_) | Value::Float(_) => ReturnType::NUMBER,
            Value::String(_) => ReturnType::STRING,
            Value::Array(_) => ReturnType::ARRAY,
            Value::Null | Value::Object(_) | Value::Binary(_) => ReturnType::OBJECT,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Binary(_) => "binary",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    /// `false` and `null` are false; every other value is true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integers, and floats with no fractional part that fit in an `i64`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                if *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Whether `target` is reachable from this value.
    pub fn references(&self, target: &ObjectRef) -> bool {
        match self {
            Value::Array(items) => items.iter().any(|item| item.references(target)),
            Value::Object(obj) => {
                obj.ptr_eq(target) || obj.entries().iter().any(|(_, v)| v.references(target))
            }
            _ => false,
        }
    }

    /// Copy with no object storage shared with `self`.
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Array(items) => Value::Array(items.iter().map(Value::deep_clone).collect()),
            Value::Object(obj) => Value::Object(obj.deep_clone()),
            other => other.clone(),
        }
    }

    /// Ordering for numbers against numbers and strings against strings.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => {
                a.as_f64().zip(b.as_f64()).and_then(|(x, y)| x.partial_cmp(&y))
            }
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::Number(Number::from(*i)),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(obj) => {
                let mut map = Map::new();
                for (key, value) in obj.entries() {
                    map.insert(key, value.to_json());
                }
                serde_json::Value::Object(map)
            }
            Value::Binary(bytes) => serde_json::Value::Array(
                bytes
                    .iter()
                    .map(|b| serde_json::Value::Number(Number::from(*b)))
                    .collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => a.as_f64() == b.as_f64(),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{}", s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::object(map.into_iter().map(|(k, v)| (k, Value::from(v))))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}
