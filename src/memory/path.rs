use core::fmt;

use crate::{EvalError, EvalResult, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Property(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Property(name) => write!(f, "{}", name),
            PathSegment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Split an accessor path into segments.
///
/// `a.b[0]['c d']` becomes `[a, b, 0, "c d"]`.
pub fn parse_path(path: &str) -> EvalResult<Vec<PathSegment>> {
    let invalid = || EvalError::invalid(format!("{} is not a valid path.", path));
    let mut segments = Vec::new();
    let mut chars = path.chars().peekable();
    let mut current = String::new();
    // true right after a `]`, where only `.` or `[` may follow
    let mut after_bracket = false;

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                if current.is_empty() && !after_bracket {
                    return Err(invalid());
                }
                if !current.is_empty() {
                    segments.push(PathSegment::Property(std::mem::take(&mut current)));
                }
                after_bracket = false;
                if chars.peek().is_none() {
                    return Err(invalid());
                }
            }
            '[' => {
                if !current.is_empty() {
                    segments.push(PathSegment::Property(std::mem::take(&mut current)));
                }
                let mut inner = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(c);
                }
                if !closed {
                    return Err(invalid());
                }
                segments.push(parse_bracket(inner.trim()).ok_or_else(invalid)?);
                after_bracket = true;
            }
            _ => {
                if after_bracket {
                    return Err(invalid());
                }
                current.push(c);
            }
        }
    }
    if !current.is_empty() {
        segments.push(PathSegment::Property(current));
    }
    if segments.is_empty() {
        return Err(invalid());
    }
    Ok(segments)
}

fn parse_bracket(inner: &str) -> Option<PathSegment> {
    let quoted = |q: char| inner.len() >= 2 && inner.starts_with(q) && inner.ends_with(q);
    if quoted('\'') || quoted('"') {
        return Some(PathSegment::Property(inner[1..inner.len() - 1].to_string()));
    }
    inner.parse::<usize>().ok().map(PathSegment::Index)
}

/// Resolve `segments` below `root`.
pub fn get_path(root: &Value, segments: &[PathSegment]) -> Option<Value> {
    let Some((head, rest)) = segments.split_first() else {
        return Some(root.clone());
    };
    let child = match (root, head) {
        (Value::Object(obj), PathSegment::Property(name)) => obj.get(name),
        (Value::Object(obj), PathSegment::Index(i)) => obj.get(&i.to_string()),
        (Value::Array(items), PathSegment::Index(i)) => items.get(*i).cloned(),
        _ => None,
    }?;
    get_path(&child, rest)
}

/// Write `value` at `segments` below `target`.
///
/// Objects are updated in place. Arrays are values, so when the write lands
/// inside an array the rebuilt array is returned and the caller stores it
/// back into its own container.
pub fn set_path(
    target: &Value,
    segments: &[PathSegment],
    value: Value,
) -> EvalResult<Option<Value>> {
    let Some((head, rest)) = segments.split_first() else {
        return Err(EvalError::invalid("Cannot set a value on an empty path."));
    };

    if rest.is_empty() {
        return match (target, head) {
            (Value::Object(obj), PathSegment::Property(name)) => {
                obj.set(name.clone(), value)?;
                Ok(None)
            }
            (Value::Object(obj), PathSegment::Index(i)) => {
                obj.set(i.to_string(), value)?;
                Ok(None)
            }
            (Value::Array(items), PathSegment::Index(i)) => {
                let mut items = items.clone();
                match (*i).cmp(&items.len()) {
                    std::cmp::Ordering::Less => items[*i] = value,
                    std::cmp::Ordering::Equal => items.push(value),
                    std::cmp::Ordering::Greater => {
                        return Err(EvalError::invalid(format!(
                            "{} index out of range.",
                            i
                        )))
                    }
                }
                Ok(Some(Value::Array(items)))
            }
            _ => Err(EvalError::invalid(format!(
                "Cannot set {} on a {} value.",
                head,
                target.type_name()
            ))),
        };
    }

    let existing = get_path(target, std::slice::from_ref(head)).filter(|v| !v.is_null());
    let (child, rebuilt_target) = match existing {
        Some(child) => (child, None),
        None => {
            // Only objects can be created implicitly along the way.
            let created = Value::Object(Default::default());
            let rebuilt = store(target, head, created.clone())?;
            (created, rebuilt)
        }
    };
    match (set_path(&child, rest, value)?, rebuilt_target) {
        (Some(child), Some(rebuilt)) => store(&rebuilt, head, child),
        (Some(child), None) => store(target, head, child),
        (None, rebuilt) => Ok(rebuilt),
    }
}

fn store(target: &Value, segment: &PathSegment, value: Value) -> EvalResult<Option<Value>> {
    set_path(target, std::slice::from_ref(segment), value)
}
