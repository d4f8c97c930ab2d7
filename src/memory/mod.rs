//! Variable scopes resolved by accessor expressions.
//!
//! A [`SimpleObjectMemory`] wraps the host's object graph. The collection
//! operators (`foreach`, `select`, `where`) stack a [`StackedMemory`] over
//! it per element to bind the iteration variable; lookups that miss the
//! local bindings fall through to the parent.
//!
//! Paths are dotted/bracketed accessors such as `user.addresses[0].city`
//! or `headers['content-type']`. A missing segment anywhere along the path
//! resolves to absent rather than failing the expression.

mod path;
mod simple;
mod stacked;

pub use path::{get_path, parse_path, set_path, PathSegment};
pub use simple::SimpleObjectMemory;
pub use stacked::StackedMemory;

use crate::{EvalResult, Value};

pub trait Memory {
    /// Value at `path`, or `None` when any segment is missing.
    fn get_value(&self, path: &str) -> Option<Value>;

    /// Write `value` at `path`, creating missing intermediate objects.
    fn set_value(&self, path: &str, value: Value) -> EvalResult<()>;
}
