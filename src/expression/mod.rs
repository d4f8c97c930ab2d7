//! Expression trees and the operator contract.
//!
//! An [`Expression`] is either a constant or a call of an
//! [`OperatorDefinition`] over child expressions. Trees are built through
//! [`FunctionRegistry::make_expression`](crate::FunctionRegistry::make_expression),
//! which runs the operator's validator once; a tree that fails to bind is
//! never evaluated.
//!
//! The [`evaluation`] and [`validation`] modules hold the building blocks the
//! builtin operators are assembled from. Host-defined operators can use them
//! the same way.

mod definition;
pub mod evaluation;
mod node;
pub mod validation;

pub use definition::{EvaluateFn, OperatorDefinition, ValidateFn};
pub use node::{evaluate, Expression, ExpressionKind};
