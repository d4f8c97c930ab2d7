//! # adaptive-expr: Embeddable Expression Evaluation
//!
//! adaptive-expr evaluates trees of typed operator calls against a host
//! supplied memory. Trees are built and validated once, then evaluated any
//! number of times, concurrently if needed.
//!
//! ## Building Blocks
//!
//! ### 1. Values and Types
//! - Dynamic values with shared objects ([`value`])
//! - Static return kinds checked at bind time ([`types`])
//!
//! ### 2. Expressions
//! - Immutable expression trees and evaluation ([`expression`])
//! - Operator definitions pairing an evaluator with a validator
//!   ([`expression::OperatorDefinition`])
//!
//! ### 3. Operator Catalogue
//! - Builtin operator families ([`functions`])
//! - Name and alias lookup, plus host registered operators ([`registry`])
//!
//! ### 4. Memory
//! - The host memory contract and path resolution ([`memory`])
//! - Lambda scopes layered over the host memory ([`memory::StackedMemory`])
//!
//! ### 5. Ambient Concerns
//! - Per-evaluation options ([`config`])
//! - Bind, evaluation and registry errors ([`error`])
//!
//! ## Lifecycle
//!
//! ```text
//! FunctionRegistry → make_expression (bind + validate) → Expression → evaluate(memory, options)
//! ```
//!
//! ```
//! use adaptive_expr::{evaluate, EvaluationOptions, Expression, FunctionRegistry, Value};
//! use adaptive_expr::memory::SimpleObjectMemory;
//! use serde_json::json;
//!
//! let registry = FunctionRegistry::standard();
//! let expr = registry
//!     .make_expression(
//!         "add",
//!         vec![Expression::accessor("order.total"), Expression::constant(5)],
//!     )
//!     .unwrap();
//! let memory = SimpleObjectMemory::from(json!({"order": {"total": 10}}));
//! let result = evaluate(&expr, &memory, &EvaluationOptions::default()).unwrap();
//! assert_eq!(result, Value::Integer(15));
//! ```
//!
//! Evaluation never panics on bad input: operator failures come back as
//! [`EvalError`] with a diagnostic message, and the first error encountered
//! in left-to-right order wins.

pub mod config;
pub mod error;
pub mod expression;
pub mod functions;
pub mod memory;
pub mod registry;
pub mod types;
pub mod value;

// Re-exports
pub use config::EvaluationOptions;
pub use error::*;
pub use expression::{evaluate, Expression, ExpressionKind, OperatorDefinition};
pub use memory::Memory;
pub use registry::FunctionRegistry;
pub use types::ReturnType;
pub use value::{ObjectRef, Value};
