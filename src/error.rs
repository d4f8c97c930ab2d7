use thiserror::Error;

use crate::types::ReturnType;

/// Errors raised while binding an expression tree.
///
/// Bind errors are fatal to the tree being constructed: an expression that
/// fails to bind is never evaluated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindError {
    #[error("{name} does not have an evaluator, it's not a built-in function or a custom function.")]
    UnknownFunction { name: String },

    #[error("{expression} should have {expected} children, found {found}.")]
    Arity {
        expression: String,
        expected: String,
        found: usize,
    },

    #[error("{expression} expected child {position} of type {expected}, found {found}.")]
    TypeMismatch {
        expression: String,
        position: usize,
        expected: ReturnType,
        found: ReturnType,
    },

    #[error("{expression}: {message}")]
    Invalid { expression: String, message: String },
}

impl BindError {
    pub fn unknown_function<S: Into<String>>(name: S) -> Self {
        Self::UnknownFunction { name: name.into() }
    }

    pub fn invalid<E: ToString, S: Into<String>>(expression: E, message: S) -> Self {
        Self::Invalid {
            expression: expression.to_string(),
            message: message.into(),
        }
    }
}

/// The error half of an evaluation result.
///
/// The message is the diagnostic surfaced to the host; the variant only
/// classifies the failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Parse(String),
}

impl EvalError {
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid(message.into())
    }

    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Invalid(m) | Self::Parse(m) => m,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Function already exists: {0}")]
    Duplicate(String),

    #[error("Alias {alias} refers to unknown function {target}")]
    UnknownAliasTarget { alias: String, target: String },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Bind error: {0}")]
    Bind(#[from] BindError),

    #[error("Eval error: {0}")]
    Eval(#[from] EvalError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Config error: {0}")]
    Config(String),
}

pub type EvalResult<T> = Result<T, EvalError>;
pub type BindResult<T> = Result<T, BindError>;
pub type InternalResult<T> = Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_error_displays_bare_message() {
        let err = EvalError::invalid("regular expression is empty.");
        assert_eq!(err.to_string(), "regular expression is empty.");
        assert_eq!(err.message(), "regular expression is empty.");
        assert_eq!(EvalError::parse("x is not valid JSON.").message(), "x is not valid JSON.");
    }

    #[test]
    fn test_error_wraps_sources() {
        let err: Error = BindError::unknown_function("nope").into();
        assert!(matches!(err, Error::Bind(BindError::UnknownFunction { .. })));
        assert!(err.to_string().starts_with("Bind error: nope"));

        let err: Error = EvalError::parse("bad json").into();
        assert_eq!(err.to_string(), "Eval error: bad json");
    }
}
