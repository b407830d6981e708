//! Error types
//!
//! Unresolved names and failed fragments are not errors at the template
//! level; they only surface through [`crate::evaluate_expression`].

use thiserror::Error;

/// Expression parse errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Empty expression")]
    Empty,

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Unexpected characters at end: '{0}'")]
    TrailingInput(String),

    #[error("Expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Expression evaluation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Name not found: {0}")]
    UnknownName(String),

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Type error: {0}")]
    TypeError(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Index out of range: {0}")]
    IndexOutOfRange(i64),

    #[error("Result longer than {0} elements")]
    TooLarge(usize),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

/// Result type for evaluation
pub type EvalResult<T> = Result<T, EvalError>;

/// Malformed object rule. This is a caller bug, not a template condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("Object rule needs a non-empty kind")]
    EmptyKind,

    #[error("Invalid placeholder prefix '{0}': only letters, digits and '_' are allowed")]
    InvalidPrefix(String),

    #[error("Placeholder prefix '{0}' must not start with a digit")]
    NumericPrefix(String),
}

/// Errors building a [`crate::Scope`] from external data
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Scope must be a JSON object, got {0}")]
    NotAnObject(String),

    #[error("Unsupported value for '{name}': {reason}")]
    UnsupportedValue { name: String, reason: String },
}

/// Grammar configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing token: {0}")]
    MissingToken(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
