//! Command preparation errors

use taql_subst::RuleError;
use thiserror::Error;

/// Errors preparing or running a TaQL command
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("Invalid TaQL style '{0}'")]
    InvalidStyle(String),

    #[error("Execution failed: {0}")]
    Execution(String),
}

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;
