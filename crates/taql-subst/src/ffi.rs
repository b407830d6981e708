//! UniFFI surface for host-language bindings.
//!
//! Hosts pass their variables as a JSON object; object rules are not
//! available across this boundary.

use crate::config::GrammarConfig;
use crate::expr::evaluate_expression;
use crate::scanner::Substituter;
use crate::scope::Scope;
use crate::serialize::serialize_value;

/// Error type for the substitution API, exposed via UniFFI.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum SubstituteFfiError {
    #[error("Invalid scope: {0}")]
    InvalidScope(String),
    #[error("Invalid grammar: {0}")]
    InvalidGrammar(String),
    #[error("Evaluation failed: {0}")]
    Evaluation(String),
}

/// Substitute placeholders using variables given as a JSON object
#[uniffi::export]
pub fn substitute_json(template: String, scope_json: String) -> Result<String, SubstituteFfiError> {
    let scope = Scope::from_json(&scope_json)
        .map_err(|e| SubstituteFfiError::InvalidScope(e.to_string()))?;
    Ok(Substituter::new(&scope).substitute(&template, &mut []))
}

/// Same as [`substitute_json`] with a grammar given as TOML
#[uniffi::export]
pub fn substitute_json_with_grammar(
    template: String,
    scope_json: String,
    grammar_toml: String,
) -> Result<String, SubstituteFfiError> {
    let scope = Scope::from_json(&scope_json)
        .map_err(|e| SubstituteFfiError::InvalidScope(e.to_string()))?;
    let grammar = GrammarConfig::from_toml(&grammar_toml)
        .map_err(|e| SubstituteFfiError::InvalidGrammar(e.to_string()))?;
    Ok(Substituter::new(&scope)
        .with_grammar(grammar)
        .substitute(&template, &mut []))
}

/// Evaluate an expression and return its TaQL literal
#[uniffi::export]
pub fn evaluate_json(expr: String, scope_json: String) -> Result<String, SubstituteFfiError> {
    let scope = Scope::from_json(&scope_json)
        .map_err(|e| SubstituteFfiError::InvalidScope(e.to_string()))?;
    let value = evaluate_expression(&expr, &scope)
        .map_err(|e| SubstituteFfiError::Evaluation(e.to_string()))?;
    Ok(serialize_value(&value, &GrammarConfig::default()))
}
