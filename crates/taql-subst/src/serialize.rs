//! Literal text for resolved values.

use crate::config::GrammarConfig;
use crate::value::{format_float, Value};

/// Serialize a value into a literal of the target grammar.
///
/// A list becomes a bracketed, separator-joined list of its serialized
/// elements. Elements are expected to be scalars; anything nested deeper
/// falls back to its generic text. Never fails.
///
/// # Examples
/// ```
/// use taql_subst::{serialize_value, GrammarConfig, Value};
/// let grammar = GrammarConfig::default();
/// assert_eq!(serialize_value(&Value::from(vec![1, 2, 3]), &grammar), "[1,2,3]");
/// assert_eq!(serialize_value(&Value::from(true), &grammar), "T");
/// ```
pub fn serialize_value(value: &Value, grammar: &GrammarConfig) -> String {
    match value {
        Value::List(items) => {
            let parts: Vec<String> = items
                .iter()
                .map(|item| serialize_scalar(item, grammar))
                .collect();
            format!(
                "{}{}{}",
                grammar.list_open,
                parts.join(&grammar.list_separator),
                grammar.list_close
            )
        }
        other => serialize_scalar(other, grammar),
    }
}

fn serialize_scalar(value: &Value, grammar: &GrammarConfig) -> String {
    match value {
        Value::Str(s) => quote_string(s, grammar),
        Value::Bool(true) => grammar.true_token.clone(),
        Value::Bool(false) => grammar.false_token.clone(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => format_float(*x),
        other => other.to_string(),
    }
}

/// Enclose a string in quotes, replacing each embedded quote by the
/// grammar's escape. With TaQL rules `ab"cd` becomes `"ab"'"'"cd"`.
pub fn quote_string(value: &str, grammar: &GrammarConfig) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(grammar.string_quote);
    for c in value.chars() {
        if c == grammar.string_quote {
            out.push_str(&grammar.quote_escape);
        } else {
            out.push(c);
        }
    }
    out.push(grammar.string_quote);
    out
}
