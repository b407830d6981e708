//! Literal formatting rules of the target grammar.
//!
//! The defaults are the TaQL rules: booleans are `T`/`F`, vectors are
//! `[a,b,c]` and strings are double-quoted with an embedded double quote
//! written as `"'"'"`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Target grammar literal configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarConfig {
    /// Token for a true boolean
    pub true_token: String,
    /// Token for a false boolean
    pub false_token: String,
    /// Opening bracket of a vector literal
    pub list_open: String,
    /// Closing bracket of a vector literal
    pub list_close: String,
    /// Separator between vector elements
    pub list_separator: String,
    /// Quote character enclosing string literals
    pub string_quote: char,
    /// Replacement for a quote character inside a string literal
    pub quote_escape: String,
}

impl Default for GrammarConfig {
    fn default() -> Self {
        Self {
            true_token: "T".to_string(),
            false_token: "F".to_string(),
            list_open: "[".to_string(),
            list_close: "]".to_string(),
            list_separator: ",".to_string(),
            string_quote: '"',
            quote_escape: "\"'\"'\"".to_string(),
        }
    }
}

impl GrammarConfig {
    /// TaQL rules
    pub fn taql() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, token) in [
            ("true_token", &self.true_token),
            ("false_token", &self.false_token),
            ("list_open", &self.list_open),
            ("list_close", &self.list_close),
            ("list_separator", &self.list_separator),
            ("quote_escape", &self.quote_escape),
        ] {
            if token.is_empty() {
                return Err(ConfigError::MissingToken(name.to_string()));
            }
        }

        if self.true_token == self.false_token {
            return Err(ConfigError::InvalidToken(
                "true_token and false_token must differ".to_string(),
            ));
        }

        // The escape has to reproduce the quote once the grammar unescapes it
        if !self.quote_escape.contains(self.string_quote) {
            return Err(ConfigError::InvalidToken(format!(
                "quote_escape must contain the string quote {}",
                self.string_quote
            )));
        }

        Ok(())
    }
}
