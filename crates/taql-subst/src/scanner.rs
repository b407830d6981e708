//! Template scanning: replacing `$name` and `$(expression)` placeholders.
//!
//! Rules:
//!
//! 1. A name starts with a letter or underscore, followed by letters, digits
//!    and underscores.
//! 2. Text inside single or double quotes is literal. A backslash makes the
//!    next character literal; the backslash itself stays in the output.
//! 3. Names are looked up in the [`Scope`].
//! 4. A value whose kind matches an [`ObjectRule`] becomes `$<prefix><n>`;
//!    anything else is serialized as a literal of the target grammar.
//! 5. An unknown name, or a fragment that fails to evaluate, is left as is.
//!
//! Substitution is not recursive: a string value holding `$a` is emitted as
//! a quoted literal.

use tracing::{debug, trace};

use crate::config::GrammarConfig;
use crate::expr::evaluate_expression;
use crate::registry::{register_object, ObjectRule};
use crate::scope::{Resolution, Scope};
use crate::serialize::serialize_value;
use crate::value::Value;

/// Substitute placeholders in `template` using TaQL literal rules.
///
/// Objects claimed by `rules` are appended to the rule's object list.
///
/// # Examples
/// ```
/// use taql_subst::{substitute, Scope};
/// let scope = Scope::new().with("a", 2).with("b", 3);
/// assert_eq!(substitute("$(a+b)+$a", &mut [], &scope), "5+2");
/// assert_eq!(substitute("\"$a\" $zzz", &mut [], &scope), "\"$a\" $zzz");
/// ```
pub fn substitute(template: &str, rules: &mut [ObjectRule], scope: &Scope) -> String {
    Substituter::new(scope).substitute(template, rules)
}

/// Placeholder substitution with a configurable target grammar
#[derive(Debug, Clone)]
pub struct Substituter<'a> {
    scope: &'a Scope,
    grammar: GrammarConfig,
}

/// Scanner state for one pass over a template
#[derive(Debug, Default)]
struct ScanState {
    out: String,
    /// Pending identifier after a `$`
    name: String,
    /// Content of an open `$( … )` fragment
    fragment: String,
    /// A `$` was seen and its placeholder is not finished
    dollar: bool,
    /// Parenthesis depth inside a fragment; 0 outside
    depth: usize,
    backslash: bool,
    single_quote: bool,
    double_quote: bool,
}

impl ScanState {
    fn in_quotes(&self) -> bool {
        self.single_quote || self.double_quote
    }

    /// Route a plain character to the fragment or to the output
    fn push(&mut self, c: char) {
        if self.depth > 0 {
            self.fragment.push(c);
        } else {
            self.out.push(c);
        }
    }

    /// Quotes of one kind are literal inside quotes of the other kind
    fn toggle_quotes(&mut self, c: char) {
        if c == '"' && !self.single_quote {
            self.double_quote = !self.double_quote;
        } else if c == '\'' && !self.double_quote {
            self.single_quote = !self.single_quote;
        }
    }
}

impl<'a> Substituter<'a> {
    /// Create a substituter with TaQL literal rules
    pub fn new(scope: &'a Scope) -> Self {
        Self {
            scope,
            grammar: GrammarConfig::default(),
        }
    }

    /// Use a different target grammar
    pub fn with_grammar(mut self, grammar: GrammarConfig) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn grammar(&self) -> &GrammarConfig {
        &self.grammar
    }

    /// Substitute all placeholders in a template
    pub fn substitute(&self, template: &str, rules: &mut [ObjectRule]) -> String {
        let mut state = ScanState {
            out: String::with_capacity(template.len()),
            ..ScanState::default()
        };

        for c in template.chars() {
            if state.backslash {
                state.push(c);
                state.backslash = false;
                continue;
            }

            // Collect the name or detect the start of a fragment
            if state.dollar && state.depth == 0 {
                if c == '_' || c.is_ascii_alphabetic() {
                    state.name.push(c);
                    continue;
                }
                if c.is_ascii_digit() && !state.name.is_empty() {
                    state.name.push(c);
                    continue;
                }
                if c == '(' && state.name.is_empty() {
                    state.depth = 1;
                    state.fragment.clear();
                    continue;
                }
                // End of name; the current character is handled below
                let name = std::mem::take(&mut state.name);
                let text = self.substitute_name(&name, rules);
                state.out.push_str(&text);
                state.dollar = false;
            }

            state.toggle_quotes(c);

            if !state.in_quotes() {
                if state.depth > 0 {
                    if c == '(' {
                        state.depth += 1;
                    } else if c == ')' {
                        state.depth -= 1;
                        if state.depth == 0 {
                            let fragment = std::mem::take(&mut state.fragment);
                            let text = self.substitute_fragment(&fragment, rules);
                            state.out.push_str(&text);
                            state.dollar = false;
                            continue;
                        }
                    }
                    state.fragment.push(c);
                    continue;
                }
                if c == '$' {
                    state.dollar = true;
                    state.name.clear();
                    continue;
                }
            }

            state.push(c);
            if c == '\\' {
                state.backslash = true;
            }
        }

        // Flush a pending name, or give back an unterminated fragment
        if state.depth > 0 {
            debug!("Unterminated fragment left as is: $({}", state.fragment);
            state.out.push_str("$(");
            state.out.push_str(&state.fragment);
        } else if state.dollar {
            let name = std::mem::take(&mut state.name);
            let text = self.substitute_name(&name, rules);
            state.out.push_str(&text);
        }

        state.out
    }

    fn substitute_name(&self, name: &str, rules: &mut [ObjectRule]) -> String {
        // A lone `$` stays a `$`
        if name.is_empty() {
            return "$".to_string();
        }

        match self.scope.resolve(name) {
            Resolution::Resolved(value) => {
                let text = self.render(&value, rules);
                trace!("Substituted ${} -> {}", name, text);
                text
            }
            Resolution::Unresolved => {
                debug!("Unresolved name left as is: ${}", name);
                format!("${}", name)
            }
        }
    }

    fn substitute_fragment(&self, fragment: &str, rules: &mut [ObjectRule]) -> String {
        match evaluate_expression(fragment, self.scope) {
            Ok(value) => {
                let text = self.render(&value, rules);
                trace!("Substituted $({}) -> {}", fragment, text);
                text
            }
            Err(e) => {
                debug!("Fragment $({}) left as is: {}", fragment, e);
                format!("$({})", fragment)
            }
        }
    }

    /// Object placeholder if a rule claims the value, literal text otherwise
    fn render(&self, value: &Value, rules: &mut [ObjectRule]) -> String {
        register_object(value, rules).unwrap_or_else(|| serialize_value(value, &self.grammar))
    }
}
