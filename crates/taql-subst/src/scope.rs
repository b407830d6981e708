//! Name resolution for placeholders and fragment expressions.
//!
//! A [`Scope`] is built explicitly by the caller. It has three tiers:
//!
//! - **locals**: explicit bindings; when present they are the only local tier
//! - **frames**: a stack of enclosing binding frames, searched innermost first,
//!   consulted only when there are no explicit locals
//! - **globals**: module-level bindings, consulted last

use std::collections::HashMap;

use crate::error::ScopeError;
use crate::value::Value;

/// Name to value bindings
pub type Bindings = HashMap<String, Value>;

/// Outcome of looking up a name
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(Value),
    Unresolved,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn into_option(self) -> Option<Value> {
        match self {
            Resolution::Resolved(v) => Some(v),
            Resolution::Unresolved => None,
        }
    }
}

/// Variable environment for substitution
#[derive(Debug, Clone, Default)]
pub struct Scope {
    locals: Bindings,
    frames: Vec<Bindings>,
    globals: Bindings,
}

impl Scope {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope with explicit local bindings
    pub fn from_locals(locals: Bindings) -> Self {
        Self {
            locals,
            ..Self::default()
        }
    }

    /// Bind a local variable (builder form)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_local(name, value);
        self
    }

    /// Bind a global variable (builder form)
    pub fn with_global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_global(name, value);
        self
    }

    /// Push an enclosing frame (builder form)
    pub fn with_frame(mut self, frame: Bindings) -> Self {
        self.push_frame(frame);
        self
    }

    pub fn set_local(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.locals.insert(name.into(), value.into());
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.globals.insert(name.into(), value.into());
    }

    /// Push a frame; it becomes the innermost one
    pub fn push_frame(&mut self, frame: Bindings) {
        self.frames.push(frame);
    }

    /// Pop the innermost frame
    pub fn pop_frame(&mut self) -> Option<Bindings> {
        self.frames.pop()
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    pub fn has_explicit_locals(&self) -> bool {
        !self.locals.is_empty()
    }

    /// Look up a name without cloning its value
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let local = if self.has_explicit_locals() {
            self.locals.get(name)
        } else {
            self.frames.iter().rev().find_map(|frame| frame.get(name))
        };
        local.or_else(|| self.globals.get(name))
    }

    /// Resolve a name to its value
    pub fn resolve(&self, name: &str) -> Resolution {
        match self.lookup(name) {
            Some(v) => Resolution::Resolved(v.clone()),
            None => Resolution::Unresolved,
        }
    }

    /// Build a scope whose locals come from a JSON object.
    ///
    /// `null` maps to `None`, arrays to lists; nested objects are rejected.
    pub fn from_json(json_str: &str) -> Result<Self, ScopeError> {
        let parsed: serde_json::Value = serde_json::from_str(json_str)?;
        let object = match parsed {
            serde_json::Value::Object(map) => map,
            other => return Err(ScopeError::NotAnObject(json_kind(&other).to_string())),
        };

        let mut locals = Bindings::with_capacity(object.len());
        for (name, json) in object {
            let value = json_to_value(&name, json)?;
            locals.insert(name, value);
        }
        Ok(Self::from_locals(locals))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let locals = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_locals(locals)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn json_to_value(name: &str, json: serde_json::Value) -> Result<Value, ScopeError> {
    match json {
        serde_json::Value::Null => Ok(Value::None),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(x) = n.as_f64() {
                Ok(Value::Float(x))
            } else {
                Err(ScopeError::UnsupportedValue {
                    name: name.to_string(),
                    reason: format!("number {} does not fit", n),
                })
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s)),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| json_to_value(name, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        serde_json::Value::Object(_) => Err(ScopeError::UnsupportedValue {
            name: name.to_string(),
            reason: "objects cannot be substituted".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pairs: &[(&str, i64)]) -> Bindings {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Int(*v)))
            .collect()
    }

    #[test]
    fn test_explicit_locals() {
        let scope = Scope::new().with("a", 2).with("c", "xyz");
        assert_eq!(scope.resolve("a"), Resolution::Resolved(Value::Int(2)));
        assert_eq!(scope.resolve("zzz"), Resolution::Unresolved);
    }

    #[test]
    fn test_innermost_frame_wins() {
        let scope = Scope::new()
            .with_frame(frame(&[("a", 1), ("b", 10)]))
            .with_frame(frame(&[("a", 2)]));
        assert_eq!(scope.lookup("a"), Some(&Value::Int(2)));
        assert_eq!(scope.lookup("b"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_explicit_locals_hide_frames() {
        let scope = Scope::new()
            .with_frame(frame(&[("a", 1), ("b", 10)]))
            .with("a", 5);
        assert_eq!(scope.lookup("a"), Some(&Value::Int(5)));
        assert_eq!(scope.lookup("b"), None);
    }

    #[test]
    fn test_globals_are_last() {
        let scope = Scope::new()
            .with_global("a", 100)
            .with_global("g", 7)
            .with_frame(frame(&[("a", 1)]));
        assert_eq!(scope.lookup("a"), Some(&Value::Int(1)));
        assert_eq!(scope.lookup("g"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_pop_frame() {
        let mut scope = Scope::new();
        scope.push_frame(frame(&[("a", 1)]));
        scope.push_frame(frame(&[("a", 2)]));
        assert_eq!(scope.frame_depth(), 2);
        scope.pop_frame();
        assert_eq!(scope.lookup("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_from_iterator() {
        let scope: Scope = vec![("x", 1), ("y", 2)].into_iter().collect();
        assert!(scope.has_explicit_locals());
        assert_eq!(scope.lookup("y"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_from_json() {
        let scope = Scope::from_json(r#"{"a": 2, "x": 1.5, "s": "ab", "v": [1, 2], "n": null}"#)
            .unwrap();
        assert_eq!(scope.lookup("a"), Some(&Value::Int(2)));
        assert_eq!(scope.lookup("x"), Some(&Value::Float(1.5)));
        assert_eq!(scope.lookup("s"), Some(&Value::Str("ab".to_string())));
        assert_eq!(
            scope.lookup("v"),
            Some(&Value::List(vec![Value::Int(1), Value::Int(2)]))
        );
        assert_eq!(scope.lookup("n"), Some(&Value::None));
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(matches!(
            Scope::from_json("[1, 2]"),
            Err(ScopeError::NotAnObject(_))
        ));
        assert!(matches!(
            Scope::from_json(r#"{"r": {"x": 1}}"#),
            Err(ScopeError::UnsupportedValue { .. })
        ));
        assert!(matches!(Scope::from_json("{"), Err(ScopeError::Json(_))));
    }
}
