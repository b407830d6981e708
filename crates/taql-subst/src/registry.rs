//! Object rules: substituting host objects as numbered placeholders.
//!
//! A value whose kind matches a rule is appended to that rule's object list
//! and replaced by `$<prefix><n>`, where `n` is its 1-based position in the
//! list. The caller binds the placeholders from the lists afterwards.

use crate::error::RuleError;
use crate::value::{ObjectRef, Value};

/// A (kind, prefix, objects) triple
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRule {
    kind: String,
    prefix: String,
    objects: Vec<ObjectRef>,
}

impl ObjectRule {
    /// Create a rule with an empty object list
    pub fn new(kind: impl Into<String>, prefix: impl Into<String>) -> Result<Self, RuleError> {
        Self::with_objects(kind, prefix, Vec::new())
    }

    /// Create a rule whose list already holds objects; numbering continues
    /// after them
    pub fn with_objects(
        kind: impl Into<String>,
        prefix: impl Into<String>,
        objects: Vec<ObjectRef>,
    ) -> Result<Self, RuleError> {
        let kind = kind.into();
        let prefix = prefix.into();

        if kind.is_empty() {
            return Err(RuleError::EmptyKind);
        }
        if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(RuleError::InvalidPrefix(prefix));
        }
        // `$1` followed by a numeric prefix would be ambiguous
        if prefix.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(RuleError::NumericPrefix(prefix));
        }

        Ok(Self {
            kind,
            prefix,
            objects,
        })
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Objects collected so far, in placeholder order
    pub fn objects(&self) -> &[ObjectRef] {
        &self.objects
    }

    pub fn into_objects(self) -> Vec<ObjectRef> {
        self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn matches(&self, object: &ObjectRef) -> bool {
        object.kind() == self.kind
    }

    /// Append an object and return its placeholder.
    ///
    /// No deduplication: the same object appended twice gets two positions.
    pub fn append(&mut self, object: ObjectRef) -> String {
        self.objects.push(object);
        self.placeholder(self.objects.len())
    }

    /// Placeholder text for a 1-based position
    pub fn placeholder(&self, position: usize) -> String {
        format!("${}{}", self.prefix, position)
    }
}

/// Substitute a value through the first matching rule.
///
/// Returns `None` when the value is not an object or no rule matches its
/// kind, in which case the value is to be serialized inline.
pub fn register_object(value: &Value, rules: &mut [ObjectRule]) -> Option<String> {
    let object = match value {
        Value::Object(object) => object,
        _ => return None,
    };

    rules
        .iter_mut()
        .find(|rule| rule.matches(object))
        .map(|rule| rule.append(object.clone()))
}
