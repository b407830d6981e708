//! Values that placeholders resolve to.

use std::fmt;
use std::sync::Arc;

/// A host object substituted by reference (`$1`, `$t2`) instead of by value.
///
/// Tables and images opened through the native library implement this so
/// that a template can mention them by name.
pub trait HostObject: fmt::Debug + Send + Sync {
    /// Type tag matched against [`crate::ObjectRule`] kinds (e.g. `table`)
    fn kind(&self) -> &str;

    /// Generic text used when no object rule claims the object
    fn describe(&self) -> String {
        format!("<{}>", self.kind())
    }
}

/// Shared handle to a [`HostObject`].
///
/// Equality is identity: two handles are equal when they point at the same
/// object.
#[derive(Debug, Clone)]
pub struct ObjectRef(Arc<dyn HostObject>);

impl ObjectRef {
    pub fn new<T: HostObject + 'static>(object: T) -> Self {
        Self(Arc::new(object))
    }

    pub fn from_arc(object: Arc<dyn HostObject>) -> Self {
        Self(object)
    }

    pub fn kind(&self) -> &str {
        self.0.kind()
    }

    pub fn describe(&self) -> String {
        self.0.describe()
    }

    /// Borrow the underlying object
    pub fn inner(&self) -> &Arc<dyn HostObject> {
        &self.0
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// A resolved value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value (e.g. a function that returns nothing)
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An ordered sequence; host lists, tuples and arrays all map here
    List(Vec<Value>),
    /// A special host object such as a table handle
    Object(ObjectRef),
}

impl Value {
    /// Name of the value's type, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Truth value: zero, empty and `None` are false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Numeric view; booleans count as 0 and 1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Quoted form used for strings nested inside a generic list rendering
    fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

/// Format a float so integral values keep a fractional part (`3.0`).
pub fn format_float(x: f64) -> String {
    format!("{:?}", x)
}

/// Generic textual form, the fallback for anything the serializer has no
/// dedicated rule for.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", format_float(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::repr).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Object(o) => write!(f, "{}", o.describe()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(i: $t) -> Self {
                    Value::Int(i64::from(i))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(items: [T; N]) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(items: &[T]) -> Self {
        Value::List(items.iter().cloned().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::None)
    }
}
