//! Runtime values captured in a scope snapshot and produced by evaluation.
//!
//! Every payload that is not plain data is behind an `Arc`, so cloning a
//! [`Value`] out of a snapshot is cheap and values can cross threads.

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, LazyError, Result};

/// Signature of a native function.  Errors are passed through unchanged.
pub type NativeFn = dyn Fn(&[Value]) -> std::result::Result<Value, BoxError> + Send + Sync;

/// A user-defined object captured by name.
///
/// `render` is the object's conversion to text.  It runs during
/// materialization, may block, and may fail; a failure reaches the observer
/// as [`LazyError::Conversion`] with the original error inside.
pub trait Object: Send + Sync + fmt::Debug {
    fn render(&self) -> std::result::Result<String, BoxError>;

    /// Attribute access for `obj.name`.
    fn get(&self, _name: &str) -> Option<Value> {
        None
    }

    fn type_name(&self) -> &str {
        "object"
    }
}

#[derive(Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Arc<str>),
    List(Arc<[Value]>),
    Object(Arc<dyn Object>),
    Native {
        name: Arc<str>,
        /// `None` accepts any number of arguments.
        arity: Option<usize>,
        func: Arc<NativeFn>,
    },
}

impl Value {
    /// Wrap a user object.
    pub fn object<T: Object + 'static>(object: T) -> Self {
        Value::Object(Arc::new(object))
    }

    /// Build a native function value.
    pub fn native<F>(name: &str, arity: Option<usize>, func: F) -> Self
    where
        F: Fn(&[Value]) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        Value::Native {
            name: Arc::from(name),
            arity,
            func: Arc::new(func),
        }
    }

    /// Short name of the value's type, used in error messages.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Object(object) => object.type_name(),
            Value::Native { .. } => "native function",
        }
    }

    /// `nil` and `false` are falsy; empty strings and lists too.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Object(_) | Value::Native { .. } => true,
        }
    }

    /// Convert to text the way an interpolation span does.  This is the only
    /// place user conversion logic runs.
    pub fn to_text(&self) -> Result<String> {
        match self {
            Value::Object(object) => object.render().map_err(LazyError::from_boxed),

            Value::List(items) => {
                let mut out = String::from("[");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&item.to_repr()?);
                }
                out.push(']');
                Ok(out)
            }

            other => Ok(other.to_string()),
        }
    }

    /// Like [`Value::to_text`] but strings are quoted, as inside lists.
    pub fn to_repr(&self) -> Result<String> {
        match self {
            Value::Str(s) => Ok(format!("{:?}", &**s)),
            other => other.to_text(),
        }
    }
}

impl fmt::Display for Value {
    /// Plain-data formatting.  Objects print a placeholder here; their real
    /// text comes from [`Value::to_text`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    f.write_str(buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::Str(s) => f.write_str(s),

            Value::List(items) => write!(f, "<list of {}>", items.len()),

            Value::Object(object) => write!(f, "<{} object>", object.type_name()),

            Value::Native { name, .. } => write!(f, "<native fn {}>", name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::Str(s) => f.debug_tuple("Str").field(&&**s).finish(),
            Value::List(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(object) => f.debug_tuple("Object").field(object).finish(),
            Value::Native { name, arity, .. } => f
                .debug_struct("Native")
                .field("name", &&**name)
                .field("arity", arity)
                .finish(),
        }
    }
}

impl PartialEq for Value {
    /// Data compares by value; objects and natives by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::Native { func: a, .. }, Value::Native { func: b, .. }) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ─────────────────────────── conversions ───────────────────────────

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

number_from!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

impl<T: Object + 'static> From<Arc<T>> for Value {
    fn from(object: Arc<T>) -> Self {
        Value::Object(object)
    }
}

/// A JSON object captured as a value: attributes are its keys, its text is
/// the compact JSON encoding.
#[derive(Debug)]
pub struct JsonRecord(serde_json::Map<String, serde_json::Value>);

impl Object for JsonRecord {
    fn render(&self) -> std::result::Result<String, BoxError> {
        Ok(serde_json::to_string(&self.0)?)
    }

    fn get(&self, name: &str) -> Option<Value> {
        self.0.get(name).map(Value::from)
    }

    fn type_name(&self) -> &str {
        "record"
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::object(JsonRecord(map.clone())),
        }
    }
}
