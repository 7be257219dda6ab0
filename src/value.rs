//! JSON value tree.
//!
//! [`Value`] is a closed tagged union: every consumer matches exhaustively on
//! its six variants. A tree exclusively owns its children, so it is acyclic
//! and can be shared read-only across threads or mutated through `&mut`.
//!
//! Objects keep their members in insertion order for serialization, but two
//! objects compare equal whenever they hold the same key/value pairs in any
//! order.

use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{Error, JsonResult, ParseError};
use crate::number::Number;

/// Insertion-ordered JSON object.
pub type Map = IndexMap<String, Value>;

/// A JSON value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// JSON null literal
    #[default]
    Null,
    /// JSON boolean (true/false)
    Bool(bool),
    /// JSON number, see [`Number`] for precision rules
    Number(Number),
    /// JSON string
    String(String),
    /// JSON array of values
    Array(Vec<Value>),
    /// JSON object with members in insertion order
    Object(Map),
}

impl Value {
    /// A boolean value.
    pub fn bool(value: bool) -> Self {
        Value::Bool(value)
    }

    /// A number value. See [`Number`] for how it serializes.
    pub fn number(value: impl Into<Number>) -> Self {
        Value::Number(value.into())
    }

    /// A string value.
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    /// An array of `elements`, in order.
    pub fn array<I>(elements: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Value::Array(elements.into_iter().map(Into::into).collect())
    }

    /// An object of `members`.
    ///
    /// A repeated key keeps the position of its first occurrence and the
    /// value of its last, the same rule the parser applies.
    pub fn object<K, V, I>(members: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(
            members
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns true if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this is a boolean value.
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns true if this is a number value.
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    /// Returns true if this is a string value.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns true if this is an array value.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns true if this is an object value.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }

    /// The boolean, or a type mismatch.
    pub fn as_bool(&self) -> JsonResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.mismatch("boolean")),
        }
    }

    /// The number, or a type mismatch.
    pub fn as_number(&self) -> JsonResult<&Number> {
        match self {
            Value::Number(n) => Ok(n),
            _ => Err(self.mismatch("number")),
        }
    }

    /// Double-precision view of the number, or a type mismatch.
    pub fn as_f64(&self) -> JsonResult<f64> {
        self.as_number().map(Number::as_f64)
    }

    /// The string, or a type mismatch.
    pub fn as_str(&self) -> JsonResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch("string")),
        }
    }

    /// The array elements, or a type mismatch.
    pub fn as_array(&self) -> JsonResult<&Vec<Value>> {
        match self {
            Value::Array(a) => Ok(a),
            _ => Err(self.mismatch("array")),
        }
    }

    /// Mutable array elements, or a type mismatch.
    pub fn as_array_mut(&mut self) -> JsonResult<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Ok(a),
            _ => Err(self.mismatch("array")),
        }
    }

    /// The object members, or a type mismatch.
    pub fn as_object(&self) -> JsonResult<&Map> {
        match self {
            Value::Object(o) => Ok(o),
            _ => Err(self.mismatch("object")),
        }
    }

    /// Mutable object members, or a type mismatch.
    pub fn as_object_mut(&mut self) -> JsonResult<&mut Map> {
        match self {
            Value::Object(o) => Ok(o),
            _ => Err(self.mismatch("object")),
        }
    }

    /// Get a value from an object by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Get a mutable value from an object by key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Object(map) => map.get_mut(key),
            _ => None,
        }
    }

    /// Get a value from an array by index.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(arr) => arr.get(index),
            _ => None,
        }
    }

    /// Get a mutable value from an array by index.
    pub fn get_index_mut(&mut self, index: usize) -> Option<&mut Value> {
        match self {
            Value::Array(arr) => arr.get_mut(index),
            _ => None,
        }
    }

    /// Replace this value with `Null`, returning what was there.
    pub fn take(&mut self) -> Value {
        std::mem::take(self)
    }

    /// Returns the type name as a string for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl FromStr for Value {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parser::parse(s)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(value)
    }
}

/// `None` becomes `Null`.
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::object(iter)
    }
}
