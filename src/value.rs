use std::collections::BTreeMap;

use crate::number::Number;
use crate::runtime::RuntimeType;

/// A JSON value owned by this crate.
///
/// This is the value type of literals inside expressions and of the built-in
/// [`ValueRuntime`](crate::runtime::ValueRuntime). Object keys are kept sorted,
/// so `keys`, `values` and rendered output are deterministic.
///
/// # Examples
///
/// ```
/// use jmespath_lattice::Value;
///
/// let array = Value::from(vec![Value::from(1), Value::from("two")]);
/// assert!(array.is_truthy());
/// assert!(!Value::from("").is_truthy());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    pub fn runtime_type(&self) -> RuntimeType {
        match self {
            Value::Null => RuntimeType::Null,
            Value::Boolean(_) => RuntimeType::Boolean,
            Value::Number(_) => RuntimeType::Number,
            Value::String(_) => RuntimeType::String,
            Value::Array(_) => RuntimeType::Array,
            Value::Object(_) => RuntimeType::Object,
        }
    }

    /// JMESPath truthiness: `null`, `false`, and empty strings, arrays and
    /// objects are false. Every number is true, including zero.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(_) => true,
            Value::String(s) => !s.is_empty(),
            Value::Array(arr) => !arr.is_empty(),
            Value::Object(obj) => !obj.is_empty(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(Number::Long(i64::from(n)))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(Number::Long(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::Double(n))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Array(values)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Object(iter.into_iter().collect())
    }
}
