//! The capability interface evaluators use to inspect and build values.
//!
//! [`ValueFactory`] holds the construction half and is implemented by every
//! runtime, including the abstract [`TypeRuntime`](crate::abstract_evaluator::TypeRuntime),
//! so code that builds values (literals, multi-selects, function results) is
//! written once. [`Runtime`] adds concrete inspection: kinds, scalars,
//! iteration, equality and ordering.
//!
//! [`ValueRuntime`] runs expressions over this crate's own [`Value`] tree.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use bitflags::bitflags;

use crate::number::Number;
use crate::value::Value;

/// The JMESPath kinds a value can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuntimeType {
    Null,
    Boolean,
    String,
    Number,
    Array,
    Object,
    /// A deferred expression (`&expr`); only seen by functions.
    Expression,
}

impl RuntimeType {
    pub const ALL: [RuntimeType; 7] = [
        RuntimeType::Null,
        RuntimeType::Boolean,
        RuntimeType::String,
        RuntimeType::Number,
        RuntimeType::Array,
        RuntimeType::Object,
        RuntimeType::Expression,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuntimeType::Null => "null",
            RuntimeType::Boolean => "boolean",
            RuntimeType::String => "string",
            RuntimeType::Number => "number",
            RuntimeType::Array => "array",
            RuntimeType::Object => "object",
            RuntimeType::Expression => "expression",
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// A set of [`RuntimeType`]s.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RuntimeTypes: u8 {
        const NULL       = 0b0000_0001;
        const BOOLEAN    = 0b0000_0010;
        const STRING     = 0b0000_0100;
        const NUMBER     = 0b0000_1000;
        const ARRAY      = 0b0001_0000;
        const OBJECT     = 0b0010_0000;
        const EXPRESSION = 0b0100_0000;
        const VALUES     = Self::NULL.bits()
            | Self::BOOLEAN.bits()
            | Self::STRING.bits()
            | Self::NUMBER.bits()
            | Self::ARRAY.bits()
            | Self::OBJECT.bits();
    }
}

impl RuntimeTypes {
    pub fn kinds(self) -> impl Iterator<Item = RuntimeType> {
        RuntimeType::ALL
            .into_iter()
            .filter(move |ty| self.contains(RuntimeTypes::from(*ty)))
    }
}

impl From<RuntimeType> for RuntimeTypes {
    fn from(ty: RuntimeType) -> Self {
        match ty {
            RuntimeType::Null => RuntimeTypes::NULL,
            RuntimeType::Boolean => RuntimeTypes::BOOLEAN,
            RuntimeType::String => RuntimeTypes::STRING,
            RuntimeType::Number => RuntimeTypes::NUMBER,
            RuntimeType::Array => RuntimeTypes::ARRAY,
            RuntimeType::Object => RuntimeTypes::OBJECT,
            RuntimeType::Expression => RuntimeTypes::EXPRESSION,
        }
    }
}

impl fmt::Display for RuntimeTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.kinds().map(RuntimeType::name).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Accumulates array elements.
pub trait ArrayBuilder<V> {
    fn add(&mut self, value: V);
    /// Appends every element of `array`.
    fn add_all(&mut self, array: V);
    fn build(self) -> V;
}

/// Accumulates object members.
pub trait ObjectBuilder<V> {
    fn put(&mut self, key: String, value: V);
    /// Copies every member of `object`.
    fn put_all(&mut self, object: V);
    fn build(self) -> V;
}

/// Value construction shared by concrete and abstract runtimes.
pub trait ValueFactory {
    type Value: Clone + fmt::Debug;
    type Array: ArrayBuilder<Self::Value>;
    type Object: ObjectBuilder<Self::Value>;

    fn create_null(&self) -> Self::Value;
    fn create_boolean(&self, value: bool) -> Self::Value;
    fn create_string(&self, value: &str) -> Self::Value;
    fn create_number(&self, value: Number) -> Self::Value;
    fn array_builder(&self) -> Self::Array;
    fn object_builder(&self) -> Self::Object;

    /// Builds this runtime's representation of an expression literal.
    fn create_literal(&self, literal: &Value) -> Self::Value {
        match literal {
            Value::Null => self.create_null(),
            Value::Boolean(b) => self.create_boolean(*b),
            Value::Number(n) => self.create_number(*n),
            Value::String(s) => self.create_string(s),
            Value::Array(items) => {
                let mut builder = self.array_builder();
                for item in items {
                    builder.add(self.create_literal(item));
                }
                builder.build()
            }
            Value::Object(members) => {
                let mut builder = self.object_builder();
                for (key, item) in members {
                    builder.put(key.clone(), self.create_literal(item));
                }
                builder.build()
            }
        }
    }
}

/// Concrete value inspection.
///
/// Accessors that do not apply to a value's kind return `None`, `null` or an
/// empty iterator rather than failing, matching JMESPath's navigation rules.
///
/// Implementations must iterate object members in ascending key order. Exact
/// object types list their properties in that order, so a runtime that keeps
/// insertion order would produce values out of line with predicted tuples.
pub trait Runtime: ValueFactory + Sync + 'static {
    fn type_of(&self, value: &Self::Value) -> RuntimeType;

    fn is(&self, value: &Self::Value, ty: RuntimeType) -> bool {
        self.type_of(value) == ty
    }

    fn as_boolean(&self, value: &Self::Value) -> Option<bool>;
    fn as_str<'v>(&self, value: &'v Self::Value) -> Option<&'v str>;
    fn as_number(&self, value: &Self::Value) -> Option<Number>;

    /// Elements of an array; empty for anything else.
    fn iter_array<'v>(&self, value: &'v Self::Value) -> Box<dyn Iterator<Item = &'v Self::Value> + 'v>;

    /// Members of an object in ascending key order; empty for anything else.
    fn iter_object<'v>(
        &self,
        value: &'v Self::Value,
    ) -> Box<dyn Iterator<Item = (&'v str, &'v Self::Value)> + 'v>;

    /// Characters of a string, elements of an array or members of an object.
    fn length(&self, value: &Self::Value) -> usize {
        match self.type_of(value) {
            RuntimeType::String => self.as_str(value).map_or(0, |s| s.chars().count()),
            RuntimeType::Array => self.iter_array(value).count(),
            RuntimeType::Object => self.iter_object(value).count(),
            _ => 0,
        }
    }

    fn element(&self, array: &Self::Value, index: usize) -> Self::Value {
        self.iter_array(array)
            .nth(index)
            .cloned()
            .unwrap_or_else(|| self.create_null())
    }

    /// Member `key` of an object, `null` when missing or not an object.
    fn value(&self, object: &Self::Value, key: &str) -> Self::Value {
        self.iter_object(object)
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.create_null())
    }

    fn is_truthy(&self, value: &Self::Value) -> bool {
        match self.type_of(value) {
            RuntimeType::Null => false,
            RuntimeType::Boolean => self.as_boolean(value).unwrap_or(false),
            RuntimeType::Number | RuntimeType::Expression => true,
            RuntimeType::String | RuntimeType::Array | RuntimeType::Object => self.length(value) > 0,
        }
    }

    /// Deep structural equality; numbers compare numerically.
    fn equal(&self, a: &Self::Value, b: &Self::Value) -> bool {
        let ty = self.type_of(a);
        if ty != self.type_of(b) {
            return false;
        }
        match ty {
            RuntimeType::Null => true,
            RuntimeType::Boolean => self.as_boolean(a) == self.as_boolean(b),
            RuntimeType::String => self.as_str(a) == self.as_str(b),
            RuntimeType::Number => self.as_number(a) == self.as_number(b),
            RuntimeType::Array => {
                self.length(a) == self.length(b)
                    && self
                        .iter_array(a)
                        .zip(self.iter_array(b))
                        .all(|(x, y)| self.equal(x, y))
            }
            RuntimeType::Object => {
                self.length(a) == self.length(b)
                    && self.iter_object(a).all(|(key, x)| {
                        self.iter_object(b)
                            .find(|(k, _)| *k == key)
                            .is_some_and(|(_, y)| self.equal(x, y))
                    })
            }
            RuntimeType::Expression => false,
        }
    }

    /// Orders two numbers or two strings; `None` for anything else.
    fn compare(&self, a: &Self::Value, b: &Self::Value) -> Option<Ordering> {
        match (self.type_of(a), self.type_of(b)) {
            (RuntimeType::Number, RuntimeType::Number) => {
                self.as_number(a)?.partial_cmp(&self.as_number(b)?)
            }
            (RuntimeType::String, RuntimeType::String) => Some(self.as_str(a)?.cmp(self.as_str(b)?)),
            _ => None,
        }
    }

    /// Elements of `array` selected by a slice; `step` must not be zero.
    fn slice(&self, array: &Self::Value, start: Option<i64>, stop: Option<i64>, step: i64) -> Self::Value {
        let items: Vec<&Self::Value> = self.iter_array(array).collect();
        let mut builder = self.array_builder();
        for index in slice_indices(items.len(), start, stop, step) {
            builder.add(items[index].clone());
        }
        builder.build()
    }

    /// Compact JSON text of a value.
    fn to_json(&self, value: &Self::Value) -> String {
        crate::output::to_json(&self.to_value(value))
    }

    /// Copies a runtime value into this crate's [`Value`] tree.
    fn to_value(&self, value: &Self::Value) -> Value {
        match self.type_of(value) {
            RuntimeType::Boolean => Value::Boolean(self.as_boolean(value).unwrap_or(false)),
            RuntimeType::String => Value::String(self.as_str(value).unwrap_or_default().to_string()),
            RuntimeType::Number => self.as_number(value).map_or(Value::Null, Value::Number),
            RuntimeType::Array => Value::Array(self.iter_array(value).map(|v| self.to_value(v)).collect()),
            RuntimeType::Object => Value::Object(
                self.iter_object(value)
                    .map(|(k, v)| (k.to_string(), self.to_value(v)))
                    .collect(),
            ),
            RuntimeType::Null | RuntimeType::Expression => Value::Null,
        }
    }
}

/// Indices selected by `[start:stop:step]` on an array of `len` elements.
///
/// Negative bounds count from the end, out-of-range bounds are clamped, and
/// omitted bounds default according to the direction of `step`. A zero step
/// selects nothing.
pub fn slice_indices(len: usize, start: Option<i64>, stop: Option<i64>, step: i64) -> Vec<usize> {
    if step == 0 {
        return Vec::new();
    }
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    let backwards = step < 0;
    let clamp = |bound: i64| -> i64 {
        if bound < 0 {
            let wrapped = bound + len;
            if wrapped >= 0 {
                wrapped
            } else if backwards {
                -1
            } else {
                0
            }
        } else if bound >= len {
            if backwards { len - 1 } else { len }
        } else {
            bound
        }
    };
    let start = start.map_or(if backwards { len - 1 } else { 0 }, clamp);
    let stop = stop.map_or(if backwards { -1 } else { len }, clamp);

    let mut indices = Vec::new();
    let mut index = start;
    while (!backwards && index < stop) || (backwards && index > stop) {
        if let Ok(i) = usize::try_from(index) {
            indices.push(i);
        }
        match index.checked_add(step) {
            Some(next) => index = next,
            None => break,
        }
    }
    indices
}

/// Runtime over this crate's own [`Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueRuntime;

#[derive(Debug, Default)]
pub struct ValueArrayBuilder(Vec<Value>);

impl ArrayBuilder<Value> for ValueArrayBuilder {
    fn add(&mut self, value: Value) {
        self.0.push(value);
    }

    fn add_all(&mut self, array: Value) {
        if let Value::Array(items) = array {
            self.0.extend(items);
        }
    }

    fn build(self) -> Value {
        Value::Array(self.0)
    }
}

#[derive(Debug, Default)]
pub struct ValueObjectBuilder(BTreeMap<String, Value>);

impl ObjectBuilder<Value> for ValueObjectBuilder {
    fn put(&mut self, key: String, value: Value) {
        self.0.insert(key, value);
    }

    fn put_all(&mut self, object: Value) {
        if let Value::Object(members) = object {
            self.0.extend(members);
        }
    }

    fn build(self) -> Value {
        Value::Object(self.0)
    }
}

impl ValueFactory for ValueRuntime {
    type Value = Value;
    type Array = ValueArrayBuilder;
    type Object = ValueObjectBuilder;

    fn create_null(&self) -> Value {
        Value::Null
    }

    fn create_boolean(&self, value: bool) -> Value {
        Value::Boolean(value)
    }

    fn create_string(&self, value: &str) -> Value {
        Value::String(value.to_string())
    }

    fn create_number(&self, value: Number) -> Value {
        Value::Number(value)
    }

    fn array_builder(&self) -> ValueArrayBuilder {
        ValueArrayBuilder::default()
    }

    fn object_builder(&self) -> ValueObjectBuilder {
        ValueObjectBuilder::default()
    }

    fn create_literal(&self, literal: &Value) -> Value {
        literal.clone()
    }
}

impl Runtime for ValueRuntime {
    fn type_of(&self, value: &Value) -> RuntimeType {
        value.runtime_type()
    }

    fn as_boolean(&self, value: &Value) -> Option<bool> {
        match value {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn as_str<'v>(&self, value: &'v Value) -> Option<&'v str> {
        value.as_str()
    }

    fn as_number(&self, value: &Value) -> Option<Number> {
        value.as_number()
    }

    fn iter_array<'v>(&self, value: &'v Value) -> Box<dyn Iterator<Item = &'v Value> + 'v> {
        match value {
            Value::Array(items) => Box::new(items.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn iter_object<'v>(&self, value: &'v Value) -> Box<dyn Iterator<Item = (&'v str, &'v Value)> + 'v> {
        match value {
            Value::Object(members) => Box::new(members.iter().map(|(k, v)| (k.as_str(), v))),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn length(&self, value: &Value) -> usize {
        match value {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Object(members) => members.len(),
            _ => 0,
        }
    }

    fn element(&self, array: &Value, index: usize) -> Value {
        match array {
            Value::Array(items) => items.get(index).cloned().unwrap_or_default(),
            _ => Value::Null,
        }
    }

    fn value(&self, object: &Value, key: &str) -> Value {
        match object {
            Value::Object(members) => members.get(key).cloned().unwrap_or_default(),
            _ => Value::Null,
        }
    }

    fn is_truthy(&self, value: &Value) -> bool {
        value.is_truthy()
    }

    fn equal(&self, a: &Value, b: &Value) -> bool {
        a == b
    }

    fn to_value(&self, value: &Value) -> Value {
        value.clone()
    }
}
