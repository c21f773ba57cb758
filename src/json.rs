//! Evaluation directly over `serde_json::Value` documents, and conversions
//! between `serde_json` and this crate's [`Value`].

use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value as Json};

use crate::number::Number;
use crate::runtime::{ArrayBuilder, ObjectBuilder, Runtime, RuntimeType, ValueFactory};
use crate::value::Value;

/// Runtime over `serde_json::Value`.
///
/// # Examples
///
/// ```
/// use jmespath_lattice::{parse, FunctionRegistry, JsonRuntime};
/// use serde_json::json;
///
/// let functions = FunctionRegistry::builtins();
/// let expr = parse("people[?age > `30`].name").unwrap();
/// let doc = json!({"people": [{"name": "a", "age": 31}, {"name": "b", "age": 20}]});
/// let result = expr.evaluate(&doc, &JsonRuntime, &functions).unwrap();
/// assert_eq!(result, json!(["a"]));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRuntime;

fn json_number(number: Number) -> Json {
    let integral = match number {
        Number::BigDecimal(d) if d.fract().is_zero() => d.to_i128(),
        other => other.as_i128(),
    };
    let converted = match integral.map(i64::try_from) {
        Some(Ok(v)) => Some(serde_json::Number::from(v)),
        // Wider integers and decimals keep their digits through `arbitrary_precision`.
        Some(Err(_)) | None if matches!(number, Number::BigInteger(_) | Number::BigDecimal(_)) => {
            serde_json::from_str::<serde_json::Number>(&number.to_string()).ok()
        }
        _ => serde_json::Number::from_f64(number.to_f64()),
    };
    converted.map_or(Json::Null, Json::Number)
}

/// Integers that fit become `Long`; anything else is read from the number's
/// text so wide integers and decimals keep their precision.
fn from_json_number(number: &serde_json::Number) -> Number {
    if let Some(v) = number.as_i64() {
        return Number::Long(v);
    }
    Number::parse(&number.to_string())
        .unwrap_or_else(|| Number::Double(number.as_f64().unwrap_or(f64::NAN)))
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Boolean(b),
            Json::Number(n) => Value::Number(from_json_number(&n)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(members) => {
                Value::Object(members.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&Value> for Json {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Json::Null,
            Value::Boolean(b) => Json::Bool(*b),
            Value::Number(n) => json_number(*n),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(items) => Json::Array(items.iter().map(Json::from).collect()),
            Value::Object(members) => Json::Object(
                members
                    .iter()
                    .map(|(k, v)| (k.clone(), Json::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Json {
    fn from(value: Value) -> Self {
        Json::from(&value)
    }
}

#[derive(Debug, Default)]
pub struct JsonArrayBuilder(Vec<Json>);

impl ArrayBuilder<Json> for JsonArrayBuilder {
    fn add(&mut self, value: Json) {
        self.0.push(value);
    }

    fn add_all(&mut self, array: Json) {
        if let Json::Array(items) = array {
            self.0.extend(items);
        }
    }

    fn build(self) -> Json {
        Json::Array(self.0)
    }
}

#[derive(Debug, Default)]
pub struct JsonObjectBuilder(Map<String, Json>);

impl ObjectBuilder<Json> for JsonObjectBuilder {
    fn put(&mut self, key: String, value: Json) {
        self.0.insert(key, value);
    }

    fn put_all(&mut self, object: Json) {
        if let Json::Object(members) = object {
            self.0.extend(members);
        }
    }

    fn build(self) -> Json {
        Json::Object(self.0)
    }
}

impl ValueFactory for JsonRuntime {
    type Value = Json;
    type Array = JsonArrayBuilder;
    type Object = JsonObjectBuilder;

    fn create_null(&self) -> Json {
        Json::Null
    }

    fn create_boolean(&self, value: bool) -> Json {
        Json::Bool(value)
    }

    fn create_string(&self, value: &str) -> Json {
        Json::String(value.to_string())
    }

    fn create_number(&self, value: Number) -> Json {
        json_number(value)
    }

    fn array_builder(&self) -> JsonArrayBuilder {
        JsonArrayBuilder::default()
    }

    fn object_builder(&self) -> JsonObjectBuilder {
        JsonObjectBuilder::default()
    }

    fn create_literal(&self, literal: &Value) -> Json {
        Json::from(literal)
    }
}

impl Runtime for JsonRuntime {
    fn type_of(&self, value: &Json) -> RuntimeType {
        match value {
            Json::Null => RuntimeType::Null,
            Json::Bool(_) => RuntimeType::Boolean,
            Json::Number(_) => RuntimeType::Number,
            Json::String(_) => RuntimeType::String,
            Json::Array(_) => RuntimeType::Array,
            Json::Object(_) => RuntimeType::Object,
        }
    }

    fn as_boolean(&self, value: &Json) -> Option<bool> {
        value.as_bool()
    }

    fn as_str<'v>(&self, value: &'v Json) -> Option<&'v str> {
        value.as_str()
    }

    fn as_number(&self, value: &Json) -> Option<Number> {
        match value {
            Json::Number(n) => Some(from_json_number(n)),
            _ => None,
        }
    }

    fn iter_array<'v>(&self, value: &'v Json) -> Box<dyn Iterator<Item = &'v Json> + 'v> {
        match value {
            Json::Array(items) => Box::new(items.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn iter_object<'v>(&self, value: &'v Json) -> Box<dyn Iterator<Item = (&'v str, &'v Json)> + 'v> {
        match value {
            Json::Object(members) => {
                // serde_json keeps insertion order when another crate enables `preserve_order`.
                let mut sorted: Vec<(&str, &Json)> = members.iter().map(|(k, v)| (k.as_str(), v)).collect();
                sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));
                Box::new(sorted.into_iter())
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    fn element(&self, array: &Json, index: usize) -> Json {
        array.get(index).cloned().unwrap_or(Json::Null)
    }

    fn value(&self, object: &Json, key: &str) -> Json {
        match object {
            Json::Object(members) => members.get(key).cloned().unwrap_or(Json::Null),
            _ => Json::Null,
        }
    }
}
