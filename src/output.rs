//! JSON rendering of [`Value`]s.
//!
//! Used for expression literals, the `to_string` built-in and command-line
//! output. Output is deterministic (object keys are sorted by the map) and
//! numbers keep their representation (`1.0` stays `1.0`).
//!
//! # Examples
//!
//! ```
//! use jmespath_lattice::Value;
//! use jmespath_lattice::output::{to_json, to_json_pretty};
//!
//! let value = Value::from(vec![Value::from(1), Value::from(2.5)]);
//! assert_eq!(to_json(&value), "[1,2.5]");
//! assert_eq!(to_json_pretty(&value), "[\n  1,\n  2.5\n]");
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::value::Value;

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, value: &Value) -> String {
        let mut out = String::new();
        self.print_value(&mut out, value, 0);
        out
    }

    fn print_value(&self, out: &mut String, value: &Value, indent: usize) {
        match value {
            Value::Null => out.push_str("null"),
            Value::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) if !n.is_finite() => out.push_str("null"),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::String(s) => write_string(out, s),
            Value::Array(arr) => self.print_array(out, arr, indent),
            Value::Object(obj) => self.print_object(out, obj, indent),
        }
    }

    fn print_array(&self, out: &mut String, arr: &[Value], indent: usize) {
        if arr.is_empty() {
            out.push_str("[]");
            return;
        }

        out.push('[');
        for (i, item) in arr.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.newline(out, indent + 1);
            self.print_value(out, item, indent + 1);
        }
        self.newline(out, indent);
        out.push(']');
    }

    fn print_object(&self, out: &mut String, obj: &BTreeMap<String, Value>, indent: usize) {
        if obj.is_empty() {
            out.push_str("{}");
            return;
        }

        out.push('{');
        for (i, (key, item)) in obj.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.newline(out, indent + 1);
            write_string(out, key);
            out.push_str(if self.pretty { ": " } else { ":" });
            self.print_value(out, item, indent + 1);
        }
        self.newline(out, indent);
        out.push('}');
    }

    fn newline(&self, out: &mut String, level: usize) {
        if self.pretty {
            out.push('\n');
            out.push_str(&"  ".repeat(level));
        }
    }
}

/// Writes `s` as a quoted JSON string.
pub(crate) fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Compact JSON.
pub fn to_json(value: &Value) -> String {
    JsonPrinter::new(false).print(value)
}

/// JSON with two-space indentation.
pub fn to_json_pretty(value: &Value) -> String {
    JsonPrinter::new(true).print(value)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_json(self))
    }
}
