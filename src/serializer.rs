//! Renders an [`Expression`] back to JMESPath text.
//!
//! The output re-parses to an equivalent tree. Parentheses are only added
//! where plain concatenation would bind differently.

use std::fmt;

use crate::ast::{Expression, Node};
use crate::output::{to_json, write_string};
use crate::value::Value;

/// Where a sub-expression is written, from the loosest to the tightest context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    /// Anywhere a full expression is allowed: top level, arguments, brackets.
    Top,
    /// Operand of a binary operator: a bare pipe would capture the operator.
    Operand,
    /// Right of a comparator or a projection: comparators must be wrapped too.
    Comparand,
    /// Left of `.`, `[..]`, `[*]`, `[?..]` or `.*`: projections must be wrapped too.
    Postfix,
}

pub struct ExpressionSerializer;

impl ExpressionSerializer {
    pub fn serialize(expr: &Expression) -> String {
        let mut out = String::new();
        write(&mut out, expr, Slot::Top);
        out
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ExpressionSerializer::serialize(self))
    }
}

/// How the right side of `left.right` is attached to its left side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attach {
    /// `left.right`
    Dot,
    /// `left[...]`
    Direct,
    /// No path syntax exists; written as `left | right`, which evaluates the same.
    Pipe,
}

fn needs_parens(node: &Node, slot: Slot) -> bool {
    match node {
        Node::Subexpression { pipe, right, .. } if *pipe || attachment(right) == Attach::Pipe => slot > Slot::Top,
        Node::ExpressionRef(_) => slot > Slot::Top,
        Node::Comparator { .. } => slot >= Slot::Comparand,
        _ => slot == Slot::Postfix && ends_in_projection(node),
    }
}

/// Whether text appended after `node` would be captured by a projection.
fn ends_in_projection(node: &Node) -> bool {
    match node {
        Node::Projection { .. }
        | Node::FilterProjection { .. }
        | Node::ObjectProjection { .. }
        | Node::Flatten(_) => true,
        Node::Subexpression {
            right, pipe: false, ..
        } => ends_in_projection(&right.node),
        _ => false,
    }
}

fn write(out: &mut String, expr: &Expression, slot: Slot) {
    let parens = needs_parens(&expr.node, slot);
    if parens {
        out.push('(');
    }
    write_node(out, expr);
    if parens {
        out.push(')');
    }
}

fn write_node(out: &mut String, expr: &Expression) {
    match &expr.node {
        Node::Current => out.push('@'),
        Node::Field(name) => write_identifier(out, name),
        Node::Index(index) => out.push_str(&format!("[{}]", index)),
        Node::Slice { start, stop, step } => {
            out.push('[');
            if let Some(start) = start {
                out.push_str(&start.to_string());
            }
            out.push(':');
            if let Some(stop) = stop {
                out.push_str(&stop.to_string());
            }
            if *step != 1 {
                out.push(':');
                out.push_str(&step.to_string());
            }
            out.push(']');
        }
        Node::Literal(value) => write_literal(out, value),
        Node::Subexpression {
            left,
            right,
            pipe: true,
        } => {
            write(out, left, Slot::Top);
            out.push_str(" | ");
            write(out, right, Slot::Operand);
        }
        Node::Subexpression {
            left,
            right,
            pipe: false,
        } => match attachment(right) {
            Attach::Pipe => {
                write(out, left, Slot::Top);
                out.push_str(" | ");
                write(out, right, Slot::Operand);
            }
            attach => {
                write(out, left, Slot::Postfix);
                if attach == Attach::Dot {
                    out.push('.');
                }
                write(out, right, Slot::Comparand);
            }
        },
        Node::Projection { left, right } => {
            match &left.node {
                Node::Current => out.push_str("[*]"),
                Node::Slice { .. } => write_node(out, left),
                Node::Flatten(inner) => write_flatten(out, inner),
                _ => {
                    write(out, left, Slot::Postfix);
                    out.push_str("[*]");
                }
            }
            write_projection_rhs(out, right);
        }
        Node::FilterProjection {
            left,
            condition,
            right,
        } => {
            if !is_current(left) {
                write(out, left, Slot::Postfix);
            }
            out.push_str("[?");
            write(out, condition, Slot::Top);
            out.push(']');
            write_projection_rhs(out, right);
        }
        Node::ObjectProjection { left, right } => {
            if is_current(left) {
                out.push('*');
            } else {
                write(out, left, Slot::Postfix);
                out.push_str(".*");
            }
            write_projection_rhs(out, right);
        }
        Node::Flatten(inner) => write_flatten(out, inner),
        Node::MultiSelectList(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write(out, item, Slot::Top);
            }
            out.push(']');
        }
        Node::MultiSelectHash(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_identifier(out, key);
                out.push_str(": ");
                write(out, value, Slot::Top);
            }
            out.push('}');
        }
        Node::Comparator { op, left, right } => {
            write(out, left, Slot::Operand);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            write(out, right, Slot::Comparand);
        }
        Node::And { left, right } => write_logical(out, left, "&&", right),
        Node::Or { left, right } => write_logical(out, left, "||", right),
        Node::Not(inner) => {
            out.push_str("!(");
            write(out, inner, Slot::Top);
            out.push(')');
        }
        Node::Function { name, args } => {
            out.push_str(name);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write(out, arg, Slot::Top);
            }
            out.push(')');
        }
        Node::ExpressionRef(inner) => {
            out.push('&');
            write(out, inner, Slot::Top);
        }
    }
}

fn write_flatten(out: &mut String, inner: &Expression) {
    if !is_current(inner) {
        write(out, inner, Slot::Comparand);
    }
    out.push_str("[]");
}

fn write_projection_rhs(out: &mut String, right: &Expression) {
    if is_current(right) {
        return;
    }
    if attachment(right) == Attach::Dot {
        out.push('.');
    }
    write(out, right, Slot::Comparand);
}

fn write_logical(out: &mut String, left: &Expression, op: &str, right: &Expression) {
    out.push('(');
    write(out, left, Slot::Operand);
    out.push(' ');
    out.push_str(op);
    out.push(' ');
    write(out, right, Slot::Operand);
    out.push(')');
}

fn write_identifier(out: &mut String, name: &str) {
    if is_bare_identifier(name) {
        out.push_str(name);
    } else {
        write_string(out, name);
    }
}

fn write_literal(out: &mut String, value: &Value) {
    out.push('`');
    out.push_str(&to_json(value).replace('`', "\\`"));
    out.push('`');
}

fn is_current(expr: &Expression) -> bool {
    matches!(expr.node, Node::Current)
}

fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn attachment(right: &Expression) -> Attach {
    match &right.node {
        Node::Field(_) | Node::MultiSelectHash(_) | Node::MultiSelectList(_) | Node::Function { .. } => Attach::Dot,
        Node::Index(_) | Node::Slice { .. } => Attach::Direct,
        Node::ObjectProjection { left, .. } if is_current(left) => Attach::Dot,
        Node::Projection { left, .. } | Node::FilterProjection { left, .. } if is_current(left) => Attach::Direct,
        Node::Flatten(inner) if is_current(inner) => Attach::Direct,
        Node::Projection { left, .. }
        | Node::FilterProjection { left, .. }
        | Node::ObjectProjection { left, .. } => attachment(left),
        Node::Subexpression {
            left, right, pipe: false,
        } => match attachment(right) {
            Attach::Pipe => Attach::Pipe,
            _ => attachment(left),
        },
        Node::Flatten(inner) => attachment(inner),
        _ => Attach::Pipe,
    }
}
