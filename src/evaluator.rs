use std::cmp::Ordering;

use thiserror::Error;

use crate::ast::{Comparator, Expression, Node};
use crate::functions::{FunctionArgument, FunctionError, FunctionRegistry};
use crate::lexer::Position;
use crate::runtime::{ArrayBuilder, ObjectBuilder, Runtime, RuntimeType};

/// Errors that abort concrete evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Call to a function that is not in the registry
    #[error("Unknown function: {name} ({position})")]
    UnknownFunction { name: String, position: Position },

    /// A function rejected its arguments
    #[error("{name} function {source} ({position})")]
    Function {
        name: String,
        position: Position,
        source: FunctionError,
    },

    /// Slice with a step of zero
    #[error("Invalid slice: step cannot be 0 ({position})")]
    InvalidSlice { position: Position },
}

impl EvalError {
    pub fn position(&self) -> Position {
        match self {
            EvalError::UnknownFunction { position, .. }
            | EvalError::Function { position, .. }
            | EvalError::InvalidSlice { position } => *position,
        }
    }
}

/// Evaluates expressions against concrete values of a runtime.
///
/// The evaluator only borrows the runtime and the function table, so creating
/// one per call is cheap.
pub struct Evaluator<'a, R: Runtime> {
    runtime: &'a R,
    functions: &'a FunctionRegistry<R>,
}

impl<'a, R: Runtime> Evaluator<'a, R> {
    pub fn new(runtime: &'a R, functions: &'a FunctionRegistry<R>) -> Self {
        Evaluator { runtime, functions }
    }

    pub fn runtime(&self) -> &'a R {
        self.runtime
    }

    pub fn functions(&self) -> &'a FunctionRegistry<R> {
        self.functions
    }

    pub fn evaluate(&self, expr: &Expression, current: &R::Value) -> Result<R::Value, EvalError> {
        let rt = self.runtime;
        match &expr.node {
            Node::Current => Ok(current.clone()),
            Node::Field(name) => Ok(rt.value(current, name)),
            Node::Index(index) => Ok(self.index(current, *index)),
            Node::Slice { start, stop, step } => {
                if !rt.is(current, RuntimeType::Array) {
                    return Ok(rt.create_null());
                }
                if *step == 0 {
                    return Err(EvalError::InvalidSlice {
                        position: expr.position,
                    });
                }
                Ok(rt.slice(current, *start, *stop, *step))
            }
            Node::Literal(value) => Ok(rt.create_literal(value)),
            Node::Subexpression { left, right, .. } => {
                let left = self.evaluate(left, current)?;
                self.evaluate(right, &left)
            }
            Node::Projection { left, right } => {
                let left = self.evaluate(left, current)?;
                if !rt.is(&left, RuntimeType::Array) {
                    return Ok(rt.create_null());
                }
                self.project(rt.iter_array(&left), right)
            }
            Node::FilterProjection {
                left,
                condition,
                right,
            } => {
                let left = self.evaluate(left, current)?;
                if !rt.is(&left, RuntimeType::Array) {
                    return Ok(rt.create_null());
                }
                let mut kept = Vec::new();
                for element in rt.iter_array(&left) {
                    let test = self.evaluate(condition, element)?;
                    if rt.is_truthy(&test) {
                        kept.push(element);
                    }
                }
                self.project(kept.into_iter(), right)
            }
            Node::ObjectProjection { left, right } => {
                let left = self.evaluate(left, current)?;
                if !rt.is(&left, RuntimeType::Object) {
                    return Ok(rt.create_null());
                }
                self.project(rt.iter_object(&left).map(|(_, v)| v), right)
            }
            Node::Flatten(inner) => {
                let inner = self.evaluate(inner, current)?;
                if !rt.is(&inner, RuntimeType::Array) {
                    return Ok(rt.create_null());
                }
                let mut builder = rt.array_builder();
                for element in rt.iter_array(&inner) {
                    if rt.is(element, RuntimeType::Array) {
                        builder.add_all(element.clone());
                    } else {
                        builder.add(element.clone());
                    }
                }
                Ok(builder.build())
            }
            Node::MultiSelectList(items) => {
                if rt.is(current, RuntimeType::Null) {
                    return Ok(rt.create_null());
                }
                let mut builder = rt.array_builder();
                for item in items {
                    builder.add(self.evaluate(item, current)?);
                }
                Ok(builder.build())
            }
            Node::MultiSelectHash(entries) => {
                if rt.is(current, RuntimeType::Null) {
                    return Ok(rt.create_null());
                }
                let mut builder = rt.object_builder();
                for (key, value) in entries {
                    builder.put(key.clone(), self.evaluate(value, current)?);
                }
                Ok(builder.build())
            }
            Node::Comparator { op, left, right } => {
                let left = self.evaluate(left, current)?;
                let right = self.evaluate(right, current)?;
                Ok(self.compare(*op, &left, &right))
            }
            Node::And { left, right } => {
                let left = self.evaluate(left, current)?;
                if rt.is_truthy(&left) {
                    self.evaluate(right, current)
                } else {
                    Ok(left)
                }
            }
            Node::Or { left, right } => {
                let left = self.evaluate(left, current)?;
                if rt.is_truthy(&left) {
                    Ok(left)
                } else {
                    self.evaluate(right, current)
                }
            }
            Node::Not(inner) => {
                let inner = self.evaluate(inner, current)?;
                Ok(rt.create_boolean(!rt.is_truthy(&inner)))
            }
            Node::Function { name, args } => self.call(name, args, current, expr.position),
            Node::ExpressionRef(inner) => self.evaluate(inner, current),
        }
    }

    fn index(&self, current: &R::Value, index: i64) -> R::Value {
        let rt = self.runtime;
        if !rt.is(current, RuntimeType::Array) {
            return rt.create_null();
        }
        match crate::types::normalize_index(index, rt.length(current)) {
            Some(i) => rt.element(current, i),
            None => rt.create_null(),
        }
    }

    /// Applies `right` to each element, dropping `null` results.
    fn project<'v, I>(&self, elements: I, right: &Expression) -> Result<R::Value, EvalError>
    where
        I: Iterator<Item = &'v R::Value>,
        R::Value: 'v,
    {
        let rt = self.runtime;
        let mut builder = rt.array_builder();
        for element in elements {
            let value = self.evaluate(right, element)?;
            if !rt.is(&value, RuntimeType::Null) {
                builder.add(value);
            }
        }
        Ok(builder.build())
    }

    fn compare(&self, op: Comparator, left: &R::Value, right: &R::Value) -> R::Value {
        let rt = self.runtime;
        match op {
            Comparator::Equal => rt.create_boolean(rt.equal(left, right)),
            Comparator::NotEqual => rt.create_boolean(!rt.equal(left, right)),
            _ => {
                if !rt.is(left, RuntimeType::Number) || !rt.is(right, RuntimeType::Number) {
                    return rt.create_null();
                }
                match rt.compare(left, right) {
                    Some(ordering) => rt.create_boolean(match op {
                        Comparator::LessThan => ordering == Ordering::Less,
                        Comparator::LessEqual => ordering != Ordering::Greater,
                        Comparator::GreaterThan => ordering == Ordering::Greater,
                        _ => ordering != Ordering::Less,
                    }),
                    None => rt.create_null(),
                }
            }
        }
    }

    fn call(
        &self,
        name: &str,
        args: &[Expression],
        current: &R::Value,
        position: Position,
    ) -> Result<R::Value, EvalError> {
        let function = self
            .functions
            .lookup(name)
            .ok_or_else(|| EvalError::UnknownFunction {
                name: name.to_string(),
                position,
            })?;

        let mut arguments = Vec::with_capacity(args.len());
        for arg in args {
            match &arg.node {
                Node::ExpressionRef(inner) => arguments.push(FunctionArgument::Expression(inner.as_ref())),
                _ => arguments.push(FunctionArgument::Value(self.evaluate(arg, current)?)),
            }
        }

        function
            .apply(self, &arguments)
            .map_err(|error| error.into_eval_error(name, position))
    }
}
