//! Function registry and the built-in JMESPath functions.
//!
//! Every function implements [`Function`] with two entry points: `apply`
//! runs on concrete values through an [`Evaluator`], `apply_abstract`
//! predicts the result [`Type`] through an [`AbstractEvaluator`].
//!
//! Built-ins are grouped by concern:
//!
//! - [`numeric`]: `abs`, `avg`, `ceil`, `floor`, `sum`, `add`
//! - [`strings`]: `starts_with`, `ends_with`, `join`
//! - [`collections`]: `length`, `contains`, `reverse`, `sort`, `max`, `min`,
//!   `concat`, `append_if_not_null`
//! - [`objects`]: `keys`, `values`, `merge`
//! - [`conversions`]: `type`, `to_string`, `to_number`, `to_array`, `not_null`
//! - [`higher_order`]: `map`, `sort_by`, `max_by`, `min_by`, `fold_left`, `eval`
//! - [`control`]: `if`

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::abstract_evaluator::AbstractEvaluator;
use crate::ast::Expression;
use crate::evaluator::{EvalError, Evaluator};
use crate::lexer::Position;
use crate::number::Number;
use crate::runtime::{Runtime, RuntimeType, RuntimeTypes};
use crate::types::{ErrorKind, Type};

pub mod collections;
pub mod control;
pub mod conversions;
pub mod higher_order;
pub mod numeric;
pub mod objects;
pub mod strings;

/// Number of arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
        }
    }
}

/// A function rejected its arguments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FunctionError {
    #[error("expected {expected} arguments, but was given {actual}")]
    Arity { expected: Arity, actual: usize },

    #[error("argument {index} error: {}", describe_mismatch(*expected, actual))]
    InvalidType {
        index: usize,
        expected: RuntimeTypes,
        actual: String,
    },

    #[error("argument {index} error: {message}")]
    InvalidValue { index: usize, message: String },

    /// Evaluating a deferred expression argument failed.
    #[error(transparent)]
    Evaluation(Box<EvalError>),
}

fn describe_mismatch(expected: RuntimeTypes, actual: &str) -> String {
    let mut kinds = expected.kinds();
    match (kinds.next(), kinds.next()) {
        (Some(kind), None) => format!("Expected argument to be {}, but found {}", kind, actual),
        _ => format!("Expected one of {}, but found {}", expected, actual),
    }
}

impl From<EvalError> for FunctionError {
    fn from(error: EvalError) -> Self {
        FunctionError::Evaluation(Box::new(error))
    }
}

impl FunctionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FunctionError::Arity { .. } => ErrorKind::InvalidArity,
            FunctionError::InvalidType { .. } => ErrorKind::InvalidType,
            FunctionError::InvalidValue { .. } | FunctionError::Evaluation(_) => ErrorKind::InvalidValue,
        }
    }

    pub(crate) fn into_eval_error(self, name: &str, position: Position) -> EvalError {
        match self {
            FunctionError::Evaluation(inner) => *inner,
            source => EvalError::Function {
                name: name.to_string(),
                position,
                source,
            },
        }
    }

    pub(crate) fn invalid_value(index: usize, message: impl Into<String>) -> Self {
        FunctionError::InvalidValue {
            index,
            message: message.into(),
        }
    }
}

/// An argument as seen by a function: an evaluated value, or an `&expr`
/// reference left for the function to evaluate.
#[derive(Debug, Clone)]
pub enum FunctionArgument<'e, V> {
    Value(V),
    Expression(&'e Expression),
}

impl<'e, V> FunctionArgument<'e, V> {
    pub fn as_value(&self) -> Option<&V> {
        match self {
            FunctionArgument::Value(value) => Some(value),
            FunctionArgument::Expression(_) => None,
        }
    }

    pub fn as_expression(&self) -> Option<&'e Expression> {
        match self {
            FunctionArgument::Value(_) => None,
            FunctionArgument::Expression(expr) => Some(expr),
        }
    }

    /// The value, failing for an expression reference.
    pub fn expect_value(&self, index: usize) -> Result<&V, FunctionError> {
        self.as_value().ok_or_else(|| FunctionError::InvalidType {
            index,
            expected: RuntimeTypes::VALUES,
            actual: RuntimeType::Expression.to_string(),
        })
    }

    fn kind_name<R>(&self, runtime: &R) -> String
    where
        R: Runtime<Value = V>,
    {
        match self {
            FunctionArgument::Value(value) => runtime.type_of(value).to_string(),
            FunctionArgument::Expression(_) => RuntimeType::Expression.to_string(),
        }
    }

    /// The value if its kind is in `allowed`.
    pub fn expect_kind<R>(&self, runtime: &R, index: usize, allowed: RuntimeTypes) -> Result<&V, FunctionError>
    where
        R: Runtime<Value = V>,
    {
        match self {
            FunctionArgument::Value(value) if allowed.contains(runtime.type_of(value).into()) => Ok(value),
            _ => Err(FunctionError::InvalidType {
                index,
                expected: allowed,
                actual: self.kind_name(runtime),
            }),
        }
    }

    pub fn expect_array<R>(&self, runtime: &R, index: usize) -> Result<&V, FunctionError>
    where
        R: Runtime<Value = V>,
    {
        self.expect_kind(runtime, index, RuntimeTypes::ARRAY)
    }

    pub fn expect_object<R>(&self, runtime: &R, index: usize) -> Result<&V, FunctionError>
    where
        R: Runtime<Value = V>,
    {
        self.expect_kind(runtime, index, RuntimeTypes::OBJECT)
    }

    pub fn expect_string<'a, R>(&'a self, runtime: &R, index: usize) -> Result<&'a str, FunctionError>
    where
        R: Runtime<Value = V>,
    {
        let value = self.expect_kind(runtime, index, RuntimeTypes::STRING)?;
        Ok(runtime.as_str(value).unwrap_or_default())
    }

    pub fn expect_number<R>(&self, runtime: &R, index: usize) -> Result<Number, FunctionError>
    where
        R: Runtime<Value = V>,
    {
        let value = self.expect_kind(runtime, index, RuntimeTypes::NUMBER)?;
        runtime
            .as_number(value)
            .ok_or_else(|| FunctionError::invalid_value(index, "Expected a finite number"))
    }

    /// The referenced expression of an `&expr` argument.
    pub fn expect_expression_ref<R>(&self, runtime: &R, index: usize) -> Result<&'e Expression, FunctionError>
    where
        R: Runtime<Value = V>,
    {
        self.as_expression().ok_or_else(|| FunctionError::InvalidType {
            index,
            expected: RuntimeTypes::EXPRESSION,
            actual: self.kind_name(runtime),
        })
    }
}

impl<'e> FunctionArgument<'e, Type> {
    /// The argument's type, failing for an expression reference.
    pub fn expect_type(&self, index: usize) -> Result<&Type, FunctionError> {
        self.expect_value(index)
    }

    /// The argument's type narrowed to `allowed`; fails when no member fits.
    pub fn expect_any_of(&self, index: usize, allowed: RuntimeTypes) -> Result<Type, FunctionError> {
        let ty = self.expect_type(index)?;
        ty.narrow(allowed).ok_or_else(|| FunctionError::InvalidType {
            index,
            expected: allowed,
            actual: ty.kind_name(),
        })
    }

    pub fn expect_expression(&self, index: usize) -> Result<&'e Expression, FunctionError> {
        match self {
            FunctionArgument::Expression(expr) => Ok(expr),
            FunctionArgument::Value(ty) => Err(FunctionError::InvalidType {
                index,
                expected: RuntimeTypes::EXPRESSION,
                actual: ty.kind_name(),
            }),
        }
    }
}

pub fn check_argument_count<V>(args: &[FunctionArgument<'_, V>], arity: Arity) -> Result<(), FunctionError> {
    if arity.accepts(args.len()) {
        Ok(())
    } else {
        Err(FunctionError::Arity {
            expected: arity,
            actual: args.len(),
        })
    }
}

/// A named function with concrete and abstract semantics.
pub trait Function<R: Runtime>: Send + Sync {
    fn name(&self) -> &str;

    fn apply(
        &self,
        evaluator: &Evaluator<'_, R>,
        args: &[FunctionArgument<'_, R::Value>],
    ) -> Result<R::Value, FunctionError>;

    fn apply_abstract(
        &self,
        evaluator: &AbstractEvaluator<'_, R>,
        args: &[FunctionArgument<'_, Type>],
    ) -> Result<Type, FunctionError>;
}

/// Name-keyed function table.
///
/// Built with [`FunctionRegistry::builtins`] or [`FunctionRegistry::empty`]
/// and extended with [`FunctionRegistry::with_function`]; once shared with
/// evaluators it is read-only.
pub struct FunctionRegistry<R: Runtime> {
    functions: HashMap<String, Box<dyn Function<R>>>,
}

impl<R: Runtime> FunctionRegistry<R> {
    pub fn empty() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }

    pub fn builtins() -> Self {
        FunctionRegistry::empty()
            .with_function(numeric::Abs)
            .with_function(numeric::Avg)
            .with_function(numeric::Ceil)
            .with_function(numeric::Floor)
            .with_function(numeric::Sum)
            .with_function(numeric::Add)
            .with_function(strings::StartsWith)
            .with_function(strings::EndsWith)
            .with_function(strings::Join)
            .with_function(collections::Length)
            .with_function(collections::Contains)
            .with_function(collections::Reverse)
            .with_function(collections::Sort)
            .with_function(collections::Max)
            .with_function(collections::Min)
            .with_function(collections::Concat)
            .with_function(collections::AppendIfNotNull)
            .with_function(objects::Keys)
            .with_function(objects::Values)
            .with_function(objects::Merge)
            .with_function(conversions::TypeOf)
            .with_function(conversions::ToJsonString)
            .with_function(conversions::ToNumber)
            .with_function(conversions::ToArray)
            .with_function(conversions::NotNull)
            .with_function(higher_order::Map)
            .with_function(higher_order::SortBy)
            .with_function(higher_order::MaxBy)
            .with_function(higher_order::MinBy)
            .with_function(higher_order::FoldLeft)
            .with_function(higher_order::Eval)
            .with_function(control::If)
    }

    /// Adds `function`, replacing any function with the same name.
    pub fn with_function<F: Function<R> + 'static>(mut self, function: F) -> Self {
        self.functions.insert(function.name().to_string(), Box::new(function));
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn Function<R>> {
        self.functions.get(name).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<R: Runtime> Default for FunctionRegistry<R> {
    fn default() -> Self {
        FunctionRegistry::builtins()
    }
}

impl<R: Runtime> fmt::Debug for FunctionRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

/// Unions `apply` over the members of `ty`. Members for which `apply`
/// fails are dropped; the first error is returned only when all fail.
pub(crate) fn per_member<F>(ty: &Type, mut apply: F) -> Result<Type, FunctionError>
where
    F: FnMut(&Type) -> Result<Type, FunctionError>,
{
    let mut results = Vec::new();
    let mut first_error = None;
    for member in ty.members() {
        match apply(&member) {
            Ok(result) => results.push(result),
            Err(error) => {
                first_error.get_or_insert(error);
            }
        }
    }
    match (results.is_empty(), first_error) {
        (true, Some(error)) => Err(error),
        _ => Ok(Type::union_all(results)),
    }
}

/// Checks the elements of an array member against `allowed`.
///
/// Tuples are checked position by position and fail on the first element
/// that can never match. An unbounded array whose element type can never
/// match is only valid when empty, reported as `Ok(None)`.
pub(crate) fn check_elements(
    member: &Type,
    index: usize,
    allowed: RuntimeTypes,
    description: &str,
) -> Result<Option<Type>, FunctionError> {
    match member {
        Type::Tuple(items) => {
            let mut narrowed = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                match item.narrow(allowed) {
                    Some(ty) => narrowed.push(ty),
                    None => {
                        return Err(FunctionError::invalid_value(
                            index,
                            format!("Expected an array of {}, but found {} at index {}", description, item.kind_name(), i),
                        ));
                    }
                }
            }
            Ok(Some(Type::union_all(narrowed)))
        }
        Type::Array(element) => Ok(element.narrow(allowed)),
        _ => Ok(None),
    }
}

/// Whether an array member may have no elements.
pub(crate) fn may_be_empty(member: &Type) -> bool {
    match member {
        Type::Tuple(items) => items.is_empty(),
        _ => true,
    }
}

/// Collects array elements for functions that order them: all numbers or all
/// strings.
pub(crate) fn comparable_elements<'v, R: Runtime>(
    runtime: &R,
    array: &'v R::Value,
    index: usize,
) -> Result<Vec<&'v R::Value>, FunctionError> {
    let elements: Vec<&R::Value> = runtime.iter_array(array).collect();
    if let Some(first) = elements.first() {
        let kind = runtime.type_of(first);
        if kind != RuntimeType::Number && kind != RuntimeType::String {
            return Err(FunctionError::invalid_value(
                index,
                format!("Expected an array of number or string, but found {} at index 0", kind),
            ));
        }
        for (i, element) in elements.iter().enumerate() {
            let found = runtime.type_of(element);
            if found != kind {
                return Err(FunctionError::invalid_value(
                    index,
                    format!("Expected an array of {}, but found {} at index {}", kind, found, i),
                ));
            }
        }
    }
    Ok(elements)
}

/// Extracts numbers from an array argument.
pub(crate) fn numbers<R: Runtime>(runtime: &R, array: &R::Value, index: usize) -> Result<Vec<Number>, FunctionError> {
    runtime
        .iter_array(array)
        .enumerate()
        .map(|(i, element)| {
            runtime.as_number(element).ok_or_else(|| {
                FunctionError::invalid_value(
                    index,
                    format!("Expected an array of number, but found {} at index {}", runtime.type_of(element), i),
                )
            })
        })
        .collect()
}
