//! Abstract evaluation: predicting the [`Type`] of a query's result without data.
//!
//! Every concrete evaluation rule has an abstract counterpart over the type
//! lattice. Projections, filter projections, object projections and flatten
//! are rewritten into a `fold_left` whose folder is instantiated from a fixed
//! template:
//!
//! ```text
//! projection:  append_if_not_null(acc, eval(&'$right', element))
//! filter:      append_if_not_null(acc, if(eval(&'$condition', element), eval(&'$right', element), `null`))
//! flatten:     concat(acc, to_array(element))
//! ```
//!
//! A fold over a tuple type runs element by element. A fold over an array of
//! unknown length iterates `acc = widen(acc | folder({acc, element}))` until the
//! accumulator stops changing, giving up with `any` after the iteration limit.
//!
//! Failures do not abort the walk: they become `Type::Error` values and are
//! recorded as [`ExpressionProblem`]s.

use std::cell::RefCell;
use std::collections::BTreeMap;

use log::{debug, trace, warn};
use once_cell::sync::Lazy;

use crate::ast::{Comparator, Expression, Node};
use crate::functions::{collections, control, conversions, higher_order, Function, FunctionArgument, FunctionRegistry};
use crate::lexer::Position;
use crate::lint::{ExpressionProblem, Severity};
use crate::number::Number;
use crate::parser;
use crate::runtime::{slice_indices, ArrayBuilder, ObjectBuilder, Runtime, RuntimeType, RuntimeTypes, ValueFactory};
use crate::types::{ErrorKind, Truthiness, Type};
use crate::value::Value;

/// Fix-point iterations before a fold over an unbounded array gives up.
pub const DEFAULT_ITERATION_LIMIT: usize = 32;

/// Accumulator unions larger than this are widened during exact tuple folds.
const MAX_EXACT_UNION: usize = 8;

static PROJECTION_FOLDER: Lazy<Expression> =
    Lazy::new(|| template("append_if_not_null(acc, eval(&'$right', element))"));

static FILTER_FOLDER: Lazy<Expression> = Lazy::new(|| {
    template("append_if_not_null(acc, if(eval(&'$condition', element), eval(&'$right', element), `null`))")
});

static FLATTEN_FOLDER: Lazy<Expression> = Lazy::new(|| template("concat(acc, to_array(element))"));

fn template(text: &str) -> Expression {
    parser::parse(text).expect("folder template is valid JMESPath")
}

/// Replaces the `'$name'` placeholders of a template.
fn instantiate(template: &Expression, bindings: &[(&str, &Expression)]) -> Expression {
    template.substitute(&|node: &Expression| match &node.node {
        Node::Literal(Value::String(placeholder)) => bindings
            .iter()
            .find(|(name, _)| *name == placeholder.as_str())
            .map(|(_, replacement)| (*replacement).clone()),
        _ => None,
    })
}

/// The functions folder templates call, available even when the registry
/// in use does not provide them.
fn template_function<R: Runtime>(name: &str) -> Option<&'static dyn Function<R>> {
    let function: &'static dyn Function<R> = match name {
        "append_if_not_null" => &collections::AppendIfNotNull,
        "concat" => &collections::Concat,
        "to_array" => &conversions::ToArray,
        "eval" => &higher_order::Eval,
        "if" => &control::If,
        _ => return None,
    };
    Some(function)
}

/// The abstract runtime: builds types instead of values.
///
/// Array builders produce tuples and object builders produce closed shapes,
/// so multi-selects and literals keep their exact structure.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeRuntime;

/// Builds a tuple, degrading to an array once an element sequence of
/// unknown length is appended.
#[derive(Debug, Default)]
pub struct TupleBuilder {
    items: Vec<Type>,
    unbounded: Option<Type>,
}

impl ArrayBuilder<Type> for TupleBuilder {
    fn add(&mut self, value: Type) {
        match self.unbounded.take() {
            Some(element) => self.unbounded = Some(Type::union(element, value)),
            None => self.items.push(value),
        }
    }

    fn add_all(&mut self, array: Type) {
        if let Type::Tuple(items) = array {
            for item in items {
                self.add(item);
            }
            return;
        }
        let known = Type::union_all(self.items.drain(..));
        let prior = self.unbounded.take().unwrap_or(Type::Bottom);
        self.unbounded = Some(Type::union_all([known, prior, array.member_type()]));
    }

    fn build(self) -> Type {
        match self.unbounded {
            Some(element) => Type::array(element),
            None => Type::Tuple(self.items),
        }
    }
}

/// Builds a closed object shape, or an unconstrained object once members of
/// an unknown shape are merged in.
#[derive(Debug, Default)]
pub struct ShapeBuilder {
    members: BTreeMap<String, Type>,
    open: bool,
}

impl ObjectBuilder<Type> for ShapeBuilder {
    fn put(&mut self, key: String, value: Type) {
        self.members.insert(key, value);
    }

    fn put_all(&mut self, object: Type) {
        match object {
            Type::Object(Some(members)) => self.members.extend(members),
            _ => self.open = true,
        }
    }

    fn build(self) -> Type {
        if self.open {
            Type::Object(None)
        } else {
            Type::Object(Some(self.members))
        }
    }
}

impl ValueFactory for TypeRuntime {
    type Value = Type;
    type Array = TupleBuilder;
    type Object = ShapeBuilder;

    fn create_null(&self) -> Type {
        Type::Null
    }

    fn create_boolean(&self, _: bool) -> Type {
        Type::Boolean
    }

    fn create_string(&self, _: &str) -> Type {
        Type::String
    }

    fn create_number(&self, _: Number) -> Type {
        Type::Number
    }

    fn array_builder(&self) -> TupleBuilder {
        TupleBuilder::default()
    }

    fn object_builder(&self) -> ShapeBuilder {
        ShapeBuilder::default()
    }
}

impl TypeRuntime {
    pub fn create_any(&self) -> Type {
        Type::Any
    }

    /// Type of testing whether a value of `value` has a given kind.
    pub fn abstract_is(&self, value: &Type, _kind: RuntimeType) -> Type {
        if value.is_error() {
            return value.clone();
        }
        Type::Boolean
    }

    pub fn abstract_equal(&self, a: &Type, b: &Type) -> Type {
        first_error(a, b).unwrap_or(Type::Boolean)
    }

    /// Type of an ordering comparison: `boolean` for numbers, `null` when an
    /// operand can never be a number.
    pub fn abstract_less_than(&self, a: &Type, b: &Type) -> Type {
        if let Some(error) = first_error(a, b) {
            return error;
        }
        if a == &Type::Bottom || b == &Type::Bottom {
            return Type::Bottom;
        }
        if !a.may_be(RuntimeType::Number) || !b.may_be(RuntimeType::Number) {
            Type::Null
        } else if a.runtime_types() == RuntimeTypes::NUMBER && b.runtime_types() == RuntimeTypes::NUMBER {
            Type::Boolean
        } else {
            Type::union(Type::Boolean, Type::Null)
        }
    }

    /// Picks a branch when the truthiness of `condition` is known, otherwise
    /// both branches are possible.
    pub fn if_then_else(&self, condition: &Type, then: &Type, otherwise: &Type) -> Type {
        if condition.is_error() {
            return condition.clone();
        }
        match condition.truthiness() {
            Truthiness::Truthy => then.clone(),
            Truthiness::Falsy => otherwise.clone(),
            Truthiness::Unknown => self.either(then, otherwise),
            Truthiness::Never => Type::Bottom,
        }
    }

    pub fn either(&self, a: &Type, b: &Type) -> Type {
        Type::union(a.clone(), b.clone())
    }
}

fn first_error(a: &Type, b: &Type) -> Option<Type> {
    [a, b].into_iter().find(|ty| ty.is_error()).cloned()
}

/// Walks an expression over types, recording problems as it goes.
pub struct AbstractEvaluator<'a, R: Runtime> {
    runtime: TypeRuntime,
    functions: &'a FunctionRegistry<R>,
    iteration_limit: usize,
    problems: RefCell<Vec<ExpressionProblem>>,
}

impl<'a, R: Runtime> AbstractEvaluator<'a, R> {
    pub fn new(functions: &'a FunctionRegistry<R>) -> Self {
        AbstractEvaluator {
            runtime: TypeRuntime,
            functions,
            iteration_limit: DEFAULT_ITERATION_LIMIT,
            problems: RefCell::new(Vec::new()),
        }
    }

    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = limit;
        self
    }

    pub fn runtime(&self) -> &TypeRuntime {
        &self.runtime
    }

    pub fn functions(&self) -> &'a FunctionRegistry<R> {
        self.functions
    }

    /// Problems recorded so far, in discovery order.
    pub fn problems(&self) -> Vec<ExpressionProblem> {
        self.problems.borrow().clone()
    }

    pub fn into_problems(self) -> Vec<ExpressionProblem> {
        self.problems.into_inner()
    }

    pub fn report(&self, severity: Severity, message: impl Into<String>, position: Position) {
        let problem = ExpressionProblem::new(severity, message, position);
        let mut problems = self.problems.borrow_mut();
        if !problems.contains(&problem) {
            problems.push(problem);
        }
    }

    pub fn evaluate(&self, expr: &Expression, current: &Type) -> Type {
        if matches!(current, Type::Bottom | Type::Error(_)) {
            return current.clone();
        }
        let rt = &self.runtime;
        match &expr.node {
            Node::Current => current.clone(),
            Node::Field(name) => self.field(current, name, expr.position),
            Node::Index(index) => {
                if certainly_not(current, RuntimeType::Array) {
                    self.danger(
                        format!("Array index '{}' extraction performed on {}", index, current.kind_name()),
                        expr.position,
                    );
                }
                current.index_type(*index)
            }
            Node::Slice { start, stop, step } => self.slice(current, *start, *stop, *step, expr.position),
            Node::Literal(value) => rt.create_literal(value),
            Node::Subexpression { left, right, .. } => {
                let left = self.evaluate(left, current);
                self.evaluate(right, &left)
            }
            Node::Projection { left, right } => {
                let collection = self.evaluate(left, current);
                if !matches!(left.node, Node::Slice { .. } | Node::Flatten(_)) {
                    self.check_kind(&collection, RuntimeType::Array, "Array projection", expr.position);
                }
                let folder = instantiate(&PROJECTION_FOLDER, &[("$right", right)]);
                self.project(&collection, &collection, RuntimeType::Array, &folder)
            }
            Node::FilterProjection {
                left,
                condition,
                right,
            } => {
                let collection = self.evaluate(left, current);
                self.check_kind(&collection, RuntimeType::Array, "Filter projection", expr.position);
                let folder = instantiate(&FILTER_FOLDER, &[("$condition", condition), ("$right", right)]);
                self.project(&collection, &collection, RuntimeType::Array, &folder)
            }
            Node::ObjectProjection { left, right } => {
                let object = self.evaluate(left, current);
                self.check_kind(&object, RuntimeType::Object, "Object projection", expr.position);
                let folder = instantiate(&PROJECTION_FOLDER, &[("$right", right)]);
                self.project(&object, &object.object_values(), RuntimeType::Object, &folder)
            }
            Node::Flatten(inner) => {
                let collection = self.evaluate(inner, current);
                self.check_kind(&collection, RuntimeType::Array, "Array flatten", expr.position);
                self.project(&collection, &collection, RuntimeType::Array, &FLATTEN_FOLDER)
            }
            Node::MultiSelectList(items) => self.multi_select(current, |target| {
                let mut builder = rt.array_builder();
                for item in items {
                    builder.add(self.evaluate(item, target));
                }
                builder.build()
            }),
            Node::MultiSelectHash(entries) => self.multi_select(current, |target| {
                let mut builder = rt.object_builder();
                for (key, value) in entries {
                    builder.put(key.clone(), self.evaluate(value, target));
                }
                builder.build()
            }),
            Node::Comparator { op, left, right } => {
                let left = self.evaluate(left, current);
                let right = self.evaluate(right, current);
                self.compare(*op, &left, &right, expr.position)
            }
            Node::And { left, right } => {
                let left = self.evaluate(left, current);
                let right = self.evaluate(right, current);
                rt.if_then_else(&left, &right, &left)
            }
            Node::Or { left, right } => {
                let left = self.evaluate(left, current);
                let right = self.evaluate(right, current);
                rt.if_then_else(&left, &left, &right)
            }
            Node::Not(inner) => {
                let inner = self.evaluate(inner, current);
                if inner.is_error() {
                    inner
                } else {
                    Type::Boolean
                }
            }
            Node::Function { name, args } => self.call(name, args, current, expr.position),
            Node::ExpressionRef(inner) => self.evaluate(inner, current),
        }
    }

    /// Folds `folder` over every array member of `collection`.
    ///
    /// Tuples are folded exactly; arrays of unknown length iterate to a
    /// fix-point. Members that are not arrays are ignored.
    pub fn fold_left(&self, init: Type, folder: &Expression, collection: &Type) -> Type {
        let mut arrays: Vec<Type> = collection
            .members()
            .into_iter()
            .filter(|member| matches!(member, Type::Array(_) | Type::Tuple(_)))
            .collect();
        if arrays.len() > MAX_EXACT_UNION {
            arrays = vec![Type::array(collection.member_type())];
        }
        let results: Vec<Type> = arrays
            .iter()
            .map(|member| match member {
                Type::Tuple(items) => self.fold_exact(init.clone(), folder, items),
                other => self.fold_fixpoint(init.clone(), folder, &other.member_type()),
            })
            .collect();
        Type::union_all(results)
    }

    fn fold_step(&self, acc: &Type, element: &Type, folder: &Expression) -> Type {
        let current = Type::object([("acc", acc.clone()), ("element", element.clone())]);
        self.evaluate(folder, &current)
    }

    fn fold_exact(&self, init: Type, folder: &Expression, items: &[Type]) -> Type {
        let mut acc = init;
        for item in items {
            acc = self.fold_step(&acc, item, folder);
            if acc.union_len() > MAX_EXACT_UNION {
                acc = acc.widen();
            }
        }
        acc
    }

    fn fold_fixpoint(&self, init: Type, folder: &Expression, element: &Type) -> Type {
        let mut acc = init.widen();
        for iteration in 0..self.iteration_limit {
            let step = self.fold_step(&acc, element, folder);
            let next = Type::union(acc.clone(), step).widen();
            trace!("fold iteration {}: {}", iteration, next);
            if next == acc {
                debug!("fold over array<{}> converged after {} iterations", element, iteration + 1);
                return acc;
            }
            acc = next;
        }
        warn!(
            "fold over array<{}> did not converge after {} iterations, widening to any",
            element, self.iteration_limit
        );
        Type::Any
    }

    /// Result of a projection-like node: the fold over `source`, `null` for
    /// members of `collection` that are not of the `accepted` kind, and the
    /// errors of `collection`.
    fn project(&self, collection: &Type, source: &Type, accepted: RuntimeType, folder: &Expression) -> Type {
        if collection.is_error() {
            return collection.clone();
        }
        let mut results = vec![self.fold_left(Type::Tuple(Vec::new()), folder, source)];
        for member in collection.members() {
            if member.is_error() {
                results.push(member);
            } else if member.is_value_type() && !member.may_be(accepted) {
                results.push(Type::Null);
            }
        }
        Type::union_all(results)
    }

    fn multi_select<F>(&self, current: &Type, build: F) -> Type
    where
        F: Fn(&Type) -> Type,
    {
        let target = current.without_null();
        if target == Type::Bottom {
            return Type::Null;
        }
        let selected = build(&target);
        if current.may_be(RuntimeType::Null) {
            Type::union(selected, Type::Null)
        } else {
            selected
        }
    }

    fn field(&self, current: &Type, name: &str, position: Position) -> Type {
        if certainly_not(current, RuntimeType::Object) {
            self.danger(
                format!("Object field '{}' extraction performed on {}", name, current.kind_name()),
                position,
            );
        } else if let Some(keys) = missing_in_every_shape(current, name) {
            self.danger(
                format!("Object field '{}' does not exist in object with properties [{}]", name, keys),
                position,
            );
        }
        current.value_type(name)
    }

    fn slice(&self, current: &Type, start: Option<i64>, stop: Option<i64>, step: i64, position: Position) -> Type {
        if certainly_not(current, RuntimeType::Array) {
            self.danger(format!("Slice performed on {}", current.kind_name()), position);
        }
        let result = Type::union_all(current.members().into_iter().map(|member| match member {
            Type::Tuple(_) | Type::Array(_) if step == 0 => Type::Error(ErrorKind::InvalidValue),
            Type::Tuple(items) => Type::Tuple(
                slice_indices(items.len(), start, stop, step)
                    .into_iter()
                    .map(|i| items[i].clone())
                    .collect(),
            ),
            Type::Array(_) | Type::Error(_) => member,
            _ => Type::Null,
        }));
        if result.is_error() {
            self.report(Severity::Error, "Invalid slice: step cannot be 0", position);
        }
        result
    }

    fn compare(&self, op: Comparator, left: &Type, right: &Type, position: Position) -> Type {
        if !op.is_ordering() {
            return self.runtime.abstract_equal(left, right);
        }
        let result = self.runtime.abstract_less_than(left, right);
        if result == Type::Null {
            let offending = if left.may_be(RuntimeType::Number) { right } else { left };
            self.report(
                Severity::Warning,
                format!("Invalid comparator '{}' for {}", op, offending.kind_name()),
                position,
            );
        }
        result
    }

    fn call(&self, name: &str, args: &[Expression], current: &Type, position: Position) -> Type {
        let Some(function) = self.functions.lookup(name).or_else(|| template_function::<R>(name)) else {
            self.report(Severity::Error, format!("Unknown function: {}", name), position);
            return Type::Error(ErrorKind::UnknownFunction);
        };

        let mut arguments = Vec::with_capacity(args.len());
        for arg in args {
            match &arg.node {
                Node::ExpressionRef(inner) => arguments.push(FunctionArgument::Expression(inner.as_ref())),
                _ => {
                    let ty = self.evaluate(arg, current);
                    if ty.is_error() || ty == Type::Bottom {
                        return ty;
                    }
                    arguments.push(FunctionArgument::Value(ty));
                }
            }
        }

        match function.apply_abstract(self, &arguments) {
            Ok(ty) => ty,
            Err(error) => {
                self.report(Severity::Error, format!("{} function {}", name, error), position);
                Type::Error(error.kind())
            }
        }
    }

    fn check_kind(&self, ty: &Type, kind: RuntimeType, what: &str, position: Position) {
        if certainly_not(ty, kind) {
            self.danger(format!("{} performed on {}", what, ty.kind_name()), position);
        }
    }

    fn danger(&self, message: String, position: Position) {
        self.report(Severity::Danger, message, position);
    }
}

/// Whether no value of `ty` has kind `kind`. Empty and error types are
/// never reported.
fn certainly_not(ty: &Type, kind: RuntimeType) -> bool {
    !ty.runtime_types().is_empty() && !ty.may_be(kind)
}

/// The keys of the first shape, when every object member of `ty` is a
/// closed shape without `name`.
fn missing_in_every_shape(ty: &Type, name: &str) -> Option<String> {
    let mut first_keys = None;
    for member in ty.members() {
        match member {
            Type::Object(Some(props)) => {
                if props.contains_key(name) {
                    return None;
                }
                first_keys.get_or_insert_with(|| props.keys().cloned().collect::<Vec<_>>().join(", "));
            }
            Type::Object(None) | Type::Map(_, _) => return None,
            _ => {}
        }
    }
    first_keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse() {
        assert!(matches!(PROJECTION_FOLDER.node, Node::Function { .. }));
        assert!(matches!(FILTER_FOLDER.node, Node::Function { .. }));
        assert!(matches!(FLATTEN_FOLDER.node, Node::Function { .. }));
    }

    #[test]
    fn test_instantiate_replaces_placeholders() {
        let right = parser::parse("foo.bar").unwrap();
        let folder = instantiate(&PROJECTION_FOLDER, &[("$right", &right)]);
        assert_eq!(folder.to_string(), "append_if_not_null(acc, eval(&foo.bar, element))");
    }

    #[test]
    fn test_tuple_builder_degrades_to_array() {
        let mut builder = TupleBuilder::default();
        builder.add(Type::Number);
        builder.add_all(Type::array(Type::String));
        builder.add(Type::Null);
        assert_eq!(
            builder.build(),
            Type::array(Type::union_all([Type::Number, Type::String, Type::Null]))
        );
    }

    #[test]
    fn test_if_then_else_uses_known_truthiness() {
        let rt = TypeRuntime;
        assert_eq!(rt.if_then_else(&Type::Number, &Type::String, &Type::Null), Type::String);
        assert_eq!(rt.if_then_else(&Type::Null, &Type::String, &Type::Null), Type::Null);
        assert_eq!(
            rt.if_then_else(&Type::Boolean, &Type::String, &Type::Null),
            Type::union(Type::String, Type::Null)
        );
    }

    #[test]
    fn test_abstract_predicates() {
        let rt = TypeRuntime;
        assert_eq!(rt.abstract_is(&Type::Any, RuntimeType::String), Type::Boolean);
        assert_eq!(rt.abstract_equal(&Type::Number, &Type::String), Type::Boolean);
        assert_eq!(rt.abstract_less_than(&Type::Number, &Type::Number), Type::Boolean);
        assert_eq!(rt.abstract_less_than(&Type::String, &Type::Number), Type::Null);
        assert_eq!(
            rt.abstract_less_than(&Type::Any, &Type::Number),
            Type::union(Type::Boolean, Type::Null)
        );
        assert_eq!(rt.create_any(), Type::Any);
    }
}
