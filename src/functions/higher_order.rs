//! Functions that take `&expr` arguments and evaluate them per element.

use std::cmp::Ordering;

use crate::abstract_evaluator::AbstractEvaluator;
use crate::ast::Expression;
use crate::evaluator::Evaluator;
use crate::functions::{check_argument_count, per_member, Arity, Function, FunctionArgument, FunctionError};
use crate::runtime::{ArrayBuilder, ObjectBuilder, Runtime, RuntimeType, RuntimeTypes};
use crate::types::Type;

const ORDERED: RuntimeTypes = RuntimeTypes::NUMBER.union(RuntimeTypes::STRING);

/// Pairs each element with the key `expr` computes for it. Keys must be all
/// numbers or all strings.
fn keyed<'v, R: Runtime>(
    evaluator: &Evaluator<'_, R>,
    array: &'v R::Value,
    expr: &Expression,
) -> Result<Vec<(&'v R::Value, R::Value)>, FunctionError> {
    let rt = evaluator.runtime();
    let mut pairs: Vec<(&R::Value, R::Value)> = Vec::new();
    let mut expected: Option<RuntimeType> = None;
    for element in rt.iter_array(array) {
        let key = evaluator.evaluate(expr, element)?;
        let kind = rt.type_of(&key);
        let first = *expected.get_or_insert(kind);
        if (kind != RuntimeType::Number && kind != RuntimeType::String) || kind != first {
            return Err(FunctionError::invalid_value(
                1,
                format!("Expected expression to return number or string, but found {}", kind),
            ));
        }
        pairs.push((element, key));
    }
    Ok(pairs)
}

/// Evaluates the key expression on every element type so that problems
/// inside it are reported, and checks what a tuple's keys can be.
fn check_keys<R: Runtime>(evaluator: &AbstractEvaluator<'_, R>, member: &Type, expr: &Expression) -> Result<(), FunctionError> {
    match member {
        Type::Tuple(items) => {
            for item in items {
                let key = evaluator.evaluate(expr, item);
                if !key.is_error() && key.narrow(ORDERED).is_none() {
                    return Err(FunctionError::invalid_value(
                        1,
                        format!("Expected expression to return number or string, but found {}", key.kind_name()),
                    ));
                }
            }
        }
        other => {
            evaluator.evaluate(expr, &other.member_type());
        }
    }
    Ok(())
}

pub struct Map;

impl<R: Runtime> Function<R> for Map {
    fn name(&self) -> &str {
        "map"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let rt = evaluator.runtime();
        let expr = args[0].expect_expression_ref(rt, 0)?;
        let array = args[1].expect_array(rt, 1)?;
        let mut builder = rt.array_builder();
        for element in rt.iter_array(array) {
            builder.add(evaluator.evaluate(expr, element)?);
        }
        Ok(builder.build())
    }

    fn apply_abstract(&self, evaluator: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let expr = args[0].expect_expression(0)?;
        let array = args[1].expect_any_of(1, RuntimeTypes::ARRAY)?;
        per_member(&array, |member| {
            Ok(match member {
                Type::Tuple(items) => Type::Tuple(items.iter().map(|item| evaluator.evaluate(expr, item)).collect()),
                other => Type::array(evaluator.evaluate(expr, &other.member_type())),
            })
        })
    }
}

/// Stable sort by the key an expression computes.
pub struct SortBy;

impl<R: Runtime> Function<R> for SortBy {
    fn name(&self) -> &str {
        "sort_by"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let rt = evaluator.runtime();
        let array = args[0].expect_array(rt, 0)?;
        let expr = args[1].expect_expression_ref(rt, 1)?;
        let mut pairs = keyed(evaluator, array, expr)?;
        pairs.sort_by(|(_, a), (_, b)| rt.compare(a, b).unwrap_or(Ordering::Equal));
        let mut builder = rt.array_builder();
        for (element, _) in pairs {
            builder.add(element.clone());
        }
        Ok(builder.build())
    }

    fn apply_abstract(&self, evaluator: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let array = args[0].expect_any_of(0, RuntimeTypes::ARRAY)?;
        let expr = args[1].expect_expression(1)?;
        per_member(&array, |member| {
            check_keys(evaluator, member, expr)?;
            Ok(match member {
                Type::Tuple(items) => Type::Tuple(vec![Type::union_all(items.iter().cloned()); items.len()]),
                other => other.clone(),
            })
        })
    }
}

fn extremum_by<R: Runtime>(
    evaluator: &Evaluator<'_, R>,
    args: &[FunctionArgument<'_, R::Value>],
    wanted: Ordering,
) -> Result<R::Value, FunctionError> {
    check_argument_count(args, Arity::Exact(2))?;
    let rt = evaluator.runtime();
    let array = args[0].expect_array(rt, 0)?;
    let expr = args[1].expect_expression_ref(rt, 1)?;
    let best = keyed(evaluator, array, expr)?
        .into_iter()
        .reduce(|best, candidate| match rt.compare(&candidate.1, &best.1) {
            Some(ordering) if ordering == wanted => candidate,
            _ => best,
        });
    Ok(best.map_or_else(|| rt.create_null(), |(element, _)| element.clone()))
}

fn extremum_by_abstract<R: Runtime>(
    evaluator: &AbstractEvaluator<'_, R>,
    args: &[FunctionArgument<'_, Type>],
) -> Result<Type, FunctionError> {
    check_argument_count(args, Arity::Exact(2))?;
    let array = args[0].expect_any_of(0, RuntimeTypes::ARRAY)?;
    let expr = args[1].expect_expression(1)?;
    per_member(&array, |member| {
        check_keys(evaluator, member, expr)?;
        Ok(match member {
            Type::Tuple(items) if items.is_empty() => Type::Null,
            Type::Tuple(items) => Type::union_all(items.iter().cloned()),
            other => other.element_type(),
        })
    })
}

pub struct MaxBy;

impl<R: Runtime> Function<R> for MaxBy {
    fn name(&self) -> &str {
        "max_by"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        extremum_by(evaluator, args, Ordering::Greater)
    }

    fn apply_abstract(&self, evaluator: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        extremum_by_abstract(evaluator, args)
    }
}

pub struct MinBy;

impl<R: Runtime> Function<R> for MinBy {
    fn name(&self) -> &str {
        "min_by"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        extremum_by(evaluator, args, Ordering::Less)
    }

    fn apply_abstract(&self, evaluator: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        extremum_by_abstract(evaluator, args)
    }
}

/// `fold_left(init, &folder, array)`.
///
/// The folder is evaluated against `{"acc": <accumulator>, "element": <element>}`
/// and its result becomes the next accumulator.
pub struct FoldLeft;

impl<R: Runtime> Function<R> for FoldLeft {
    fn name(&self) -> &str {
        "fold_left"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(3))?;
        let rt = evaluator.runtime();
        let mut acc = args[0].expect_value(0)?.clone();
        let folder = args[1].expect_expression_ref(rt, 1)?;
        let array = args[2].expect_array(rt, 2)?;
        for element in rt.iter_array(array) {
            let mut current = rt.object_builder();
            current.put("acc".to_string(), acc);
            current.put("element".to_string(), element.clone());
            acc = evaluator.evaluate(folder, &current.build())?;
        }
        Ok(acc)
    }

    fn apply_abstract(&self, evaluator: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(3))?;
        let init = args[0].expect_type(0)?.clone();
        let folder = args[1].expect_expression(1)?;
        let array = args[2].expect_any_of(2, RuntimeTypes::ARRAY)?;
        Ok(evaluator.fold_left(init, folder, &array))
    }
}

/// `eval(&expr, value)`: evaluates `expr` with `value` as the current node.
pub struct Eval;

impl<R: Runtime> Function<R> for Eval {
    fn name(&self) -> &str {
        "eval"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let rt = evaluator.runtime();
        let expr = args[0].expect_expression_ref(rt, 0)?;
        let value = args[1].expect_value(1)?;
        Ok(evaluator.evaluate(expr, value)?)
    }

    fn apply_abstract(&self, evaluator: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let expr = args[0].expect_expression(0)?;
        let value = args[1].expect_type(1)?;
        Ok(evaluator.evaluate(expr, value))
    }
}
