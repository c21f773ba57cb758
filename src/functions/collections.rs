//! Functions over arrays, and over strings where JMESPath treats them as sequences.

use std::cmp::Ordering;

use crate::abstract_evaluator::AbstractEvaluator;
use crate::evaluator::Evaluator;
use crate::functions::{
    check_argument_count, check_elements, comparable_elements, may_be_empty, per_member, Arity, Function,
    FunctionArgument, FunctionError,
};
use crate::number::Number;
use crate::runtime::{ArrayBuilder, Runtime, RuntimeType, RuntimeTypes};
use crate::types::Type;

const SEQUENCE: RuntimeTypes = RuntimeTypes::STRING.union(RuntimeTypes::ARRAY);
const ORDERED: RuntimeTypes = RuntimeTypes::NUMBER.union(RuntimeTypes::STRING);

pub struct Length;

impl<R: Runtime> Function<R> for Length {
    fn name(&self) -> &str {
        "length"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let subject = args[0].expect_kind(rt, 0, SEQUENCE | RuntimeTypes::OBJECT)?;
        let length = i64::try_from(rt.length(subject)).unwrap_or(i64::MAX);
        Ok(rt.create_number(Number::Long(length)))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        args[0].expect_any_of(0, SEQUENCE | RuntimeTypes::OBJECT)?;
        Ok(Type::Number)
    }
}

/// `contains(subject, search)`: array membership or substring test.
pub struct Contains;

impl<R: Runtime> Function<R> for Contains {
    fn name(&self) -> &str {
        "contains"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let rt = evaluator.runtime();
        let subject = args[0].expect_kind(rt, 0, SEQUENCE)?;
        let search = args[1].expect_value(1)?;
        let found = match rt.type_of(subject) {
            RuntimeType::Array => rt.iter_array(subject).any(|element| rt.equal(element, search)),
            _ => match (rt.as_str(subject), rt.as_str(search)) {
                (Some(haystack), Some(needle)) => haystack.contains(needle),
                _ => false,
            },
        };
        Ok(rt.create_boolean(found))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        args[0].expect_any_of(0, SEQUENCE)?;
        args[1].expect_type(1)?;
        Ok(Type::Boolean)
    }
}

pub struct Reverse;

impl<R: Runtime> Function<R> for Reverse {
    fn name(&self) -> &str {
        "reverse"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let subject = args[0].expect_kind(rt, 0, SEQUENCE)?;
        if let Some(text) = rt.as_str(subject) {
            let reversed: String = text.chars().rev().collect();
            return Ok(rt.create_string(&reversed));
        }
        let elements: Vec<&R::Value> = rt.iter_array(subject).collect();
        let mut builder = rt.array_builder();
        for element in elements.into_iter().rev() {
            builder.add(element.clone());
        }
        Ok(builder.build())
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let subject = args[0].expect_any_of(0, SEQUENCE)?;
        per_member(&subject, |member| {
            Ok(match member {
                Type::Tuple(items) => Type::Tuple(items.iter().rev().cloned().collect()),
                other => other.clone(),
            })
        })
    }
}

/// Sorts numbers or strings in natural order.
pub struct Sort;

impl<R: Runtime> Function<R> for Sort {
    fn name(&self) -> &str {
        "sort"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let array = args[0].expect_array(rt, 0)?;
        let mut elements = comparable_elements(rt, array, 0)?;
        elements.sort_by(|a, b| rt.compare(a, b).unwrap_or(Ordering::Equal));
        let mut builder = rt.array_builder();
        for element in elements {
            builder.add(element.clone());
        }
        Ok(builder.build())
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let array = args[0].expect_any_of(0, RuntimeTypes::ARRAY)?;
        per_member(&array, |member| {
            let element = check_elements(member, 0, ORDERED, "number or string")?;
            Ok(match (member, element) {
                (Type::Tuple(items), Some(element)) => Type::Tuple(vec![element; items.len()]),
                (_, Some(element)) => Type::array(element),
                (_, None) => Type::Tuple(Vec::new()),
            })
        })
    }
}

fn extremum<R: Runtime>(
    evaluator: &Evaluator<'_, R>,
    args: &[FunctionArgument<'_, R::Value>],
    wanted: Ordering,
) -> Result<R::Value, FunctionError> {
    check_argument_count(args, Arity::Exact(1))?;
    let rt = evaluator.runtime();
    let array = args[0].expect_array(rt, 0)?;
    let elements = comparable_elements(rt, array, 0)?;
    let best = elements
        .into_iter()
        .reduce(|best, element| match rt.compare(element, best) {
            Some(ordering) if ordering == wanted => element,
            _ => best,
        });
    Ok(best.cloned().unwrap_or_else(|| rt.create_null()))
}

fn extremum_abstract(args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
    check_argument_count(args, Arity::Exact(1))?;
    let array = args[0].expect_any_of(0, RuntimeTypes::ARRAY)?;
    per_member(&array, |member| {
        Ok(match check_elements(member, 0, ORDERED, "number or string")? {
            None | Some(Type::Bottom) => Type::Null,
            Some(element) if may_be_empty(member) => Type::union(element, Type::Null),
            Some(element) => element,
        })
    })
}

pub struct Max;

impl<R: Runtime> Function<R> for Max {
    fn name(&self) -> &str {
        "max"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        extremum(evaluator, args, Ordering::Greater)
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        extremum_abstract(args)
    }
}

pub struct Min;

impl<R: Runtime> Function<R> for Min {
    fn name(&self) -> &str {
        "min"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        extremum(evaluator, args, Ordering::Less)
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        extremum_abstract(args)
    }
}

/// `concat(a, b)`: elements of `a` followed by elements of `b`.
pub struct Concat;

impl<R: Runtime> Function<R> for Concat {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let rt = evaluator.runtime();
        let first = args[0].expect_array(rt, 0)?;
        let second = args[1].expect_array(rt, 1)?;
        let mut builder = rt.array_builder();
        builder.add_all(first.clone());
        builder.add_all(second.clone());
        Ok(builder.build())
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let first = args[0].expect_any_of(0, RuntimeTypes::ARRAY)?;
        let second = args[1].expect_any_of(1, RuntimeTypes::ARRAY)?;
        per_member(&first, |a| {
            per_member(&second, |b| {
                Ok(match (a, b) {
                    (Type::Tuple(x), Type::Tuple(y)) => Type::Tuple(x.iter().chain(y).cloned().collect()),
                    _ => Type::array(Type::union(a.member_type(), b.member_type())),
                })
            })
        })
    }
}

/// `append_if_not_null(array, value)`: appends `value` unless it is `null`.
pub struct AppendIfNotNull;

impl<R: Runtime> Function<R> for AppendIfNotNull {
    fn name(&self) -> &str {
        "append_if_not_null"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let rt = evaluator.runtime();
        let array = args[0].expect_array(rt, 0)?;
        let value = args[1].expect_value(1)?;
        if rt.is(value, RuntimeType::Null) {
            return Ok(array.clone());
        }
        let mut builder = rt.array_builder();
        builder.add_all(array.clone());
        builder.add(value.clone());
        Ok(builder.build())
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let array = args[0].expect_any_of(0, RuntimeTypes::ARRAY)?;
        let value = args[1].expect_type(1)?;
        let appended = value.without_null();
        per_member(&array, |member| {
            let mut results = Vec::with_capacity(2);
            if value.may_be(RuntimeType::Null) {
                results.push(member.clone());
            }
            if appended != Type::Bottom {
                results.push(match member {
                    Type::Tuple(items) => {
                        let mut items = items.clone();
                        items.push(appended.clone());
                        Type::Tuple(items)
                    }
                    other => Type::array(Type::union(other.member_type(), appended.clone())),
                });
            }
            Ok(Type::union_all(results))
        })
    }
}
