//! `abs`, `avg`, `ceil`, `floor`, `sum` and `add`.

use crate::abstract_evaluator::AbstractEvaluator;
use crate::evaluator::Evaluator;
use crate::functions::{
    check_argument_count, check_elements, may_be_empty, numbers, per_member, Arity, Function, FunctionArgument,
    FunctionError,
};
use crate::number::Number;
use crate::runtime::{Runtime, RuntimeTypes};
use crate::types::Type;

/// Shared shape of the one-number-in, one-number-out functions.
fn unary<R: Runtime>(
    evaluator: &Evaluator<'_, R>,
    args: &[FunctionArgument<'_, R::Value>],
    op: fn(&Number) -> Number,
) -> Result<R::Value, FunctionError> {
    check_argument_count(args, Arity::Exact(1))?;
    let rt = evaluator.runtime();
    let number = args[0].expect_number(rt, 0)?;
    Ok(rt.create_number(op(&number)))
}

/// Sum of `values` with promotion; `None` when empty.
fn total(values: &[Number], index: usize) -> Result<Option<Number>, FunctionError> {
    let Some((first, rest)) = values.split_first() else {
        return Ok(None);
    };
    rest.iter()
        .try_fold(*first, |acc, n| acc.checked_add(n))
        .map(Some)
        .ok_or_else(|| out_of_range(index))
}

fn out_of_range(index: usize) -> FunctionError {
    FunctionError::invalid_value(index, "Sum is outside the range of representable numbers")
}

fn unary_abstract(args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
    check_argument_count(args, Arity::Exact(1))?;
    args[0].expect_any_of(0, RuntimeTypes::NUMBER)?;
    Ok(Type::Number)
}

pub struct Abs;

impl<R: Runtime> Function<R> for Abs {
    fn name(&self) -> &str {
        "abs"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        unary(evaluator, args, Number::abs)
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        unary_abstract(args)
    }
}

pub struct Ceil;

impl<R: Runtime> Function<R> for Ceil {
    fn name(&self) -> &str {
        "ceil"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        unary(evaluator, args, Number::ceil)
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        unary_abstract(args)
    }
}

pub struct Floor;

impl<R: Runtime> Function<R> for Floor {
    fn name(&self) -> &str {
        "floor"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        unary(evaluator, args, Number::floor)
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        unary_abstract(args)
    }
}

/// Average of an array of numbers; `null` for an empty array.
pub struct Avg;

impl<R: Runtime> Function<R> for Avg {
    fn name(&self) -> &str {
        "avg"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let values = numbers(rt, args[0].expect_array(rt, 0)?, 0)?;
        let Some(sum) = total(&values, 0)? else {
            return Ok(rt.create_null());
        };
        Ok(sum
            .divide(values.len())
            .map_or_else(|| rt.create_null(), |avg| rt.create_number(avg)))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let array = args[0].expect_any_of(0, RuntimeTypes::ARRAY)?;
        per_member(&array, |member| {
            Ok(match check_elements(member, 0, RuntimeTypes::NUMBER, "number")? {
                None | Some(Type::Bottom) => Type::Null,
                Some(_) if may_be_empty(member) => Type::union(Type::Number, Type::Null),
                Some(_) => Type::Number,
            })
        })
    }
}

/// Sum of an array of numbers; `0` for an empty array.
pub struct Sum;

impl<R: Runtime> Function<R> for Sum {
    fn name(&self) -> &str {
        "sum"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let values = numbers(rt, args[0].expect_array(rt, 0)?, 0)?;
        let sum = total(&values, 0)?.unwrap_or(Number::Long(0));
        Ok(rt.create_number(sum))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let array = args[0].expect_any_of(0, RuntimeTypes::ARRAY)?;
        per_member(&array, |member| {
            check_elements(member, 0, RuntimeTypes::NUMBER, "number")?;
            Ok(Type::Number)
        })
    }
}

/// `add(a, b)`: sum of two numbers with promotion.
pub struct Add;

impl<R: Runtime> Function<R> for Add {
    fn name(&self) -> &str {
        "add"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let rt = evaluator.runtime();
        let a = args[0].expect_number(rt, 0)?;
        let b = args[1].expect_number(rt, 1)?;
        let sum = a.checked_add(&b).ok_or_else(|| out_of_range(1))?;
        Ok(rt.create_number(sum))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        args[0].expect_any_of(0, RuntimeTypes::NUMBER)?;
        args[1].expect_any_of(1, RuntimeTypes::NUMBER)?;
        Ok(Type::Number)
    }
}
