use once_cell::sync::Lazy;
use regex::Regex;

use crate::abstract_evaluator::AbstractEvaluator;
use crate::evaluator::Evaluator;
use crate::functions::{check_argument_count, per_member, Arity, Function, FunctionArgument, FunctionError};
use crate::number::Number;
use crate::runtime::{ArrayBuilder, Runtime, RuntimeType};
use crate::types::Type;

/// JSON number grammar; `to_number` rejects anything else.
static JSON_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(0|[1-9][0-9]*)(\.[0-9]+)?([eE][+-]?[0-9]+)?$").expect("JSON number pattern is valid")
});

pub(crate) fn parse_json_number(text: &str) -> Option<Number> {
    if JSON_NUMBER.is_match(text) {
        Number::parse(text)
    } else {
        None
    }
}

/// `type(value)`: the JMESPath kind name.
pub struct TypeOf;

impl<R: Runtime> Function<R> for TypeOf {
    fn name(&self) -> &str {
        "type"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let value = args[0].expect_value(0)?;
        Ok(rt.create_string(rt.type_of(value).name()))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        args[0].expect_type(0)?;
        Ok(Type::String)
    }
}

/// `to_string(value)`: strings unchanged, anything else as compact JSON.
pub struct ToJsonString;

impl<R: Runtime> Function<R> for ToJsonString {
    fn name(&self) -> &str {
        "to_string"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let value = args[0].expect_value(0)?;
        if rt.is(value, RuntimeType::String) {
            return Ok(value.clone());
        }
        Ok(rt.create_string(&rt.to_json(value)))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        args[0].expect_type(0)?;
        Ok(Type::String)
    }
}

/// `to_number(value)`: numbers unchanged, numeric strings parsed, else `null`.
pub struct ToNumber;

impl<R: Runtime> Function<R> for ToNumber {
    fn name(&self) -> &str {
        "to_number"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let value = args[0].expect_value(0)?;
        if rt.is(value, RuntimeType::Number) {
            return Ok(value.clone());
        }
        Ok(rt
            .as_str(value)
            .and_then(parse_json_number)
            .map_or_else(|| rt.create_null(), |n| rt.create_number(n)))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let value = args[0].expect_type(0)?;
        per_member(value, |member| {
            Ok(match member {
                Type::Number => Type::Number,
                Type::String => Type::union(Type::Number, Type::Null),
                _ => Type::Null,
            })
        })
    }
}

/// `to_array(value)`: arrays unchanged, anything else wrapped.
pub struct ToArray;

impl<R: Runtime> Function<R> for ToArray {
    fn name(&self) -> &str {
        "to_array"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let value = args[0].expect_value(0)?;
        if rt.is(value, RuntimeType::Array) {
            return Ok(value.clone());
        }
        let mut builder = rt.array_builder();
        builder.add(value.clone());
        Ok(builder.build())
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let value = args[0].expect_type(0)?;
        per_member(value, |member| {
            Ok(match member {
                Type::Array(_) | Type::Tuple(_) => member.clone(),
                other => Type::Tuple(vec![other.clone()]),
            })
        })
    }
}

/// `not_null(values...)`: the first argument that is not `null`.
pub struct NotNull;

impl<R: Runtime> Function<R> for NotNull {
    fn name(&self) -> &str {
        "not_null"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::AtLeast(1))?;
        let rt = evaluator.runtime();
        for (i, arg) in args.iter().enumerate() {
            let value = arg.expect_value(i)?;
            if !rt.is(value, RuntimeType::Null) {
                return Ok(value.clone());
            }
        }
        Ok(rt.create_null())
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::AtLeast(1))?;
        let mut candidates = Vec::with_capacity(args.len() + 1);
        for (i, arg) in args.iter().enumerate() {
            let ty = arg.expect_type(i)?;
            candidates.push(ty.without_null());
            if !ty.may_be(RuntimeType::Null) {
                return Ok(Type::union_all(candidates));
            }
        }
        candidates.push(Type::Null);
        Ok(Type::union_all(candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_number_grammar() {
        assert_eq!(parse_json_number("42"), Some(Number::Long(42)));
        assert_eq!(parse_json_number("-1.5e2"), Some(Number::Double(-150.0)));
        assert_eq!(parse_json_number("01"), None);
        assert_eq!(parse_json_number("1."), None);
        assert_eq!(parse_json_number(" 1"), None);
        assert_eq!(parse_json_number("abc"), None);
    }
}
