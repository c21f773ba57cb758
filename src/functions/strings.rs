use crate::abstract_evaluator::AbstractEvaluator;
use crate::evaluator::Evaluator;
use crate::functions::{check_argument_count, check_elements, per_member, Arity, Function, FunctionArgument, FunctionError};
use crate::runtime::{Runtime, RuntimeTypes};
use crate::types::Type;

fn string_test_abstract(args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
    check_argument_count(args, Arity::Exact(2))?;
    args[0].expect_any_of(0, RuntimeTypes::STRING)?;
    args[1].expect_any_of(1, RuntimeTypes::STRING)?;
    Ok(Type::Boolean)
}

pub struct StartsWith;

impl<R: Runtime> Function<R> for StartsWith {
    fn name(&self) -> &str {
        "starts_with"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let rt = evaluator.runtime();
        let subject = args[0].expect_string(rt, 0)?;
        let prefix = args[1].expect_string(rt, 1)?;
        Ok(rt.create_boolean(subject.starts_with(prefix)))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        string_test_abstract(args)
    }
}

pub struct EndsWith;

impl<R: Runtime> Function<R> for EndsWith {
    fn name(&self) -> &str {
        "ends_with"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let rt = evaluator.runtime();
        let subject = args[0].expect_string(rt, 0)?;
        let suffix = args[1].expect_string(rt, 1)?;
        Ok(rt.create_boolean(subject.ends_with(suffix)))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        string_test_abstract(args)
    }
}

/// `join(glue, strings)`
pub struct Join;

impl<R: Runtime> Function<R> for Join {
    fn name(&self) -> &str {
        "join"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        let rt = evaluator.runtime();
        let glue = args[0].expect_string(rt, 0)?;
        let array = args[1].expect_array(rt, 1)?;
        let mut parts = Vec::new();
        for (i, element) in rt.iter_array(array).enumerate() {
            match rt.as_str(element) {
                Some(part) => parts.push(part),
                None => {
                    return Err(FunctionError::invalid_value(
                        1,
                        format!("Expected an array of string, but found {} at index {}", rt.type_of(element), i),
                    ));
                }
            }
        }
        Ok(rt.create_string(&parts.join(glue)))
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(2))?;
        args[0].expect_any_of(0, RuntimeTypes::STRING)?;
        let array = args[1].expect_any_of(1, RuntimeTypes::ARRAY)?;
        per_member(&array, |member| {
            check_elements(member, 1, RuntimeTypes::STRING, "string")?;
            Ok(Type::String)
        })
    }
}
