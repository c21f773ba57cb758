use std::collections::BTreeMap;

use crate::abstract_evaluator::AbstractEvaluator;
use crate::evaluator::Evaluator;
use crate::functions::{check_argument_count, per_member, Arity, Function, FunctionArgument, FunctionError};
use crate::runtime::{ArrayBuilder, ObjectBuilder, Runtime, RuntimeTypes};
use crate::types::Type;

pub struct Keys;

impl<R: Runtime> Function<R> for Keys {
    fn name(&self) -> &str {
        "keys"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let object = args[0].expect_object(rt, 0)?;
        let mut builder = rt.array_builder();
        for (key, _) in rt.iter_object(object) {
            builder.add(rt.create_string(key));
        }
        Ok(builder.build())
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let object = args[0].expect_any_of(0, RuntimeTypes::OBJECT)?;
        per_member(&object, |member| {
            Ok(match member {
                Type::Object(Some(props)) => Type::Tuple(vec![Type::String; props.len()]),
                _ => Type::array(Type::String),
            })
        })
    }
}

pub struct Values;

impl<R: Runtime> Function<R> for Values {
    fn name(&self) -> &str {
        "values"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let rt = evaluator.runtime();
        let object = args[0].expect_object(rt, 0)?;
        let mut builder = rt.array_builder();
        for (_, value) in rt.iter_object(object) {
            builder.add(value.clone());
        }
        Ok(builder.build())
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(1))?;
        let object = args[0].expect_any_of(0, RuntimeTypes::OBJECT)?;
        Ok(object.object_values())
    }
}

/// `merge(objects...)`: later members override earlier ones.
pub struct Merge;

impl<R: Runtime> Function<R> for Merge {
    fn name(&self) -> &str {
        "merge"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        let rt = evaluator.runtime();
        let mut builder = rt.object_builder();
        for (i, arg) in args.iter().enumerate() {
            builder.put_all(arg.expect_object(rt, i)?.clone());
        }
        Ok(builder.build())
    }

    fn apply_abstract(&self, _: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        let mut merged = Some(BTreeMap::new());
        for (i, arg) in args.iter().enumerate() {
            let object = arg.expect_any_of(i, RuntimeTypes::OBJECT)?;
            merged = match (object, merged) {
                (Type::Object(Some(props)), Some(mut members)) => {
                    members.extend(props);
                    Some(members)
                }
                _ => None,
            };
        }
        Ok(Type::Object(merged))
    }
}
