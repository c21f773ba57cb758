use crate::abstract_evaluator::AbstractEvaluator;
use crate::evaluator::Evaluator;
use crate::functions::{check_argument_count, Arity, Function, FunctionArgument, FunctionError};
use crate::runtime::Runtime;
use crate::types::Type;

/// `if(condition, then, otherwise)`: picks by the truthiness of `condition`.
///
/// All three arguments are evaluated eagerly.
pub struct If;

impl<R: Runtime> Function<R> for If {
    fn name(&self) -> &str {
        "if"
    }

    fn apply(&self, evaluator: &Evaluator<'_, R>, args: &[FunctionArgument<'_, R::Value>]) -> Result<R::Value, FunctionError> {
        check_argument_count(args, Arity::Exact(3))?;
        let rt = evaluator.runtime();
        let condition = args[0].expect_value(0)?;
        let (chosen, index) = if rt.is_truthy(condition) { (&args[1], 1) } else { (&args[2], 2) };
        Ok(chosen.expect_value(index)?.clone())
    }

    fn apply_abstract(&self, evaluator: &AbstractEvaluator<'_, R>, args: &[FunctionArgument<'_, Type>]) -> Result<Type, FunctionError> {
        check_argument_count(args, Arity::Exact(3))?;
        let condition = args[0].expect_type(0)?;
        let then = args[1].expect_type(1)?;
        let otherwise = args[2].expect_type(2)?;
        Ok(evaluator.runtime().if_then_else(condition, then, otherwise))
    }
}
