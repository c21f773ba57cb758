//! Static analysis and formatting of expressions

use super::CliError;
use crate::{parse, AbstractEvaluator, FunctionRegistry, JsonRuntime, LinterResult, Type, DEFAULT_ITERATION_LIMIT};

/// Options for the lint command
#[derive(Debug, Clone)]
pub struct LintOptions {
    pub query: String,
    /// Sample JSON document; its exact type is used as the input type
    pub sample: Option<String>,
    pub iteration_limit: usize,
}

impl Default for LintOptions {
    fn default() -> Self {
        LintOptions {
            query: String::new(),
            sample: None,
            iteration_limit: DEFAULT_ITERATION_LIMIT,
        }
    }
}

#[derive(Debug)]
pub struct LintReport {
    pub input: Type,
    pub result: LinterResult,
}

/// Lint an expression against the type of a sample document, or `any`.
pub fn execute_lint(options: &LintOptions) -> Result<LintReport, CliError> {
    let expr = parse(&options.query)?;
    let input = match &options.sample {
        Some(sample) => {
            let document: serde_json::Value = serde_json::from_str(sample)?;
            Type::of(&document, &JsonRuntime)
        }
        None => Type::Any,
    };

    let functions = FunctionRegistry::<JsonRuntime>::builtins();
    let evaluator = AbstractEvaluator::new(&functions).with_iteration_limit(options.iteration_limit);
    let result = crate::lint::lint_with(evaluator, &expr, &input);
    Ok(LintReport { input, result })
}

/// Parse an expression and render it canonically.
pub fn execute_fmt(query: &str) -> Result<String, CliError> {
    Ok(parse(query)?.serialize())
}
