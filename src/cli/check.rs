//! Execute JMESPath expressions against JSON input

use log::debug;

use super::CliError;
use crate::{parse, FunctionRegistry, JsonRuntime};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to execute
    pub query: String,
    /// JSON input string
    pub input: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
    /// Only validate syntax, don't execute
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression executed successfully with JSON output
    Success(serde_json::Value),
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let expr = parse(&options.query)?;
    debug!("parsed {:?} as {}", options.query, expr);

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let document: serde_json::Value = serde_json::from_str(json_str)?;

    let functions = FunctionRegistry::<JsonRuntime>::builtins();
    let output = expr.evaluate(&document, &JsonRuntime, &functions)?;
    Ok(CheckResult::Success(output))
}
