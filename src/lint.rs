//! Static checks on an expression, driven by abstract evaluation.

use std::fmt;

use crate::abstract_evaluator::AbstractEvaluator;
use crate::ast::Expression;
use crate::functions::FunctionRegistry;
use crate::lexer::Position;
use crate::runtime::Runtime;
use crate::types::Type;

/// How bad a problem is, from the worst down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Evaluation fails for every input of the given type.
    Error,
    /// The expression can only produce `null` here.
    Danger,
    /// Suspicious but not certainly wrong.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Error => "ERROR",
            Severity::Danger => "DANGER",
            Severity::Warning => "WARNING",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpressionProblem {
    pub severity: Severity,
    pub message: String,
    pub position: Position,
}

impl ExpressionProblem {
    pub fn new(severity: Severity, message: impl Into<String>, position: Position) -> Self {
        ExpressionProblem {
            severity,
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ExpressionProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.severity, self.message, self.position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinterResult {
    /// Predicted type of the result.
    pub result: Type,
    /// Problems ordered by position, then severity.
    pub problems: Vec<ExpressionProblem>,
}

impl LinterResult {
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(|p| p.severity == Severity::Error)
    }

    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ExpressionProblem> {
        self.problems.iter().filter(move |p| p.severity == severity)
    }
}

pub fn lint<R: Runtime>(expr: &Expression, input: &Type, functions: &FunctionRegistry<R>) -> LinterResult {
    lint_with(AbstractEvaluator::new(functions), expr, input)
}

/// Lints with a configured evaluator, e.g. one with a custom iteration limit.
pub fn lint_with<R: Runtime>(evaluator: AbstractEvaluator<'_, R>, expr: &Expression, input: &Type) -> LinterResult {
    let result = evaluator.evaluate(expr, input);
    let mut problems = evaluator.into_problems();
    problems.sort_by(|a, b| {
        (a.position, a.severity, &a.message).cmp(&(b.position, b.severity, &b.message))
    });
    problems.dedup();
    LinterResult { result, problems }
}
