//! CLI support for jmespath-lattice
//!
//! Provides programmatic access to the `jmes` subcommands so they can be
//! embedded in other tools.

mod check;
mod lint;

pub use check::{execute_check, CheckOptions, CheckResult};
pub use lint::{execute_fmt, execute_lint, LintOptions, LintReport};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Parser error
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),
    /// Evaluation error
    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),
    /// JSON parsing error
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// No input provided
    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
    /// The linter found at least one ERROR
    #[error("{0} error(s) found")]
    LintFailed(usize),
}
