pub mod abstract_evaluator;
pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod evaluator;
pub mod functions;
pub mod json;
pub mod lexer;
pub mod lint;
pub mod number;
pub mod output;
pub mod parser;
pub mod runtime;
pub mod serializer;
pub mod types;
pub mod value;

pub use abstract_evaluator::{AbstractEvaluator, TypeRuntime, DEFAULT_ITERATION_LIMIT};
pub use ast::{Comparator, Expression, Node, Token};
pub use evaluator::{EvalError, Evaluator};
pub use functions::{Arity, Function, FunctionArgument, FunctionError, FunctionRegistry};
pub use json::JsonRuntime;
pub use lexer::{LexError, Lexer, Position};
pub use lint::{lint, ExpressionProblem, LinterResult, Severity};
pub use number::{Number, NumberType};
pub use output::{to_json, to_json_pretty};
pub use parser::{parse, ParseError, Parser};
pub use runtime::{Runtime, RuntimeType, RuntimeTypes, ValueFactory, ValueRuntime};
pub use serializer::ExpressionSerializer;
pub use types::{ErrorKind, Type};
pub use value::Value;
