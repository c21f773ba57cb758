use crate::abstract_evaluator::AbstractEvaluator;
use crate::ast::Comparator;
use crate::evaluator::{EvalError, Evaluator};
use crate::functions::FunctionRegistry;
use crate::lexer::Position;
use crate::lint::{self, LinterResult};
use crate::parser::{self, ParseError};
use crate::runtime::Runtime;
use crate::serializer::ExpressionSerializer;
use crate::types::Type;
use crate::value::Value;

/// A parsed JMESPath expression: an AST node and where it starts in the source.
///
/// Equality compares the tree structure only; positions are ignored, so a
/// re-parsed serialization compares equal to the original.
#[derive(Debug, Clone)]
pub struct Expression {
    pub node: Node,
    pub position: Position,
}

/// Abstract Syntax Tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Current node (`@`)
    Current,

    /// Object field access
    ///
    /// # Example
    /// ```text
    /// foo
    /// "foo bar"
    /// ```
    Field(String),

    /// Array index, negative values count from the end
    ///
    /// # Example
    /// ```text
    /// [0]
    /// [-1]
    /// ```
    Index(i64),

    /// Array slice; `step` defaults to 1
    ///
    /// # Example
    /// ```text
    /// [1:3]
    /// [::-1]
    /// ```
    Slice {
        start: Option<i64>,
        stop: Option<i64>,
        step: i64,
    },

    /// JSON literal or raw string
    ///
    /// # Example
    /// ```text
    /// `[1, 2]`
    /// 'text'
    /// ```
    Literal(Value),

    /// Evaluates `right` against the result of `left`.
    ///
    /// `pipe` distinguishes `a | b` from `a.b` / `a[0]`; the two differ only in
    /// how they bind to projections.
    Subexpression {
        left: Box<Expression>,
        right: Box<Expression>,
        pipe: bool,
    },

    /// List projection: applies `right` to each element of `left`
    ///
    /// # Example
    /// ```text
    /// foo[*].bar
    /// foo[1:].bar
    /// ```
    Projection {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Filter projection
    ///
    /// # Example
    /// ```text
    /// foo[?age > `18`].name
    /// ```
    FilterProjection {
        left: Box<Expression>,
        condition: Box<Expression>,
        right: Box<Expression>,
    },

    /// Object projection over the values of `left`
    ///
    /// # Example
    /// ```text
    /// foo.*.bar
    /// ```
    ObjectProjection {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Flattens one level of nested arrays
    ///
    /// # Example
    /// ```text
    /// foo[]
    /// ```
    Flatten(Box<Expression>),

    /// Multi-select list
    ///
    /// # Example
    /// ```text
    /// [foo, bar]
    /// ```
    MultiSelectList(Vec<Expression>),

    /// Multi-select hash, keys keep their source order
    ///
    /// # Example
    /// ```text
    /// {a: foo, b: bar}
    /// ```
    MultiSelectHash(Vec<(String, Expression)>),

    /// Comparison
    Comparator {
        op: Comparator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// `left && right`
    And {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// `left || right`
    Or {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// `!expr`
    Not(Box<Expression>),

    /// Function call
    ///
    /// # Example
    /// ```text
    /// length(foo)
    /// sort_by(people, &age)
    /// ```
    Function {
        name: String,
        args: Vec<Expression>,
    },

    /// Expression reference (`&expr`), passed to functions unevaluated
    ExpressionRef(Box<Expression>),
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl From<Node> for Expression {
    fn from(node: Node) -> Self {
        Expression::new(node, Position::default())
    }
}

impl Expression {
    pub fn new(node: Node, position: Position) -> Self {
        Expression { node, position }
    }

    pub fn parse(text: &str) -> Result<Expression, ParseError> {
        parser::parse(text)
    }

    /// Canonical JMESPath text for this expression.
    pub fn serialize(&self) -> String {
        ExpressionSerializer::serialize(self)
    }

    pub fn evaluate<R: Runtime>(
        &self,
        current: &R::Value,
        runtime: &R,
        functions: &FunctionRegistry<R>,
    ) -> Result<R::Value, EvalError> {
        Evaluator::new(runtime, functions).evaluate(self, current)
    }

    /// Predicts the result type of evaluating against any value of `input`.
    pub fn evaluate_abstract<R: Runtime>(&self, input: &Type, functions: &FunctionRegistry<R>) -> Type {
        AbstractEvaluator::new(functions).evaluate(self, input)
    }

    pub fn lint<R: Runtime>(&self, input: &Type, functions: &FunctionRegistry<R>) -> LinterResult {
        lint::lint(self, input, functions)
    }

    /// Rebuilds the tree, replacing every node for which `replace` returns
    /// `Some`. Replacements are inserted as-is and not visited again.
    pub fn substitute<F>(&self, replace: &F) -> Expression
    where
        F: Fn(&Expression) -> Option<Expression>,
    {
        if let Some(replacement) = replace(self) {
            return replacement;
        }

        let sub = |e: &Expression| Box::new(e.substitute(replace));
        let node = match &self.node {
            Node::Current => Node::Current,
            Node::Field(name) => Node::Field(name.clone()),
            Node::Index(index) => Node::Index(*index),
            Node::Slice { start, stop, step } => Node::Slice {
                start: *start,
                stop: *stop,
                step: *step,
            },
            Node::Literal(value) => Node::Literal(value.clone()),
            Node::Subexpression { left, right, pipe } => Node::Subexpression {
                left: sub(left),
                right: sub(right),
                pipe: *pipe,
            },
            Node::Projection { left, right } => Node::Projection {
                left: sub(left),
                right: sub(right),
            },
            Node::FilterProjection {
                left,
                condition,
                right,
            } => Node::FilterProjection {
                left: sub(left),
                condition: sub(condition),
                right: sub(right),
            },
            Node::ObjectProjection { left, right } => Node::ObjectProjection {
                left: sub(left),
                right: sub(right),
            },
            Node::Flatten(inner) => Node::Flatten(sub(inner)),
            Node::MultiSelectList(items) => {
                Node::MultiSelectList(items.iter().map(|e| e.substitute(replace)).collect())
            }
            Node::MultiSelectHash(entries) => Node::MultiSelectHash(
                entries
                    .iter()
                    .map(|(key, e)| (key.clone(), e.substitute(replace)))
                    .collect(),
            ),
            Node::Comparator { op, left, right } => Node::Comparator {
                op: *op,
                left: sub(left),
                right: sub(right),
            },
            Node::And { left, right } => Node::And {
                left: sub(left),
                right: sub(right),
            },
            Node::Or { left, right } => Node::Or {
                left: sub(left),
                right: sub(right),
            },
            Node::Not(inner) => Node::Not(sub(inner)),
            Node::Function { name, args } => Node::Function {
                name: name.clone(),
                args: args.iter().map(|e| e.substitute(replace)).collect(),
            },
            Node::ExpressionRef(inner) => Node::ExpressionRef(sub(inner)),
        };
        Expression::new(node, self.position)
    }
}
