use log::debug;
use thiserror::Error;

use crate::ast::{Comparator, Expression, Node, Token};
use crate::lexer::{LexError, Lexer, Position, SpannedToken};
use crate::value::Value;

/// Deepest expression nesting the parser accepts before giving up.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Projection right-hand sides stop at tokens binding weaker than this.
const PROJECTION_STOP: u8 = 10;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("Syntax error at line {} column {}: {message}", position.line, position.column)]
    Syntax { position: Position, message: String },
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex(e) => e.position,
            ParseError::Syntax { position, .. } => *position,
        }
    }
}

/// Parses JMESPath text into an [`Expression`].
///
/// # Examples
///
/// ```
/// use jmespath_lattice::parse;
/// use jmespath_lattice::ast::Node;
///
/// let expr = parse("foo.bar").unwrap();
/// assert!(matches!(expr.node, Node::Subexpression { pipe: false, .. }));
/// assert!(parse("foo.").is_err());
/// ```
pub fn parse(text: &str) -> Result<Expression, ParseError> {
    Parser::new(Lexer::new(text))?.parse()
}

/// Top-down operator precedence (Pratt) parser.
pub struct Parser {
    tokens: Vec<SpannedToken>,
    index: usize,
    depth: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Result<Self, ParseError> {
        Ok(Parser {
            tokens: lexer.tokenize()?,
            index: 0,
            depth: 0,
        })
    }

    pub fn parse(&mut self) -> Result<Expression, ParseError> {
        let expr = self.expression(0)?;
        if self.current() != &Token::Eof {
            return Err(self.unexpected("end of expression"));
        }
        debug!("parsed expression {:?}", expr.node);
        Ok(expr)
    }

    fn current(&self) -> &Token {
        self.peek(0)
    }

    /// The token `offset` places ahead, clamped to the trailing `Eof`.
    fn spanned(&self, offset: usize) -> &SpannedToken {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.index + offset).min(last)]
    }

    fn peek(&self, offset: usize) -> &Token {
        &self.spanned(offset).token
    }

    fn current_position(&self) -> Position {
        self.spanned(0).position
    }

    /// Returns the current token and moves past it. Never moves past `Eof`.
    fn advance(&mut self) -> SpannedToken {
        let spanned = SpannedToken {
            token: self.current().clone(),
            position: self.current_position(),
        };
        if spanned.token != Token::Eof {
            self.index += 1;
        }
        spanned
    }

    fn expect(&mut self, expected: Token) -> Result<Position, ParseError> {
        if self.current() != &expected {
            return Err(self.unexpected(&expected.to_string()));
        }
        Ok(self.advance().position)
    }

    fn error(&self, position: Position, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            position,
            message: message.into(),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        self.error(
            self.current_position(),
            format!("Expected {}, but found {}", expected, self.current()),
        )
    }

    fn expression(&mut self, rbp: u8) -> Result<Expression, ParseError> {
        let entered = self.depth;
        let result = self.expression_with_depth(rbp);
        self.depth = entered;
        result
    }

    /// Counts one more level of tree depth. Recursive calls and every node
    /// `led` wraps around its left side both count.
    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(self.error(
                self.current_position(),
                format!(
                    "Expression exceeds the maximum nesting depth of {}",
                    MAX_NESTING_DEPTH
                ),
            ));
        }
        Ok(())
    }

    fn expression_with_depth(&mut self, rbp: u8) -> Result<Expression, ParseError> {
        self.descend()?;
        let mut left = self.nud()?;
        while rbp < self.current().lbp() {
            self.descend()?;
            left = self.led(left)?;
        }
        Ok(left)
    }

    fn nud(&mut self) -> Result<Expression, ParseError> {
        let SpannedToken { token, position } = self.advance();
        let node = match token {
            Token::At => Node::Current,
            Token::Identifier(name) => {
                if self.current() == &Token::LParen {
                    self.advance();
                    let args = self.parse_list(Token::RParen, true)?;
                    Node::Function { name, args }
                } else {
                    Node::Field(name)
                }
            }
            Token::QuotedIdentifier(name) => {
                if self.current() == &Token::LParen {
                    return Err(self.error(position, "Quoted identifiers cannot name a function"));
                }
                Node::Field(name)
            }
            Token::Literal(value) => Node::Literal(value),
            Token::RawString(s) => Node::Literal(Value::String(s)),
            Token::Star => {
                let right = self.parse_projection_rhs(Token::Star.lbp())?;
                Node::ObjectProjection {
                    left: Box::new(Expression::new(Node::Current, position)),
                    right: Box::new(right),
                }
            }
            Token::LBracket => return self.parse_nud_lbracket(position),
            Token::LBrace => return self.parse_multi_select_hash(position),
            Token::Flatten => {
                let flatten = Node::Flatten(Box::new(Expression::new(Node::Current, position)));
                let right = self.parse_projection_rhs(Token::Flatten.lbp())?;
                Node::Projection {
                    left: Box::new(Expression::new(flatten, position)),
                    right: Box::new(right),
                }
            }
            Token::Ampersand => {
                Node::ExpressionRef(Box::new(self.expression(Token::Ampersand.lbp())?))
            }
            Token::Not => Node::Not(Box::new(self.expression(Token::Not.lbp())?)),
            Token::Filter => {
                let current = Expression::new(Node::Current, position);
                return self.parse_filter(current, position);
            }
            Token::LParen => {
                let inner = self.expression(0)?;
                self.expect(Token::RParen)?;
                return Ok(inner);
            }
            other => {
                return Err(self.error(
                    position,
                    format!("Expected an expression, but found {}", other),
                ));
            }
        };
        Ok(Expression::new(node, position))
    }

    fn led(&mut self, left: Expression) -> Result<Expression, ParseError> {
        let SpannedToken { token, position } = self.advance();
        let left = Box::new(left);
        let node = match token {
            Token::Dot => {
                if self.current() == &Token::Star {
                    let star = self.advance().position;
                    let right = self.parse_projection_rhs(Token::Star.lbp())?;
                    return Ok(Expression::new(
                        Node::ObjectProjection {
                            left,
                            right: Box::new(right),
                        },
                        star,
                    ));
                }
                let start = left.position;
                let right = self.parse_dot_rhs(Token::Dot.lbp())?;
                return Ok(Expression::new(
                    Node::Subexpression {
                        left,
                        right: Box::new(right),
                        pipe: false,
                    },
                    start,
                ));
            }
            Token::Flatten => {
                let flatten = Expression::new(Node::Flatten(left), position);
                let right = self.parse_projection_rhs(Token::Flatten.lbp())?;
                Node::Projection {
                    left: Box::new(flatten),
                    right: Box::new(right),
                }
            }
            Token::Or => Node::Or {
                left,
                right: Box::new(self.expression(Token::Or.lbp())?),
            },
            Token::And => Node::And {
                left,
                right: Box::new(self.expression(Token::And.lbp())?),
            },
            Token::Pipe => Node::Subexpression {
                left,
                right: Box::new(self.expression(Token::Pipe.lbp())?),
                pipe: true,
            },
            Token::Filter => return self.parse_filter(*left, position),
            Token::LBracket => {
                if self.current() == &Token::Star && self.peek(1) == &Token::RBracket {
                    let star = self.advance().position;
                    self.advance();
                    let right = self.parse_projection_rhs(Token::Star.lbp())?;
                    return Ok(Expression::new(
                        Node::Projection {
                            left,
                            right: Box::new(right),
                        },
                        star,
                    ));
                }
                let start = left.position;
                let index = self.parse_index()?;
                return Ok(Expression::new(
                    Node::Subexpression {
                        left,
                        right: Box::new(index),
                        pipe: false,
                    },
                    start,
                ));
            }
            Token::Eq => self.parse_comparator(Comparator::Equal, left)?,
            Token::NotEq => self.parse_comparator(Comparator::NotEqual, left)?,
            Token::Lt => self.parse_comparator(Comparator::LessThan, left)?,
            Token::Lte => self.parse_comparator(Comparator::LessEqual, left)?,
            Token::Gt => self.parse_comparator(Comparator::GreaterThan, left)?,
            Token::Gte => self.parse_comparator(Comparator::GreaterEqual, left)?,
            other => {
                return Err(self.error(position, format!("Unexpected {}", other)));
            }
        };
        Ok(Expression::new(node, position))
    }

    fn parse_comparator(&mut self, op: Comparator, left: Box<Expression>) -> Result<Node, ParseError> {
        let right = self.expression(Token::Eq.lbp())?;
        Ok(Node::Comparator {
            op,
            left,
            right: Box::new(right),
        })
    }

    /// `[` has been consumed in prefix position.
    fn parse_nud_lbracket(&mut self, position: Position) -> Result<Expression, ParseError> {
        match self.current() {
            Token::Number(_) | Token::Colon => self.parse_index(),
            Token::Star if self.peek(1) == &Token::RBracket => {
                let star = self.advance().position;
                self.advance();
                let right = self.parse_projection_rhs(Token::Star.lbp())?;
                Ok(Expression::new(
                    Node::Projection {
                        left: Box::new(Expression::new(Node::Current, position)),
                        right: Box::new(right),
                    },
                    star,
                ))
            }
            _ => {
                let items = self.parse_list(Token::RBracket, false)?;
                Ok(Expression::new(Node::MultiSelectList(items), position))
            }
        }
    }

    /// Parses `n]` or a slice `start:stop:step]`; the opening `[` has been consumed.
    /// A slice starts a projection.
    fn parse_index(&mut self) -> Result<Expression, ParseError> {
        let start = self.current_position();
        let mut parts: [Option<i64>; 3] = [None; 3];
        let mut colons = 0;

        loop {
            match self.current() {
                Token::Colon => {
                    colons += 1;
                    if colons > 2 {
                        return Err(self.error(
                            self.current_position(),
                            "Too many colons in slice expression",
                        ));
                    }
                    self.advance();
                }
                Token::Number(n) if parts[colons].is_none() => {
                    parts[colons] = Some(*n);
                    self.advance();
                }
                Token::RBracket if colons > 0 || parts[0].is_some() => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("a number, ':' or ']'")),
            }
        }

        if colons == 0 {
            let index = parts[0].unwrap_or_default();
            return Ok(Expression::new(Node::Index(index), start));
        }

        let slice = Expression::new(
            Node::Slice {
                start: parts[0],
                stop: parts[1],
                step: parts[2].unwrap_or(1),
            },
            start,
        );
        let right = self.parse_projection_rhs(Token::Star.lbp())?;
        Ok(Expression::new(
            Node::Projection {
                left: Box::new(slice),
                right: Box::new(right),
            },
            start,
        ))
    }

    /// `[?` has been consumed.
    fn parse_filter(&mut self, left: Expression, position: Position) -> Result<Expression, ParseError> {
        let condition = self.expression(0)?;
        self.expect(Token::RBracket)?;
        let right = self.parse_projection_rhs(Token::Filter.lbp())?;
        Ok(Expression::new(
            Node::FilterProjection {
                left: Box::new(left),
                condition: Box::new(condition),
                right: Box::new(right),
            },
            position,
        ))
    }

    fn parse_projection_rhs(&mut self, rbp: u8) -> Result<Expression, ParseError> {
        match self.current() {
            Token::Dot => {
                self.advance();
                self.parse_dot_rhs(rbp)
            }
            Token::LBracket | Token::Filter => self.expression(rbp),
            token if token.lbp() < PROJECTION_STOP => {
                Ok(Expression::new(Node::Current, self.current_position()))
            }
            _ => Err(self.error(
                self.current_position(),
                format!("Invalid projection, unexpected {}", self.current()),
            )),
        }
    }

    fn parse_dot_rhs(&mut self, rbp: u8) -> Result<Expression, ParseError> {
        match self.current() {
            Token::LBracket => {
                let position = self.advance().position;
                let items = self.parse_list(Token::RBracket, false)?;
                Ok(Expression::new(Node::MultiSelectList(items), position))
            }
            Token::LBrace => {
                let position = self.advance().position;
                self.parse_multi_select_hash(position)
            }
            Token::Star | Token::Identifier(_) | Token::QuotedIdentifier(_) => self.expression(rbp),
            _ => Err(self.unexpected("an identifier, '*', '[' or '{' after '.'")),
        }
    }

    /// `{` has been consumed.
    fn parse_multi_select_hash(&mut self, position: Position) -> Result<Expression, ParseError> {
        let mut entries = Vec::new();
        loop {
            let key = match self.current() {
                Token::Identifier(key) | Token::QuotedIdentifier(key) => key.clone(),
                _ => return Err(self.unexpected("an identifier as multi-select hash key")),
            };
            self.advance();
            self.expect(Token::Colon)?;
            let value = self.expression(0)?;
            entries.push((key, value));

            match self.current() {
                Token::Comma => {
                    self.advance();
                    if self.current() == &Token::RBrace {
                        return Err(self.error(self.current_position(), "Invalid token after ','"));
                    }
                }
                Token::RBrace => {
                    self.advance();
                    break;
                }
                _ => return Err(self.unexpected("',' or '}'")),
            }
        }
        Ok(Expression::new(Node::MultiSelectHash(entries), position))
    }

    /// Comma separated expressions up to `close`; the opener has been consumed.
    fn parse_list(&mut self, close: Token, allow_empty: bool) -> Result<Vec<Expression>, ParseError> {
        let mut items = Vec::new();
        if self.current() == &close {
            if allow_empty {
                self.advance();
                return Ok(items);
            }
            return Err(self.unexpected("an expression"));
        }

        loop {
            items.push(self.expression(0)?);
            if self.current() == &Token::Comma {
                self.advance();
                if self.current() == &close {
                    return Err(self.error(self.current_position(), "Invalid token after ','"));
                }
            } else if self.current() == &close {
                self.advance();
                return Ok(items);
            } else {
                return Err(self.unexpected(&format!("',' or {}", close)));
            }
        }
    }
}
