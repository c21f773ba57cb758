use std::fmt;

use crate::value::Value;

/// Lexical tokens of a JMESPath expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Unquoted identifier
    ///
    /// Must start with an ASCII letter or underscore, followed by ASCII letters,
    /// digits, or underscores.
    ///
    /// # Examples
    /// ```text
    /// foo
    /// _private
    /// item_2
    /// ```
    Identifier(String),

    /// Identifier enclosed in double quotes, with JSON escapes
    ///
    /// # Examples
    /// ```text
    /// "with space"
    /// "é"
    /// ```
    QuotedIdentifier(String),

    /// JSON literal enclosed in backticks
    ///
    /// # Examples
    /// ```text
    /// `true`
    /// `[1, 2, 3]`
    /// `{"a": "b"}`
    /// ```
    Literal(Value),

    /// Raw string literal enclosed in single quotes
    ///
    /// `\'` is an escaped quote; other characters are taken verbatim.
    ///
    /// # Examples
    /// ```text
    /// 'hello'
    /// 'it\'s'
    /// ```
    RawString(String),

    /// Signed integer, used by index and slice expressions
    ///
    /// # Examples
    /// ```text
    /// 0
    /// -1
    /// ```
    Number(i64),

    /// `.` sub-expression separator
    Dot,
    /// `*` wildcard
    Star,
    /// `[]` flatten
    Flatten,
    /// `[?` filter opener
    Filter,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Colon,

    /// `|` pipe
    Pipe,
    /// `||`
    Or,
    /// `&&`
    And,
    /// `&` expression reference
    Ampersand,
    /// `!`
    Not,

    // Comparators
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,

    /// `@` current node
    At,

    /// End of input
    Eof,
}

impl Token {
    /// Left binding power used by the Pratt parser.
    ///
    /// ```text
    /// |  1    ||  2    &&  3    == != < <= > >=  5
    /// [] 9    *  20    [? 21    .  40    !  45
    /// {  50   [  55    (  60    everything else 0
    /// ```
    pub fn lbp(&self) -> u8 {
        match self {
            Token::Pipe => 1,
            Token::Or => 2,
            Token::And => 3,
            Token::Eq | Token::NotEq | Token::Lt | Token::Lte | Token::Gt | Token::Gte => 5,
            Token::Flatten => 9,
            Token::Star => 20,
            Token::Filter => 21,
            Token::Dot => 40,
            Token::Not => 45,
            Token::LBrace => 50,
            Token::LBracket => 55,
            Token::LParen => 60,
            _ => 0,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Identifier(name) => write!(f, "identifier '{}'", name),
            Token::QuotedIdentifier(name) => write!(f, "quoted identifier \"{}\"", name),
            Token::Literal(value) => write!(f, "literal `{}`", value),
            Token::RawString(s) => write!(f, "raw string '{}'", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::Dot => f.write_str("'.'"),
            Token::Star => f.write_str("'*'"),
            Token::Flatten => f.write_str("'[]'"),
            Token::Filter => f.write_str("'[?'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::Colon => f.write_str("':'"),
            Token::Pipe => f.write_str("'|'"),
            Token::Or => f.write_str("'||'"),
            Token::And => f.write_str("'&&'"),
            Token::Ampersand => f.write_str("'&'"),
            Token::Not => f.write_str("'!'"),
            Token::Eq => f.write_str("'=='"),
            Token::NotEq => f.write_str("'!='"),
            Token::Lt => f.write_str("'<'"),
            Token::Lte => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::Gte => f.write_str("'>='"),
            Token::At => f.write_str("'@'"),
            Token::Eof => f.write_str("end of expression"),
        }
    }
}
