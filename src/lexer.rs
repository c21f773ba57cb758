use std::fmt;

use thiserror::Error;

use crate::ast::Token;
use crate::value::Value;

/// Deepest nesting accepted inside a backtick JSON literal.
pub const MAX_LITERAL_NESTING: usize = 50;

/// A 1-based line and column in the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new(1, 1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Syntax error at line {} column {}: {message}", position.line, position.column)]
pub struct LexError {
    pub position: Position,
    pub message: String,
}

impl LexError {
    fn new(position: Position, message: impl Into<String>) -> Self {
        LexError {
            position,
            message: message.into(),
        }
    }
}

/// A token together with the position of its first character.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub position: Position,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn location(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn advance(&mut self) {
        match self.current_char() {
            Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            // A lone '\r' is a line break; in "\r\n" the '\n' does the counting
            Some('\r') if self.peek_char(1) != Some('\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => {}
        }
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if matches!(ch, ' ' | '\t' | '\n' | '\r') {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Consumes `second` if it follows, returning `double`, else `single`.
    fn either(&mut self, second: char, double: Token, single: Token) -> Token {
        self.advance();
        if self.current_char() == Some(second) {
            self.advance();
            double
        } else {
            single
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_number(&mut self, start: Position) -> Result<Token, LexError> {
        let mut number = String::new();
        if self.current_char() == Some('-') {
            number.push('-');
            self.advance();
        }
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        if number == "-" {
            return Err(LexError::new(start, "Expected a digit after '-'"));
        }
        number
            .parse::<i64>()
            .map(Token::Number)
            .map_err(|_| LexError::new(start, format!("Number {} is out of range", number)))
    }

    fn read_hex_escape(&mut self, start: Position) -> Result<u32, LexError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .current_char()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| LexError::new(start, "Invalid unicode escape, expected 4 hex digits"))?;
            code = code * 16 + digit;
            self.advance();
        }
        Ok(code)
    }

    /// Reads a double-quoted string with JSON escapes. The opening quote is current.
    fn read_quoted(&mut self, start: Position) -> Result<String, LexError> {
        let mut result = String::new();
        self.advance();

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    let escaped = match self.current_char() {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('/') => '/',
                        Some('b') => '\u{08}',
                        Some('f') => '\u{0c}',
                        Some('n') => '\n',
                        Some('r') => '\r',
                        Some('t') => '\t',
                        Some('u') => {
                            self.advance();
                            result.push(self.read_unicode(start)?);
                            continue;
                        }
                        Some(other) => {
                            return Err(LexError::new(
                                self.location(),
                                format!("Invalid escape sequence: \\{}", other),
                            ));
                        }
                        None => break,
                    };
                    result.push(escaped);
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::new(start, "Unterminated quoted identifier"))
    }

    fn read_unicode(&mut self, start: Position) -> Result<char, LexError> {
        let high = self.read_hex_escape(start)?;
        if (0xD800..0xDC00).contains(&high) {
            if self.current_char() == Some('\\') && self.peek_char(1) == Some('u') {
                self.advance();
                self.advance();
                let low = self.read_hex_escape(start)?;
                if (0xDC00..0xE000).contains(&low) {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    if let Some(c) = char::from_u32(code) {
                        return Ok(c);
                    }
                }
            }
            return Err(LexError::new(start, "Invalid surrogate pair in unicode escape"));
        }
        char::from_u32(high).ok_or_else(|| LexError::new(start, "Invalid unicode escape"))
    }

    /// Reads a single-quoted raw string. The opening quote is current.
    fn read_raw_string(&mut self, start: Position) -> Result<String, LexError> {
        let mut result = String::new();
        self.advance();

        while let Some(ch) = self.current_char() {
            match ch {
                '\'' => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance();
                    match self.current_char() {
                        Some(c @ ('\'' | '\\')) => {
                            result.push(c);
                            self.advance();
                        }
                        _ => result.push('\\'),
                    }
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::new(start, "Unterminated raw string literal"))
    }

    /// Reads a backtick JSON literal. The opening backtick is current.
    fn read_literal(&mut self, start: Position) -> Result<Value, LexError> {
        let mut text = String::new();
        self.advance();

        loop {
            match self.current_char() {
                Some('`') => {
                    self.advance();
                    break;
                }
                Some('\\') if self.peek_char(1) == Some('`') => {
                    text.push('`');
                    self.advance();
                    self.advance();
                }
                Some(ch) => {
                    text.push(ch);
                    self.advance();
                }
                None => return Err(LexError::new(start, "Unterminated JSON literal")),
            }
        }

        let json: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| LexError::new(start, format!("Invalid JSON literal: {}", e)))?;
        if nesting_depth(&json) > MAX_LITERAL_NESTING {
            return Err(LexError::new(
                start,
                format!(
                    "JSON literal exceeds the maximum nesting depth of {}",
                    MAX_LITERAL_NESTING
                ),
            ));
        }
        let value = Value::from(json);
        if !all_finite(&value) {
            return Err(LexError::new(start, "Number in JSON literal is out of range"));
        }
        Ok(value)
    }

    pub fn next_token(&mut self) -> Result<SpannedToken, LexError> {
        self.skip_whitespace();
        let start = self.location();

        let token = match self.current_char() {
            None => Token::Eof,
            Some('.') => {
                self.advance();
                Token::Dot
            }
            Some('*') => {
                self.advance();
                Token::Star
            }
            Some(',') => {
                self.advance();
                Token::Comma
            }
            Some(':') => {
                self.advance();
                Token::Colon
            }
            Some('@') => {
                self.advance();
                Token::At
            }
            Some('(') => {
                self.advance();
                Token::LParen
            }
            Some(')') => {
                self.advance();
                Token::RParen
            }
            Some('{') => {
                self.advance();
                Token::LBrace
            }
            Some('}') => {
                self.advance();
                Token::RBrace
            }
            Some(']') => {
                self.advance();
                Token::RBracket
            }
            Some('[') => {
                self.advance();
                match self.current_char() {
                    Some(']') => {
                        self.advance();
                        Token::Flatten
                    }
                    Some('?') => {
                        self.advance();
                        Token::Filter
                    }
                    _ => Token::LBracket,
                }
            }
            Some('|') => self.either('|', Token::Or, Token::Pipe),
            Some('&') => self.either('&', Token::And, Token::Ampersand),
            Some('!') => self.either('=', Token::NotEq, Token::Not),
            Some('<') => self.either('=', Token::Lte, Token::Lt),
            Some('>') => self.either('=', Token::Gte, Token::Gt),
            Some('=') => {
                self.advance();
                if self.current_char() != Some('=') {
                    return Err(LexError::new(start, "Invalid token '=', did you mean '=='?"));
                }
                self.advance();
                Token::Eq
            }
            Some('"') => Token::QuotedIdentifier(self.read_quoted(start)?),
            Some('\'') => Token::RawString(self.read_raw_string(start)?),
            Some('`') => Token::Literal(self.read_literal(start)?),
            Some(ch) if ch == '-' || ch.is_ascii_digit() => self.read_number(start)?,
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
                Token::Identifier(self.read_identifier())
            }
            Some(ch) => {
                return Err(LexError::new(start, format!("Unexpected character '{}'", ch)));
            }
        };

        Ok(SpannedToken {
            token,
            position: start,
        })
    }

    /// Lexes the whole input. The last token is always [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

fn nesting_depth(value: &serde_json::Value) -> usize {
    match value {
        serde_json::Value::Array(items) => 1 + items.iter().map(nesting_depth).max().unwrap_or(0),
        serde_json::Value::Object(map) => 1 + map.values().map(nesting_depth).max().unwrap_or(0),
        _ => 0,
    }
}

fn all_finite(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_finite(),
        Value::Array(items) => items.iter().all(all_finite),
        Value::Object(members) => members.values().all(all_finite),
        _ => true,
    }
}

#[cfg(test)]
fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.token)
        .collect()
}

#[test]
fn test_bracket_forms() {
    assert_eq!(
        tokens("a[] [? [0]"),
        vec![
            Token::Identifier("a".to_string()),
            Token::Flatten,
            Token::Filter,
            Token::LBracket,
            Token::Number(0),
            Token::RBracket,
            Token::Eof,
        ]
    );
}

#[test]
fn test_double_character_operators() {
    assert_eq!(
        tokens("| || & && ! != < <= > >= =="),
        vec![
            Token::Pipe,
            Token::Or,
            Token::Ampersand,
            Token::And,
            Token::Not,
            Token::NotEq,
            Token::Lt,
            Token::Lte,
            Token::Gt,
            Token::Gte,
            Token::Eq,
            Token::Eof,
        ]
    );
}

#[test]
fn test_positions_across_lines() {
    let spanned = Lexer::new("a\r\n  .b").tokenize().unwrap();
    assert_eq!(spanned[0].position, Position::new(1, 1));
    assert_eq!(spanned[1].position, Position::new(2, 3));
    assert_eq!(spanned[2].position, Position::new(2, 4));
}

#[test]
fn test_single_equals_is_an_error() {
    let err = Lexer::new("a = b").tokenize().unwrap_err();
    assert_eq!(err.position, Position::new(1, 3));
}
