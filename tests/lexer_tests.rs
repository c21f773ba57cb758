// tests/lexer_tests.rs

use jmespath_lattice::ast::Token;
use jmespath_lattice::lexer::{Lexer, Position, MAX_LITERAL_NESTING};
use jmespath_lattice::number::Number;
use jmespath_lattice::value::Value;

fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|t| t.token)
        .collect()
}

fn single(input: &str) -> Token {
    let mut lexer = Lexer::new(input);
    let token = lexer.next_token().unwrap().token;
    assert_eq!(lexer.next_token().unwrap().token, Token::Eof, "Trailing input for: {}", input);
    token
}

// ============================================================================
// Single Character Tokens
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        (".", Token::Dot),
        ("*", Token::Star),
        ("@", Token::At),
        ("&", Token::Ampersand),
        ("!", Token::Not),
        ("|", Token::Pipe),
        ("(", Token::LParen),
        (")", Token::RParen),
        ("[", Token::LBracket),
        ("]", Token::RBracket),
        ("{", Token::LBrace),
        ("}", Token::RBrace),
        (",", Token::Comma),
        (":", Token::Colon),
        ("<", Token::Lt),
        (">", Token::Gt),
    ];

    for (input, expected) in test_cases {
        assert_eq!(single(input), expected, "Failed for input: {}", input);
    }
}

// ============================================================================
// Two Character Tokens
// ============================================================================

#[test]
fn test_two_char_tokens() {
    let test_cases = vec![
        ("==", Token::Eq),
        ("!=", Token::NotEq),
        ("<=", Token::Lte),
        (">=", Token::Gte),
        ("||", Token::Or),
        ("&&", Token::And),
        ("[]", Token::Flatten),
        ("[?", Token::Filter),
    ];

    for (input, expected) in test_cases {
        assert_eq!(single(input), expected, "Failed for input: {}", input);
    }
}

#[test]
fn test_bracket_with_space_is_not_flatten() {
    assert_eq!(tokens("[ ]"), vec![Token::LBracket, Token::RBracket, Token::Eof]);
}

// ============================================================================
// Identifiers
// ============================================================================

#[test]
fn test_identifiers() {
    assert_eq!(single("foo"), Token::Identifier("foo".to_string()));
    assert_eq!(single("_private"), Token::Identifier("_private".to_string()));
    assert_eq!(single("item_2"), Token::Identifier("item_2".to_string()));
}

#[test]
fn test_quoted_identifiers() {
    assert_eq!(single(r#""with space""#), Token::QuotedIdentifier("with space".to_string()));
    assert_eq!(single(r#""a\"b""#), Token::QuotedIdentifier("a\"b".to_string()));
    assert_eq!(single(r#""\n\t""#), Token::QuotedIdentifier("\n\t".to_string()));
    assert_eq!(single(r#""é""#), Token::QuotedIdentifier("é".to_string()));
    assert_eq!(single(r#""😀""#), Token::QuotedIdentifier("😀".to_string()));
}

#[test]
fn test_quoted_identifier_errors() {
    assert!(Lexer::new(r#""open"#).tokenize().is_err());
    assert!(Lexer::new(r#""\q""#).tokenize().is_err());
    assert!(Lexer::new(r#""\u12""#).tokenize().is_err());
    assert!(Lexer::new(r#""\ud83d""#).tokenize().is_err());
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(single("0"), Token::Number(0));
    assert_eq!(single("42"), Token::Number(42));
    assert_eq!(single("-1"), Token::Number(-1));
}

#[test]
fn test_number_errors() {
    assert!(Lexer::new("-").tokenize().is_err());
    assert!(Lexer::new("99999999999999999999").tokenize().is_err());
}

// ============================================================================
// Literals and Raw Strings
// ============================================================================

#[test]
fn test_json_literals() {
    assert_eq!(single("`true`"), Token::Literal(Value::Boolean(true)));
    assert_eq!(single("`null`"), Token::Literal(Value::Null));
    assert_eq!(single("`\"a\"`"), Token::Literal(Value::from("a")));
    assert_eq!(
        single("`[1, 2]`"),
        Token::Literal(Value::from(vec![Value::from(1), Value::from(2)]))
    );
}

#[test]
fn test_escaped_backtick_in_literal() {
    assert_eq!(single(r#"`"a\`b"`"#), Token::Literal(Value::from("a`b")));
}

#[test]
fn test_invalid_literals() {
    assert!(Lexer::new("`{`").tokenize().is_err());
    assert!(Lexer::new("`true").tokenize().is_err());
}

#[test]
fn test_wide_integer_literals_keep_precision() {
    match single("`100000000000000000000`") {
        Token::Literal(Value::Number(Number::BigInteger(v))) => assert_eq!(v, 100_000_000_000_000_000_000),
        other => panic!("expected a big integer literal, got {:?}", other),
    }
    match single("`[18446744073709551615]`") {
        Token::Literal(Value::Array(items)) => {
            assert!(matches!(items[0], Value::Number(Number::BigInteger(v)) if v == i128::from(u64::MAX)))
        }
        other => panic!("expected an array literal, got {:?}", other),
    }
    assert!(matches!(single("`42`"), Token::Literal(Value::Number(Number::Long(42)))));
    assert!(matches!(single("`2.5`"), Token::Literal(Value::Number(Number::Double(v))) if v == 2.5));
    assert!(Lexer::new("`1e400`").tokenize().is_err());
}

#[test]
fn test_literal_nesting_limit() {
    let ok = format!("`{}{}`", "[".repeat(MAX_LITERAL_NESTING), "]".repeat(MAX_LITERAL_NESTING));
    assert!(Lexer::new(&ok).tokenize().is_ok());

    let deep = MAX_LITERAL_NESTING + 1;
    let too_deep = format!("`{}{}`", "[".repeat(deep), "]".repeat(deep));
    let err = Lexer::new(&too_deep).tokenize().unwrap_err();
    assert!(err.message.contains("nesting depth"), "{}", err);
}

#[test]
fn test_raw_strings() {
    assert_eq!(single("'hello'"), Token::RawString("hello".to_string()));
    assert_eq!(single(r"'it\'s'"), Token::RawString("it's".to_string()));
    assert_eq!(single(r"'a\nb'"), Token::RawString(r"a\nb".to_string()));
    assert!(Lexer::new("'open").tokenize().is_err());
}

// ============================================================================
// Sequences and Positions
// ============================================================================

#[test]
fn test_filter_expression_tokens() {
    assert_eq!(
        tokens("people[?age >= `30`].name"),
        vec![
            Token::Identifier("people".to_string()),
            Token::Filter,
            Token::Identifier("age".to_string()),
            Token::Gte,
            Token::Literal(Value::from(30)),
            Token::RBracket,
            Token::Dot,
            Token::Identifier("name".to_string()),
            Token::Eof,
        ]
    );
}

#[test]
fn test_function_call_tokens() {
    assert_eq!(
        tokens("sort_by(@, &a)"),
        vec![
            Token::Identifier("sort_by".to_string()),
            Token::LParen,
            Token::At,
            Token::Comma,
            Token::Ampersand,
            Token::Identifier("a".to_string()),
            Token::RParen,
            Token::Eof,
        ]
    );
}

#[test]
fn test_token_positions() {
    let spanned = Lexer::new("foo.bar\n  [0]").tokenize().unwrap();
    let positions: Vec<Position> = spanned.iter().map(|t| t.position).collect();
    assert_eq!(
        positions,
        vec![
            Position::new(1, 1),
            Position::new(1, 4),
            Position::new(1, 5),
            Position::new(2, 3),
            Position::new(2, 4),
            Position::new(2, 5),
            Position::new(2, 6),
        ]
    );
}

#[test]
fn test_unexpected_character() {
    let err = Lexer::new("foo ^").tokenize().unwrap_err();
    assert_eq!(err.position, Position::new(1, 5));
    assert_eq!(err.to_string(), "Syntax error at line 1 column 5: Unexpected character '^'");
}

#[test]
fn test_binding_powers() {
    assert_eq!(Token::Pipe.lbp(), 1);
    assert_eq!(Token::Or.lbp(), 2);
    assert_eq!(Token::And.lbp(), 3);
    assert_eq!(Token::Lt.lbp(), 5);
    assert_eq!(Token::Flatten.lbp(), 9);
    assert_eq!(Token::Star.lbp(), 20);
    assert_eq!(Token::Filter.lbp(), 21);
    assert_eq!(Token::Dot.lbp(), 40);
    assert_eq!(Token::Not.lbp(), 45);
    assert_eq!(Token::LBrace.lbp(), 50);
    assert_eq!(Token::LBracket.lbp(), 55);
    assert_eq!(Token::LParen.lbp(), 60);
    assert_eq!(Token::Identifier("x".to_string()).lbp(), 0);
}
