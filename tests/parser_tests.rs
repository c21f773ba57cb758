// tests/parser_tests.rs

use jmespath_lattice::ast::{Comparator, Expression, Node};
use jmespath_lattice::parser::{parse, ParseError, MAX_NESTING_DEPTH};
use jmespath_lattice::lexer::Position;
use jmespath_lattice::value::Value;

fn expr(node: Node) -> Expression {
    Expression::from(node)
}

fn current() -> Expression {
    expr(Node::Current)
}

fn field(name: &str) -> Expression {
    expr(Node::Field(name.to_string()))
}

fn sub(left: Expression, right: Expression) -> Expression {
    expr(Node::Subexpression {
        left: Box::new(left),
        right: Box::new(right),
        pipe: false,
    })
}

fn pipe(left: Expression, right: Expression) -> Expression {
    expr(Node::Subexpression {
        left: Box::new(left),
        right: Box::new(right),
        pipe: true,
    })
}

fn projection(left: Expression, right: Expression) -> Expression {
    expr(Node::Projection {
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn compare(op: Comparator, left: Expression, right: Expression) -> Expression {
    expr(Node::Comparator {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

fn literal(value: impl Into<Value>) -> Expression {
    expr(Node::Literal(value.into()))
}

fn syntax_message(text: &str) -> String {
    match parse(text) {
        Err(ParseError::Syntax { message, .. }) => message,
        other => panic!("expected a syntax error for {:?}, got {:?}", text, other),
    }
}

// ============================================================================
// Basic Expressions
// ============================================================================

#[test]
fn test_parse_field() {
    assert_eq!(parse("foo").unwrap(), field("foo"));
    assert_eq!(parse("\"foo bar\"").unwrap(), field("foo bar"));
}

#[test]
fn test_parse_current() {
    assert_eq!(parse("@").unwrap(), current());
}

#[test]
fn test_parse_subexpression() {
    assert_eq!(parse("foo.bar").unwrap(), sub(field("foo"), field("bar")));
    assert_eq!(
        parse("a.b.c").unwrap(),
        sub(sub(field("a"), field("b")), field("c"))
    );
}

#[test]
fn test_parse_index() {
    assert_eq!(parse("[0]").unwrap(), expr(Node::Index(0)));
    assert_eq!(parse("foo[-1]").unwrap(), sub(field("foo"), expr(Node::Index(-1))));
}

#[test]
fn test_parse_literals() {
    assert_eq!(parse("`true`").unwrap(), literal(true));
    assert_eq!(parse("`\"x\"`").unwrap(), literal("x"));
    assert_eq!(parse("'raw'").unwrap(), literal("raw"));
    assert_eq!(parse("`null`").unwrap(), literal(Value::Null));
}

// ============================================================================
// Projections
// ============================================================================

#[test]
fn test_parse_list_projection() {
    assert_eq!(parse("foo[*]").unwrap(), projection(field("foo"), current()));
    assert_eq!(parse("foo[*].bar").unwrap(), projection(field("foo"), field("bar")));
    assert_eq!(parse("[*]").unwrap(), projection(current(), current()));
}

#[test]
fn test_projection_captures_the_rest_of_the_path() {
    assert_eq!(
        parse("foo[*].bar.baz").unwrap(),
        projection(field("foo"), sub(field("bar"), field("baz")))
    );
    assert_eq!(
        parse("foo[*].bar[0]").unwrap(),
        projection(field("foo"), sub(field("bar"), expr(Node::Index(0))))
    );
}

#[test]
fn test_pipe_stops_projection() {
    assert_eq!(
        parse("foo[*].bar | [0]").unwrap(),
        pipe(projection(field("foo"), field("bar")), expr(Node::Index(0)))
    );
}

#[test]
fn test_parse_object_projection() {
    let expected = expr(Node::ObjectProjection {
        left: Box::new(field("foo")),
        right: Box::new(field("bar")),
    });
    assert_eq!(parse("foo.*.bar").unwrap(), expected);

    let bare = expr(Node::ObjectProjection {
        left: Box::new(current()),
        right: Box::new(current()),
    });
    assert_eq!(parse("*").unwrap(), bare);
}

#[test]
fn test_parse_flatten() {
    let flatten = expr(Node::Flatten(Box::new(field("foo"))));
    assert_eq!(parse("foo[]").unwrap(), projection(flatten.clone(), current()));
    assert_eq!(parse("foo[].bar").unwrap(), projection(flatten, field("bar")));
}

#[test]
fn test_parse_slice() {
    let slice = expr(Node::Slice {
        start: Some(1),
        stop: None,
        step: -1,
    });
    assert_eq!(parse("[1::-1]").unwrap(), projection(slice, current()));

    let defaults = expr(Node::Slice {
        start: None,
        stop: Some(2),
        step: 1,
    });
    assert_eq!(
        parse("foo[:2].a").unwrap(),
        sub(field("foo"), projection(defaults, field("a")))
    );
}

#[test]
fn test_parse_filter() {
    let expected = expr(Node::FilterProjection {
        left: Box::new(field("people")),
        condition: Box::new(compare(Comparator::GreaterThan, field("age"), literal(30))),
        right: Box::new(field("name")),
    });
    assert_eq!(parse("people[?age > `30`].name").unwrap(), expected);
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_parse_comparators() {
    let cases = [
        ("a == b", Comparator::Equal),
        ("a != b", Comparator::NotEqual),
        ("a < b", Comparator::LessThan),
        ("a <= b", Comparator::LessEqual),
        ("a > b", Comparator::GreaterThan),
        ("a >= b", Comparator::GreaterEqual),
    ];
    for (text, op) in cases {
        assert_eq!(parse(text).unwrap(), compare(op, field("a"), field("b")), "{}", text);
    }
}

#[test]
fn test_and_binds_tighter_than_or() {
    let expected = expr(Node::Or {
        left: Box::new(field("a")),
        right: Box::new(expr(Node::And {
            left: Box::new(field("b")),
            right: Box::new(field("c")),
        })),
    });
    assert_eq!(parse("a || b && c").unwrap(), expected);
}

#[test]
fn test_not_and_parentheses() {
    let expected = expr(Node::Not(Box::new(expr(Node::Or {
        left: Box::new(field("a")),
        right: Box::new(field("b")),
    }))));
    assert_eq!(parse("!(a || b)").unwrap(), expected);
    assert_eq!(parse("((a))").unwrap(), field("a"));
}

#[test]
fn test_pipe_is_lowest_precedence() {
    let expected = pipe(
        expr(Node::Or {
            left: Box::new(field("a")),
            right: Box::new(field("b")),
        }),
        field("c"),
    );
    assert_eq!(parse("a || b | c").unwrap(), expected);
}

// ============================================================================
// Multi-select and Functions
// ============================================================================

#[test]
fn test_parse_multi_select_list() {
    assert_eq!(
        parse("[a, b.c]").unwrap(),
        expr(Node::MultiSelectList(vec![field("a"), sub(field("b"), field("c"))]))
    );
    assert_eq!(
        parse("foo.[a, b]").unwrap(),
        sub(field("foo"), expr(Node::MultiSelectList(vec![field("a"), field("b")])))
    );
}

#[test]
fn test_parse_multi_select_hash_keeps_key_order() {
    let parsed = parse("{z: a, \"a b\": b}").unwrap();
    assert_eq!(
        parsed,
        expr(Node::MultiSelectHash(vec![
            ("z".to_string(), field("a")),
            ("a b".to_string(), field("b")),
        ]))
    );
}

#[test]
fn test_parse_function_calls() {
    assert_eq!(
        parse("length(@)").unwrap(),
        expr(Node::Function {
            name: "length".to_string(),
            args: vec![current()],
        })
    );
    assert_eq!(
        parse("sort_by(people, &age)").unwrap(),
        expr(Node::Function {
            name: "sort_by".to_string(),
            args: vec![field("people"), expr(Node::ExpressionRef(Box::new(field("age"))))],
        })
    );
    assert_eq!(
        parse("f()").unwrap(),
        expr(Node::Function {
            name: "f".to_string(),
            args: vec![],
        })
    );
}

// ============================================================================
// Positions
// ============================================================================

#[test]
fn test_node_positions() {
    let parsed = parse("foo[?a < `1`]").unwrap();
    assert_eq!(parsed.position, Position::new(1, 4));
    match parsed.node {
        Node::FilterProjection { left, condition, .. } => {
            assert_eq!(left.position, Position::new(1, 1));
            assert_eq!(condition.position, Position::new(1, 8));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_equality_ignores_positions() {
    assert_eq!(parse("a.b").unwrap(), parse("  a .\n b").unwrap());
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_incomplete_expressions() {
    for text in ["foo.", "foo[", "[a, b", "{a: b", "(a", "a ||", "", "foo[?a"] {
        assert!(parse(text).is_err(), "Expected error for {:?}", text);
    }
}

#[test]
fn test_trailing_tokens() {
    assert!(parse("a b").is_err());
    assert!(parse("a)").is_err());
}

#[test]
fn test_trailing_comma() {
    assert_eq!(syntax_message("[a, ]"), "Invalid token after ','");
    assert_eq!(syntax_message("{a: b, }"), "Invalid token after ','");
    assert_eq!(syntax_message("f(a, )"), "Invalid token after ','");
}

#[test]
fn test_too_many_colons() {
    assert_eq!(syntax_message("[1:2:3:4]"), "Too many colons in slice expression");
}

#[test]
fn test_invalid_projection() {
    assert!(syntax_message("a.**").starts_with("Invalid projection"));
}

#[test]
fn test_quoted_function_name() {
    assert_eq!(syntax_message("\"f\"(a)"), "Quoted identifiers cannot name a function");
}

#[test]
fn test_error_display_has_position() {
    let err = parse("foo.]").unwrap_err();
    assert_eq!(err.position(), Position::new(1, 5));
    assert!(err.to_string().starts_with("Syntax error at line 1 column 5:"), "{}", err);
}

#[test]
fn test_lex_errors_surface_as_parse_errors() {
    assert!(matches!(parse("a = b"), Err(ParseError::Lex(_))));
}

#[test]
fn test_nesting_depth_limit() {
    let ok = format!("{}a{}", "(".repeat(MAX_NESTING_DEPTH - 2), ")".repeat(MAX_NESTING_DEPTH - 2));
    assert!(parse(&ok).is_ok());

    let deep = MAX_NESTING_DEPTH + 10;
    let too_deep = format!("{}a{}", "(".repeat(deep), ")".repeat(deep));
    assert!(syntax_message(&too_deep).contains("maximum nesting depth"));
}

#[test]
fn test_long_chains_hit_nesting_limit() {
    for separator in [".", " || ", " && ", " | ", " == "] {
        let segments = vec!["a"; 10_000];
        let query = segments.join(separator);
        assert!(
            syntax_message(&query).contains("maximum nesting depth"),
            "chain joined by {:?} was accepted",
            separator
        );
    }
}

#[test]
fn test_chains_within_limit_parse() {
    let query = vec!["a"; MAX_NESTING_DEPTH / 2].join(".");
    let expr = parse(&query).unwrap();
    assert_eq!(expr.to_string(), query);
}
