// tests/serializer_tests.rs

use jmespath_lattice::ast::{Expression, Node};
use jmespath_lattice::parse;
use jmespath_lattice::serializer::ExpressionSerializer;
use jmespath_lattice::{FunctionRegistry, JsonRuntime};
use serde_json::json;

fn canonical(text: &str) -> String {
    parse(text).unwrap().serialize()
}

fn assert_round_trip(text: &str) {
    let parsed = parse(text).unwrap();
    let serialized = ExpressionSerializer::serialize(&parsed);
    let reparsed = parse(&serialized).unwrap_or_else(|e| panic!("{:?} -> {:?}: {}", text, serialized, e));
    assert_eq!(reparsed, parsed, "{:?} serialized as {:?}", text, serialized);
    assert_eq!(reparsed.serialize(), serialized, "not idempotent for {:?}", text);
}

// ============================================================================
// Canonical Forms
// ============================================================================

#[test]
fn test_paths() {
    assert_eq!(canonical("foo.bar"), "foo.bar");
    assert_eq!(canonical("foo[0]"), "foo[0]");
    assert_eq!(canonical("foo[-1].bar"), "foo[-1].bar");
    assert_eq!(canonical("@"), "@");
}

#[test]
fn test_identifiers_are_quoted_only_when_needed() {
    assert_eq!(canonical("\"foo\""), "foo");
    assert_eq!(canonical("\"foo bar\""), "\"foo bar\"");
    assert_eq!(canonical("\"1a\""), "\"1a\"");
    assert_eq!(canonical("{\"x y\": a}"), "{\"x y\": a}");
}

#[test]
fn test_projections() {
    assert_eq!(canonical("foo[*].bar"), "foo[*].bar");
    assert_eq!(canonical("[*]"), "[*]");
    assert_eq!(canonical("*.a"), "*.a");
    assert_eq!(canonical("foo.*"), "foo.*");
    assert_eq!(canonical("a[*][*]"), "a[*][*]");
    assert_eq!(canonical("*.*"), "*.*");
}

#[test]
fn test_flatten() {
    assert_eq!(canonical("a[]"), "a[]");
    assert_eq!(canonical("a[].b"), "a[].b");
    assert_eq!(canonical("[]"), "[]");
}

#[test]
fn test_slices() {
    assert_eq!(canonical("foo[1:3]"), "foo[1:3]");
    assert_eq!(canonical("[::-1]"), "[::-1]");
    assert_eq!(canonical("[0:10:1]"), "[0:10]");
    assert_eq!(canonical("[:2].a"), "[:2].a");
}

#[test]
fn test_filters() {
    assert_eq!(canonical("people[?age > `30`].name"), "people[?age > `30`].name");
    assert_eq!(canonical("[?a]"), "[?a]");
}

#[test]
fn test_literals() {
    assert_eq!(canonical("`[1, 2]`"), "`[1,2]`");
    assert_eq!(canonical("'raw'"), "`\"raw\"`");
    assert_eq!(canonical(r#"`"a\`b"`"#), r#"`"a\`b"`"#);
}

#[test]
fn test_logical_operators_are_parenthesised() {
    assert_eq!(canonical("a || b && c"), "(a || (b && c))");
    assert_eq!(canonical("!a"), "!(a)");
    assert_eq!(canonical("!(a.b) || c"), "(!(a.b) || c)");
    assert_eq!(canonical("!a.b"), "!(a).b");
}

#[test]
fn test_pipes_and_grouping() {
    assert_eq!(canonical("a | b"), "a | b");
    assert_eq!(canonical("foo[*].bar | [0]"), "foo[*].bar | [0]");
    assert_eq!(canonical("(a | b).c"), "(a | b).c");
    assert_eq!(canonical("(a[*].b).c"), "(a[*].b).c");
    assert_eq!(canonical("a == (b == c)"), "a == (b == c)");
}

#[test]
fn test_functions_and_multi_select() {
    assert_eq!(canonical("sort_by(people, &age)"), "sort_by(people, &age)");
    assert_eq!(canonical("length( @ )"), "length(@)");
    assert_eq!(canonical("[a,b]"), "[a, b]");
    assert_eq!(canonical("a.{x:b,y:c}"), "a.{x: b, y: c}");
    assert_eq!(canonical("a.[b]"), "a.[b]");
}

#[test]
fn test_display_matches_serialize() {
    let expr = parse("foo[?a].b").unwrap();
    assert_eq!(expr.to_string(), expr.serialize());
}

#[test]
fn test_serializes_hand_built_trees() {
    let expr = Expression::from(Node::Subexpression {
        left: Box::new(Expression::from(Node::Field("a".to_string()))),
        right: Box::new(Expression::from(Node::Subexpression {
            left: Box::new(Expression::from(Node::Field("b".to_string()))),
            right: Box::new(Expression::from(Node::Field("c".to_string()))),
            pipe: true,
        })),
        pipe: false,
    });
    let text = expr.serialize();
    assert_eq!(text, "a | (b | c)");

    let doc = json!({"a": {"b": {"c": 7}}});
    let functions = FunctionRegistry::builtins();
    let reparsed = parse(&text).unwrap();
    assert_eq!(
        reparsed.evaluate(&doc, &JsonRuntime, &functions).unwrap(),
        expr.evaluate(&doc, &JsonRuntime, &functions).unwrap()
    );
}

#[test]
fn test_grouped_projection_keeps_parentheses() {
    assert_eq!(canonical("(a.b[*].c).d"), "(a.b[*].c).d");
    assert_eq!(canonical("(x.a[*])[?c]"), "(x.a[*])[?c]");
    assert_eq!(canonical("(a[].b).c"), "(a[].b).c");
}

// ============================================================================
// Round Trips
// ============================================================================

#[test]
fn test_round_trips() {
    let cases = [
        "foo.bar.baz",
        "foo[*].bar[0].baz",
        "a.b[*]",
        "foo[?a == `1` && b].c | [0].x",
        "reservations[].instances[].state",
        "people[?age > `20`].name | sort(@) | [-1]",
        "{name: name, tags: tags[*].key}",
        "a[?!b]",
        "length(a) > `1` && b",
        "max_by(people, &age).name",
        "fold_left(`[]`, &append_if_not_null(acc, element.a), items)",
        "foo.*.bar[?baz].qux",
        "a[1:-1:2][]",
        "\"a\\\"b\".\"c\\nd\"",
        "`{\"k\": [true, null]}`",
        "[a, b][0]",
        "(a || b).c",
        "a[?b > c.d][*]",
        "contains(a, 'x') == `false`",
        "(a.b[*].c).d",
        "(x.a[*])[?c].d",
        "*.b.*",
    ];
    for text in cases {
        assert_round_trip(text);
    }
}
