//! Property-based tests for the abstract evaluator and the serializer
//!
//! Uses proptest to check that predicted types describe every concrete
//! result, that canonical text parses back to the same tree, and that type
//! unions stay flat.
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use jmespath_lattice::runtime::ValueRuntime;
use jmespath_lattice::{parse, FunctionRegistry, JsonRuntime, Type, Value};

// ============================================================================
// Test Strategies
// ============================================================================

/// Strategy for small JSON documents with overlapping keys
fn document_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        (-3i64..4).prop_map(serde_json::Value::from),
        extreme_number_strategy(),
        prop::sample::select(vec!["", "a", "xy"]).prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
            prop::collection::btree_map(prop::sample::select(vec!["a", "b", "c"]), inner, 0..3).prop_map(
                |members| {
                    serde_json::Value::Object(members.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
                }
            ),
        ]
    })
    .prop_map(Value::from)
}

/// Numbers at the edges of the integral and floating ranges
fn extreme_number_strategy() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        prop::sample::select(vec![1e308, -1e308, f64::MAX, f64::MIN_POSITIVE, 0.5, -2.5])
            .prop_map(serde_json::Value::from),
        prop::sample::select(vec![i64::MAX, i64::MIN]).prop_map(serde_json::Value::from),
        Just(serde_json::Value::from(u64::MAX)),
    ]
}

const ROOTS: &[&str] = &["@", "a", "b", "[0]", "*"];

const SEGMENTS: &[&str] = &[
    ".a",
    ".b",
    "[0]",
    "[-1]",
    "[*]",
    "[]",
    "[?a]",
    "[?b == `1`]",
    ".*",
    "[1:]",
    "[::-1]",
    " | @",
    " | [0]",
    ".[a, b]",
    ".{x: a, y: b}",
    " || a",
    " && b",
    " < `1`",
    " >= b",
    "[?a > `0`]",
    "[?a <= b]",
];

const WRAPPERS: &[&str] = &["{}", "!({})", "({}) == a", "[{}, a]", "not_null({}, `1`)"];

/// Strategy for path expressions built from valid fragments
fn expression_strategy() -> impl Strategy<Value = String> {
    (
        prop::sample::select(ROOTS.to_vec()),
        prop::collection::vec(prop::sample::select(SEGMENTS.to_vec()), 0..4),
        prop::sample::select(WRAPPERS.to_vec()),
    )
        .prop_map(|(root, segments, wrapper)| {
            let path: String = std::iter::once(root).chain(segments).collect();
            wrapper.replace("{}", &path)
        })
}

const FUNCTION_QUERIES: &[&str] = &[
    "length(@)",
    "keys(@)",
    "values(@)",
    "type(@)",
    "to_array(@)",
    "to_string(@)",
    "to_number(@)",
    "reverse(@)",
    "sort(@)",
    "max(@)",
    "sum(@)",
    "avg(@)",
    "contains(@, `1`)",
    "not_null(a, b, @)",
    "map(&a, @)",
    "sort_by(@, &a)",
    "merge(@, `{\"z\": 1}`)",
    "eval(&[0], @)",
    "if(a, b, `null`)",
    "fold_left(`[]`, &append_if_not_null(acc, element), @)",
    "fold_left(`0`, &add(acc, `1`), @)",
    "[*].[a, b] | [0]",
    "a[*].b[]",
    "abs(@)",
    "ceil(@)",
    "floor(@)",
    "abs(a)",
    "add(a, b)",
    "join(', ', @)",
    "starts_with(@, 'a')",
    "max_by(@, &a)",
    "min_by(@, &@)",
    "length(@) > `2`",
    "sort(@)[?@ < `2`]",
    "[?@ >= `0`] | sum(@)",
    "sum(@) < `0`",
];

fn base_type_strategy() -> impl Strategy<Value = Type> {
    prop::sample::select(vec![
        Type::Null,
        Type::Boolean,
        Type::String,
        Type::Number,
        Type::Any,
        Type::array(Type::Number),
        Type::Tuple(vec![Type::String]),
        Type::Tuple(vec![Type::Number, Type::Number]),
        Type::object([("a", Type::Number)]),
        Type::Object(None),
        Type::Bottom,
    ])
}

fn assert_sound(query: &str, document: &Value) -> Result<(), TestCaseError> {
    let expr = parse(query).unwrap();
    let input = Type::of(document, &ValueRuntime);

    let functions = FunctionRegistry::<ValueRuntime>::builtins();
    if let Ok(result) = expr.evaluate(document, &ValueRuntime, &functions) {
        let predicted = expr.evaluate_abstract(&input, &functions);
        prop_assert!(
            predicted.is_instance(&result, &ValueRuntime),
            "{} on {:?}: {:?} is not an instance of {}",
            query,
            document,
            result,
            predicted
        );
    }

    let json = serde_json::Value::from(document);
    let functions = FunctionRegistry::<JsonRuntime>::builtins();
    if let Ok(result) = expr.evaluate(&json, &JsonRuntime, &functions) {
        let predicted = expr.evaluate_abstract(&input, &functions);
        prop_assert!(
            predicted.is_instance(&result, &JsonRuntime),
            "{} on {}: {} is not an instance of {}",
            query,
            json,
            result,
            predicted
        );
    }
    Ok(())
}

// ============================================================================
// Abstract Evaluation Properties
// ============================================================================

proptest! {
    /// Every concrete result is an instance of the type predicted for the input's type
    #[test]
    fn prop_paths_are_sound(query in expression_strategy(), document in document_strategy()) {
        assert_sound(&query, &document)?;
    }

    /// The same holds for function calls and folds
    #[test]
    fn prop_functions_are_sound(
        query in prop::sample::select(FUNCTION_QUERIES.to_vec()),
        document in document_strategy(),
    ) {
        assert_sound(query, &document)?;
    }

    /// The exact type of a document describes the document
    #[test]
    fn prop_type_of_is_instance(document in document_strategy()) {
        let ty = Type::of(&document, &ValueRuntime);
        prop_assert!(ty.is_instance(&document, &ValueRuntime));
        prop_assert!(ty.is_subtype_of(&Type::Any));
    }
}

// ============================================================================
// Serializer Properties
// ============================================================================

proptest! {
    /// Canonical text parses back to the same tree and is a fixed point
    #[test]
    fn prop_serialize_roundtrip(query in expression_strategy()) {
        let expr = parse(&query).unwrap();
        let text = expr.serialize();
        let reparsed = parse(&text).unwrap();
        prop_assert_eq!(&reparsed, &expr, "{} became {}", query, text);
        prop_assert_eq!(reparsed.serialize(), text);
    }
}

// ============================================================================
// Union Properties
// ============================================================================

proptest! {
    /// Unions are flat, contain each input, and ignore order
    #[test]
    fn prop_union_is_flat(types in prop::collection::vec(base_type_strategy(), 0..6)) {
        let union = Type::union_all(types.clone());
        prop_assert!(union.members().iter().all(|m| !matches!(m, Type::Union(_))));
        if let Type::Union(members) = &union {
            prop_assert!(members.len() >= 2);
        }
        for ty in &types {
            prop_assert!(ty.is_subtype_of(&union), "{} is not in {}", ty, union);
        }
        prop_assert_eq!(Type::union_all(types.into_iter().rev()), union.clone());
        prop_assert_eq!(Type::union(union.clone(), union.clone()), union);
    }
}
