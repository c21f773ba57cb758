// tests/type_tests.rs

use jmespath_lattice::runtime::ValueRuntime;
use jmespath_lattice::{parse, ErrorKind, FunctionRegistry, JsonRuntime, RuntimeType, RuntimeTypes, Type, Value};
use serde_json::json;

fn type_of(doc: serde_json::Value) -> Type {
    Type::of(&Value::from(doc), &ValueRuntime)
}

fn instance(ty: &Type, doc: serde_json::Value) -> bool {
    ty.is_instance(&Value::from(doc), &ValueRuntime)
}

// ============================================================================
// Unions
// ============================================================================

#[test]
fn test_union_identities() {
    assert_eq!(Type::union_all(Vec::new()), Type::Bottom);
    assert_eq!(Type::union(Type::Number, Type::Bottom), Type::Number);
    assert_eq!(Type::union(Type::Number, Type::Number), Type::Number);
    assert_eq!(Type::union(Type::Any, Type::String), Type::Any);
    assert_eq!(Type::union(Type::String, Type::Any), Type::Any);
}

#[test]
fn test_union_flattens_nested_unions() {
    let nested = Type::union(
        Type::union(Type::Null, Type::Boolean),
        Type::union(Type::String, Type::union(Type::Number, Type::Null)),
    );
    assert_eq!(nested.union_len(), 4);
    assert_eq!(nested.to_string(), "boolean | null | number | string");
    assert!(nested.members().iter().all(|m| !matches!(m, Type::Union(_))));
}

#[test]
fn test_union_keeps_errors_beside_any() {
    let ty = Type::union(Type::Any, Type::Error(ErrorKind::InvalidType));
    assert_eq!(ty.union_len(), 2);
    assert!(ty.may_be(RuntimeType::Object));
    assert!(!ty.is_error());
}

#[test]
fn test_union_subsumes_shapes() {
    let ty = Type::union_all([
        Type::Tuple(vec![Type::Number]),
        Type::Tuple(vec![Type::Number, Type::Number]),
        Type::array(Type::Number),
    ]);
    assert_eq!(ty, Type::array(Type::Number));

    let objects = Type::union(Type::object([("a", Type::Number)]), Type::Object(None));
    assert_eq!(objects, Type::Object(None));
}

// ============================================================================
// Subtyping
// ============================================================================

#[test]
fn test_subtype_of_any_and_bottom() {
    assert!(Type::Number.is_subtype_of(&Type::Any));
    assert!(Type::array(Type::Any).is_subtype_of(&Type::Any));
    assert!(Type::Bottom.is_subtype_of(&Type::Null));
    assert!(!Type::Error(ErrorKind::InvalidValue).is_subtype_of(&Type::Any));
    assert!(!Type::Any.is_subtype_of(&Type::Number));
}

#[test]
fn test_subtype_of_arrays() {
    let tuple = Type::Tuple(vec![Type::Number, Type::Number]);
    assert!(tuple.is_subtype_of(&Type::array(Type::Number)));
    assert!(!Type::array(Type::Number).is_subtype_of(&tuple));
    assert!(!tuple.is_subtype_of(&Type::Tuple(vec![Type::Number])));
    assert!(Type::array(Type::Number).is_subtype_of(&Type::array(Type::union(Type::Number, Type::Null))));
}

#[test]
fn test_subtype_of_objects() {
    let shape = Type::object([("a", Type::Number)]);
    assert!(shape.is_subtype_of(&Type::Object(None)));
    assert!(shape.is_subtype_of(&Type::map(Type::String, Type::Number)));
    assert!(!shape.is_subtype_of(&Type::map(Type::String, Type::String)));
    assert!(!shape.is_subtype_of(&Type::object([("a", Type::Number), ("b", Type::Null)])));
    assert!(Type::map(Type::String, Type::Null).is_subtype_of(&Type::Object(None)));
}

#[test]
fn test_subtype_of_unions() {
    let wide = Type::union_all([Type::Null, Type::Number, Type::String]);
    assert!(Type::union(Type::Null, Type::Number).is_subtype_of(&wide));
    assert!(!Type::union(Type::Null, Type::Boolean).is_subtype_of(&wide));
}

// ============================================================================
// Values and Types
// ============================================================================

#[test]
fn test_type_of_value() {
    assert_eq!(type_of(json!(null)), Type::Null);
    assert_eq!(type_of(json!(1)), Type::Number);
    assert_eq!(
        type_of(json!({"a": [1, "x"], "b": {}})),
        Type::object([
            ("a", Type::Tuple(vec![Type::Number, Type::String])),
            ("b", Type::object(Vec::<(String, Type)>::new())),
        ])
    );
    assert_eq!(
        type_of(json!({"a": [1, "x"]})).to_string(),
        "object{a: tuple<number, string>}"
    );
}

#[test]
fn test_type_of_json_matches_value() {
    let doc = json!({"list": [true, null, 2.5], "name": "x"});
    assert_eq!(Type::of(&doc, &JsonRuntime), type_of(doc.clone()));
}

#[test]
fn test_type_of_is_instance() {
    let doc = json!({"a": [1, {"b": false}], "c": "s"});
    assert!(instance(&type_of(doc.clone()), doc));
}

#[test]
fn test_is_instance() {
    let tuple = Type::Tuple(vec![Type::Number, Type::String]);
    assert!(instance(&tuple, json!([1, "a"])));
    assert!(!instance(&tuple, json!([1])));
    assert!(!instance(&tuple, json!(["a", 1])));

    let array = Type::array(Type::union(Type::Number, Type::Null));
    assert!(instance(&array, json!([])));
    assert!(instance(&array, json!([1, null, 2])));
    assert!(!instance(&array, json!([1, "x"])));

    let shape = Type::object([("a", Type::Number)]);
    assert!(instance(&shape, json!({"a": 1})));
    assert!(!instance(&shape, json!({"a": 1, "b": 2})));
    assert!(!instance(&shape, json!({})));

    let map = Type::map(Type::String, Type::Boolean);
    assert!(instance(&map, json!({"x": true, "y": false})));
    assert!(!instance(&map, json!({"x": 1})));

    assert!(instance(&Type::Any, json!({"deep": [[]]})));
    assert!(!instance(&Type::Bottom, json!(null)));
    assert!(!instance(&Type::Error(ErrorKind::InvalidType), json!(null)));
}

// ============================================================================
// Operations
// ============================================================================

#[test]
fn test_expect_any_of() {
    let ty = Type::union(Type::Number, Type::String);
    assert_eq!(ty.expect_any_of(RuntimeTypes::NUMBER), Type::Number);
    assert_eq!(ty.expect_any_of(RuntimeTypes::NUMBER | RuntimeTypes::STRING), ty);
    assert_eq!(
        Type::Boolean.expect_any_of(RuntimeTypes::NUMBER),
        Type::Error(ErrorKind::InvalidType)
    );
    assert_eq!(Type::Any.expect_any_of(RuntimeTypes::STRING), Type::String);
    assert_eq!(Type::Any.expect_any_of(RuntimeTypes::VALUES), Type::Any);
}

#[test]
fn test_value_type() {
    let shape = Type::object([("a", Type::Number)]);
    assert_eq!(shape.value_type("a"), Type::Number);
    assert_eq!(shape.value_type("b"), Type::Null);
    assert_eq!(Type::Boolean.value_type("a"), Type::Null);
    assert_eq!(Type::Object(None).value_type("a"), Type::Any);
    assert_eq!(
        Type::map(Type::String, Type::Number).value_type("a"),
        Type::union(Type::Number, Type::Null)
    );
    assert_eq!(
        Type::union(shape, Type::Null).value_type("a"),
        Type::union(Type::Number, Type::Null)
    );
}

#[test]
fn test_without_null() {
    assert_eq!(Type::union(Type::Null, Type::String).without_null(), Type::String);
    assert_eq!(Type::Null.without_null(), Type::Bottom);
    assert_eq!(Type::Number.without_null(), Type::Number);
}

#[test]
fn test_widen_reaches_into_shapes() {
    let ty = Type::object([("a", Type::Tuple(vec![Type::Number, Type::Null]))]);
    assert_eq!(
        ty.widen(),
        Type::object([("a", Type::array(Type::union(Type::Number, Type::Null)))])
    );
    assert_eq!(Type::array(Type::Number).widen(), Type::array(Type::Number));
}

#[test]
fn test_kind_name() {
    assert_eq!(Type::union(Type::Null, Type::Object(None)).kind_name(), "null | object");
    assert_eq!(Type::Tuple(vec![Type::Number]).kind_name(), "array");
    assert_eq!(Type::Any.kind_name(), "any");
}

#[test]
fn test_display() {
    assert_eq!(Type::array(Type::Any).to_string(), "array<any>");
    assert_eq!(Type::map(Type::String, Type::Number).to_string(), "map<string, number>");
    assert_eq!(Type::Object(None).to_string(), "object");
    assert_eq!(Type::Tuple(vec![]).to_string(), "tuple<>");
    assert_eq!(Type::Bottom.to_string(), "bottom");
    assert_eq!(Type::Error(ErrorKind::UnknownFunction).to_string(), "error<unknown-function>");
    assert_eq!(
        Type::object([("b", Type::Null), ("a", Type::Boolean)]).to_string(),
        "object{a: boolean, b: null}"
    );
}

#[test]
fn test_hash_agrees_with_equality() {
    use std::collections::HashSet;

    let mut set = HashSet::new();
    set.insert(Type::union(Type::Number, Type::Null));
    set.insert(Type::union(Type::Null, Type::Number));
    set.insert(Type::object([("a", Type::array(Type::String))]));
    set.insert(Type::object([("a", Type::array(Type::String))]));
    set.insert(Type::Expression(Box::new(parse("a.b").unwrap())));
    set.insert(Type::Expression(Box::new(parse("a .b").unwrap())));
    assert_eq!(set.len(), 3);

    assert!(set.insert(Type::Tuple(vec![Type::Null, Type::Number])));
    assert!(set.insert(Type::Tuple(vec![Type::Number, Type::Null])));
    assert!(set.insert(Type::map(Type::String, Type::Number)));
    assert!(set.insert(Type::Error(ErrorKind::InvalidType)));
    assert!(!set.insert(Type::Error(ErrorKind::InvalidType)));
}

#[test]
fn test_object_values_follow_key_order() {
    let doc = json!({"b": "x", "a": 1});
    let functions = FunctionRegistry::<JsonRuntime>::builtins();
    let input = Type::of(&doc, &JsonRuntime);
    for text in ["*", "values(@)"] {
        let expr = parse(text).unwrap();
        let result = expr.evaluate(&doc, &JsonRuntime, &functions).unwrap();
        let predicted = expr.evaluate_abstract(&input, &functions);
        assert_eq!(result, json!([1, "x"]), "{}", text);
        assert_eq!(predicted, Type::Tuple(vec![Type::Number, Type::String]), "{}", text);
        assert!(predicted.is_instance(&result, &JsonRuntime), "{}", text);
    }
}
