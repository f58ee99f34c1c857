use schemacheck::{Schema, SchemaError};
use serde_json::{json, Value};

/// Helper to compile a schema for testing
fn schema(raw: Value) -> Schema {
    Schema::new(&raw, "test-schema").expect("compile schema")
}

#[test]
fn test_required_field() {
    let schema = schema(json!({"name": "str()", "age": "int()"}));

    assert_eq!(
        schema.errors(&json!({"age": 30}), true),
        vec!["name: Required field missing"]
    );
    assert!(schema.errors(&json!({"name": "Ada", "age": 30}), true).is_empty());
}

#[test]
fn test_optional_nullable_skip_any_type() {
    for expression in [
        "str(required=False)",
        "int(required=False)",
        "list(int(), required=False)",
        "map(str(), required=False)",
        "any(int(), str(), required=False)",
        "include('missing', required=False)",
    ] {
        let schema = schema(json!({"field": expression}));
        assert!(
            schema.errors(&json!({"field": null}), true).is_empty(),
            "null should be skipped for {}",
            expression
        );
    }
}

#[test]
fn test_required_nullable_still_checked() {
    let schema = schema(json!({"field": "str()"}));
    assert_eq!(
        schema.errors(&json!({"field": null}), true),
        vec!["field: 'null' is not a str."]
    );
}

#[test]
fn test_strict_unknown_key() {
    let schema = schema(json!({"a": "str()"}));
    let data = json!({"a": "x", "b": 1});

    assert_eq!(schema.errors(&data, true), vec!["b: Unexpected element"]);
    assert!(schema.errors(&data, false).is_empty());
}

#[test]
fn test_strict_unknown_keys_nested() {
    let schema = schema(json!({"meta": {"name": "str()"}}));
    let data = json!({"meta": {"name": "x", "labels": {}, "extra": 1}});

    assert_eq!(
        schema.errors(&data, true),
        vec!["meta.labels: Unexpected element", "meta.extra: Unexpected element"]
    );
}

#[test]
fn test_dynamic_map_any_of() {
    let schema = schema(json!({"env": "map(int(), str(max=3))"}));

    assert!(schema
        .errors(&json!({"env": {"a": 1, "b": "abc"}}), true)
        .is_empty());

    assert_eq!(
        schema.errors(&json!({"env": {"a": 1, "b": "abcd", "c": true}}), true),
        vec![
            "env.b: 'abcd' is not a int.",
            "env.b: Length of abcd is greater than 3",
            "env.c: 'true' is not a int.",
            "env.c: 'true' is not a str.",
        ]
    );
}

#[test]
fn test_dynamic_map_with_nested_structure() {
    let schema = schema(json!({"people": "map(include('person'))"}));
    schema
        .add_include(&json!({"person": {"name": "str()", "age": "int(required=False)"}}))
        .expect("add include");

    let data = json!({"people": {"ada": {"name": "Ada"}, "bob": {"age": 3}}});
    assert_eq!(
        schema.errors(&data, true),
        vec!["people.bob.name: Required field missing"]
    );
}

#[test]
fn test_any_combinator() {
    let schema = schema(json!({"port": "any(int(min=1), enum('auto'))"}));

    assert!(schema.errors(&json!({"port": 80}), true).is_empty());
    assert!(schema.errors(&json!({"port": "auto"}), true).is_empty());
    assert_eq!(
        schema.errors(&json!({"port": 0}), true),
        vec!["port: 0 is less than 1", "port: '0' is not a enum."]
    );
}

#[test]
fn test_any_empty_reports_configuration_error() {
    let schema = schema(json!({"v": "any()"}));
    assert_eq!(
        schema.errors(&json!({"v": 1}), true),
        vec!["v: No validators specified for 'any'."]
    );
}

#[test]
fn test_aggregate_ordering_depth_first() {
    let schema = schema(json!({
        "first": {"x": "int()", "y": "int()"},
        "second": "str()",
        "third": ["int()", {"z": "bool()"}]
    }));

    let data = json!({
        "third": ["a", {"z": 1}],
        "second": 5,
        "first": {"y": "b", "x": "a"}
    });

    assert_eq!(
        schema.errors(&data, true),
        vec![
            "first.x: 'a' is not a int.",
            "first.y: 'b' is not a int.",
            "second: '5' is not a str.",
            "third.0: 'a' is not a int.",
            "third.1.z: '1' is not a bool.",
        ]
    );
}

#[test]
fn test_errors_continue_past_failures() {
    let schema = schema(json!({"a": "int()", "b": "int()", "c": {"d": "int()"}}));
    let errors = schema.errors(&json!({"a": "x", "c": {"d": "y"}}), true);

    assert_eq!(
        errors,
        vec![
            "a: 'x' is not a int.",
            "b: Required field missing",
            "c.d: 'y' is not a int.",
        ]
    );
}

#[test]
fn test_root_level_list_schema() {
    let schema = schema(json!("list(include('item'), min=1)"));
    schema
        .add_include(&json!({"item": {"id": "int()"}}))
        .expect("add include");

    assert!(schema.errors(&json!([{"id": 1}, {"id": 2}]), true).is_empty());
    assert_eq!(schema.errors(&json!([]), true), vec![": Length of [] is less than 1"]);
    assert_eq!(
        schema.errors(&json!([{"id": 1}, {"id": "2"}]), true),
        vec!["1.id: '2' is not a int."]
    );
}

#[test]
fn test_validate_is_repeatable() {
    let schema = schema(json!({"name": "str()"}));
    let data = json!({"name": 1});

    let first = schema.validate(&data, "data", true).unwrap_err();
    let second = schema.validate(&data, "data", true).unwrap_err();
    assert_eq!(first, second);
    assert_eq!(data, json!({"name": 1}));
}

#[test]
fn test_schema_syntax_error() {
    let err = Schema::new(&json!({"spec": {"size": "int(min=)"}}), "bad").unwrap_err();

    match &err {
        SchemaError::Syntax(message) => {
            assert!(message.starts_with("Invalid schema expression: 'int(min=)'."));
            assert!(message.ends_with(" at node 'spec.size'"));
        }
        other => panic!("Expected syntax error, got {:?}", other),
    }
}

#[test]
fn test_unknown_validator_is_syntax_error() {
    let err = Schema::new(&json!({"a": "string()"}), "bad").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Invalid schema expression: 'string()'. unknown validator 'string' at node 'a'"
    );
}
