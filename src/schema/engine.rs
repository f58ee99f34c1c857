//! Validation Engine
//!
//! Walks a compiled schema tree alongside a data tree and collects
//! path-qualified error messages. Nothing here mutates the schema or the
//! data; per-call state lives in [`Validation`] and in the `Active`
//! include stack threaded through the recursion.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::lookup::lookup;
use super::tree::Node;
use crate::path::{Path, Segment};
use crate::validators::{describe, Include, IncludeIf, Kind, Validator};

/// Includes being resolved on the current branch, with the path each was entered at
pub(crate) type Active = Vec<(String, Path)>;

static NULL: Value = Value::Null;

/// State for a single validation call
pub(crate) struct Validation<'a> {
    /// Whole document, used by conditional includes
    pub root: &'a Value,
    pub includes: &'a HashMap<String, Node>,
}

impl Validation<'_> {
    /// Validate `data` against `node`
    pub fn validate(
        &self,
        node: &Node,
        data: &Value,
        path: &Path,
        strict: bool,
        active: &mut Active,
    ) -> Vec<String> {
        match node {
            Node::Map(children) => self.validate_static_map(children, data, path, strict, active),
            Node::List(children) => self.validate_static_list(children, data, path, strict, active),
            Node::Leaf(validator) => self.validate_leaf(validator, data, path, strict, active),
        }
    }

    fn validate_leaf(
        &self,
        validator: &Validator,
        data: &Value,
        path: &Path,
        strict: bool,
        active: &mut Active,
    ) -> Vec<String> {
        // Optional field with a null value
        if data.is_null()
            && validator.is_optional()
            && validator.can_be_none()
            && !validator.is_include_if()
        {
            return Vec::new();
        }

        let mut errors: Vec<String> = validator
            .validate(data)
            .into_iter()
            .map(|error| format!("{}: {}", path, error))
            .collect();

        if !errors.is_empty() {
            return errors;
        }

        match &validator.kind {
            Kind::Primitive(_) => {}
            Kind::Include(include) => {
                errors.extend(self.validate_include(include, data, path, strict, active));
            }
            Kind::IncludeIf(rule) => {
                errors.extend(self.validate_include_if(rule, data, path, strict, active));
            }
            Kind::Map(validators) | Kind::List(validators) => {
                errors.extend(self.validate_dynamic(validators, data, path, strict, active));
            }
            Kind::Any(validators) => {
                errors.extend(self.validate_any(validators, data, path, strict, active));
            }
        }

        errors
    }

    fn validate_static_map(
        &self,
        children: &[(String, Node)],
        data: &Value,
        path: &Path,
        strict: bool,
        active: &mut Active,
    ) -> Vec<String> {
        let object = match data {
            Value::Object(object) => object,
            Value::Null => return vec![format!("{}: Required field missing", path)],
            other => return vec![format!("{} : '{}' is not a map", path, describe(other))],
        };

        let mut errors = Vec::new();

        if strict {
            for key in object.keys() {
                if !children.iter().any(|(declared, _)| declared == key) {
                    errors.push(format!("{}: Unexpected element", path.join(key.as_str())));
                }
            }
        }

        for (key, child) in children {
            errors.extend(self.validate_item(
                child,
                object.get(key),
                &path.join(key.as_str()),
                strict,
                active,
            ));
        }

        errors
    }

    fn validate_static_list(
        &self,
        children: &[Node],
        data: &Value,
        path: &Path,
        strict: bool,
        active: &mut Active,
    ) -> Vec<String> {
        let items = match data {
            Value::Array(items) => items,
            other => return vec![format!("{} : '{}' is not a list", path, describe(other))],
        };

        let mut errors = Vec::new();

        if strict {
            for index in children.len()..items.len() {
                errors.push(format!("{}: Unexpected element", path.join(index)));
            }
        }

        for (index, child) in children.iter().enumerate() {
            errors.extend(self.validate_item(child, items.get(index), &path.join(index), strict, active));
        }

        errors
    }

    /// Validate one declared position whose value may be missing from the data
    fn validate_item(
        &self,
        node: &Node,
        item: Option<&Value>,
        path: &Path,
        strict: bool,
        active: &mut Active,
    ) -> Vec<String> {
        if let Some(value) = item {
            return self.validate(node, value, path, strict, active);
        }

        match node.as_leaf() {
            // Conditional includes decide for themselves what a missing value means
            Some(validator) if validator.is_include_if() => {
                self.validate(node, &NULL, path, strict, active)
            }
            Some(validator) if validator.is_optional() => Vec::new(),
            _ => vec![format!("{}: Required field missing", path)],
        }
    }

    /// Any-of per key: every present key must satisfy at least one validator
    fn validate_dynamic(
        &self,
        validators: &[Validator],
        data: &Value,
        path: &Path,
        strict: bool,
        active: &mut Active,
    ) -> Vec<String> {
        // No validators: any contents accepted
        if validators.is_empty() {
            return Vec::new();
        }

        let mut errors = Vec::new();

        for (segment, value) in entries(data) {
            let item_path = path.join(segment);
            let mut failures = Vec::with_capacity(validators.len());

            for validator in validators {
                let item_errors = self.validate_leaf(validator, value, &item_path, strict, active);
                if item_errors.is_empty() {
                    failures.clear();
                    break;
                }
                failures.push(item_errors);
            }

            if failures.len() == validators.len() {
                errors.extend(failures.into_iter().flatten());
            }
        }

        errors
    }

    fn validate_any(
        &self,
        validators: &[Validator],
        data: &Value,
        path: &Path,
        strict: bool,
        active: &mut Active,
    ) -> Vec<String> {
        if validators.is_empty() {
            return vec![format!("{}: No validators specified for 'any'.", path)];
        }

        let mut failures = Vec::with_capacity(validators.len());

        for validator in validators {
            let errors = self.validate_leaf(validator, data, path, strict, active);
            if errors.is_empty() {
                return Vec::new();
            }
            failures.push(errors);
        }

        failures.into_iter().flatten().collect()
    }

    fn validate_include(
        &self,
        include: &Include,
        data: &Value,
        path: &Path,
        strict: bool,
        active: &mut Active,
    ) -> Vec<String> {
        let strict = include.strict.unwrap_or(strict);
        self.resolve_include(&include.name, data, path, strict, active)
    }

    fn validate_include_if(
        &self,
        rule: &IncludeIf,
        data: &Value,
        path: &Path,
        strict: bool,
        active: &mut Active,
    ) -> Vec<String> {
        let strict = rule.strict.unwrap_or(strict);

        let fallback = Value::Object(Map::new());
        let condition_data = match lookup(self.root, &rule.if_path) {
            Some(value) => value,
            None if strict => {
                return vec![format!("{}: path '{}' does not exist.", path, rule.if_path)];
            }
            None => &fallback,
        };

        if !self.includes.contains_key(&rule.if_include_test) {
            return vec![undefined_include(path, &rule.if_include_test)];
        }

        // Errors from the condition only steer the branch choice
        let condition_path = Path::parse_slashed(&rule.if_path);
        let holds = self
            .resolve_include(
                &rule.if_include_test,
                condition_data,
                &condition_path,
                strict,
                active,
            )
            .is_empty();

        let chosen = if holds {
            &rule.then_include
        } else {
            match &rule.else_include {
                Some(else_include) => else_include,
                None if strict && !data.is_null() => {
                    return vec![format!("{}: Unexpected element", path)];
                }
                None => return Vec::new(),
            }
        };

        log::trace!(
            "{}: condition '{}' on '{}' {}, using include '{}'",
            path,
            rule.if_include_test,
            rule.if_path,
            if holds { "holds" } else { "fails" },
            chosen
        );

        self.resolve_include(chosen, data, path, strict, active)
    }

    /// Resolve `name` against `data`.
    ///
    /// Re-entering an include at the path it is already being resolved at
    /// would never consume any data, so that branch stops with an error.
    fn resolve_include(
        &self,
        name: &str,
        data: &Value,
        path: &Path,
        strict: bool,
        active: &mut Active,
    ) -> Vec<String> {
        let Some(node) = self.includes.get(name) else {
            return vec![undefined_include(path, name)];
        };

        if active
            .iter()
            .any(|(entered, at)| entered == name && at == path)
        {
            log::debug!("{}: include '{}' re-entered without descending", path, name);
            return vec![format!("{}: Include '{}' loops back on itself.", path, name)];
        }

        active.push((name.to_string(), path.clone()));
        let errors = self.validate(node, data, path, strict, active);
        active.pop();
        errors
    }
}

fn undefined_include(path: &Path, name: &str) -> String {
    format!("{}: Include '{}' has not been defined.", path, name)
}

/// Keys or indices present in a map or list, in data order
fn entries(data: &Value) -> Vec<(Segment, &Value)> {
    match data {
        Value::Object(object) => object
            .iter()
            .map(|(key, value)| (Segment::Key(key.clone()), value))
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, value)| (Segment::Index(index), value))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tree::compile;
    use crate::validators::ValidatorRegistry;
    use serde_json::json;

    fn run(schema: Value, includes: &[(&str, Value)], data: Value, strict: bool) -> Vec<String> {
        let registry = ValidatorRegistry::default();
        let root = compile(&schema, &registry).expect("compile schema");
        let includes: HashMap<String, Node> = includes
            .iter()
            .map(|(name, raw)| (name.to_string(), compile(raw, &registry).expect("compile include")))
            .collect();

        let validation = Validation {
            root: &data,
            includes: &includes,
        };
        validation.validate(&root, &data, &Path::root(), strict, &mut Active::new())
    }

    #[test]
    fn test_required_field_missing() {
        let errors = run(json!({"name": "str()", "age": "int()"}), &[], json!({"age": 3}), true);
        assert_eq!(errors, vec!["name: Required field missing"]);
    }

    #[test]
    fn test_optional_field_missing() {
        let errors = run(json!({"name": "str(required=False)"}), &[], json!({}), true);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_optional_nullable_skip() {
        let schema = json!({"a": "int(required=False)", "b": "int(required=False, none=False)"});
        let errors = run(schema, &[], json!({"a": null, "b": null}), true);
        assert_eq!(errors, vec!["b: 'null' is not a int."]);
    }

    #[test]
    fn test_static_map_type_errors() {
        let schema = json!({"meta": {"name": "str()"}});

        let errors = run(schema.clone(), &[], json!({"meta": "text"}), true);
        assert_eq!(errors, vec!["meta : 'text' is not a map"]);

        let errors = run(schema, &[], json!({"meta": null}), true);
        assert_eq!(errors, vec!["meta: Required field missing"]);
    }

    #[test]
    fn test_static_list() {
        let schema = json!({"pair": ["str()", "int()"]});

        assert!(run(schema.clone(), &[], json!({"pair": ["a", 1]}), true).is_empty());
        assert_eq!(
            run(schema.clone(), &[], json!({"pair": ["a"]}), true),
            vec!["pair.1: Required field missing"]
        );
        assert_eq!(
            run(schema.clone(), &[], json!({"pair": ["a", 1, 2]}), true),
            vec!["pair.2: Unexpected element"]
        );
        assert!(run(schema.clone(), &[], json!({"pair": ["a", 1, 2]}), false).is_empty());
        assert_eq!(
            run(schema.clone(), &[], json!({"pair": 5}), true),
            vec!["pair : '5' is not a list"]
        );
        assert_eq!(
            run(schema.clone(), &[], json!({"pair": null}), true),
            vec!["pair : 'null' is not a list"]
        );
        // Absent, as opposed to null
        assert_eq!(
            run(schema, &[], json!({}), true),
            vec!["pair: Required field missing"]
        );
    }

    #[test]
    fn test_leaf_failure_stops_descent() {
        let schema = json!({"items": "list(int(), min=5)"});
        let errors = run(schema, &[], json!({"items": ["x"]}), true);
        assert_eq!(errors, vec!["items: Length of [\"x\"] is less than 5"]);
    }

    #[test]
    fn test_dynamic_list_any_of() {
        let schema = json!({"values": "list(int(), str())"});

        assert!(run(schema.clone(), &[], json!({"values": [1, "a", 2]}), true).is_empty());
        assert_eq!(
            run(schema, &[], json!({"values": [1, true]}), true),
            vec!["values.1: 'true' is not a int.", "values.1: 'true' is not a str."]
        );
    }

    #[test]
    fn test_open_map_accepts_anything() {
        let errors = run(json!({"extra": "map()"}), &[], json!({"extra": {"x": [1, {}]}}), true);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_any_empty_is_configuration_error() {
        let errors = run(json!({"value": "any()"}), &[], json!({"value": 1}), true);
        assert_eq!(errors, vec!["value: No validators specified for 'any'."]);
    }

    #[test]
    fn test_undefined_include() {
        let errors = run(json!({"owner": "include('person')"}), &[], json!({"owner": {}}), true);
        assert_eq!(errors, vec!["owner: Include 'person' has not been defined."]);
    }

    #[test]
    fn test_include_strict_override() {
        let includes = [("person", json!({"name": "str()"}))];
        let data = json!({"owner": {"name": "a", "extra": 1}});

        let errors = run(json!({"owner": "include('person')"}), &includes, data.clone(), true);
        assert_eq!(errors, vec!["owner.extra: Unexpected element"]);

        let errors = run(
            json!({"owner": "include('person', strict=False)"}),
            &includes,
            data,
            true,
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_self_include_stops() {
        let includes = [("loop", json!("include('loop')"))];
        let errors = run(json!("include('loop')"), &includes, json!(1), true);

        assert_eq!(errors, vec![": Include 'loop' loops back on itself."]);
    }

    #[test]
    fn test_self_include_through_any_stops() {
        let includes = [("loop", json!("any(include('loop'), include('loop'))"))];
        let errors = run(json!({"v": "include('loop')"}), &includes, json!({"v": 1}), true);

        assert_eq!(
            errors,
            vec![
                "v: Include 'loop' loops back on itself.",
                "v: Include 'loop' loops back on itself.",
            ]
        );
    }

    #[test]
    fn test_recursive_include_follows_data_depth() {
        let includes = [(
            "node",
            json!({"name": "str()", "child": "include('node', required=False)"}),
        )];

        let mut data = json!({"name": "leaf"});
        for level in 0..100 {
            data = json!({"name": format!("level-{}", level), "child": data});
        }

        assert!(run(json!("include('node')"), &includes, data, true).is_empty());

        let mut broken = json!({"name": 7});
        for _ in 0..80 {
            broken = json!({"name": "x", "child": broken});
        }
        let errors = run(json!("include('node')"), &includes, broken, true);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("child.child."));
        assert!(errors[0].ends_with(".name: '7' is not a str."));
    }

    #[test]
    fn test_include_if_missing_path() {
        let includes = [("test", json!("str()")), ("then", json!("int()"))];
        let schema = json!({"value": "include_if('/kind', 'test', 'then')"});

        let errors = run(schema.clone(), &includes, json!({"value": 1}), true);
        assert_eq!(errors, vec!["value: path '/kind' does not exist."]);

        // Lenient mode tests against an empty map, which is not a str
        let errors = run(schema, &includes, json!({"value": 1}), false);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_include_if_without_else() {
        let includes = [
            ("is_a", json!("enum('a')")),
            ("then", json!("int()")),
        ];
        let schema = json!({
            "kind": "str()",
            "value": "include_if('/kind', 'is_a', 'then')"
        });

        assert_eq!(
            run(schema.clone(), &includes, json!({"kind": "b", "value": 1}), true),
            vec!["value: Unexpected element"]
        );
        assert!(run(schema.clone(), &includes, json!({"kind": "b", "value": 1}), false).is_empty());
        // Missing value is treated as null, which is never unexpected
        assert!(run(schema, &includes, json!({"kind": "b"}), true).is_empty());
    }
}
