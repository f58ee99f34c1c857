//! Schema Tree
//!
//! Compiles a raw schema description into a tree of the same shape whose
//! leaves are validators.

use serde_json::Value;

use crate::error::SchemaError;
use crate::path::Path;
use crate::syntax;
use crate::validators::{describe, Validator, ValidatorRegistry};

/// A compiled schema node
#[derive(Debug, Clone)]
pub enum Node {
    /// Literal map structure; children keep declaration order
    Map(Vec<(String, Node)>),
    /// Literal list structure, one child per expected index
    List(Vec<Node>),
    Leaf(Validator),
}

impl Node {
    pub fn as_leaf(&self) -> Option<&Validator> {
        match self {
            Node::Leaf(validator) => Some(validator),
            Node::Map(_) | Node::List(_) => None,
        }
    }

    /// Child declared under `key`, for map nodes
    pub fn child(&self, key: &str) -> Option<&Node> {
        match self {
            Node::Map(children) => children
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, node)| node),
            Node::List(_) | Node::Leaf(_) => None,
        }
    }
}

/// Compile a raw schema rooted at the empty path
pub fn compile(raw: &Value, registry: &ValidatorRegistry) -> Result<Node, SchemaError> {
    compile_at(&Path::root(), raw, registry)
}

/// Compile a raw schema, reporting failures relative to `path`
pub fn compile_at(
    path: &Path,
    raw: &Value,
    registry: &ValidatorRegistry,
) -> Result<Node, SchemaError> {
    match raw {
        Value::Object(map) => {
            let mut children = Vec::with_capacity(map.len());
            for (key, child) in map {
                let node = compile_at(&path.join(key.as_str()), child, registry)?;
                children.push((key.clone(), node));
            }
            Ok(Node::Map(children))
        }
        Value::Array(items) => {
            let mut children = Vec::with_capacity(items.len());
            for (index, child) in items.iter().enumerate() {
                children.push(compile_at(&path.join(index), child, registry)?);
            }
            Ok(Node::List(children))
        }
        Value::String(expression) => syntax::parse(expression, registry)
            .map(Node::Leaf)
            .map_err(|e| SchemaError::Syntax(format!("{} at node '{}'", e, path))),
        other => Err(SchemaError::Syntax(format!(
            "Invalid schema expression: '{}'. expected a validator expression at node '{}'",
            describe(other),
            path
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::{Kind, Primitive};
    use serde_json::json;

    #[test]
    fn test_compile_preserves_shape() {
        let raw = json!({
            "name": "str()",
            "tags": ["str()", "int()"],
            "owner": {"email": "str(required=False)"}
        });

        let node = compile(&raw, &ValidatorRegistry::default()).expect("compile");

        match &node {
            Node::Map(children) => {
                let keys: Vec<_> = children.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["name", "tags", "owner"]);
            }
            other => panic!("Expected map node, got {:?}", other),
        }

        assert!(matches!(node.child("tags"), Some(Node::List(items)) if items.len() == 2));
        let email = node
            .child("owner")
            .and_then(|owner| owner.child("email"))
            .and_then(Node::as_leaf)
            .expect("email leaf");
        assert!(email.is_optional());
        assert!(matches!(email.kind, Kind::Primitive(Primitive::Str)));
    }

    #[test]
    fn test_syntax_error_names_node() {
        let raw = json!({"spec": {"replicas": ["int(", "int()"]}});
        let err = compile(&raw, &ValidatorRegistry::default()).unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Invalid schema expression: 'int('."));
        assert!(message.ends_with("at node 'spec.replicas.0'"));
    }

    #[test]
    fn test_non_string_leaf_rejected() {
        let raw = json!({"count": 3});
        let err = compile(&raw, &ValidatorRegistry::default()).unwrap_err();

        assert!(matches!(err, SchemaError::Syntax(_)));
        assert!(err.to_string().ends_with("at node 'count'"));
    }
}
