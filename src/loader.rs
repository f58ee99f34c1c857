//! Document loading.
//!
//! Handles:
//! - YAML streams (several `---` documents per file) and JSON files
//! - Conversion of YAML values into the `serde_json::Value` data model
//! - Schema files: first document is the schema, later documents are includes

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::schema::Schema;
use crate::validators::ValidatorRegistry;

/// Source format of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON, everything else is treated as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }
}

/// Read every document in a data file
pub fn load_documents(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_documents(&content, Format::from_path(path))
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Parse document text in the given format
pub fn parse_documents(content: &str, format: Format) -> Result<Vec<Value>> {
    match format {
        Format::Json => Ok(vec![serde_json::from_str(content)?]),
        Format::Yaml => {
            let mut documents = Vec::new();
            for document in serde_yaml::Deserializer::from_str(content) {
                let yaml = serde_yaml::Value::deserialize(document)?;
                documents.push(yaml_to_json_value(&yaml)?);
            }
            Ok(documents)
        }
    }
}

/// Load a schema file, named after its path
pub fn load_schema(path: &Path, validators: Arc<ValidatorRegistry>) -> Result<Schema> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema {}", path.display()))?;
    parse_schema(
        &content,
        &path.display().to_string(),
        Format::from_path(path),
        validators,
    )
    .with_context(|| format!("Invalid schema {}", path.display()))
}

/// Build a schema from text.
///
/// The first document is the schema itself; every following document must
/// be a map of include name to schema and is added as includes.
pub fn parse_schema(
    content: &str,
    name: &str,
    format: Format,
    validators: Arc<ValidatorRegistry>,
) -> Result<Schema> {
    let mut documents = parse_documents(content, format)?.into_iter();

    let raw = match documents.next() {
        Some(Value::Null) | None => bail!("schema {} is empty", name),
        Some(raw) => raw,
    };

    let schema = Schema::with_validators(&raw, name, validators)?;
    for includes in documents {
        schema.add_include(&includes)?;
    }

    log::debug!(
        "Loaded schema {} with {} include(s)",
        name,
        schema.includes().len()
    );
    Ok(schema)
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// String, number and bool map keys become strings; tags are dropped.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| anyhow!("cannot represent float {} in the data model", f))
            } else {
                bail!("unsupported YAML number: {:?}", n)
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => bail!("unsupported YAML map key: {:?}", other),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("a/b.json")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a/b.JSON")), Format::Json);
        assert_eq!(Format::from_path(Path::new("a/b.yml")), Format::Yaml);
        assert_eq!(Format::from_path(Path::new("a/b")), Format::Yaml);
    }

    #[test]
    fn test_parse_yaml_stream() {
        let docs = parse_documents("name: a\n---\nname: b\nn: 1.5\n", Format::Yaml).expect("parse");

        assert_eq!(docs, vec![json!({"name": "a"}), json!({"name": "b", "n": 1.5})]);
    }

    #[test]
    fn test_yaml_keys_and_order() {
        let docs = parse_documents("z: 1\n1: two\ntrue: 3\na: [x, ~]\n", Format::Yaml).expect("parse");
        let keys: Vec<_> = docs[0].as_object().expect("map").keys().cloned().collect();

        assert_eq!(keys, vec!["z", "1", "true", "a"]);
        assert_eq!(docs[0]["a"], json!(["x", null]));
    }

    #[test]
    fn test_parse_json() {
        let docs = parse_documents(r#"{"a": [1, 2]}"#, Format::Json).expect("parse");
        assert_eq!(docs, vec![json!({"a": [1, 2]})]);
    }

    #[test]
    fn test_parse_schema_with_includes() {
        let content = "person: include('person')\n---\nperson:\n  name: str()\n  age: int(min=0)\n";
        let schema = parse_schema(
            content,
            "schema.yaml",
            Format::Yaml,
            Arc::new(ValidatorRegistry::default()),
        )
        .expect("schema");

        assert!(schema.includes().contains("person"));
        assert!(schema
            .validate(&json!({"person": {"name": "a", "age": 3}}), "data", true)
            .is_ok());
        assert_eq!(
            schema.errors(&json!({"person": {"name": "a", "age": -1}}), true),
            vec!["person.age: -1 is less than 0"]
        );
    }

    #[test]
    fn test_parse_schema_empty() {
        let result = parse_schema("", "empty.yaml", Format::Yaml, Arc::new(ValidatorRegistry::default()));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_documents_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("data.yaml");
        fs::write(&path, "a: 1\n").expect("write");

        assert_eq!(load_documents(&path).expect("load"), vec![json!({"a": 1})]);
        assert!(load_documents(&dir.path().join("missing.yaml")).is_err());
    }
}
