//! Schemas
//!
//! A [`Schema`] owns a compiled tree and a handle to the includes registry
//! it shares with every schema added through it.
//!
//! `Schema` keeps no per-call state: the document being validated is
//! threaded through the engine, so one instance can validate many
//! documents concurrently.

pub mod engine;
pub mod lookup;
pub mod tree;

pub use lookup::lookup;
pub use tree::{compile, Node};

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use serde_json::Value;

use crate::error::{SchemaError, ValidationError};
use crate::path::Path;
use crate::validators::{describe, ValidatorRegistry};
use engine::{Active, Validation};

/// Shared registry of named schema trees.
///
/// Cloning the handle shares the same underlying registry.
#[derive(Debug, Clone, Default)]
pub struct Includes {
    inner: Arc<RwLock<HashMap<String, Node>>>,
}

impl Includes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a compiled include, replacing any previous one with the same name
    pub fn insert(&self, name: &str, node: Node) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), node);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// List all include names
    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Whether both handles refer to the same registry
    pub fn ptr_eq(&self, other: &Includes) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Node>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A compiled schema
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    root: Node,
    includes: Includes,
    validators: Arc<ValidatorRegistry>,
}

impl Schema {
    /// Compile `raw` with the built-in validators and a fresh includes registry
    pub fn new(raw: &Value, name: &str) -> Result<Self, SchemaError> {
        Self::with_validators(raw, name, Arc::new(ValidatorRegistry::default()))
    }

    /// Compile `raw` with a custom validator registry
    pub fn with_validators(
        raw: &Value,
        name: &str,
        validators: Arc<ValidatorRegistry>,
    ) -> Result<Self, SchemaError> {
        Self::with_includes(raw, name, validators, Includes::new())
    }

    /// Compile `raw` as a member of an existing includes registry
    pub fn with_includes(
        raw: &Value,
        name: &str,
        validators: Arc<ValidatorRegistry>,
        includes: Includes,
    ) -> Result<Self, SchemaError> {
        let root = compile(raw, &validators)?;
        log::debug!("Compiled schema {}", name);

        Ok(Self {
            name: name.to_string(),
            root,
            includes,
            validators,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn includes(&self) -> &Includes {
        &self.includes
    }

    pub fn validators(&self) -> &ValidatorRegistry {
        &self.validators
    }

    /// Compile and register every entry of a `name -> schema` map.
    ///
    /// All entries are compiled before any is inserted, so a syntax error
    /// leaves the registry unchanged. Node paths in syntax errors start
    /// at the include name.
    pub fn add_include(&self, includes: &Value) -> Result<(), SchemaError> {
        let entries = includes
            .as_object()
            .ok_or_else(|| SchemaError::InvalidIncludes(describe(includes)))?;

        let mut compiled = Vec::with_capacity(entries.len());
        for (name, raw) in entries {
            let node = tree::compile_at(&Path::root().join(name.as_str()), raw, &self.validators)?;
            compiled.push((name, node));
        }

        for (name, node) in compiled {
            log::debug!("Registered include {} on schema {}", name, self.name);
            self.includes.insert(name, node);
        }

        Ok(())
    }

    /// Validate `data` and return every error message in order
    pub fn errors(&self, data: &Value, strict: bool) -> Vec<String> {
        let includes = self.includes.read();
        let validation = Validation {
            root: data,
            includes: &includes,
        };
        validation.validate(&self.root, data, &Path::root(), strict, &mut Active::new())
    }

    /// Validate `data`, naming it `data_name` in the error header
    pub fn validate(&self, data: &Value, data_name: &str, strict: bool) -> Result<(), ValidationError> {
        log::debug!(
            "Validating {} with schema {} (strict: {})",
            data_name,
            self.name,
            strict
        );

        let errors = self.errors(data, strict);
        if errors.is_empty() {
            return Ok(());
        }

        Err(ValidationError {
            schema_name: self.name.clone(),
            data_name: data_name.to_string(),
            errors,
        })
    }
}
