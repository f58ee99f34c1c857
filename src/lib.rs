//! schemacheck
//!
//! Validates YAML and JSON documents against schemas written as compact
//! per-field expressions.
//!
//! This library provides:
//! - Field expression parsing (`str(max=5)`, `list(include('item'))`, ...)
//! - Primitive and composite validators with a pluggable registry
//! - Schema compilation, shared includes and conditional includes
//! - Document loading and batch validation of files and directories
//!
//! ```
//! use schemacheck::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::new(&json!({"name": "str()", "age": "int(min=0)"}), "person").unwrap();
//! assert!(schema.validate(&json!({"name": "Ada", "age": 36}), "ada", true).is_ok());
//!
//! let err = schema.validate(&json!({"age": -1}), "anon", true).unwrap_err();
//! assert_eq!(err.errors, vec!["name: Required field missing", "age: -1 is less than 0"]);
//! ```

pub mod config;
pub mod error;
pub mod loader;
pub mod path;
pub mod runner;
pub mod schema;
pub mod syntax;
pub mod validators;

// Re-exports for clean public API
pub use config::Config;
pub use error::{SchemaError, ValidationError};
pub use path::{Path, Segment};
pub use schema::{Includes, Node, Schema};
pub use validators::{Kind, Validator, ValidatorRegistry};
