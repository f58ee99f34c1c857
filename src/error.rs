//! Error Types
//!
//! Library-level errors. The binary and loader wrap these in `anyhow`.

use thiserror::Error;

/// Errors raised while compiling a schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// Malformed field expression; the message names the offending node
    #[error("{0}")]
    Syntax(String),

    /// `add_include` was handed something other than a map of name to schema
    #[error("includes must be a map of include name to schema, got {0}")]
    InvalidIncludes(String),
}

/// A document failed validation.
///
/// Displays as a header line followed by one tab-indented line per
/// error, in the order the errors were produced.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("\nError validating data {data_name} with schema {schema_name}\n\t{}", .errors.join("\n\t"))]
pub struct ValidationError {
    pub schema_name: String,
    pub data_name: String,
    pub errors: Vec<String>,
}
