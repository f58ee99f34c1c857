//! Validators
//!
//! Compiled field validators. A validator is either a primitive leaf check
//! or one of the composite kinds whose structure is walked by the schema
//! engine.

pub mod constraints;
pub mod primitive;
pub mod registry;

pub use constraints::Constraint;
pub use primitive::Primitive;
pub use registry::{Arg, Args, Builder, ValidatorRegistry};

use serde_json::Value;

/// Reference to a named schema in the includes registry
#[derive(Debug, Clone, PartialEq)]
pub struct Include {
    pub name: String,
    /// Overrides the caller's strict flag when set
    pub strict: Option<bool>,
}

/// Conditional include: validates the value at `if_path` against
/// `if_include_test` and picks `then_include` or `else_include`.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeIf {
    pub if_path: String,
    pub if_include_test: String,
    pub then_include: String,
    pub else_include: Option<String>,
    pub strict: Option<bool>,
}

/// Closed set of validator kinds
#[derive(Debug, Clone)]
pub enum Kind {
    Primitive(Primitive),
    Map(Vec<Validator>),
    List(Vec<Validator>),
    Any(Vec<Validator>),
    Include(Include),
    IncludeIf(IncludeIf),
}

/// A compiled validator attached to one schema position
#[derive(Debug, Clone)]
pub struct Validator {
    pub kind: Kind,
    pub constraints: Vec<Constraint>,
    pub optional: bool,
    pub nullable: bool,
}

impl Validator {
    /// Required, nullable validator with no constraints
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            constraints: Vec::new(),
            optional: false,
            nullable: true,
        }
    }

    pub fn with_constraints(mut self, constraints: Vec<Constraint>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn can_be_none(&self) -> bool {
        self.nullable
    }

    pub fn is_include_if(&self) -> bool {
        matches!(self.kind, Kind::IncludeIf(_))
    }

    /// Name used in "is not a ..." messages
    pub fn tag(&self) -> &str {
        match &self.kind {
            Kind::Primitive(primitive) => primitive.tag(),
            Kind::Map(_) => "map",
            Kind::List(_) => "list",
            Kind::Any(_) => "any",
            Kind::Include(_) => "include",
            Kind::IncludeIf(_) => "include_if",
        }
    }

    /// Leaf-level check of a single value.
    ///
    /// Returns unprefixed messages. A type mismatch yields exactly one
    /// message and skips the constraints. Composite structure is not
    /// inspected here.
    pub fn validate(&self, value: &Value) -> Vec<String> {
        let accepted = match &self.kind {
            Kind::Primitive(primitive) => primitive.accepts(value),
            Kind::Map(_) => value.is_object(),
            Kind::List(_) => value.is_array(),
            Kind::Any(_) | Kind::Include(_) | Kind::IncludeIf(_) => true,
        };

        if !accepted {
            return vec![format!("'{}' is not a {}.", describe(value), self.tag())];
        }

        self.constraints
            .iter()
            .filter_map(|constraint| constraint.check(value))
            .collect()
    }
}

/// Render a data value for an error message: strings raw, everything else as compact JSON
pub fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
