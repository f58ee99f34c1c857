//! Primitive Validators
//!
//! Leaf type checks. Constraints (min/max, exclude, ...) live in
//! [`super::constraints`] and run only after the type check passes.

use std::net::IpAddr;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use crate::syntax::Literal;

static MAC_ADDRESS: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?i)(?:[0-9a-f]{2}(?::[0-9a-f]{2}){5}",
        r"|[0-9a-f]{2}(?:-[0-9a-f]{2}){5}",
        r"|[0-9a-f]{12}",
        r"|[0-9a-f]{4}\.[0-9a-f]{4}\.[0-9a-f]{4})$"
    ))
    .ok()
});

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

/// Strings matching at least one of a set of patterns
#[derive(Debug, Clone)]
pub struct RegexMatch {
    /// Shown in the "is not a ..." message
    pub name: String,
    pub patterns: Vec<Regex>,
}

/// Primitive value types
#[derive(Debug, Clone)]
pub enum Primitive {
    Str,
    Int,
    Num,
    Bool,
    Null,
    Enum(Vec<Literal>),
    Day,
    Timestamp,
    Regex(RegexMatch),
    Ip,
    Mac,
}

impl Primitive {
    pub fn tag(&self) -> &str {
        match self {
            Primitive::Str => "str",
            Primitive::Int => "int",
            Primitive::Num => "num",
            Primitive::Bool => "bool",
            Primitive::Null => "null",
            Primitive::Enum(_) => "enum",
            Primitive::Day => "day",
            Primitive::Timestamp => "timestamp",
            Primitive::Regex(rule) => &rule.name,
            Primitive::Ip => "ip",
            Primitive::Mac => "mac",
        }
    }

    /// Type check
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Primitive::Str => value.is_string(),
            Primitive::Int => value.is_i64() || value.is_u64(),
            Primitive::Num => value.is_number(),
            Primitive::Bool => value.is_boolean(),
            Primitive::Null => value.is_null(),
            Primitive::Enum(choices) => choices.iter().any(|choice| choice.matches(value)),
            Primitive::Day => value.as_str().and_then(parse_day).is_some(),
            Primitive::Timestamp => value.as_str().and_then(parse_timestamp).is_some(),
            Primitive::Regex(rule) => value
                .as_str()
                .map(|s| rule.patterns.iter().any(|re| re.is_match(s)))
                .unwrap_or(false),
            Primitive::Ip => value.as_str().and_then(parse_ip).is_some(),
            Primitive::Mac => match (value.as_str(), MAC_ADDRESS.as_ref()) {
                (Some(s), Some(re)) => re.is_match(s),
                _ => false,
            },
        }
    }
}

pub(crate) fn parse_day(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

pub(crate) fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

pub(crate) fn parse_ip(text: &str) -> Option<IpAddr> {
    text.parse().ok()
}
