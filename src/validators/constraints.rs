//! Validator Constraints
//!
//! Checks applied after a value has passed its validator's type check.
//! Each check returns `None` when satisfied, or an unprefixed message.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use super::describe;
use super::primitive::{parse_day, parse_ip, parse_timestamp};

/// A single constraint attached to a validator
#[derive(Debug, Clone)]
pub enum Constraint {
    /// Numeric lower bound
    Min(f64),
    /// Numeric upper bound
    Max(f64),
    /// Length of a string (in characters), list or map
    LengthMin(usize),
    LengthMax(usize),
    Exclude { chars: String, ignore_case: bool },
    Equals { expected: String, ignore_case: bool },
    StartsWith { prefix: String, ignore_case: bool },
    EndsWith { suffix: String, ignore_case: bool },
    Matches(Regex),
    DayMin(NaiveDate),
    DayMax(NaiveDate),
    TimestampMin(NaiveDateTime),
    TimestampMax(NaiveDateTime),
    /// IP address family, 4 or 6
    IpVersion(u8),
}

impl Constraint {
    pub fn check(&self, value: &Value) -> Option<String> {
        match self {
            Constraint::Min(min) => {
                let number = value.as_f64()?;
                (number < *min).then(|| format!("{} is less than {}", describe(value), min))
            }
            Constraint::Max(max) => {
                let number = value.as_f64()?;
                (number > *max).then(|| format!("{} is greater than {}", describe(value), max))
            }
            Constraint::LengthMin(min) => {
                let length = length_of(value)?;
                (length < *min)
                    .then(|| format!("Length of {} is less than {}", describe(value), min))
            }
            Constraint::LengthMax(max) => {
                let length = length_of(value)?;
                (length > *max)
                    .then(|| format!("Length of {} is greater than {}", describe(value), max))
            }
            Constraint::Exclude { chars, ignore_case } => {
                let text = value.as_str()?;
                let excluded = chars.chars().find(|c| {
                    text.chars().any(|t| {
                        if *ignore_case {
                            t.to_lowercase().eq(c.to_lowercase())
                        } else {
                            t == *c
                        }
                    })
                })?;
                Some(format!("'{}' contains excluded character '{}'", text, excluded))
            }
            Constraint::Equals {
                expected,
                ignore_case,
            } => {
                let text = value.as_str()?;
                (!fold(text, *ignore_case).eq(&fold(expected, *ignore_case)))
                    .then(|| format!("'{}' does not equal '{}'", text, expected))
            }
            Constraint::StartsWith {
                prefix,
                ignore_case,
            } => {
                let text = value.as_str()?;
                (!fold(text, *ignore_case).starts_with(&fold(prefix, *ignore_case)))
                    .then(|| format!("'{}' does not start with '{}'", text, prefix))
            }
            Constraint::EndsWith {
                suffix,
                ignore_case,
            } => {
                let text = value.as_str()?;
                (!fold(text, *ignore_case).ends_with(&fold(suffix, *ignore_case)))
                    .then(|| format!("'{}' does not end with '{}'", text, suffix))
            }
            Constraint::Matches(pattern) => {
                let text = value.as_str()?;
                (!pattern.is_match(text))
                    .then(|| format!("'{}' does not match '{}'", text, pattern.as_str()))
            }
            Constraint::DayMin(min) => {
                let day = value.as_str().and_then(parse_day)?;
                (day < *min).then(|| format!("{} is less than {}", day, min))
            }
            Constraint::DayMax(max) => {
                let day = value.as_str().and_then(parse_day)?;
                (day > *max).then(|| format!("{} is greater than {}", day, max))
            }
            Constraint::TimestampMin(min) => {
                let timestamp = value.as_str().and_then(parse_timestamp)?;
                (timestamp < *min).then(|| format!("{} is less than {}", timestamp, min))
            }
            Constraint::TimestampMax(max) => {
                let timestamp = value.as_str().and_then(parse_timestamp)?;
                (timestamp > *max).then(|| format!("{} is greater than {}", timestamp, max))
            }
            Constraint::IpVersion(version) => {
                let address = value.as_str().and_then(parse_ip)?;
                let matches = match version {
                    4 => address.is_ipv4(),
                    _ => address.is_ipv6(),
                };
                (!matches).then(|| format!("'{}' is not a ipv{}.", describe(value), version))
            }
        }
    }
}

fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        Value::Object(map) => Some(map.len()),
        _ => None,
    }
}

fn fold(text: &str, ignore_case: bool) -> String {
    if ignore_case {
        text.to_lowercase()
    } else {
        text.to_string()
    }
}
