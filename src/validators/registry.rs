//! Validator Registry
//!
//! Maps validator names used in field expressions to builder functions.

use std::collections::{HashMap, VecDeque};
use std::fmt;

use regex::{Regex, RegexBuilder};

use super::constraints::Constraint;
use super::primitive::{parse_day, parse_timestamp, Primitive, RegexMatch};
use super::{Include, IncludeIf, Kind, Validator};
use crate::syntax::{Call, Expr, Literal};

/// Builds a validator from its call arguments.
///
/// Builders consume the arguments they understand; anything left over is
/// reported as an error by the registry. The common `required` and `none`
/// keywords are handled by the registry before the builder runs.
pub type Builder = fn(&mut Args) -> Result<Validator, String>;

/// A resolved call argument
#[derive(Debug, Clone)]
pub enum Arg {
    Literal(Literal),
    Validator(Validator),
}

impl Arg {
    fn describe(&self) -> String {
        match self {
            Arg::Literal(literal) => literal.to_string(),
            Arg::Validator(validator) => format!("{}()", validator.tag()),
        }
    }
}

/// Arguments of one validator call, consumed by its builder
#[derive(Debug)]
pub struct Args {
    name: String,
    positional: VecDeque<Arg>,
    keywords: Vec<(String, Arg)>,
}

impl Args {
    /// Name of the validator being built
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn next_positional(&mut self) -> Option<Arg> {
        self.positional.pop_front()
    }

    /// Remove and return a keyword argument
    pub fn keyword(&mut self, key: &str) -> Option<Arg> {
        let index = self.keywords.iter().position(|(k, _)| k == key)?;
        Some(self.keywords.remove(index).1)
    }

    pub fn keyword_bool(&mut self, key: &str) -> Result<Option<bool>, String> {
        match self.keyword(key) {
            None => Ok(None),
            Some(Arg::Literal(Literal::Bool(b))) => Ok(Some(b)),
            Some(other) => Err(self.bad_keyword(key, "a boolean", &other)),
        }
    }

    pub fn keyword_number(&mut self, key: &str) -> Result<Option<f64>, String> {
        match self.keyword(key) {
            None => Ok(None),
            Some(Arg::Literal(Literal::Int(i))) => Ok(Some(i as f64)),
            Some(Arg::Literal(Literal::Float(f))) => Ok(Some(f)),
            Some(other) => Err(self.bad_keyword(key, "a number", &other)),
        }
    }

    pub fn keyword_length(&mut self, key: &str) -> Result<Option<usize>, String> {
        match self.keyword(key) {
            None => Ok(None),
            Some(Arg::Literal(Literal::Int(i))) if i >= 0 => Ok(Some(i as usize)),
            Some(other) => Err(self.bad_keyword(key, "a non-negative integer", &other)),
        }
    }

    pub fn keyword_string(&mut self, key: &str) -> Result<Option<String>, String> {
        match self.keyword(key) {
            None => Ok(None),
            Some(Arg::Literal(Literal::Str(s))) => Ok(Some(s)),
            Some(other) => Err(self.bad_keyword(key, "a string", &other)),
        }
    }

    /// Next string argument, taken positionally or by keyword
    pub fn string(&mut self, key: &str) -> Result<Option<String>, String> {
        if self.positional.is_empty() {
            return self.keyword_string(key);
        }
        match self.next_positional() {
            Some(Arg::Literal(Literal::Str(s))) => Ok(Some(s)),
            Some(other) => Err(self.bad_keyword(key, "a string", &other)),
            None => Ok(None),
        }
    }

    /// Like [`Args::string`] but the argument must be present
    pub fn required_string(&mut self, key: &str) -> Result<String, String> {
        self.string(key)?
            .ok_or_else(|| format!("'{}' requires argument '{}'", self.name, key))
    }

    /// Drain all positional arguments, which must be validators
    pub fn take_validators(&mut self) -> Result<Vec<Validator>, String> {
        let name = &self.name;
        self.positional
            .drain(..)
            .map(|arg| match arg {
                Arg::Validator(validator) => Ok(validator),
                Arg::Literal(literal) => Err(format!(
                    "'{}' expects validators as arguments, got {}",
                    name, literal
                )),
            })
            .collect()
    }

    /// Drain all positional arguments, which must be literals
    pub fn take_literals(&mut self) -> Result<Vec<Literal>, String> {
        let name = &self.name;
        self.positional
            .drain(..)
            .map(|arg| match arg {
                Arg::Literal(literal) => Ok(literal),
                Arg::Validator(validator) => Err(format!(
                    "'{}' expects literal arguments, got {}()",
                    name,
                    validator.tag()
                )),
            })
            .collect()
    }

    fn bad_keyword(&self, key: &str, expected: &str, got: &Arg) -> String {
        format!(
            "'{}' argument '{}' must be {}, got {}",
            self.name,
            key,
            expected,
            got.describe()
        )
    }

    fn finish(self) -> Result<(), String> {
        if let Some(extra) = self.positional.front() {
            return Err(format!(
                "'{}' got an unexpected positional argument {}",
                self.name,
                extra.describe()
            ));
        }
        if let Some((key, _)) = self.keywords.first() {
            return Err(format!(
                "'{}' got an unexpected keyword argument '{}'",
                self.name, key
            ));
        }
        Ok(())
    }
}

/// Registry of validator builders keyed by expression name
#[derive(Clone)]
pub struct ValidatorRegistry {
    builders: HashMap<String, Builder>,
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("ValidatorRegistry")
            .field("builders", &names)
            .finish()
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("str", build_str);
        registry.register("int", build_int);
        registry.register("num", build_num);
        registry.register("bool", build_bool);
        registry.register("null", build_null);
        registry.register("enum", build_enum);
        registry.register("day", build_day);
        registry.register("timestamp", build_timestamp);
        registry.register("regex", build_regex);
        registry.register("ip", build_ip);
        registry.register("mac", build_mac);
        registry.register("map", build_map);
        registry.register("list", build_list);
        registry.register("any", build_any);
        registry.register("include", build_include);
        registry.register("include_if", build_include_if);
        registry
    }
}

impl ValidatorRegistry {
    /// Registry with no validators
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Add or replace a validator builder
    pub fn register(&mut self, name: &str, builder: Builder) {
        self.builders.insert(name.to_string(), builder);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// List all registered validator names
    pub fn names(&self) -> Vec<&str> {
        self.builders.keys().map(|s| s.as_str()).collect()
    }

    /// Build a validator from a parsed call, resolving nested calls first
    pub fn build(&self, call: &Call) -> Result<Validator, String> {
        let builder = self
            .builders
            .get(&call.name)
            .ok_or_else(|| format!("unknown validator '{}'", call.name))?;

        let mut args = Args {
            name: call.name.clone(),
            positional: call
                .args
                .iter()
                .map(|expr| self.resolve(expr))
                .collect::<Result<_, _>>()?,
            keywords: call
                .kwargs
                .iter()
                .map(|(key, expr)| self.resolve(expr).map(|arg| (key.clone(), arg)))
                .collect::<Result<_, _>>()?,
        };

        let required = args.keyword_bool("required")?.unwrap_or(true);
        let nullable = args.keyword_bool("none")?.unwrap_or(true);

        let mut validator = builder(&mut args)?;
        args.finish()?;

        validator.optional = !required;
        validator.nullable = nullable;
        Ok(validator)
    }

    fn resolve(&self, expr: &Expr) -> Result<Arg, String> {
        match expr {
            Expr::Literal(literal) => Ok(Arg::Literal(literal.clone())),
            Expr::Call(call) => self.build(call).map(Arg::Validator),
        }
    }
}

fn build_str(args: &mut Args) -> Result<Validator, String> {
    let ignore_case = args.keyword_bool("ignore_case")?.unwrap_or(false);
    let mut constraints = length_constraints(args)?;

    if let Some(chars) = args.keyword_string("exclude")? {
        constraints.push(Constraint::Exclude { chars, ignore_case });
    }
    if let Some(expected) = args.keyword_string("equals")? {
        constraints.push(Constraint::Equals {
            expected,
            ignore_case,
        });
    }
    if let Some(prefix) = args.keyword_string("starts_with")? {
        constraints.push(Constraint::StartsWith {
            prefix,
            ignore_case,
        });
    }
    if let Some(suffix) = args.keyword_string("ends_with")? {
        constraints.push(Constraint::EndsWith {
            suffix,
            ignore_case,
        });
    }
    if let Some(pattern) = args.keyword_string("matches")? {
        let regex = compile_pattern(&pattern, ignore_case, false, false)?;
        constraints.push(Constraint::Matches(regex));
    }

    Ok(Validator::new(Kind::Primitive(Primitive::Str)).with_constraints(constraints))
}

fn build_int(args: &mut Args) -> Result<Validator, String> {
    let constraints = numeric_constraints(args)?;
    Ok(Validator::new(Kind::Primitive(Primitive::Int)).with_constraints(constraints))
}

fn build_num(args: &mut Args) -> Result<Validator, String> {
    let constraints = numeric_constraints(args)?;
    Ok(Validator::new(Kind::Primitive(Primitive::Num)).with_constraints(constraints))
}

fn build_bool(_args: &mut Args) -> Result<Validator, String> {
    Ok(Validator::new(Kind::Primitive(Primitive::Bool)))
}

fn build_null(_args: &mut Args) -> Result<Validator, String> {
    Ok(Validator::new(Kind::Primitive(Primitive::Null)))
}

fn build_mac(_args: &mut Args) -> Result<Validator, String> {
    Ok(Validator::new(Kind::Primitive(Primitive::Mac)))
}

fn build_enum(args: &mut Args) -> Result<Validator, String> {
    let choices = args.take_literals()?;
    if choices.is_empty() {
        return Err("'enum' requires at least one value".to_string());
    }
    Ok(Validator::new(Kind::Primitive(Primitive::Enum(choices))))
}

fn build_day(args: &mut Args) -> Result<Validator, String> {
    let mut constraints = Vec::new();
    if let Some(min) = args.keyword_string("min")? {
        let day = parse_day(&min).ok_or_else(|| format!("invalid day '{}' for 'min'", min))?;
        constraints.push(Constraint::DayMin(day));
    }
    if let Some(max) = args.keyword_string("max")? {
        let day = parse_day(&max).ok_or_else(|| format!("invalid day '{}' for 'max'", max))?;
        constraints.push(Constraint::DayMax(day));
    }
    Ok(Validator::new(Kind::Primitive(Primitive::Day)).with_constraints(constraints))
}

fn build_timestamp(args: &mut Args) -> Result<Validator, String> {
    let mut constraints = Vec::new();
    if let Some(min) = args.keyword_string("min")? {
        let timestamp = parse_timestamp(&min)
            .ok_or_else(|| format!("invalid timestamp '{}' for 'min'", min))?;
        constraints.push(Constraint::TimestampMin(timestamp));
    }
    if let Some(max) = args.keyword_string("max")? {
        let timestamp = parse_timestamp(&max)
            .ok_or_else(|| format!("invalid timestamp '{}' for 'max'", max))?;
        constraints.push(Constraint::TimestampMax(timestamp));
    }
    Ok(Validator::new(Kind::Primitive(Primitive::Timestamp)).with_constraints(constraints))
}

fn build_regex(args: &mut Args) -> Result<Validator, String> {
    let name = args
        .keyword_string("name")?
        .unwrap_or_else(|| "regex match".to_string());
    let ignore_case = args.keyword_bool("ignore_case")?.unwrap_or(false);
    let multiline = args.keyword_bool("multiline")?.unwrap_or(false);
    let dotall = args.keyword_bool("dotall")?.unwrap_or(false);

    let patterns = args
        .take_literals()?
        .into_iter()
        .map(|literal| match literal {
            Literal::Str(pattern) => compile_pattern(&pattern, ignore_case, multiline, dotall),
            other => Err(format!("'regex' patterns must be strings, got {}", other)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if patterns.is_empty() {
        return Err("'regex' requires at least one pattern".to_string());
    }

    Ok(Validator::new(Kind::Primitive(Primitive::Regex(RegexMatch {
        name,
        patterns,
    }))))
}

fn build_ip(args: &mut Args) -> Result<Validator, String> {
    let mut constraints = Vec::new();
    match args.keyword("version") {
        None => {}
        Some(Arg::Literal(Literal::Int(4))) => constraints.push(Constraint::IpVersion(4)),
        Some(Arg::Literal(Literal::Int(6))) => constraints.push(Constraint::IpVersion(6)),
        Some(other) => {
            return Err(format!(
                "'ip' argument 'version' must be 4 or 6, got {}",
                other.describe()
            ));
        }
    }
    Ok(Validator::new(Kind::Primitive(Primitive::Ip)).with_constraints(constraints))
}

fn build_map(args: &mut Args) -> Result<Validator, String> {
    let validators = args.take_validators()?;
    let constraints = length_constraints(args)?;
    Ok(Validator::new(Kind::Map(validators)).with_constraints(constraints))
}

fn build_list(args: &mut Args) -> Result<Validator, String> {
    let validators = args.take_validators()?;
    let constraints = length_constraints(args)?;
    Ok(Validator::new(Kind::List(validators)).with_constraints(constraints))
}

fn build_any(args: &mut Args) -> Result<Validator, String> {
    let validators = args.take_validators()?;
    Ok(Validator::new(Kind::Any(validators)))
}

fn build_include(args: &mut Args) -> Result<Validator, String> {
    let name = args.required_string("name")?;
    let strict = args.keyword_bool("strict")?;
    Ok(Validator::new(Kind::Include(Include { name, strict })))
}

fn build_include_if(args: &mut Args) -> Result<Validator, String> {
    let if_path = args.required_string("if_path")?;
    let if_include_test = args.required_string("if_include_test")?;
    let then_include = args.required_string("then_include")?;
    let else_include = args.string("else_include")?;
    let strict = args.keyword_bool("strict")?;

    Ok(Validator::new(Kind::IncludeIf(IncludeIf {
        if_path,
        if_include_test,
        then_include,
        else_include,
        strict,
    })))
}

fn numeric_constraints(args: &mut Args) -> Result<Vec<Constraint>, String> {
    let mut constraints = Vec::new();
    if let Some(min) = args.keyword_number("min")? {
        constraints.push(Constraint::Min(min));
    }
    if let Some(max) = args.keyword_number("max")? {
        constraints.push(Constraint::Max(max));
    }
    Ok(constraints)
}

fn length_constraints(args: &mut Args) -> Result<Vec<Constraint>, String> {
    let mut constraints = Vec::new();
    if let Some(min) = args.keyword_length("min")? {
        constraints.push(Constraint::LengthMin(min));
    }
    if let Some(max) = args.keyword_length("max")? {
        constraints.push(Constraint::LengthMax(max));
    }
    Ok(constraints)
}

fn compile_pattern(
    pattern: &str,
    ignore_case: bool,
    multiline: bool,
    dotall: bool,
) -> Result<Regex, String> {
    RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .multi_line(multiline)
        .dot_matches_new_line(dotall)
        .build()
        .map_err(|e| format!("invalid regular expression '{}': {}", pattern, e))
}
