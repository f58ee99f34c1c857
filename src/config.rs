//! Configuration management for schemacheck.
//!
//! Handles:
//! - Command-line argument parsing
//! - Project (`.schemacheck.toml`) and user-global config files
//! - Priority: command line > project file > user file > defaults

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

/// Project config file looked up in the current directory
pub const PROJECT_CONFIG_FILE: &str = ".schemacheck.toml";

/// Schema file name searched for next to data files
pub const DEFAULT_SCHEMA_NAME: &str = "schema.yaml";

pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "schemacheck")]
#[command(about = "Validate YAML and JSON files against a schema")]
#[command(version)]
pub struct Args {
    /// File or directory to validate
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Schema file to use
    #[arg(
        short,
        long,
        help = "Schema file path, or file name searched for in the data file's directory and its parents (default: schema.yaml)"
    )]
    pub schema: Option<String>,

    /// Number of files validated in parallel
    #[arg(short = 'n', long, help = "Number of files validated in parallel")]
    pub cpus: Option<usize>,

    /// Report elements not described by the schema, overriding config files
    #[arg(long, conflicts_with = "no_strict", help = "Report elements that are not in the schema")]
    pub strict: bool,

    /// Allow elements not described by the schema
    #[arg(long, help = "Do not report elements that are not in the schema")]
    pub no_strict: bool,

    /// Log level
    #[arg(long, help = "Log level (trace, debug, info, warn, error)")]
    pub log_level: Option<String>,
}

/// Settings read from a TOML config file; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub schema: Option<String>,
    pub strict: Option<bool>,
    pub cpus: Option<usize>,
    pub log_level: Option<String>,
}

impl FileConfig {
    /// Load a config file, returning `None` if it does not exist
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(Some(config))
    }

    /// Fill unset keys from `lower`
    fn or(self, lower: FileConfig) -> FileConfig {
        FileConfig {
            schema: self.schema.or(lower.schema),
            strict: self.strict.or(lower.strict),
            cpus: self.cpus.or(lower.cpus),
            log_level: self.log_level.or(lower.log_level),
        }
    }
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// File or directory to validate
    pub path: PathBuf,
    /// Schema path or file name
    pub schema: String,
    pub strict: bool,
    /// Maximum number of files validated at once
    pub cpus: usize,
    pub log_level: String,
    /// Project config file that contributed settings, if any
    pub project_config_path: Option<PathBuf>,
}

impl Config {
    /// Create configuration from command-line arguments and config files
    pub fn from_args_and_env() -> Result<Self> {
        let project = std::env::current_dir()?.join(PROJECT_CONFIG_FILE);
        let user = dirs::config_dir().map(|dir| dir.join("schemacheck").join("config.toml"));
        Self::from_sources(Args::parse(), Some(&project), user.as_deref())
    }

    /// Create configuration from explicit arguments only (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        Self::from_sources(args, None, None)
    }

    /// Merge arguments with optional project and user config files
    pub fn from_sources(args: Args, project: Option<&Path>, user: Option<&Path>) -> Result<Self> {
        let project_config = match project {
            Some(path) => FileConfig::load(path)?,
            None => None,
        };
        let user_config = match user {
            Some(path) => FileConfig::load(path)?,
            None => None,
        };

        let project_config_path = project
            .filter(|_| project_config.is_some())
            .map(Path::to_path_buf);

        let file = project_config
            .unwrap_or_default()
            .or(user_config.unwrap_or_default());

        let strict = match (args.strict, args.no_strict) {
            (true, _) => true,
            (_, true) => false,
            _ => file.strict.unwrap_or(true),
        };

        Ok(Config {
            path: args.path,
            schema: args
                .schema
                .or(file.schema)
                .unwrap_or_else(|| DEFAULT_SCHEMA_NAME.to_string()),
            strict,
            cpus: args
                .cpus
                .or(file.cpus)
                .unwrap_or_else(default_cpus)
                .max(1),
            log_level: args
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            project_config_path,
        })
    }

    pub fn has_project_config(&self) -> bool {
        self.project_config_path.is_some()
    }
}

fn default_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
