//! Tests for merging command-line arguments with config files
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use schemacheck::config::{Args, Config, FileConfig, DEFAULT_LOG_LEVEL, DEFAULT_SCHEMA_NAME};

fn args(argv: &[&str]) -> Args {
    Args::parse_from(std::iter::once("schemacheck").chain(argv.iter().copied()))
}

fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn test_project_config_overrides_user_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let project = write_config(&dir, "project.toml", "schema = \"project.yaml\"\ncpus = 2\n");
    let user = write_config(
        &dir,
        "user.toml",
        "schema = \"user.yaml\"\nstrict = false\nlog_level = \"debug\"\n",
    );

    let config = Config::from_sources(args(&[]), Some(project.as_path()), Some(user.as_path())).expect("config");

    assert_eq!(config.schema, "project.yaml");
    assert_eq!(config.cpus, 2);
    // Keys missing from the project file fall through to the user file
    assert!(!config.strict);
    assert_eq!(config.log_level, "debug");
    assert_eq!(config.project_config_path.as_deref(), Some(project.as_path()));
}

#[test]
fn test_cli_overrides_config_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let project = write_config(&dir, "project.toml", "schema = \"project.yaml\"\ncpus = 2\n");
    let user = write_config(&dir, "user.toml", "log_level = \"debug\"\n");

    let config = Config::from_sources(
        args(&["data", "--schema", "cli.yaml", "--cpus", "7", "--log-level", "trace"]),
        Some(project.as_path()),
        Some(user.as_path()),
    )
    .expect("config");

    assert_eq!(config.path, PathBuf::from("data"));
    assert_eq!(config.schema, "cli.yaml");
    assert_eq!(config.cpus, 7);
    assert_eq!(config.log_level, "trace");
}

#[test]
fn test_no_strict_flag_wins_over_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let project = write_config(&dir, "project.toml", "strict = true\n");

    let config = Config::from_sources(args(&["--no-strict"]), Some(project.as_path()), None).expect("config");
    assert!(!config.strict);

    let config = Config::from_sources(args(&[]), Some(project.as_path()), None).expect("config");
    assert!(config.strict);
}

#[test]
fn test_strict_flag_wins_over_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let project = write_config(&dir, "project.toml", "strict = false\n");
    let user = write_config(&dir, "user.toml", "strict = false\n");

    let config = Config::from_sources(args(&[]), Some(project.as_path()), Some(user.as_path()))
        .expect("config");
    assert!(!config.strict);

    let config = Config::from_sources(args(&["--strict"]), Some(project.as_path()), Some(user.as_path()))
        .expect("config");
    assert!(config.strict);

    assert!(Args::try_parse_from(["schemacheck", "--strict", "--no-strict"]).is_err());
}

#[test]
fn test_missing_config_files_use_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let project = dir.path().join("missing.toml");

    let config = Config::from_sources(args(&[]), Some(project.as_path()), Some(project.as_path())).expect("config");

    assert_eq!(config.schema, DEFAULT_SCHEMA_NAME);
    assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    assert!(config.strict);
    assert!(!config.has_project_config());
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let broken = write_config(&dir, "broken.toml", "cpus = \"many\"\n");
    let unknown = write_config(&dir, "unknown.toml", "flavor = \"prusa\"\n");

    let err = Config::from_sources(args(&[]), Some(broken.as_path()), None).unwrap_err();
    assert!(format!("{:#}", err).contains("Invalid config"));

    assert!(FileConfig::load(&unknown).is_err());
}

#[test]
fn test_file_config_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(&dir, "config.toml", "schema = \"s.yaml\"\nstrict = false\n");

    let loaded = FileConfig::load(&path).expect("load").expect("present");
    assert_eq!(
        loaded,
        FileConfig {
            schema: Some("s.yaml".to_string()),
            strict: Some(false),
            ..FileConfig::default()
        }
    );
    assert_eq!(FileConfig::load(&dir.path().join("none.toml")).expect("load"), None);
}
