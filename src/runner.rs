//! Batch validation of files and directories.
//!
//! Finds data files, resolves the schema for each one, and validates them
//! on the blocking thread pool with at most `cpus` files in flight.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::ValidationError;
use crate::loader;
use crate::schema::Schema;
use crate::validators::ValidatorRegistry;

const DATA_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Result of checking one data file
#[derive(Debug)]
pub enum Outcome {
    Valid,
    /// One error per failing document in the file
    Invalid(Vec<ValidationError>),
    /// The file or its schema could not be loaded
    Failed(String),
}

/// Report for a single data file
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: Outcome,
}

impl FileReport {
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Valid)
    }
}

/// Collect data files under `root` (or `root` itself if it is a file).
///
/// Directory results are sorted; files named like the schema are skipped.
pub fn find_data_files(root: &Path, schema_name: &str) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let skip = Path::new(schema_name).file_name();
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?;

        for entry in entries {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
                continue;
            }

            let is_data = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| DATA_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
                .unwrap_or(false);

            if is_data && path.file_name() != skip {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Resolve the schema for a data file.
///
/// A value with a directory component is used as a path. A bare file name
/// is looked up in the data file's directory, then each parent in turn.
pub fn find_schema(data_file: &Path, schema: &str) -> Option<PathBuf> {
    let direct = Path::new(schema);
    if direct.is_absolute() || direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }

    data_file
        .ancestors()
        .skip(1)
        .map(|dir| dir.join(schema))
        .find(|candidate| candidate.is_file())
}

/// Validate every document of one data file against `schema`
pub fn check_file(schema: &Schema, data_file: &Path, strict: bool) -> Outcome {
    let documents = match loader::load_documents(data_file) {
        Ok(documents) => documents,
        Err(e) => return Outcome::Failed(format!("{:#}", e)),
    };

    let data_name = data_file.display().to_string();
    let failures: Vec<ValidationError> = documents
        .iter()
        .filter_map(|document| schema.validate(document, &data_name, strict).err())
        .collect();

    if failures.is_empty() {
        Outcome::Valid
    } else {
        Outcome::Invalid(failures)
    }
}

/// Validate everything the configuration points at
pub async fn run(config: &Config) -> Result<Vec<FileReport>> {
    let root = config.path.clone();
    let schema_name = config.schema.clone();
    let targets = tokio::task::spawn_blocking(move || -> Result<Vec<(PathBuf, Option<PathBuf>)>> {
        let files = find_data_files(&root, &schema_name)?;
        Ok(files
            .into_iter()
            .map(|file| {
                let schema = find_schema(&file, &schema_name);
                (file, schema)
            })
            .collect())
    })
    .await
    .context("File discovery task panicked")??;
    log::info!("Found {} data file(s) under {}", targets.len(), config.path.display());

    let semaphore = Arc::new(Semaphore::new(config.cpus.max(1)));
    let schema_paths = targets.iter().filter_map(|(_, schema)| schema.clone()).collect();
    let schemas = load_schemas(schema_paths, &semaphore).await?;

    let mut reports: Vec<Option<FileReport>> = Vec::with_capacity(targets.len());
    let mut tasks = JoinSet::new();
    let strict = config.strict;

    for (index, (file, schema_path)) in targets.into_iter().enumerate() {
        reports.push(None);

        let schema = match schema_path {
            Some(path) => schemas
                .get(&path)
                .cloned()
                .unwrap_or_else(|| Err(format!("Schema {} was not loaded", path.display()))),
            None => Err(format!("Schema '{}' not found", config.schema)),
        };

        let schema = match schema {
            Ok(schema) => schema,
            Err(message) => {
                reports[index] = Some(FileReport {
                    path: file,
                    outcome: Outcome::Failed(message),
                });
                continue;
            }
        };

        let permit = semaphore.clone().acquire_owned().await?;
        tasks.spawn_blocking(move || {
            let _permit = permit;
            log::debug!("Validating {}", file.display());
            let outcome = check_file(&schema, &file, strict);
            (index, FileReport { path: file, outcome })
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (index, report) = joined.context("Validation task panicked")?;
        reports[index] = Some(report);
    }

    Ok(reports.into_iter().flatten().collect())
}

/// Load each distinct schema once on the blocking pool.
///
/// Load failures are kept per schema so every file using it can report them.
async fn load_schemas(
    paths: Vec<PathBuf>,
    semaphore: &Arc<Semaphore>,
) -> Result<HashMap<PathBuf, Result<Arc<Schema>, String>>> {
    let validators = Arc::new(ValidatorRegistry::default());
    let mut pending = HashSet::new();
    let mut tasks = JoinSet::new();

    for path in paths {
        if !pending.insert(path.clone()) {
            continue;
        }

        let permit = semaphore.clone().acquire_owned().await?;
        let validators = validators.clone();
        tasks.spawn_blocking(move || {
            let _permit = permit;
            log::debug!("Loading schema {}", path.display());
            let schema = loader::load_schema(&path, validators)
                .map(Arc::new)
                .map_err(|e| format!("{:#}", e));
            (path, schema)
        });
    }

    let mut schemas = HashMap::with_capacity(pending.len());
    while let Some(joined) = tasks.join_next().await {
        let (path, schema) = joined.context("Schema loading task panicked")?;
        schemas.insert(path, schema);
    }

    Ok(schemas)
}
