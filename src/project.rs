//! A project directory: `pdp.toml` plus one JSON file per entity type under
//! a directory per product.

use crate::config::manager::ConfigManager;
use crate::config::models::ProjectConfig;
use crate::entity::{registry, Entity, EntityType};
use crate::error::Error;
use crate::fs::{FileSystem, OsFileSystem};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Parses the contents of an entity file.
///
/// A bare object is treated as a one-element list. Any other top-level value,
/// or a list element that is not an object, is a structural error naming
/// `source`.
///
/// # Errors
///
/// Returns a `Project` error for invalid JSON or an unexpected shape.
pub fn parse_entities(content: &str, source: &str) -> Result<Vec<Entity>, Error> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| Error::invalid_project_file(source, e))?;
    match value {
        Value::Object(entity) => Ok(vec![entity]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(entity) => Ok(entity),
                other => Err(Error::invalid_project_file(
                    source,
                    format!("element {i} is {}, expected an object", json_kind(&other)),
                )),
            })
            .collect(),
        other => Err(Error::invalid_project_file(
            source,
            format!("top-level value is {}, expected an array", json_kind(&other)),
        )),
    }
}

/// Serializes entities the way they are stored on disk: pretty-printed with
/// two-space indentation and a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_entities(entities: &[Entity]) -> Result<String, Error> {
    let mut out = serde_json::to_string_pretty(entities)?;
    out.push('\n');
    Ok(out)
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub struct Project<F: FileSystem> {
    fs: F,
    root: PathBuf,
}

impl Project<OsFileSystem> {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fs(OsFileSystem, root.into())
    }
}

impl<F: FileSystem + Clone> Project<F> {
    pub const fn with_fs(fs: F, root: PathBuf) -> Self {
        Self { fs, root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn config_manager(&self) -> ConfigManager<F> {
        ConfigManager::with_fs(self.fs.clone(), self.root.clone())
    }

    /// Loads `pdp.toml` of an existing project.
    ///
    /// # Errors
    ///
    /// Returns an error if the project directory does not exist or the
    /// configuration is invalid.
    pub fn load_config(&self) -> Result<ProjectConfig, Error> {
        self.ensure_exists()?;
        self.config_manager().load_config()
    }

    /// Fails unless the project directory exists.
    ///
    /// # Errors
    ///
    /// Returns `Project` if the root is not a directory.
    pub fn ensure_exists(&self) -> Result<(), Error> {
        if self.fs.is_dir(&self.root) {
            Ok(())
        } else {
            Err(Error::project_not_found(&self.root.display().to_string()))
        }
    }

    /// Creates `pdp.toml` and an empty entity file for every registered type.
    /// Existing entity files are kept; `force` only allows rewriting an
    /// existing `pdp.toml`. Returns the files created.
    ///
    /// # Errors
    ///
    /// Returns an error if a project already exists and `force` is not set,
    /// or if a file cannot be written.
    pub fn init(&self, force: bool) -> Result<Vec<PathBuf>, Error> {
        let manager = self.config_manager();
        let config_path = manager.config_path();
        if self.fs.exists(&config_path) && !force {
            return Err(Error::project_exists(&self.root.display().to_string()));
        }

        let mut created = Vec::new();
        manager.save_config(&ProjectConfig::default())?;
        created.push(config_path);

        for entity_type in registry::all_types() {
            let path = self.entity_path(entity_type);
            if self.fs.exists(&path) {
                debug!(path = %path.display(), "entity file already present");
                continue;
            }
            if let Some(parent) = path.parent() {
                self.fs.create_dir_all(parent)?;
            }
            self.fs.write_all(&path, b"[]\n")?;
            created.push(path);
        }

        info!(project = %self.root.display(), files = created.len(), "project initialised");
        Ok(created)
    }

    /// `<root>/<Product>/<fileName>`
    #[must_use]
    pub fn entity_path(&self, entity_type: &EntityType) -> PathBuf {
        self.root
            .join(entity_type.product.title_case())
            .join(entity_type.file_name)
    }

    /// Reads the entity file of `entity_type`. A missing file reads as an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a list of
    /// objects.
    pub fn read_entities(&self, entity_type: &EntityType) -> Result<Vec<Entity>, Error> {
        let path = self.entity_path(entity_type);
        if !self.fs.exists(&path) {
            return Ok(Vec::new());
        }
        let content = self.fs.read_to_string(&path)?;
        parse_entities(&content, &entity_type.relative_path())
    }

    /// Overwrites the entity file of `entity_type`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_entities(&self, entity_type: &EntityType, entities: &[Entity]) -> Result<(), Error> {
        let path = self.entity_path(entity_type);
        if let Some(parent) = path.parent() {
            self.fs.create_dir_all(parent)?;
        }
        self.fs
            .write_all(&path, render_entities(entities)?.as_bytes())?;
        debug!(path = %path.display(), count = entities.len(), "entities written");
        Ok(())
    }
}
