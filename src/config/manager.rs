use crate::config::models::ProjectConfig;
use crate::config::settings::{SettingInfo, SettingKey, SettingValue};
use crate::constants;
use crate::error::Error;
use crate::fs::{FileSystem, OsFileSystem};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads and writes `pdp.toml` of one project.
pub struct ConfigManager<F: FileSystem> {
    fs: F,
    project_dir: PathBuf,
}

impl ConfigManager<OsFileSystem> {
    /// Creates a new `ConfigManager` for `project_dir` on the real filesystem.
    #[must_use]
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self::with_fs(OsFileSystem, project_dir.into())
    }
}

impl<F: FileSystem> ConfigManager<F> {
    pub const fn with_fs(fs: F, project_dir: PathBuf) -> Self {
        Self { fs, project_dir }
    }

    #[must_use]
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.project_dir.join(constants::PROJECT_CONFIG_FILE)
    }

    /// Loads `pdp.toml`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_config(&self) -> Result<ProjectConfig, Error> {
        let config_path = self.config_path();
        if !self.fs.exists(&config_path) {
            debug!(path = %config_path.display(), "no project config, using defaults");
            return Ok(ProjectConfig::default());
        }
        let content = self.fs.read_to_string(&config_path)?;
        toml::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("{}: {e}", config_path.display())))
    }

    /// Saves the configuration to `pdp.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or written.
    pub fn save_config(&self, config: &ProjectConfig) -> Result<(), Error> {
        self.fs.create_dir_all(&self.project_dir)?;
        let content = toml::to_string_pretty(config)?;
        self.fs.write_all(&self.config_path(), content.as_bytes())?;
        Ok(())
    }

    /// Current value of a setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn get_setting(&self, key: SettingKey) -> Result<SettingValue, Error> {
        Ok(key.value_from_config(&self.load_config()?))
    }

    /// Validates `value` for `key` and stores it.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is invalid for the key, or the
    /// configuration cannot be loaded or saved.
    pub fn set_setting(&self, key: SettingKey, value: &str) -> Result<SettingValue, Error> {
        let parsed = SettingValue::parse_for_key(key, value)?;
        let mut config = self.load_config()?;
        key.apply(&mut config, &parsed);
        self.save_config(&config)?;
        Ok(parsed)
    }

    /// All settings with their current values.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn list_settings(&self) -> Result<Vec<SettingInfo>, Error> {
        let config = self.load_config()?;
        Ok(SettingKey::ALL
            .iter()
            .map(|key| SettingInfo::new(*key, &key.value_from_config(&config)))
            .collect())
    }
}
