//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the HR
//! configuration from a YAML file, with environment overrides.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{HrError, HrResult};

use super::policy::Policy;
use super::types::AppConfig;

/// Environment variable that overrides `database.path`.
pub const DATABASE_PATH_ENV: &str = "HR_DATABASE_PATH";

/// Loads and provides access to the application configuration.
///
/// # Example
///
/// ```no_run
/// use hr_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/hr.yaml").unwrap();
/// println!("Database: {}", loader.config().database.path);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Loads configuration from a YAML file.
    ///
    /// After parsing, `HR_DATABASE_PATH` (from the process environment or a
    /// `.env` file already loaded by the caller) replaces the database path.
    ///
    /// # Errors
    ///
    /// - [`HrError::ConfigNotFound`] if the file cannot be read
    /// - [`HrError::ConfigParseError`] if it is not valid YAML for [`AppConfig`]
    pub fn load<P: AsRef<Path>>(path: P) -> HrResult<Self> {
        let path = path.as_ref();
        let mut config = Self::load_yaml::<AppConfig>(path)?;
        Self::apply_env_overrides(&mut config);
        info!(path = %path.display(), database = %config.database.path, "configuration loaded");
        Ok(Self { config })
    }

    /// Loads the file when it exists, otherwise falls back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> HrResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        debug!(path = %path.display(), "no configuration file, using defaults");
        let mut config = AppConfig::default();
        Self::apply_env_overrides(&mut config);
        Ok(Self { config })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: AppConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> HrResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| HrError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| HrError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    fn apply_env_overrides(config: &mut AppConfig) {
        if let Ok(db_path) = std::env::var(DATABASE_PATH_ENV) {
            if !db_path.trim().is_empty() {
                config.database.path = db_path;
            }
        }
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the default policy described by this configuration.
    pub fn policy(&self) -> Policy {
        Policy::from_config(&self.config)
    }
}
