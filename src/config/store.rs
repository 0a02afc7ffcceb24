//! Persistence of the connection settings between runs.
//!
//! Only the endpoint and API key are remembered; everything else comes from
//! the environment or the YAML configuration.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Settings remembered between sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredSettings {
    pub endpoint: String,
    pub api_key: String,
}

/// Load and save [`StoredSettings`].
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Returns `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<StoredSettings>, ConfigError>;

    async fn save(&self, settings: &StoredSettings) -> Result<(), ConfigError>;
}

/// Settings kept in a YAML file.
#[derive(Debug, Clone)]
pub struct YamlFileStore {
    path: PathBuf,
}

impl YamlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl ConfigStore for YamlFileStore {
    async fn load(&self) -> Result<Option<StoredSettings>, ConfigError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let settings: StoredSettings = serde_yaml::from_str(&contents)?;
        tracing::debug!("Loaded stored settings from {}", self.path.display());
        Ok(Some(settings))
    }

    async fn save(&self, settings: &StoredSettings) -> Result<(), ConfigError> {
        let contents = serde_yaml::to_string(settings)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        tokio::fs::write(&self.path, contents)
            .await
            .map_err(|e| self.io_error(e))?;

        tracing::info!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

/// In-process store, used by tests and when no settings file is given.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<Option<StoredSettings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn load(&self) -> Result<Option<StoredSettings>, ConfigError> {
        Ok(self.settings.lock().clone())
    }

    async fn save(&self, settings: &StoredSettings) -> Result<(), ConfigError> {
        *self.settings.lock() = Some(settings.clone());
        Ok(())
    }
}
